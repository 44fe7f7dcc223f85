//! Domain logic for deriving body-segment orientation from pose landmarks.
//!
//! Everything here is pure and synchronous: no database or runtime access.
//! The `poseaxis-db` crate persists what these modules compute and the
//! `poseaxis-pipeline` crate drives them over a store.

pub mod angle;
pub mod codec;
pub mod config;
pub mod direction;
pub mod error;
pub mod landmark;
pub mod rect;
pub mod reliability;
pub mod types;

pub use error::CoreError;
