//! Row structs and insert DTOs.
//!
//! Each submodule contains:
//! - `FromRow` + `Serialize` structs matching stored rows
//! - plain DTOs for the values a pass writes

pub mod direction;
pub mod file;
pub mod flexion;
pub mod frame;
pub mod reliability;
pub mod similarity;
pub mod tag;
