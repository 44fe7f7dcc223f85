//! Pipeline stages over the pose store.
//!
//! Each pass takes a `&mut SqliteConnection` (usually a transaction) and
//! returns a serializable report. [`orchestrator::Pipeline`] owns the store
//! lifecycle and runs the passes in order:
//!
//! ingest → reliability → torso/spine → thigh/crus → flexion → tagging

pub mod direction;
pub mod error;
pub mod flexion;
pub mod ingest;
pub mod orchestrator;
pub mod reliability;
pub mod tagging;

pub use error::{PipelineError, StageFailed};
pub use ingest::{Detector, DetectorError, Instance};
pub use orchestrator::{Pipeline, Stage, StageReport};
