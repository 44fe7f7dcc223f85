//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&mut SqliteConnection` as the first argument. Passes call them
//! with their open transaction (`&mut *tx`).

pub mod direction_repo;
pub mod file_repo;
pub mod flexion_repo;
pub mod frame_repo;
pub mod reliability_repo;
pub mod similarity_repo;
pub mod tag_repo;

pub use direction_repo::DirectionRepo;
pub use file_repo::FileRepo;
pub use flexion_repo::FlexionRepo;
pub use frame_repo::FrameRepo;
pub use reliability_repo::ReliabilityRepo;
pub use similarity_repo::SimilarityRepo;
pub use tag_repo::TagRepo;
