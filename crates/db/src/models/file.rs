//! Source file registry models.

use poseaxis_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `File` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SourceFile {
    pub id: DbId,
    pub path: String,
    /// Size in bytes.
    pub size: i64,
    /// Modification time, unix seconds.
    pub timestamp: i64,
    /// SHA-512 digest of the content.
    #[serde(skip)]
    pub hash: Vec<u8>,
}

impl SourceFile {
    pub fn modified_at(&self) -> Option<Timestamp> {
        chrono::DateTime::from_timestamp(self.timestamp, 0)
    }
}

/// DTO for registering a source file.
#[derive(Debug, Clone)]
pub struct CreateSourceFile {
    pub path: String,
    pub size: i64,
    pub timestamp: i64,
    pub hash: Vec<u8>,
}
