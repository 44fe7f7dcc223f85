use poseaxis_core::error::CoreError;

/// A declared table does not match the database.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// The column set differs from the declared one.
    #[error("Column mismatch in {table}: expected {expected:?}, found {actual:?}")]
    ColumnMismatch {
        table: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    /// A stored value's type differs from its column's declared type.
    #[error("Row type mismatch in {table}: expected {expected}, found row {row}")]
    RowTypeMismatch {
        table: String,
        expected: String,
        row: String,
    },

    /// The file was written by a newer schema than this build supports.
    #[error("Schema version {found} is newer than supported version {supported}")]
    VersionMismatch { found: i64, supported: i64 },
}

impl SchemaError {
    /// Declared columns absent from the table.
    pub fn missing_columns(&self) -> Vec<&str> {
        match self {
            Self::ColumnMismatch {
                expected, actual, ..
            } => expected
                .iter()
                .filter(|c| !actual.contains(c))
                .map(String::as_str)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Table columns that were not declared.
    pub fn unexpected_columns(&self) -> Vec<&str> {
        match self {
            Self::ColumnMismatch {
                expected, actual, ..
            } => actual
                .iter()
                .filter(|c| !expected.contains(c))
                .map(String::as_str)
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// The vector search extension is not usable on this connection.
    #[error("Vector index unavailable: {0}")]
    VectorCapability(String),

    #[error("Store is closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_mismatch_reports_both_directions() {
        let err = SchemaError::ColumnMismatch {
            table: "Frame".into(),
            expected: vec!["id".into(), "file_id".into(), "person_index".into()],
            actual: vec!["id".into(), "file_id".into(), "pose_index".into()],
        };
        assert_eq!(err.missing_columns(), vec!["person_index"]);
        assert_eq!(err.unexpected_columns(), vec!["pose_index"]);
        assert!(err.to_string().starts_with("Column mismatch in Frame"));
    }
}
