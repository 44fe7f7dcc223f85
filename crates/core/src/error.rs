use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A packed vector whose byte length is not a whole number of elements.
    #[error("Malformed vector: {len} bytes is not a multiple of the {element_size}-byte element size")]
    MalformedVector { len: usize, element_size: usize },

    /// The grouped reliability aggregates did not line up frame-for-frame.
    #[error(
        "Aggregate alignment failed at position {position}: \
         face={face:?}, left={left:?}, right={right:?}"
    )]
    AggregateAlignment {
        position: usize,
        face: Option<DbId>,
        left: Option<DbId>,
        right: Option<DbId>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}
