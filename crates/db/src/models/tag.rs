use poseaxis_core::error::CoreError;
use poseaxis_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `TagInfo` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TagInfo {
    pub id: DbId,
    pub name: String,
}

/// Assign `tag` to frames whose source path has a `keyword` directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMapping {
    pub keyword: String,
    pub tag: String,
}

impl TagMapping {
    /// Parse a `keyword=tag` pair.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let Some((keyword, tag)) = raw.split_once('=') else {
            return Err(CoreError::Validation(format!(
                "Tag mapping must be keyword=tag, got '{raw}'"
            )));
        };
        let (keyword, tag) = (keyword.trim(), tag.trim());
        if keyword.is_empty() || tag.is_empty() {
            return Err(CoreError::Validation(format!(
                "Tag mapping has an empty side: '{raw}'"
            )));
        }
        Ok(Self {
            keyword: keyword.to_string(),
            tag: tag.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mapping() {
        let m = TagMapping::parse(" standing = upright ").unwrap();
        assert_eq!(m.keyword, "standing");
        assert_eq!(m.tag, "upright");
        assert!(TagMapping::parse("standing").is_err());
        assert!(TagMapping::parse("=upright").is_err());
        assert!(TagMapping::parse("standing=").is_err());
    }
}
