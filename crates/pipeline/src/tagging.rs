//! Tagging pass: label frames by directory keywords in their source path.

use poseaxis_db::models::tag::TagMapping;
use poseaxis_db::repositories::TagRepo;
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::error::PipelineError;

/// Parse `keyword=tag` strings, skipping malformed ones with a warning.
pub fn parse_mappings<S: AsRef<str>>(raw: &[S]) -> Vec<TagMapping> {
    raw.iter()
        .filter_map(|entry| match TagMapping::parse(entry.as_ref()) {
            Ok(mapping) => Some(mapping),
            Err(e) => {
                tracing::warn!(entry = entry.as_ref(), error = %e, "Skipping tag mapping");
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagReport {
    pub tags: usize,
    /// New frame/tag pairs; re-running the same mappings adds none.
    pub assigned: u64,
}

/// Register each mapping's tag and assign it to matching frames.
pub async fn add_tags(
    conn: &mut SqliteConnection,
    mappings: &[TagMapping],
) -> Result<TagReport, PipelineError> {
    let mut report = TagReport::default();
    for mapping in mappings {
        let tag_id = TagRepo::ensure(conn, &mapping.tag).await?;
        let assigned = TagRepo::assign_by_keyword(conn, tag_id, &mapping.keyword).await?;
        tracing::debug!(keyword = %mapping.keyword, tag = %mapping.tag, assigned, "Tag assigned");
        report.tags += 1;
        report.assigned += assigned;
    }
    tracing::info!(tags = report.tags, assigned = report.assigned, "Tagging complete");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_mappings_are_dropped() {
        let mappings = parse_mappings(&["standing=upright", "bad", "sitting = seated", "=x"]);
        assert_eq!(
            mappings,
            vec![
                TagMapping {
                    keyword: "standing".into(),
                    tag: "upright".into()
                },
                TagMapping {
                    keyword: "sitting".into(),
                    tag: "seated".into()
                },
            ]
        );
    }
}
