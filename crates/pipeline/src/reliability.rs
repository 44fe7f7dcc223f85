//! Reliability pass: per-frame region scores from landmark confidence.

use poseaxis_core::reliability::{zip_aggregates, Region};
use poseaxis_db::repositories::ReliabilityRepo;
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::error::PipelineError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReliabilityReport {
    pub scored: usize,
    /// Frames lacking any landmark in some region.
    pub unscored: i64,
}

/// Recompute every `Reliability` row.
///
/// The three region aggregates are zipped by position; a misalignment
/// aborts the pass before anything is written.
pub async fn score_reliability(
    conn: &mut SqliteConnection,
) -> Result<ReliabilityReport, PipelineError> {
    let face = ReliabilityRepo::region_aggregate(conn, Region::Face).await?;
    let left = ReliabilityRepo::region_aggregate(conn, Region::LeftLimb).await?;
    let right = ReliabilityRepo::region_aggregate(conn, Region::RightLimb).await?;

    let scores = zip_aggregates(&face, &left, &right)?;
    ReliabilityRepo::replace_all(conn, &scores).await?;

    let report = ReliabilityReport {
        scored: scores.len(),
        unscored: ReliabilityRepo::count_unscored(conn).await?,
    };
    if report.unscored > 0 {
        tracing::debug!(frames = report.unscored, "Frames without landmarks in every region left unscored");
    }
    tracing::info!(scored = report.scored, unscored = report.unscored, "Reliability scored");
    Ok(report)
}
