//! Direction passes: torso and spine, then thigh and crus.
//!
//! Both passes read every stored landmark grouped by frame. Segments the
//! engine reports unavailable are left out; they never fail a pass.

use std::collections::HashMap;

use poseaxis_core::direction::{
    DirectionEngine, HandednessResolver, Inference, SegmentKind, TorsoOrientation,
};
use poseaxis_core::landmark::FrameLandmarks;
use poseaxis_core::types::{DbId, Side};
use poseaxis_db::models::direction::{NewSideDirection, NewSpineDirection, NewTorsoDirection};
use poseaxis_db::models::frame::{collect_landmarks, LandmarkRow};
use poseaxis_db::repositories::{DirectionRepo, FrameRepo, ReliabilityRepo};
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::error::PipelineError;

/// Every frame's landmark set, ascending by frame id.
async fn frames(conn: &mut SqliteConnection) -> Result<Vec<(DbId, FrameLandmarks)>, PipelineError> {
    let rows: Vec<LandmarkRow> = FrameRepo::all_landmarks(conn).await?;
    Ok(rows
        .chunk_by(|a, b| a.frame_id == b.frame_id)
        .map(|chunk| (chunk[0].frame_id, collect_landmarks(chunk)))
        .collect())
}

// ---------------------------------------------------------------------------
// Torso and spine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TorsoReport {
    pub frames: usize,
    pub torso: usize,
    pub spine: usize,
    /// Torso directions dropped because the frame has no reliability score.
    pub unscored: usize,
    pub torso_unavailable: usize,
    pub spine_unavailable: usize,
}

/// Recompute every torso and spine direction with its vector row.
///
/// A torso row carries the frame's `torso_half_min` as its score, so frames
/// the reliability pass did not score get no torso row.
pub async fn infer_torso_and_spine<R: HandednessResolver>(
    conn: &mut SqliteConnection,
    engine: &DirectionEngine<R>,
) -> Result<TorsoReport, PipelineError> {
    let scores: HashMap<DbId, f64> = ReliabilityRepo::list(conn)
        .await?
        .into_iter()
        .map(|r| (r.frame_id, r.torso_half_min))
        .collect();

    let mut report = TorsoReport::default();
    let mut torso_rows = Vec::new();
    let mut spine_rows = Vec::new();

    for (frame_id, landmarks) in frames(conn).await? {
        report.frames += 1;

        match engine.torso(&landmarks) {
            Inference::Available(direction) => match scores.get(&frame_id) {
                Some(&score) => torso_rows.push(NewTorsoDirection {
                    frame_id,
                    direction: direction.vector,
                    tier: direction.tier,
                    score,
                    orientation: TorsoOrientation::from_direction(&direction.vector),
                }),
                None => report.unscored += 1,
            },
            Inference::Unavailable(reason) => {
                tracing::debug!(frame_id, ?reason, "Torso unavailable");
                report.torso_unavailable += 1;
            }
        }

        match engine.spine(&landmarks) {
            Inference::Available(direction) => spine_rows.push(NewSpineDirection {
                frame_id,
                direction: direction.vector,
                tier: direction.tier,
            }),
            Inference::Unavailable(reason) => {
                tracing::debug!(frame_id, ?reason, "Spine unavailable");
                report.spine_unavailable += 1;
            }
        }
    }

    DirectionRepo::replace_torso(conn, &torso_rows).await?;
    DirectionRepo::replace_spine(conn, &spine_rows).await?;
    report.torso = torso_rows.len();
    report.spine = spine_rows.len();

    if report.unscored > 0 {
        tracing::warn!(frames = report.unscored, "Torso directions skipped for unscored frames");
    }
    tracing::info!(
        frames = report.frames,
        torso = report.torso,
        spine = report.spine,
        torso_unavailable = report.torso_unavailable,
        spine_unavailable = report.spine_unavailable,
        "Torso and spine directions stored"
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// Thigh and crus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LimbReport {
    pub frames: usize,
    pub thigh: usize,
    pub crus: usize,
    pub unavailable: usize,
    /// Vector rows removed because their relational row is gone.
    pub purged: u64,
}

/// Upsert both sides' thigh and crus directions of every frame.
pub async fn infer_limbs<R: HandednessResolver>(
    conn: &mut SqliteConnection,
    engine: &DirectionEngine<R>,
) -> Result<LimbReport, PipelineError> {
    let mut report = LimbReport::default();
    let mut thigh_rows = Vec::new();
    let mut crus_rows = Vec::new();

    for (frame_id, landmarks) in frames(conn).await? {
        report.frames += 1;
        for side in Side::BOTH {
            for (kind, rows) in [
                (SegmentKind::Thigh, &mut thigh_rows),
                (SegmentKind::Crus, &mut crus_rows),
            ] {
                match engine.infer_segment_direction(&landmarks, kind, Some(side)) {
                    Inference::Available(direction) => rows.push(NewSideDirection {
                        frame_id,
                        side,
                        direction: direction.vector,
                    }),
                    Inference::Unavailable(reason) => {
                        tracing::debug!(frame_id, side = side.label(), ?kind, ?reason, "Segment unavailable");
                        report.unavailable += 1;
                    }
                }
            }
        }
    }

    DirectionRepo::upsert_sided(conn, SegmentKind::Thigh, &thigh_rows).await?;
    DirectionRepo::upsert_sided(conn, SegmentKind::Crus, &crus_rows).await?;
    report.purged = DirectionRepo::purge_orphan_vectors(conn, SegmentKind::Thigh).await?
        + DirectionRepo::purge_orphan_vectors(conn, SegmentKind::Crus).await?;
    report.thigh = thigh_rows.len();
    report.crus = crus_rows.len();

    tracing::info!(
        frames = report.frames,
        thigh = report.thigh,
        crus = report.crus,
        unavailable = report.unavailable,
        purged = report.purged,
        "Thigh and crus directions stored"
    );
    Ok(report)
}
