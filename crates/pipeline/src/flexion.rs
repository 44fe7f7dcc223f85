//! Flexion pass: hip and knee angles from stored segment directions.

use poseaxis_core::angle::{derive_flexion, Flexion};
use poseaxis_core::direction::UnitVector;
use poseaxis_core::types::Side;
use poseaxis_db::models::flexion::{NewCrusFlexion, NewThighFlexion};
use poseaxis_db::repositories::FlexionRepo;
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::error::PipelineError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlexionReport {
    pub thigh: usize,
    pub crus: usize,
    /// Input rows that no longer form unit vectors or name no side.
    pub skipped: usize,
}

fn unit(x: f64, y: f64, z: f64) -> Option<UnitVector> {
    UnitVector::from_components(x, y, z)
}

/// Upsert thigh and crus flexion for every (frame, side) whose inputs exist.
///
/// Pairs missing a direction never reach the input queries, so they are
/// omitted without a trace.
pub async fn derive_flexion_angles(
    conn: &mut SqliteConnection,
) -> Result<FlexionReport, PipelineError> {
    let mut report = FlexionReport::default();

    let mut thigh_rows = Vec::new();
    for input in FlexionRepo::thigh_inputs(conn).await? {
        let (Some(torso), Some(thigh), Some(spine), Some(side)) = (
            unit(input.torso_x, input.torso_y, input.torso_z),
            unit(input.thigh_x, input.thigh_y, input.thigh_z),
            unit(input.spine_x, input.spine_y, input.spine_z),
            Side::from_is_right(input.is_right),
        ) else {
            report.skipped += 1;
            continue;
        };
        if let Flexion::Thigh(flexion) = derive_flexion(&torso, &thigh, Some(&spine)) {
            thigh_rows.push(NewThighFlexion {
                frame_id: input.frame_id,
                side,
                flexion,
            });
        }
    }

    let mut crus_rows = Vec::new();
    for input in FlexionRepo::crus_inputs(conn).await? {
        let (Some(thigh), Some(crus), Some(side)) = (
            unit(input.thigh_x, input.thigh_y, input.thigh_z),
            unit(input.crus_x, input.crus_y, input.crus_z),
            Side::from_is_right(input.is_right),
        ) else {
            report.skipped += 1;
            continue;
        };
        if let Flexion::Crus(flexion) = derive_flexion(&thigh, &crus, None) {
            crus_rows.push(NewCrusFlexion {
                frame_id: input.frame_id,
                side,
                flexion,
            });
        }
    }

    FlexionRepo::upsert_thigh(conn, &thigh_rows).await?;
    FlexionRepo::upsert_crus(conn, &crus_rows).await?;
    report.thigh = thigh_rows.len();
    report.crus = crus_rows.len();

    tracing::info!(
        thigh = report.thigh,
        crus = report.crus,
        skipped = report.skipped,
        "Flexion angles stored"
    );
    Ok(report)
}
