//! Stage orchestration.
//!
//! Each stage opens the store with its own schema, runs its pass in one
//! transaction, and closes the store whether or not the pass succeeded.
//! [`Pipeline::run_all`] runs the stages in dependency order and stops at
//! the first failure.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use poseaxis_core::config::PipelineConfig;
use poseaxis_core::direction::DirectionEngine;
use poseaxis_db::models::tag::TagMapping;
use poseaxis_db::schema::{
    Schema, FLEXION_SCHEMA, INGEST_SCHEMA, LIMB_SCHEMA, RELIABILITY_SCHEMA, TAG_SCHEMA,
    TORSO_SCHEMA,
};
use poseaxis_db::{RepairPolicy, Store, StoreError, StoreOptions};
use serde::Serialize;
use tracing::Instrument;

use crate::direction::{self, LimbReport, TorsoReport};
use crate::error::{PipelineError, StageFailed};
use crate::flexion::{self, FlexionReport};
use crate::ingest::{self, Detector, IngestReport};
use crate::reliability::{self, ReliabilityReport};
use crate::tagging::{self, TagReport};

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Ingest,
    Reliability,
    Torso,
    Limbs,
    Flexion,
    Tagging,
}

impl Stage {
    /// Dependency order.
    pub const ORDER: [Stage; 6] = [
        Stage::Ingest,
        Stage::Reliability,
        Stage::Torso,
        Stage::Limbs,
        Stage::Flexion,
        Stage::Tagging,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ingest => "ingest",
            Self::Reliability => "reliability",
            Self::Torso => "torso",
            Self::Limbs => "limbs",
            Self::Flexion => "flexion",
            Self::Tagging => "tagging",
        }
    }

    /// The tables this stage owns.
    pub fn schema(&self) -> &'static Schema {
        match self {
            Self::Ingest => &INGEST_SCHEMA,
            Self::Reliability => &RELIABILITY_SCHEMA,
            Self::Torso => &TORSO_SCHEMA,
            Self::Limbs => &LIMB_SCHEMA,
            Self::Flexion => &FLEXION_SCHEMA,
            Self::Tagging => &TAG_SCHEMA,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StageReport {
    Ingest(IngestReport),
    Reliability(ReliabilityReport),
    Torso(TorsoReport),
    Limbs(LimbReport),
    Flexion(FlexionReport),
    Tagging(TagReport),
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Runs stages against one store file.
pub struct Pipeline {
    config: PipelineConfig,
    reset: bool,
    detector: Option<Arc<dyn Detector>>,
    sources: Vec<PathBuf>,
    tags: Vec<TagMapping>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            reset: false,
            detector: None,
            sources: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Drop and recreate each stage's tables before its pass.
    pub fn with_reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    pub fn with_detector(mut self, detector: Arc<dyn Detector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Image files for the ingestion stage.
    pub fn with_sources(mut self, sources: Vec<PathBuf>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_tags(mut self, tags: Vec<TagMapping>) -> Self {
        self.tags = tags;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            reset: self.reset,
            repair: if self.config.repair_missing_tables {
                RepairPolicy::RecreateMissing
            } else {
                RepairPolicy::Strict
            },
        }
    }

    /// Open the configured store with `schema`, outside any stage.
    pub async fn open_store(&self, schema: &'static Schema) -> Result<Store, StoreError> {
        Store::open(&self.config.database_path, schema, self.store_options()).await
    }

    pub async fn run_stage(&self, stage: Stage) -> Result<StageReport, StageFailed> {
        let span = tracing::info_span!("stage", stage = stage.name());
        async {
            tracing::info!(path = %self.config.database_path.display(), "Stage starting");
            let mut store = self
                .open_store(stage.schema())
                .await
                .map_err(|e| StageFailed {
                    stage,
                    source: e.into(),
                })?;

            let result = self.execute(stage, &mut store).await;
            if let Err(e) = store.close().await {
                tracing::warn!(error = %e, "Closing store failed");
            }
            result.map_err(|source| StageFailed { stage, source })
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, stage: Stage, store: &mut Store) -> Result<StageReport, PipelineError> {
        let engine = DirectionEngine::new(self.config.presence_threshold);
        let mut tx = store.begin().await?;

        let report = match stage {
            Stage::Ingest => {
                let detector = self.detector.clone().ok_or_else(|| {
                    PipelineError::MissingInput("ingestion needs a detector".into())
                })?;
                let report =
                    ingest::ingest(&mut *tx, detector, &self.sources, self.config.max_workers)
                        .await?;
                StageReport::Ingest(report)
            }
            Stage::Reliability => {
                StageReport::Reliability(reliability::score_reliability(&mut *tx).await?)
            }
            Stage::Torso => {
                StageReport::Torso(direction::infer_torso_and_spine(&mut *tx, &engine).await?)
            }
            Stage::Limbs => StageReport::Limbs(direction::infer_limbs(&mut *tx, &engine).await?),
            Stage::Flexion => {
                StageReport::Flexion(flexion::derive_flexion_angles(&mut *tx).await?)
            }
            Stage::Tagging => StageReport::Tagging(tagging::add_tags(&mut *tx, &self.tags).await?),
        };

        tx.commit().await?;
        Ok(report)
    }

    /// Run every stage in order, stopping at the first failure.
    pub async fn run_all(&self) -> Result<Vec<StageReport>, StageFailed> {
        let mut reports = Vec::with_capacity(Stage::ORDER.len());
        for stage in Stage::ORDER {
            match self.run_stage(stage).await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    tracing::error!(stage = stage.name(), error = %e.source, "Pipeline aborted");
                    return Err(e);
                }
            }
        }
        Ok(reports)
    }
}
