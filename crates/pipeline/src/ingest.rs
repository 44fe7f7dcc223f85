//! Ingestion: the source file registry and the detector worker pool.
//!
//! Registration and every store write happen on the caller's connection.
//! Detection runs on a bounded pool of blocking tasks; their results flow
//! through a bounded completion queue into one consuming loop, which is the
//! only code that writes frames.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use poseaxis_core::error::CoreError;
use poseaxis_core::landmark::{validate_landmark_count, LandmarkSample};
use poseaxis_core::rect::FrameRect;
use poseaxis_core::types::DbId;
use poseaxis_db::models::file::{CreateSourceFile, SourceFile};
use poseaxis_db::repositories::{FileRepo, FrameRepo};
use serde::Serialize;
use sha2::{Digest, Sha512};
use sqlx::SqliteConnection;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Semaphore};

use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

/// One detected body instance: a sample per vocabulary entry.
pub type Instance = Vec<LandmarkSample>;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct DetectorError(pub String);

/// Landmark detector, treated as a black box.
///
/// Called on blocking worker threads, never on the async runtime.
pub trait Detector: Send + Sync + 'static {
    /// Every body instance found in the image at `path`, in detector order.
    fn detect(&self, path: &Path) -> Result<Vec<Instance>, DetectorError>;
}

// ---------------------------------------------------------------------------
// Source file registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Registration {
    /// Stored at this path with the same content; facts refreshed if touched.
    Unchanged(SourceFile),
    /// Known content under a new path; the row now points here.
    Moved(SourceFile),
    /// Registered now; needs detection.
    New(SourceFile),
}

impl Registration {
    pub fn file(&self) -> &SourceFile {
        match self {
            Self::Unchanged(f) | Self::Moved(f) | Self::New(f) => f,
        }
    }

    pub fn needs_detection(&self) -> bool {
        matches!(self, Self::New(_))
    }
}

struct SourceFacts {
    path: String,
    size: i64,
    timestamp: i64,
}

async fn source_facts(path: &Path) -> Result<SourceFacts, PipelineError> {
    let io = |source: std::io::Error| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    };
    let meta = tokio::fs::metadata(path).await.map_err(io)?;
    if !meta.is_file() {
        return Err(CoreError::Validation(format!("{} is not a file", path.display())).into());
    }
    if meta.len() == 0 {
        return Err(CoreError::Validation(format!("{} is empty", path.display())).into());
    }
    let modified: DateTime<Utc> = meta.modified().map_err(io)?.into();
    Ok(SourceFacts {
        path: path.to_string_lossy().into_owned(),
        size: i64::try_from(meta.len()).unwrap_or(i64::MAX),
        timestamp: modified.timestamp().max(0),
    })
}

const HASH_CHUNK: usize = 64 * 1024;

/// SHA-512 of the file's content, read in chunks.
pub async fn hash_file(path: &Path) -> Result<Vec<u8>, PipelineError> {
    let io = |source: std::io::Error| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = tokio::fs::File::open(path).await.map_err(io)?;
    let mut reader = BufReader::with_capacity(HASH_CHUNK, file);
    let mut hasher = Sha512::new();
    loop {
        let chunk = reader.fill_buf().await.map_err(io)?;
        if chunk.is_empty() {
            break;
        }
        hasher.update(chunk);
        let read = chunk.len();
        reader.consume(read);
    }
    Ok(hasher.finalize().to_vec())
}

/// Register `path`, deciding whether it needs detection.
///
/// A stored row with the same path, size and timestamp is taken as is.
/// Otherwise the content hash decides: known content keeps its row and
/// frames, with the row pointed at `path` and its facts refreshed. A row
/// left at `path` with other content is stale and is removed with its
/// frames.
pub async fn register_source_file(
    conn: &mut SqliteConnection,
    path: &Path,
) -> Result<Registration, PipelineError> {
    let facts = source_facts(path).await?;

    let at_path = FileRepo::find_by_path(conn, &facts.path).await?;
    if let Some(existing) = &at_path {
        if existing.size == facts.size && existing.timestamp == facts.timestamp {
            return Ok(Registration::Unchanged(existing.clone()));
        }
    }

    let hash = hash_file(path).await?;
    if let Some(known) = FileRepo::find_by_hash(conn, &hash).await? {
        if let Some(stale) = at_path.filter(|f| f.id != known.id) {
            tracing::info!(path = %facts.path, file_id = stale.id, "Source file replaced");
            FileRepo::delete(conn, stale.id).await?;
        }
        FileRepo::update_location(conn, known.id, &facts.path, facts.size, facts.timestamp).await?;
        let same_path = known.path == facts.path;
        if same_path {
            tracing::debug!(path = %facts.path, file_id = known.id, "Source file touched");
        } else {
            tracing::info!(from = %known.path, to = %facts.path, file_id = known.id, "Source file moved");
        }
        let file = SourceFile {
            path: facts.path,
            size: facts.size,
            timestamp: facts.timestamp,
            ..known
        };
        return Ok(if same_path {
            Registration::Unchanged(file)
        } else {
            Registration::Moved(file)
        });
    }

    if let Some(stale) = at_path {
        tracing::info!(path = %facts.path, file_id = stale.id, "Source file changed");
        FileRepo::delete(conn, stale.id).await?;
    }

    let file = FileRepo::create(
        conn,
        &CreateSourceFile {
            path: facts.path,
            size: facts.size,
            timestamp: facts.timestamp,
            hash,
        },
    )
    .await?;
    tracing::debug!(path = %file.path, file_id = file.id, "Source file registered");
    Ok(Registration::New(file))
}

/// Remove a registered file with its frames and everything derived from
/// them. Returns `false` when the path is not registered.
pub async fn remove_source_file(
    conn: &mut SqliteConnection,
    path: &Path,
) -> Result<bool, PipelineError> {
    let Some(file) = FileRepo::find_by_path(conn, &path.to_string_lossy()).await? else {
        return Ok(false);
    };
    let removed = FileRepo::delete(conn, file.id).await?;
    tracing::info!(path = %file.path, file_id = file.id, "Source file removed");
    Ok(removed)
}

// ---------------------------------------------------------------------------
// Worker pool
// ---------------------------------------------------------------------------

struct Job {
    file_id: DbId,
    path: PathBuf,
}

struct Outcome {
    file_id: DbId,
    path: PathBuf,
    result: Result<Vec<Instance>, DetectorError>,
}

/// Run `jobs` through the detector with at most `workers` in flight.
///
/// A worker keeps its permit until its outcome is queued, so neither the
/// pool nor the queue grows past `workers`. Dropping the receiver stops
/// dispatch; jobs not yet started are abandoned.
fn spawn_pool(
    detector: Arc<dyn Detector>,
    jobs: Vec<Job>,
    workers: usize,
) -> mpsc::Receiver<Outcome> {
    let workers = workers.max(1);
    let (tx, rx) = mpsc::channel(workers);
    let permits = Arc::new(Semaphore::new(workers));

    tokio::spawn(async move {
        let total = jobs.len();
        for (dispatched, job) in jobs.into_iter().enumerate() {
            let permit = match Arc::clone(&permits).acquire_owned().await {
                Ok(permit) if !tx.is_closed() => permit,
                _ => {
                    tracing::debug!(abandoned = total - dispatched, "Detector pool stopped");
                    break;
                }
            };
            let detector = Arc::clone(&detector);
            let tx = tx.clone();
            tokio::spawn(async move {
                let _permit = permit;
                let path = job.path.clone();
                let result = tokio::task::spawn_blocking(move || detector.detect(&path))
                    .await
                    .unwrap_or_else(|e| Err(DetectorError(format!("Detector task failed: {e}"))));
                let outcome = Outcome {
                    file_id: job.file_id,
                    path: job.path,
                    result,
                };
                if let Err(mpsc::error::SendError(lost)) = tx.send(outcome).await {
                    tracing::debug!(path = %lost.path.display(), "Consumer gone, detector outcome dropped");
                }
            });
        }
    });
    rx
}

// ---------------------------------------------------------------------------
// Ingestion pass
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub registered: usize,
    pub moved: usize,
    pub unchanged: usize,
    /// Unreadable, empty, or non-file sources.
    pub skipped_files: usize,
    /// Files the detector failed on; unregistered so a later run retries.
    pub failed_files: usize,
    pub frames: usize,
    /// Instances with the wrong landmark count or non-finite coordinates.
    pub skipped_instances: usize,
}

/// Register `sources`, detect landmarks in new ones, and store the frames.
pub async fn ingest(
    conn: &mut SqliteConnection,
    detector: Arc<dyn Detector>,
    sources: &[PathBuf],
    workers: usize,
) -> Result<IngestReport, PipelineError> {
    let mut report = IngestReport::default();
    let mut jobs = Vec::new();

    for path in sources {
        match register_source_file(conn, path).await {
            Ok(Registration::New(file)) => {
                report.registered += 1;
                jobs.push(Job {
                    file_id: file.id,
                    path: path.clone(),
                });
            }
            Ok(Registration::Moved(_)) => report.moved += 1,
            Ok(Registration::Unchanged(_)) => report.unchanged += 1,
            Err(e @ (PipelineError::Io { .. } | PipelineError::Core(_))) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping source file");
                report.skipped_files += 1;
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!(queued = jobs.len(), workers, "Running detector");
    let mut outcomes = spawn_pool(detector, jobs, workers);
    while let Some(outcome) = outcomes.recv().await {
        match outcome.result {
            Ok(instances) => {
                store_instances(conn, outcome.file_id, &outcome.path, &instances, &mut report)
                    .await?;
            }
            Err(e) => {
                tracing::warn!(path = %outcome.path.display(), error = %e, "Detector failed");
                FileRepo::delete(conn, outcome.file_id).await?;
                report.failed_files += 1;
            }
        }
    }

    tracing::info!(
        registered = report.registered,
        moved = report.moved,
        unchanged = report.unchanged,
        frames = report.frames,
        skipped_files = report.skipped_files,
        failed_files = report.failed_files,
        skipped_instances = report.skipped_instances,
        "Ingestion complete"
    );
    Ok(report)
}

fn is_finite(sample: &LandmarkSample) -> bool {
    sample
        .position
        .iter()
        .chain(&sample.image_position)
        .all(|v| v.is_finite())
}

async fn store_instances(
    conn: &mut SqliteConnection,
    file_id: DbId,
    path: &Path,
    instances: &[Instance],
    report: &mut IngestReport,
) -> Result<(), PipelineError> {
    for (person_index, samples) in instances.iter().enumerate() {
        if let Err(e) = validate_landmark_count(samples) {
            tracing::warn!(path = %path.display(), person_index, error = %e, "Skipping detected instance");
            report.skipped_instances += 1;
            continue;
        }
        if !samples.iter().all(is_finite) {
            tracing::warn!(path = %path.display(), person_index, "Skipping instance with non-finite coordinates");
            report.skipped_instances += 1;
            continue;
        }

        let frame = FrameRepo::create(conn, file_id, person_index as i64).await?;
        FrameRepo::insert_landmarks(conn, frame.id, samples).await?;
        match FrameRect::from_samples(samples) {
            Ok(rect) => FrameRepo::insert_rect(conn, frame.id, &rect).await?,
            Err(e) => tracing::warn!(frame_id = frame.id, error = %e, "No bounding box for frame"),
        }
        report.frames += 1;
        tracing::debug!(frame_id = frame.id, file_id, person_index, "Frame stored");
    }
    Ok(())
}
