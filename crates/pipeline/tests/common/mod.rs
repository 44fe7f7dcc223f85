#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use poseaxis_core::config::PipelineConfig;
use poseaxis_core::landmark::{Keypoint, LandmarkSample};
use poseaxis_pipeline::{Detector, DetectorError, Instance};
use sqlx::SqliteConnection;

/// 3-D position of each keypoint for an upright pose facing the camera.
///
/// x grows to the subject's left, y is up, z is depth.
pub fn upright_position(kp: Keypoint) -> [f64; 3] {
    match kp {
        Keypoint::Nose => [0.0, 0.75, -0.05],
        Keypoint::LeftEye => [0.03, 0.78, -0.04],
        Keypoint::RightEye => [-0.03, 0.78, -0.04],
        Keypoint::LeftEar => [0.07, 0.77, 0.0],
        Keypoint::RightEar => [-0.07, 0.77, 0.0],
        Keypoint::LeftShoulder => [0.2, 0.5, 0.0],
        Keypoint::RightShoulder => [-0.2, 0.5, 0.0],
        Keypoint::LeftElbow => [0.25, 0.25, 0.0],
        Keypoint::RightElbow => [-0.25, 0.25, 0.0],
        Keypoint::LeftWrist => [0.27, 0.0, -0.05],
        Keypoint::RightWrist => [-0.27, 0.0, -0.05],
        Keypoint::LeftHip => [0.15, 0.0, 0.0],
        Keypoint::RightHip => [-0.15, 0.0, 0.0],
        Keypoint::LeftKnee => [0.15, -0.45, -0.1],
        Keypoint::RightKnee => [-0.15, -0.45, -0.1],
        Keypoint::LeftAnkle => [0.15, -0.9, 0.0],
        Keypoint::RightAnkle => [-0.15, -0.9, 0.0],
    }
}

/// A fully visible upright pose.
pub fn upright() -> Instance {
    Keypoint::ALL
        .iter()
        .map(|&kp| {
            let [x, y, z] = upright_position(kp);
            LandmarkSample {
                presence: 0.99,
                confidence: 0.9,
                position: [x, y, z],
                image_position: [0.5 - x * 0.5, 0.5 - y * 0.4],
            }
        })
        .collect()
}

/// [`upright`] with one keypoint's presence replaced.
pub fn with_presence(mut pose: Instance, kp: Keypoint, presence: f64) -> Instance {
    pose[kp as usize].presence = presence;
    pose
}

/// Replays canned detections keyed by file name and tracks concurrency.
#[derive(Default)]
pub struct FakeDetector {
    poses: Mutex<HashMap<String, Result<Vec<Instance>, String>>>,
    in_flight: AtomicUsize,
    pub peak: AtomicUsize,
    pub calls: AtomicUsize,
    delay: Duration,
}

impl FakeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn set(&self, name: &str, instances: Vec<Instance>) {
        self.poses
            .lock()
            .unwrap()
            .insert(name.to_string(), Ok(instances));
    }

    pub fn fail(&self, name: &str, message: &str) {
        self.poses
            .lock()
            .unwrap()
            .insert(name.to_string(), Err(message.to_string()));
    }
}

impl Detector for FakeDetector {
    fn detect(&self, path: &Path) -> Result<Vec<Instance>, DetectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let result = match self.poses.lock().unwrap().get(&name) {
            Some(Ok(instances)) => Ok(instances.clone()),
            Some(Err(message)) => Err(DetectorError(message.clone())),
            None => Ok(Vec::new()),
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Write a distinct, non-empty image stand-in at `dir/rel`.
pub fn write_image(dir: &Path, rel: &str) -> PathBuf {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, format!("image:{rel}")).unwrap();
    path
}

pub fn config(dir: &Path) -> PipelineConfig {
    PipelineConfig {
        database_path: dir.join("pose.db"),
        max_workers: 2,
        ..PipelineConfig::default()
    }
}

pub async fn count(conn: &mut SqliteConnection, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(conn)
        .await
        .unwrap()
}
