//! Replays precomputed detector output.
//!
//! The document is a JSON object mapping image paths to the instances found
//! in that image, each instance being the full landmark sequence:
//!
//! ```json
//! { "shots/standing/001.jpg": [[{"presence": 0.98, "confidence": 0.91,
//!     "position": [0.2, 0.5, 0.0], "image_position": [0.4, 0.3]}, ...]] }
//! ```
//!
//! Relative keys resolve against the document's directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use poseaxis_pipeline::{Detector, DetectorError, Instance};

pub struct JsonDetector {
    detections: HashMap<PathBuf, Vec<Instance>>,
}

/// Canonical form when the file exists, the joined path otherwise.
fn normalize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

impl JsonDetector {
    pub async fn load(document: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(document)
            .await
            .with_context(|| format!("Failed to read detections from {}", document.display()))?;
        let base = document.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&raw, base)
            .with_context(|| format!("Invalid detections document {}", document.display()))
    }

    pub fn parse(raw: &str, base: &Path) -> anyhow::Result<Self> {
        let entries: HashMap<String, Vec<Instance>> = serde_json::from_str(raw)?;
        let detections = entries
            .into_iter()
            .map(|(key, instances)| (normalize(&base.join(key)), instances))
            .collect::<HashMap<_, _>>();
        tracing::info!(images = detections.len(), "Detections loaded");
        Ok(Self { detections })
    }

    /// Every image the document covers, sorted.
    pub fn images(&self) -> Vec<PathBuf> {
        let mut images: Vec<PathBuf> = self.detections.keys().cloned().collect();
        images.sort();
        images
    }
}

impl Detector for JsonDetector {
    fn detect(&self, path: &Path) -> Result<Vec<Instance>, DetectorError> {
        self.detections
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| DetectorError(format!("No detections recorded for {}", path.display())))
    }
}
