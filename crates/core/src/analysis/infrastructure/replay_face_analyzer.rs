use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::analysis::domain::face_analyzer::{FaceAnalyzer, FaceDetection};
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("failed to read detections from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed detections file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("frame {0} appears more than once")]
    DuplicateFrame(usize),
}

#[derive(Deserialize)]
struct ReplayFile {
    frames: Vec<ReplayEntry>,
}

#[derive(Deserialize)]
struct ReplayEntry {
    frame: usize,
    #[serde(default)]
    faces: Vec<FaceDetection>,
}

/// Replays recorded analyzer output by frame index.
///
/// Lets a session run end to end from detections captured earlier (or
/// written by hand), with no model runtime present. Frames without an
/// entry yield no faces.
pub struct ReplayFaceAnalyzer {
    detections: HashMap<usize, Vec<FaceDetection>>,
}

impl ReplayFaceAnalyzer {
    pub fn new(detections: HashMap<usize, Vec<FaceDetection>>) -> Self {
        Self { detections }
    }

    pub fn from_file(path: &Path) -> Result<Self, ReplayError> {
        let json = fs::read_to_string(path).map_err(|e| ReplayError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        let file: ReplayFile = serde_json::from_str(json)?;
        let mut detections = HashMap::with_capacity(file.frames.len());
        for entry in file.frames {
            if detections.insert(entry.frame, entry.faces).is_some() {
                return Err(ReplayError::DuplicateFrame(entry.frame));
            }
        }
        log::debug!("Loaded replay detections for {} frames", detections.len());
        Ok(Self::new(detections))
    }

    pub fn frame_count(&self) -> usize {
        self.detections.len()
    }
}

impl FaceAnalyzer for ReplayFaceAnalyzer {
    fn analyze(&mut self, frame: &Frame) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>> {
        Ok(self
            .detections
            .get(&frame.index())
            .cloned()
            .unwrap_or_default())
    }
}
