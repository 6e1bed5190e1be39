use serde::{Deserialize, Serialize};

use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// One face as reported by the analyzer, before any smoothing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    pub bbox: BoundingBox,
    pub age: f64,
    /// Binary gender code; `1` means male.
    #[serde(rename = "gender")]
    pub gender_code: i32,
}

/// Domain interface for the face-analysis model.
///
/// Takes a BGR frame and returns every face found in it. Implementations
/// may hold model sessions or replay state, hence `&mut self`.
pub trait FaceAnalyzer: Send {
    fn analyze(&mut self, frame: &Frame) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>>;
}
