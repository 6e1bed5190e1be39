use std::path::PathBuf;

use crate::capture::domain::frame_source::FrameSource;
use crate::shared::frame::Frame;

use super::image_decoder::decode_frame;

/// A single still image presented as a one-frame stream.
pub struct ImageFileSource {
    path: PathBuf,
    consumed: bool,
}

impl ImageFileSource {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            consumed: false,
        }
    }
}

impl FrameSource for ImageFileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if !self.path.is_file() {
            return Err(format!("image not found: {}", self.path.display()).into());
        }
        self.consumed = false;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        if self.consumed {
            return Ok(None);
        }
        self.consumed = true;
        decode_frame(&self.path, 0).map(Some)
    }

    fn close(&mut self) {
        self.consumed = true;
    }
}
