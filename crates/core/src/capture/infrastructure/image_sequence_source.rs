use std::fs;
use std::path::PathBuf;

use crate::capture::domain::frame_source::FrameSource;
use crate::shared::frame::Frame;

use super::image_decoder::{decode_frame, is_image};

/// Plays a directory of image files back as a stream, in file-name order.
///
/// Frame indices count from zero in playback order, so recorded detections
/// can be keyed by position in the sequence.
pub struct ImageSequenceSource {
    dir: PathBuf,
    paths: Vec<PathBuf>,
    position: usize,
}

impl ImageSequenceSource {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            paths: Vec::new(),
            position: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn name(&self) -> String {
        self.dir.display().to_string()
    }

    fn open(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_image(p))
            .collect();
        if paths.is_empty() {
            return Err(format!("no images in {}", self.dir.display()).into());
        }
        paths.sort();
        log::debug!("Opened {} frames from {}", paths.len(), self.dir.display());
        self.paths = paths;
        self.position = 0;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let Some(path) = self.paths.get(self.position) else {
            return Ok(None);
        };
        let frame = decode_frame(path, self.position)?;
        self.position += 1;
        Ok(Some(frame))
    }

    fn close(&mut self) {
        self.paths.clear();
        self.position = 0;
    }
}
