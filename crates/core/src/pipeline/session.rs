use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::analysis::domain::face_analyzer::FaceAnalyzer;
use crate::analysis::infrastructure::analyzer_loader::{
    self, AnalyzerFactory, ExecutionTarget, ModelUnavailable,
};
use crate::capture::domain::frame_source::FrameSource;
use crate::pipeline::frame_processor::{AnnotatedFace, FrameProcessor};
use crate::pipeline::session_observer::SessionObserver;
use crate::shared::config::{ConfigError, TrackerConfig};
use crate::shared::constants::DEFAULT_FRAME_DELAY_MS;
use crate::shared::frame::Frame;
use crate::tracking::domain::age_recorder::AgeStatistics;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    ModelUnavailable(#[from] ModelUnavailable),
    #[error("no face analyzer loaded")]
    ModelNotLoaded,
    #[error("could not open capture {device}: {reason}")]
    CaptureUnavailable { device: String, reason: String },
    #[error("failed to read frame {frame} from capture: {reason}")]
    CaptureReadFailure { frame: usize, reason: String },
}

/// What a finished capture session did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSummary {
    pub frames: usize,
    pub stopped: bool,
}

/// The controlling side of the demo: load-model, reset-statistics,
/// submit-image and start/stop capture.
///
/// Processing is frame-synchronous on the calling thread. The stop flag
/// is the only state shared with other threads.
pub struct Session {
    processor: FrameProcessor,
    analyzer: Option<Box<dyn FaceAnalyzer>>,
    observer: Box<dyn SessionObserver>,
    last_faces: Vec<AnnotatedFace>,
    stop: Arc<AtomicBool>,
    frame_delay: Duration,
}

impl Session {
    pub fn new(
        config: TrackerConfig,
        observer: Box<dyn SessionObserver>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            processor: FrameProcessor::new(config)?,
            analyzer: None,
            observer,
            last_faces: Vec::new(),
            stop: Arc::new(AtomicBool::new(false)),
            frame_delay: Duration::from_millis(DEFAULT_FRAME_DELAY_MS),
        })
    }

    /// Pause between captured frames.
    pub fn with_frame_delay(mut self, delay: Duration) -> Self {
        self.frame_delay = delay;
        self
    }

    pub fn has_model(&self) -> bool {
        self.analyzer.is_some()
    }

    /// Loads the analyzer, falling back through `targets` in order.
    ///
    /// Does nothing when a model is already loaded. On failure the session
    /// stays usable; detection is just unavailable.
    pub fn load_model(
        &mut self,
        factory: &dyn AnalyzerFactory,
        targets: &[ExecutionTarget],
    ) -> Result<(), SessionError> {
        if self.analyzer.is_some() {
            return Ok(());
        }
        match analyzer_loader::load(factory, targets) {
            Ok(loaded) => {
                self.analyzer = Some(loaded.analyzer);
                Ok(())
            }
            Err(e) => {
                self.observer
                    .warning(&format!("Failed to load face analysis model: {e}"));
                Err(e.into())
            }
        }
    }

    /// Clears tracked identities, recorded ages and the frame counter.
    pub fn reset_statistics(&mut self) {
        self.processor.reset();
        self.last_faces.clear();
        self.observer.statistics(&self.processor.recorder().statistics());
        log::info!("Statistics reset");
    }

    pub fn statistics(&self) -> AgeStatistics {
        self.processor.recorder().statistics()
    }

    pub fn processor(&self) -> &FrameProcessor {
        &self.processor
    }

    /// Faces from the most recent frame that had any.
    pub fn last_faces(&self) -> &[AnnotatedFace] {
        &self.last_faces
    }

    /// Processes one still image. Without a model nothing is counted.
    pub fn submit_image(&mut self, frame: &Frame) -> Vec<AnnotatedFace> {
        let Some(analyzer) = self.analyzer.as_deref_mut() else {
            self.observer
                .warning("Load the face analysis model before submitting images");
            return Vec::new();
        };
        let faces = self.processor.process(frame, analyzer);
        self.observer.frame(frame, &faces);
        self.observer
            .statistics(&self.processor.recorder().statistics());
        if !faces.is_empty() {
            self.last_faces.clone_from(&faces);
        }
        faces
    }

    /// Flag that ends a running capture when set. Clone it to another
    /// thread (e.g. a Ctrl-C handler) to stop capture from outside.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn stop_capture(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Streams frames from `source` until it ends or capture is stopped.
    ///
    /// A read failure ends the session with `CaptureReadFailure`; anything
    /// recorded up to that point is kept.
    pub fn start_capture(
        &mut self,
        source: &mut dyn FrameSource,
    ) -> Result<CaptureSummary, SessionError> {
        let Some(analyzer) = self.analyzer.as_deref_mut() else {
            self.observer
                .warning("Load the face analysis model before starting capture");
            return Err(SessionError::ModelNotLoaded);
        };

        self.stop.store(false, Ordering::SeqCst);
        if let Err(e) = source.open() {
            let device = source.name();
            self.observer
                .warning(&format!("Could not access capture {device}: {e}"));
            return Err(SessionError::CaptureUnavailable {
                device,
                reason: e.to_string(),
            });
        }
        log::info!("Capture started: {}", source.name());

        let mut frames = 0;
        let mut stopped = false;
        loop {
            if self.stop.load(Ordering::SeqCst) {
                stopped = true;
                break;
            }
            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    source.close();
                    self.observer
                        .warning(&format!("Failed to capture frame from {}", source.name()));
                    return Err(SessionError::CaptureReadFailure {
                        frame: frames,
                        reason: e.to_string(),
                    });
                }
            };

            let faces = self.processor.process(&frame, analyzer);
            self.observer.frame(&frame, &faces);
            self.observer
                .statistics(&self.processor.recorder().statistics());
            if !faces.is_empty() {
                self.last_faces = faces;
            }
            frames += 1;

            if !self.frame_delay.is_zero() {
                thread::sleep(self.frame_delay);
            }
        }

        source.close();
        log::info!("Capture ended after {frames} frames");
        Ok(CaptureSummary { frames, stopped })
    }

    pub fn observer(&self) -> &dyn SessionObserver {
        self.observer.as_ref()
    }
}
