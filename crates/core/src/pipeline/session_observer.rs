use std::time::Instant;

use crate::pipeline::frame_processor::AnnotatedFace;
use crate::shared::frame::Frame;
use crate::tracking::domain::age_recorder::AgeStatistics;

/// Display side of a session: receives frames with their faces, updated
/// statistics and user-facing warnings.
///
/// Decouples the session from any particular front end (terminal, GUI,
/// tests).
pub trait SessionObserver: Send {
    /// A processed frame and the faces annotated on it (possibly none).
    fn frame(&mut self, frame: &Frame, faces: &[AnnotatedFace]);

    /// Statistics after a frame was processed or the session was reset.
    fn statistics(&mut self, stats: &AgeStatistics);

    /// Something the user should see, e.g. an unavailable camera.
    fn warning(&mut self, message: &str);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards all events.
pub struct NullSessionObserver;

impl SessionObserver for NullSessionObserver {
    fn frame(&mut self, _frame: &Frame, _faces: &[AnnotatedFace]) {}
    fn statistics(&mut self, _stats: &AgeStatistics) {}
    fn warning(&mut self, _message: &str) {}
}

/// Writes events through the `log` facade and keeps counters for a
/// summary at the end of the session.
///
/// Per-face lines go to `debug`; statistics changes and warnings are
/// always visible.
pub struct LogSessionObserver {
    start_time: Instant,
    frames: usize,
    faces: usize,
    warnings: Vec<String>,
    population: usize,
    mean_age: Option<f64>,
}

impl LogSessionObserver {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            frames: 0,
            faces: 0,
            warnings: Vec::new(),
            population: 0,
            mean_age: None,
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn faces(&self) -> usize {
        self.faces
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Returns the formatted summary, or `None` if nothing was observed.
    pub fn summary_string(&self) -> Option<String> {
        if self.frames == 0 && self.warnings.is_empty() {
            return None;
        }

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Session summary ({} frames, {elapsed:.1}s):",
            self.frames
        )];
        lines.push(format!("  Face annotations: {}", self.faces));
        lines.push(format!("  People recorded: {}", self.population));
        if let Some(mean) = self.mean_age {
            lines.push(format!("  Average age: {mean:.1} years"));
        }
        if !self.warnings.is_empty() {
            lines.push(format!("  Warnings: {}", self.warnings.len()));
        }
        if self.frames > 0 && elapsed > 0.0 {
            lines.push(format!("  Throughput: {:.1} fps", self.frames as f64 / elapsed));
        }
        Some(lines.join("\n"))
    }
}

impl Default for LogSessionObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionObserver for LogSessionObserver {
    fn frame(&mut self, frame: &Frame, faces: &[AnnotatedFace]) {
        self.frames += 1;
        self.faces += faces.len();
        for face in faces {
            log::debug!(
                "frame {}: {} age {} {} {}",
                frame.index(),
                face.identity_id,
                face.age,
                face.gender,
                face.status_label()
            );
        }
    }

    fn statistics(&mut self, stats: &AgeStatistics) {
        if stats.population != self.population {
            log::info!("People detected: {}", stats.population);
        }
        self.population = stats.population;
        self.mean_age = stats.mean_age;
    }

    fn warning(&mut self, message: &str) {
        log::warn!("{message}");
        self.warnings.push(message.to_string());
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
