use crate::shared::frame::Frame;

/// Produces frames for a capture session, one at a time.
///
/// Implementations handle device or file details; the session only sees
/// BGR `Frame`s. `Ok(None)` means the stream ended normally.
pub trait FrameSource: Send {
    /// Human-readable name for warnings and logs.
    fn name(&self) -> String;

    /// Prepares the source. Failing here means capture is unavailable.
    fn open(&mut self) -> Result<(), Box<dyn std::error::Error>>;

    /// Reads the next frame.
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    /// Releases any resources held by the source.
    fn close(&mut self);
}
