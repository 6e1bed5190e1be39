/// Samples kept per identity per signal (age, gender).
pub const SMOOTHING_WINDOW: usize = 20;

/// Samples required before an identity's age and gender lock.
pub const CONFIDENCE_THRESHOLD: usize = 15;

/// Frames an identity may go unmatched before it expires.
pub const MAX_STALE_FRAMES: usize = 30;

/// Centroid distance (pixels) under which a detection continues an identity.
pub const FACE_DISTANCE_THRESHOLD: f64 = 100.0;

/// Median drift (years) a locked age tolerates before it starts to move.
pub const AGE_CHANGE_THRESHOLD: i32 = 3;

/// Newest samples consulted when deciding whether a lock should move.
pub const RECENT_WINDOW: usize = 10;

/// Votes among the recent window needed to flip a locked gender.
pub const GENDER_OVERRIDE_COUNT: usize = 7;

/// Run the analyzer on every Nth frame.
pub const PROCESS_EVERY_N_FRAMES: usize = 3;

/// Raw analyzer ages outside `0..=MAX_RAW_AGE` are treated as bad readings.
pub const MAX_RAW_AGE: f64 = 150.0;

/// Bias correction applied to every raw age reading.
pub const AGE_CALIBRATION_OFFSET: i32 = -4;

/// A recorded age is replaced only when the lock moves further than this.
pub const RECORD_CHANGE_THRESHOLD: i32 = 2;

/// Pause between captured frames.
pub const DEFAULT_FRAME_DELAY_MS: u64 = 100;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
