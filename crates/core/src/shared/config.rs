use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::constants::{
    AGE_CALIBRATION_OFFSET, AGE_CHANGE_THRESHOLD, CONFIDENCE_THRESHOLD, FACE_DISTANCE_THRESHOLD,
    GENDER_OVERRIDE_COUNT, MAX_STALE_FRAMES, PROCESS_EVERY_N_FRAMES, RECENT_WINDOW,
    RECORD_CHANGE_THRESHOLD, SMOOTHING_WINDOW,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tuning parameters for identity tracking and smoothing.
///
/// Every field has a default, so a config file only needs to name what it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub smoothing_window: usize,
    pub confidence_threshold: usize,
    pub max_stale_frames: usize,
    pub distance_threshold: f64,
    pub age_change_threshold: i32,
    pub recent_window: usize,
    pub gender_override_count: usize,
    pub process_every_n_frames: usize,
    pub age_offset: i32,
    pub record_change_threshold: i32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            smoothing_window: SMOOTHING_WINDOW,
            confidence_threshold: CONFIDENCE_THRESHOLD,
            max_stale_frames: MAX_STALE_FRAMES,
            distance_threshold: FACE_DISTANCE_THRESHOLD,
            age_change_threshold: AGE_CHANGE_THRESHOLD,
            recent_window: RECENT_WINDOW,
            gender_override_count: GENDER_OVERRIDE_COUNT,
            process_every_n_frames: PROCESS_EVERY_N_FRAMES,
            age_offset: AGE_CALIBRATION_OFFSET,
            record_change_threshold: RECORD_CHANGE_THRESHOLD,
        }
    }
}

impl TrackerConfig {
    /// Reads a JSON config file and validates it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.smoothing_window == 0 {
            return Err(ConfigError::Invalid(
                "smoothing_window must be at least 1".into(),
            ));
        }
        if self.confidence_threshold == 0 || self.confidence_threshold > self.smoothing_window {
            return Err(ConfigError::Invalid(format!(
                "confidence_threshold must be between 1 and smoothing_window ({}), got {}",
                self.smoothing_window, self.confidence_threshold
            )));
        }
        if self.recent_window == 0 || self.recent_window > self.smoothing_window {
            return Err(ConfigError::Invalid(format!(
                "recent_window must be between 1 and smoothing_window ({}), got {}",
                self.smoothing_window, self.recent_window
            )));
        }
        if self.gender_override_count > self.recent_window {
            return Err(ConfigError::Invalid(format!(
                "gender_override_count ({}) cannot exceed recent_window ({})",
                self.gender_override_count, self.recent_window
            )));
        }
        if self.process_every_n_frames == 0 {
            return Err(ConfigError::Invalid(
                "process_every_n_frames must be at least 1".into(),
            ));
        }
        if !(self.distance_threshold.is_finite() && self.distance_threshold > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "distance_threshold must be a positive number, got {}",
                self.distance_threshold
            )));
        }
        if self.age_change_threshold < 0 || self.record_change_threshold < 0 {
            return Err(ConfigError::Invalid(
                "change thresholds must not be negative".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_tuned_constants() {
        let c = TrackerConfig::default();
        assert_eq!(c.smoothing_window, 20);
        assert_eq!(c.confidence_threshold, 15);
        assert_eq!(c.max_stale_frames, 30);
        assert_relative_eq!(c.distance_threshold, 100.0);
        assert_eq!(c.age_change_threshold, 3);
        assert_eq!(c.recent_window, 10);
        assert_eq!(c.gender_override_count, 7);
        assert_eq!(c.process_every_n_frames, 3);
        assert_eq!(c.age_offset, -4);
        assert_eq!(c.record_change_threshold, 2);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file_keeps_other_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tracker.json");
        fs::write(&path, r#"{ "age_offset": 0, "distance_threshold": 80.0 }"#).unwrap();

        let c = TrackerConfig::load(&path).unwrap();

        assert_eq!(c.age_offset, 0);
        assert_relative_eq!(c.distance_threshold, 80.0);
        assert_eq!(c.confidence_threshold, 15);
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let err = TrackerConfig::load(&tmp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_malformed_file_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let err = TrackerConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("invalid.json");
        fs::write(&path, r#"{ "process_every_n_frames": 0 }"#).unwrap();
        let err = TrackerConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    fn with(f: impl FnOnce(&mut TrackerConfig)) -> TrackerConfig {
        let mut c = TrackerConfig::default();
        f(&mut c);
        c
    }

    #[rstest]
    #[case::zero_window(with(|c| c.smoothing_window = 0))]
    #[case::threshold_above_window(with(|c| c.confidence_threshold = 21))]
    #[case::zero_threshold(with(|c| c.confidence_threshold = 0))]
    #[case::recent_above_window(with(|c| c.recent_window = 25))]
    #[case::override_above_recent(with(|c| c.gender_override_count = 11))]
    #[case::negative_distance(with(|c| c.distance_threshold = -1.0))]
    #[case::nan_distance(with(|c| c.distance_threshold = f64::NAN))]
    #[case::negative_change(with(|c| c.age_change_threshold = -1))]
    fn test_validate_rejects(#[case] config: TrackerConfig) {
        assert!(config.validate().is_err());
    }
}
