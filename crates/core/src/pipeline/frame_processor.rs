use serde::Serialize;

use crate::analysis::domain::face_analyzer::{FaceAnalyzer, FaceDetection};
use crate::analysis::domain::gender::Gender;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::config::{ConfigError, TrackerConfig};
use crate::shared::constants::MAX_RAW_AGE;
use crate::shared::frame::Frame;
use crate::tracking::domain::age_recorder::AgeRecorder;
use crate::tracking::domain::face_matcher::FaceMatcher;
use crate::tracking::domain::identity::IdentityId;
use crate::tracking::domain::stability_estimator::StabilityEstimator;
use crate::tracking::domain::tracking_store::TrackingStore;

/// One face ready for display.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnnotatedFace {
    pub bbox: BoundingBox,
    pub age: i32,
    pub gender: Gender,
    pub sample_count: usize,
    pub required_samples: usize,
    pub is_stable: bool,
    pub identity_id: IdentityId,
}

impl AnnotatedFace {
    /// e.g. `STABLE (15/15)` or `LEARNING (4/15)`.
    pub fn status_label(&self) -> String {
        let status = if self.is_stable { "STABLE" } else { "LEARNING" };
        format!("{status} ({}/{})", self.sample_count, self.required_samples)
    }
}

/// Per-frame orchestration: cadence, analysis, matching, smoothing.
///
/// Owns all session tracking state (identities, recorded ages, frame
/// counter) so a reset clears them together.
pub struct FrameProcessor {
    config: TrackerConfig,
    store: TrackingStore,
    recorder: AgeRecorder,
    matcher: FaceMatcher,
    estimator: StabilityEstimator,
    frame_count: usize,
}

impl FrameProcessor {
    /// Fails if `config` does not pass [`TrackerConfig::validate`].
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            store: TrackingStore::new(config.smoothing_window, config.confidence_threshold),
            recorder: AgeRecorder::new(config.record_change_threshold),
            matcher: FaceMatcher::new(config.distance_threshold, config.max_stale_frames),
            estimator: StabilityEstimator::new(
                config.age_change_threshold,
                config.recent_window,
                config.gender_override_count,
            ),
            frame_count: 0,
            config,
        })
    }

    /// Counts the frame and, on every Nth one, analyzes and tracks it.
    ///
    /// Skipped frames and failed analyses return an empty list and leave
    /// tracking state untouched.
    pub fn process(&mut self, frame: &Frame, analyzer: &mut dyn FaceAnalyzer) -> Vec<AnnotatedFace> {
        self.frame_count += 1;
        if self.frame_count % self.config.process_every_n_frames != 0 {
            return Vec::new();
        }

        let detections = match analyzer.analyze(frame) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("Face analysis failed on frame {}: {e}", frame.index());
                return Vec::new();
            }
        };

        let removed = self
            .store
            .prune_stale(self.frame_count, self.config.max_stale_frames);
        if !removed.is_empty() {
            log::debug!("Expired {} identities", removed.len());
        }

        detections
            .iter()
            .filter_map(|d| self.track(d))
            .collect()
    }

    fn track(&mut self, detection: &FaceDetection) -> Option<AnnotatedFace> {
        if !(0.0..=MAX_RAW_AGE).contains(&detection.age) {
            log::warn!("Skipping detection with invalid age {}", detection.age);
            return None;
        }
        let Some(age) = (detection.age.trunc() as i32).checked_add(self.config.age_offset) else {
            log::warn!(
                "Skipping detection: age {} with offset {} is out of range",
                detection.age,
                self.config.age_offset
            );
            return None;
        };
        let gender = Gender::from_code(detection.gender_code);
        let center = detection.bbox.center();

        let id = match self
            .matcher
            .match_identity(center, &self.store, self.frame_count)
        {
            Some(id) => id,
            None => {
                let id = self.store.create(center, self.frame_count);
                log::debug!("New identity {id} at ({:.0}, {:.0})", center.x, center.y);
                id
            }
        };

        let identity = self.store.get_mut(id)?;
        identity.observe(age, gender, center, self.frame_count);
        let estimate = self.estimator.estimate(identity, &mut self.recorder)?;

        Some(AnnotatedFace {
            bbox: detection.bbox,
            age: estimate.age,
            gender: estimate.gender,
            sample_count: identity.sample_count(),
            required_samples: identity.confidence_threshold(),
            is_stable: estimate.is_stable,
            identity_id: id,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn store(&self) -> &TrackingStore {
        &self.store
    }

    pub fn recorder(&self) -> &AgeRecorder {
        &self.recorder
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Clears identities, recorded ages and the frame counter.
    pub fn reset(&mut self) {
        self.store.clear();
        self.recorder.clear();
        self.frame_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::VecDeque;

    /// Returns queued responses in order, then nothing. Counts calls.
    struct ScriptedAnalyzer {
        responses: VecDeque<Result<Vec<FaceDetection>, String>>,
        calls: usize,
    }

    impl ScriptedAnalyzer {
        fn new() -> Self {
            Self {
                responses: VecDeque::new(),
                calls: 0,
            }
        }

        fn then(mut self, faces: Vec<FaceDetection>) -> Self {
            self.responses.push_back(Ok(faces));
            self
        }

        fn then_fail(mut self, message: &str) -> Self {
            self.responses.push_back(Err(message.to_string()));
            self
        }
    }

    impl FaceAnalyzer for ScriptedAnalyzer {
        fn analyze(
            &mut self,
            _frame: &Frame,
        ) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>> {
            self.calls += 1;
            match self.responses.pop_front() {
                Some(Ok(faces)) => Ok(faces),
                Some(Err(message)) => Err(message.into()),
                None => Ok(Vec::new()),
            }
        }
    }

    /// Same face every call.
    struct FixedAnalyzer(Vec<FaceDetection>);

    impl FaceAnalyzer for FixedAnalyzer {
        fn analyze(
            &mut self,
            _frame: &Frame,
        ) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>> {
            Ok(self.0.clone())
        }
    }

    fn face(x: i32, age: f64, gender_code: i32) -> FaceDetection {
        FaceDetection {
            bbox: BoundingBox::new(x, 100, x + 80, 200),
            age,
            gender_code,
        }
    }

    fn frame() -> Frame {
        Frame::blank(4, 4, 0)
    }

    /// Config that analyzes every frame, to keep counts readable.
    fn every_frame() -> TrackerConfig {
        TrackerConfig {
            process_every_n_frames: 1,
            ..TrackerConfig::default()
        }
    }

    /// Drives `n` analyzed frames, returning the last frame's output.
    fn run(
        processor: &mut FrameProcessor,
        analyzer: &mut dyn FaceAnalyzer,
        n: usize,
    ) -> Vec<AnnotatedFace> {
        let mut last = Vec::new();
        for _ in 0..n {
            last = processor.process(&frame(), analyzer);
        }
        last
    }

    // ── Cadence ──────────────────────────────────────────────────────

    #[test]
    fn test_only_every_third_frame_is_analyzed() {
        let mut processor = FrameProcessor::new(TrackerConfig::default()).unwrap();
        let mut analyzer = ScriptedAnalyzer::new();

        for i in 1..=9 {
            processor.process(&frame(), &mut analyzer);
            assert_eq!(analyzer.calls, i / 3);
        }
        assert_eq!(processor.frame_count(), 9);
    }

    #[test]
    fn test_skipped_frames_return_nothing() {
        let mut processor = FrameProcessor::new(TrackerConfig::default()).unwrap();
        let mut analyzer = FixedAnalyzer(vec![face(0, 34.0, 1)]);

        assert!(processor.process(&frame(), &mut analyzer).is_empty());
        assert!(processor.process(&frame(), &mut analyzer).is_empty());
        assert_eq!(processor.process(&frame(), &mut analyzer).len(), 1);
    }

    // ── Per-detection mapping ────────────────────────────────────────

    #[test]
    fn test_age_is_calibrated_and_gender_mapped() {
        let mut processor = FrameProcessor::new(every_frame()).unwrap();
        let mut analyzer = ScriptedAnalyzer::new()
            .then(vec![face(0, 34.9, 1)])
            .then(vec![face(500, 50.2, 0)]);

        let first = processor.process(&frame(), &mut analyzer);
        let second = processor.process(&frame(), &mut analyzer);

        assert_eq!(first[0].age, 30);
        assert_eq!(first[0].gender, Gender::Male);
        assert_eq!(second[0].age, 46);
        assert_eq!(second[0].gender, Gender::Female);
    }

    #[test]
    fn test_configured_offset_applies() {
        let config = TrackerConfig {
            age_offset: 0,
            ..every_frame()
        };
        let mut processor = FrameProcessor::new(config).unwrap();
        let out = processor.process(&frame(), &mut FixedAnalyzer(vec![face(0, 34.0, 1)]));
        assert_eq!(out[0].age, 34);
    }

    #[test]
    fn test_result_record_fields() {
        let mut processor = FrameProcessor::new(every_frame()).unwrap();
        let detection = face(10, 40.0, 1);

        let out = processor.process(&frame(), &mut FixedAnalyzer(vec![detection.clone()]));

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].bbox, detection.bbox);
        assert_eq!(out[0].sample_count, 1);
        assert_eq!(out[0].required_samples, 15);
        assert!(!out[0].is_stable);
        assert_eq!(out[0].status_label(), "LEARNING (1/15)");
    }

    #[test]
    fn test_non_finite_age_is_skipped() {
        let mut processor = FrameProcessor::new(every_frame()).unwrap();
        let mut analyzer = FixedAnalyzer(vec![face(0, f64::NAN, 1), face(400, 30.0, 0)]);

        let out = processor.process(&frame(), &mut analyzer);

        assert_eq!(out.len(), 1);
        assert_eq!(processor.store().len(), 1);
    }

    #[rstest]
    #[case::huge_negative(-1e12)]
    #[case::huge_positive(1e12)]
    #[case::negative(-0.5)]
    #[case::past_max(MAX_RAW_AGE + 1.0)]
    fn test_implausible_age_is_skipped(#[case] age: f64) {
        let mut processor = FrameProcessor::new(every_frame()).unwrap();
        let mut analyzer = FixedAnalyzer(vec![face(0, age, 1), face(400, 30.0, 0)]);

        let out = processor.process(&frame(), &mut analyzer);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].age, 26);
        assert_eq!(processor.store().len(), 1);
    }

    #[test]
    fn test_offset_overflow_is_skipped() {
        let config = TrackerConfig {
            age_offset: i32::MAX,
            ..every_frame()
        };
        let mut processor = FrameProcessor::new(config).unwrap();

        let out = processor.process(&frame(), &mut FixedAnalyzer(vec![face(0, 34.0, 1)]));

        assert!(out.is_empty());
        assert!(processor.store().is_empty());
        assert_eq!(processor.recorder().population(), 0);
    }

    #[rstest]
    #[case::zero_cadence(TrackerConfig { process_every_n_frames: 0, ..TrackerConfig::default() })]
    #[case::zero_window(TrackerConfig { smoothing_window: 0, ..TrackerConfig::default() })]
    fn test_invalid_config_is_rejected(#[case] config: TrackerConfig) {
        assert!(matches!(
            FrameProcessor::new(config),
            Err(ConfigError::Invalid(_))
        ));
    }

    // ── Identity association ─────────────────────────────────────────

    #[test]
    fn test_nearby_detection_continues_identity() {
        let mut processor = FrameProcessor::new(every_frame()).unwrap();
        let mut analyzer = ScriptedAnalyzer::new()
            .then(vec![face(0, 30.0, 1)])
            .then(vec![face(40, 30.0, 1)]);

        let a = processor.process(&frame(), &mut analyzer);
        let b = processor.process(&frame(), &mut analyzer);

        assert_eq!(a[0].identity_id, b[0].identity_id);
        assert_eq!(b[0].sample_count, 2);
        assert_eq!(processor.store().len(), 1);
    }

    #[test]
    fn test_distant_detection_creates_identity() {
        let mut processor = FrameProcessor::new(every_frame()).unwrap();
        let mut analyzer = ScriptedAnalyzer::new()
            .then(vec![face(0, 30.0, 1)])
            .then(vec![face(300, 30.0, 1)]);

        let a = processor.process(&frame(), &mut analyzer);
        let b = processor.process(&frame(), &mut analyzer);

        assert_ne!(a[0].identity_id, b[0].identity_id);
        assert_eq!(processor.store().len(), 2);
    }

    #[test]
    fn test_centroid_follows_moving_face() {
        let mut processor = FrameProcessor::new(every_frame()).unwrap();
        let mut analyzer = ScriptedAnalyzer::new()
            .then(vec![face(0, 30.0, 1)])
            .then(vec![face(90, 30.0, 1)])
            .then(vec![face(180, 30.0, 1)]);

        let ids: Vec<IdentityId> = (0..3)
            .map(|_| processor.process(&frame(), &mut analyzer)[0].identity_id)
            .collect();

        // each hop is 90px from the previous position, 180px from the first
        assert!(ids.iter().all(|&id| id == ids[0]));
    }

    #[test]
    fn test_stale_identities_are_pruned_on_processing_frames() {
        let mut processor = FrameProcessor::new(every_frame()).unwrap();
        let mut analyzer = ScriptedAnalyzer::new().then(vec![face(0, 30.0, 1)]);

        run(&mut processor, &mut analyzer, 31);
        assert_eq!(processor.store().len(), 1);

        processor.process(&frame(), &mut analyzer);
        assert!(processor.store().is_empty());
    }

    #[test]
    fn test_returning_face_after_expiry_gets_new_identity() {
        let mut processor = FrameProcessor::new(every_frame()).unwrap();
        let mut analyzer = ScriptedAnalyzer::new().then(vec![face(0, 30.0, 1)]);
        let first = processor.process(&frame(), &mut analyzer)[0].identity_id;

        run(&mut processor, &mut analyzer, 31);
        let mut analyzer = FixedAnalyzer(vec![face(0, 30.0, 1)]);
        let again = processor.process(&frame(), &mut analyzer)[0].identity_id;

        assert_ne!(first, again);
    }

    // ── Stability end to end ─────────────────────────────────────────

    #[test]
    fn test_locks_and_records_after_fifteen_readings() {
        let mut processor = FrameProcessor::new(TrackerConfig::default()).unwrap();
        let mut analyzer = FixedAnalyzer(vec![face(0, 34.0, 1)]);

        // 14 analyzed frames: still learning
        let out = run(&mut processor, &mut analyzer, 42);
        assert!(!out[0].is_stable);
        assert_eq!(processor.recorder().population(), 0);

        run(&mut processor, &mut analyzer, 2);
        let out = processor.process(&frame(), &mut analyzer);

        assert!(out[0].is_stable);
        assert_eq!(out[0].age, 30);
        assert_eq!(out[0].status_label(), "STABLE (15/15)");
        assert_eq!(processor.recorder().ages(), &[30]);
        assert_eq!(processor.recorder().population(), 1);
    }

    #[test]
    fn test_locked_age_steps_instead_of_jumping() {
        let mut processor = FrameProcessor::new(every_frame()).unwrap();

        run(&mut processor, &mut FixedAnalyzer(vec![face(0, 34.0, 1)]), 15);
        let out = run(&mut processor, &mut FixedAnalyzer(vec![face(0, 44.0, 1)]), 10);

        assert_eq!(out[0].age, 31);
        assert_eq!(processor.recorder().ages(), &[30]);
    }

    #[test]
    fn test_recorded_age_survives_identity_expiry() {
        let mut processor = FrameProcessor::new(every_frame()).unwrap();
        run(&mut processor, &mut FixedAnalyzer(vec![face(0, 34.0, 1)]), 15);

        run(&mut processor, &mut FixedAnalyzer(vec![]), 40);

        assert!(processor.store().is_empty());
        assert_eq!(processor.recorder().population(), 1);
    }

    // ── Failures and reset ───────────────────────────────────────────

    #[test]
    fn test_analyzer_failure_leaves_state_untouched() {
        let mut processor = FrameProcessor::new(every_frame()).unwrap();
        let mut analyzer = ScriptedAnalyzer::new()
            .then(vec![face(0, 30.0, 1)])
            .then_fail("model crashed")
            .then(vec![face(0, 30.0, 1)]);

        processor.process(&frame(), &mut analyzer);
        let failed = processor.process(&frame(), &mut analyzer);
        let after = processor.process(&frame(), &mut analyzer);

        assert!(failed.is_empty());
        assert_eq!(processor.store().len(), 1);
        assert_eq!(after[0].sample_count, 2);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut processor = FrameProcessor::new(every_frame()).unwrap();
        run(&mut processor, &mut FixedAnalyzer(vec![face(0, 34.0, 1)]), 15);

        processor.reset();

        assert_eq!(processor.frame_count(), 0);
        assert!(processor.store().is_empty());
        assert_eq!(processor.recorder().population(), 0);
        assert!(processor.recorder().ages().is_empty());

        let out = processor.process(&frame(), &mut FixedAnalyzer(vec![face(0, 34.0, 1)]));
        assert_eq!(out[0].identity_id, IdentityId::new(1));
        assert_eq!(out[0].sample_count, 1);
        assert!(!out[0].is_stable);
    }
}
