use serde::Serialize;

use crate::analysis::domain::gender::Gender;
use crate::shared::bounding_box::Point;

use super::sample_history::SampleHistory;

/// Session-local identity token. Ids increase in creation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct IdentityId(u64);

impl IdentityId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Human-facing name used in reports.
    pub fn label(&self) -> String {
        format!("Person {}", self.0)
    }
}

impl std::fmt::Display for IdentityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "face_{}", self.0)
    }
}

/// Locked output of an identity. Age and gender lock together.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StableLock {
    pub age: i32,
    pub gender: Gender,
}

/// A face followed across frames by spatial proximity.
#[derive(Clone, Debug)]
pub struct Identity {
    id: IdentityId,
    center: Point,
    last_seen_frame: usize,
    age_samples: SampleHistory<i32>,
    gender_samples: SampleHistory<Gender>,
    lock: Option<StableLock>,
    confidence_threshold: usize,
}

impl Identity {
    pub fn new(
        id: IdentityId,
        center: Point,
        frame: usize,
        window: usize,
        confidence_threshold: usize,
    ) -> Self {
        Self {
            id,
            center,
            last_seen_frame: frame,
            age_samples: SampleHistory::new(window),
            gender_samples: SampleHistory::new(window),
            lock: None,
            confidence_threshold,
        }
    }

    /// Appends one reading and moves the identity to where it was seen.
    pub fn observe(&mut self, age: i32, gender: Gender, center: Point, frame: usize) {
        self.age_samples.push(age);
        self.gender_samples.push(gender);
        self.center = center;
        self.last_seen_frame = frame;
    }

    /// Stale once more than `max_stale_frames` have passed since last match.
    pub fn is_stale(&self, current_frame: usize, max_stale_frames: usize) -> bool {
        current_frame.saturating_sub(self.last_seen_frame) > max_stale_frames
    }

    pub fn id(&self) -> IdentityId {
        self.id
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn last_seen_frame(&self) -> usize {
        self.last_seen_frame
    }

    pub fn age_samples(&self) -> &SampleHistory<i32> {
        &self.age_samples
    }

    pub fn gender_samples(&self) -> &SampleHistory<Gender> {
        &self.gender_samples
    }

    pub fn sample_count(&self) -> usize {
        self.age_samples.len()
    }

    pub fn confidence_threshold(&self) -> usize {
        self.confidence_threshold
    }

    pub fn lock(&self) -> Option<StableLock> {
        self.lock
    }

    pub fn stable_age(&self) -> Option<i32> {
        self.lock.map(|l| l.age)
    }

    pub fn stable_gender(&self) -> Option<Gender> {
        self.lock.map(|l| l.gender)
    }

    pub fn is_stable(&self) -> bool {
        self.lock.is_some()
    }

    pub(crate) fn set_lock(&mut self, lock: StableLock) {
        self.lock = Some(lock);
    }
}
