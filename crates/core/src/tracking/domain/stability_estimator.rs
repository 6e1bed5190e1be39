use crate::analysis::domain::gender::Gender;

use super::age_recorder::AgeRecorder;
use super::identity::{Identity, StableLock};

/// Smoothed output for one identity on one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Estimate {
    pub age: i32,
    pub gender: Gender,
    pub is_stable: bool,
}

/// Turns an identity's noisy sample history into a steady age and gender.
///
/// Before `confidence_threshold` samples the output simply follows the
/// window statistics ("learning"). After that the first values lock, and a
/// locked age moves at most one year per update, only when both the full
/// window and the recent window have drifted past `age_change_threshold`.
/// A locked gender flips only on a supermajority of recent samples.
pub struct StabilityEstimator {
    age_change_threshold: i32,
    recent_window: usize,
    gender_override_count: usize,
}

impl StabilityEstimator {
    pub fn new(age_change_threshold: i32, recent_window: usize, gender_override_count: usize) -> Self {
        Self {
            age_change_threshold,
            recent_window,
            gender_override_count,
        }
    }

    /// Updates the identity's lock and returns what to display.
    ///
    /// Newly locked or moved ages are passed to `recorder`.
    pub fn estimate(&self, identity: &mut Identity, recorder: &mut AgeRecorder) -> Option<Estimate> {
        if identity.age_samples().is_empty() {
            return None;
        }

        let current_age = median(identity.age_samples().iter().copied())?;
        let (current_gender, _) = dominant_gender(identity.gender_samples().iter().copied())?;

        if identity.sample_count() < identity.confidence_threshold() {
            return Some(Estimate {
                age: current_age,
                gender: current_gender,
                is_stable: false,
            });
        }

        let lock = match identity.lock() {
            None => {
                let lock = StableLock {
                    age: current_age,
                    gender: current_gender,
                };
                identity.set_lock(lock);
                recorder.record(identity.id(), lock.age);
                log::debug!(
                    "{} locked at age {} ({})",
                    identity.id(),
                    lock.age,
                    lock.gender
                );
                lock
            }
            Some(previous) => {
                let mut lock = previous;
                if (current_age - lock.age).abs() > self.age_change_threshold {
                    lock.age = self.step_age(identity, lock.age);
                }
                if current_gender != lock.gender {
                    lock.gender = self.override_gender(identity, lock.gender);
                }
                if lock != previous {
                    identity.set_lock(lock);
                    if lock.age != previous.age {
                        recorder.record(identity.id(), lock.age);
                    }
                }
                lock
            }
        };

        Some(Estimate {
            age: lock.age,
            gender: lock.gender,
            is_stable: true,
        })
    }

    /// One year toward the recent median, if the recent window agrees the
    /// age has drifted. Never overshoots the recent median.
    fn step_age(&self, identity: &Identity, stable_age: i32) -> i32 {
        let Some(recent) = median(identity.age_samples().recent(self.recent_window).copied())
        else {
            return stable_age;
        };
        if (recent - stable_age).abs() <= self.age_change_threshold {
            return stable_age;
        }
        if recent > stable_age {
            (stable_age + 1).min(recent)
        } else {
            (stable_age - 1).max(recent)
        }
    }

    fn override_gender(&self, identity: &Identity, stable_gender: Gender) -> Gender {
        match dominant_gender(identity.gender_samples().recent(self.recent_window).copied()) {
            Some((gender, count))
                if gender != stable_gender && count >= self.gender_override_count =>
            {
                gender
            }
            _ => stable_gender,
        }
    }
}

/// Median truncated toward zero; the midpoint of the two middle values for
/// even counts.
pub fn median(values: impl Iterator<Item = i32>) -> Option<i32> {
    let mut sorted: Vec<i32> = values.collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        let midpoint = (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0;
        Some(midpoint.trunc() as i32)
    }
}

/// Most frequent gender with its count. Ties go to the first observed.
pub fn dominant_gender(values: impl Iterator<Item = Gender>) -> Option<(Gender, usize)> {
    let mut counts: Vec<(Gender, usize)> = Vec::with_capacity(2);
    for gender in values {
        match counts.iter_mut().find(|(g, _)| *g == gender) {
            Some((_, n)) => *n += 1,
            None => counts.push((gender, 1)),
        }
    }
    let mut best: Option<(Gender, usize)> = None;
    for (gender, count) in counts {
        if best.map_or(true, |(_, n)| count > n) {
            best = Some((gender, count));
        }
    }
    best
}
