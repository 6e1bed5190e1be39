use std::collections::BTreeMap;

use serde::Serialize;

use super::identity::IdentityId;

/// One person in the statistics breakdown.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecordedPerson {
    pub id: IdentityId,
    pub label: String,
    pub age: i32,
}

/// Read-only snapshot of the recorded population.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgeStatistics {
    pub population: usize,
    pub mean_age: Option<f64>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    /// Recorded age → number of people, ascending by age.
    pub histogram: BTreeMap<i32, usize>,
    pub people: Vec<RecordedPerson>,
}

/// Keeps one finalized age per identity plus the multiset of all of them.
///
/// Small moves of an already recorded age are ignored; larger ones replace
/// the previous value rather than adding a second entry.
#[derive(Debug)]
pub struct AgeRecorder {
    recorded: BTreeMap<IdentityId, i32>,
    ages: Vec<i32>,
    change_threshold: i32,
}

impl AgeRecorder {
    pub fn new(change_threshold: i32) -> Self {
        Self {
            recorded: BTreeMap::new(),
            ages: Vec::new(),
            change_threshold,
        }
    }

    /// Records `age` for `id`. Returns whether the stored value changed.
    pub fn record(&mut self, id: IdentityId, age: i32) -> bool {
        if let Some(&previous) = self.recorded.get(&id) {
            if (previous - age).abs() <= self.change_threshold {
                return false;
            }
            if let Some(pos) = self.ages.iter().position(|&a| a == previous) {
                self.ages.remove(pos);
            }
        }
        self.recorded.insert(id, age);
        self.ages.push(age);
        log::debug!("Recorded age {age} for {id}");
        true
    }

    pub fn recorded_age(&self, id: IdentityId) -> Option<i32> {
        self.recorded.get(&id).copied()
    }

    /// Every recorded age, in recording order.
    pub fn ages(&self) -> &[i32] {
        &self.ages
    }

    pub fn population(&self) -> usize {
        self.recorded.len()
    }

    pub fn mean_age(&self) -> Option<f64> {
        if self.ages.is_empty() {
            return None;
        }
        let sum: i64 = self.ages.iter().map(|&a| a as i64).sum();
        Some(sum as f64 / self.ages.len() as f64)
    }

    pub fn min_age(&self) -> Option<i32> {
        self.ages.iter().copied().min()
    }

    pub fn max_age(&self) -> Option<i32> {
        self.ages.iter().copied().max()
    }

    pub fn histogram(&self) -> BTreeMap<i32, usize> {
        let mut counts = BTreeMap::new();
        for &age in &self.ages {
            *counts.entry(age).or_insert(0) += 1;
        }
        counts
    }

    pub fn statistics(&self) -> AgeStatistics {
        AgeStatistics {
            population: self.population(),
            mean_age: self.mean_age(),
            min_age: self.min_age(),
            max_age: self.max_age(),
            histogram: self.histogram(),
            people: self
                .recorded
                .iter()
                .map(|(&id, &age)| RecordedPerson {
                    id,
                    label: id.label(),
                    age,
                })
                .collect(),
        }
    }

    pub fn clear(&mut self) {
        self.recorded.clear();
        self.ages.clear();
    }
}
