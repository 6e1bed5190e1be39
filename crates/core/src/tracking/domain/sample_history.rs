use std::collections::VecDeque;

/// Fixed-capacity sample buffer: appending past capacity drops the oldest.
#[derive(Clone, Debug)]
pub struct SampleHistory<T> {
    samples: VecDeque<T>,
    capacity: usize,
}

impl<T> SampleHistory<T> {
    /// # Panics
    /// If `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be at least 1");
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: T) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.samples.iter()
    }

    /// The newest `n` samples (all of them if fewer), oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &T> + '_ {
        self.samples.iter().skip(self.samples.len().saturating_sub(n))
    }
}
