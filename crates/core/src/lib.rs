//! Face age tracking: per-identity smoothing of noisy age and gender
//! estimates over a frame stream, plus aggregate age statistics.

pub mod analysis;
pub mod capture;
pub mod pipeline;
pub mod shared;
pub mod tracking;
