pub mod age_recorder;
pub mod face_matcher;
pub mod identity;
pub mod sample_history;
pub mod stability_estimator;
pub mod tracking_store;
