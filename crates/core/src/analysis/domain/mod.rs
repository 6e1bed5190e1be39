pub mod face_analyzer;
pub mod gender;
