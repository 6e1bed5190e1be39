pub mod analyzer_loader;
pub mod replay_face_analyzer;
