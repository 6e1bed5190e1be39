pub mod frame_processor;
pub mod session;
pub mod session_observer;
