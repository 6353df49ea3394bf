pub mod session_control;
pub mod tick;
pub mod tracker_config;
pub mod tracker_session;
