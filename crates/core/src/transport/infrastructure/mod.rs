pub mod json_lines_transport;
pub mod recording_transport;
