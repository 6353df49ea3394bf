pub mod axes;
pub mod constants;
