pub mod actuator_command;
pub mod actuator_mapper;
pub mod error_shaper;
pub mod regulator;
