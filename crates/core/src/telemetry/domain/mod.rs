pub mod telemetry_sink;
