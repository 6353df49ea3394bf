pub mod ptz_transport;
