//! Closed-loop pan-tilt-zoom control for face tracking.
//!
//! A [`session::tracker_session::TrackerSession`] turns one detector result
//! per frame into camera commands: the error is shaped, regulated and mapped
//! to transport units, and a recovery state machine recalls a preset or
//! zooms out when the face stays lost.

pub mod control;
pub mod error;
pub mod recovery;
pub mod session;
pub mod shared;
pub mod telemetry;
pub mod transport;
