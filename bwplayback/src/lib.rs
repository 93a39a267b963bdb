//! # bwplayback - Playback session state machine
//!
//! Transport logic behind the player bar: which track is loaded, whether
//! it is playing, pausing and resuming, seeking, and the auto-advance
//! that follows the end of a stream. Sound output goes through the
//! [`AudioBackend`] trait so the session can be driven headless.

pub mod backend;
pub mod error;
pub mod session;

pub use backend::{AudioBackend, BackendOp, NullBackend};
pub use error::{Error, Result};
pub use session::{fraction_from_pointer, PlayReporter, PlaybackSession, PlaybackState};
