//! # Playback Module
//!
//! Turn a run of notes into timed tone events and sound them on a synthesis backend.
//!
//! ## Purpose
//! Playback happens in two steps:
//! 1. **Scheduling** - every note gets an absolute start time, a duration in
//!    seconds and an amplitude envelope, laid back to back from the backend's
//!    current time
//! 2. **Registration** - every non-rest event is handed to the backend, which
//!    performs the timed execution on its own clock
//!
//! ## Sub-modules
//! - `types` - Schedule, ToneEvent, PlaybackState and handle types
//! - `envelope` - Four-point linear envelope
//! - `engine` - Schedule building
//! - `backend` - The `SynthBackend` trait and the in-memory `RecordingBackend`
//! - `player` - Session state machine (`Idle`, `Playing`, `Stopped`)
//! - `cpal_backend` - Real audio output (`audio` feature)
//!
//! ## Key Types
//! - [`Schedule`] - Every event of one session plus the tempo and start time
//! - [`ToneEvent`] - One note or rest with frequency, timing and envelope
//! - [`Player`] - Owns the backend and the tones registered in the current session
//!
//! ## Example
//! ```rust
//! use jianpu::playback::{Player, RecordingBackend};
//! use jianpu::Score;
//!
//! let mut score = Score::new("Twinkle");
//! score.add_notes_from_numeric("1 1 5 5 6 6 5");
//!
//! let mut player = Player::new(|| Ok(RecordingBackend::starting_at(2.0)));
//! let schedule = player.start_playing(score.all_notes(), 120)?;
//!
//! assert_eq!(schedule.events[0].start_time, 2.0);
//! assert_eq!(schedule.events.len(), 7);
//! assert_eq!(schedule.end_time(), 5.5);
//! # Ok::<(), jianpu::JianpuError>(())
//! ```
//!
//! ## Timing
//!
//! A quarter note lasts `60 / tempo` seconds. Half and whole notes are two and
//! four times that, an eighth is half of it, and a dot multiplies by 1.5.
//! Events never overlap and never leave gaps: each starts where the previous
//! one ended. Rests occupy their slot but produce no sound.
//!
//! ## Stopping
//!
//! [`Player::stop_playing`] silences every tone the session registered, and
//! may be called at any time, any number of times. Starting a new session
//! while one is playing stops the old one first. A [`StopHandle`] taken from
//! the player lets another thread cut a long registration short.

mod types;
mod envelope;
mod engine;
mod backend;
mod player;
#[cfg(feature = "audio")]
mod cpal_backend;

#[cfg(test)]
mod tests;

pub use types::*;
pub use envelope::{Envelope, EnvelopePoint};
pub use engine::build_schedule;
pub use backend::{BackendError, RecordedTone, RecordingBackend, SynthBackend};
pub use player::{Player, StopHandle};
#[cfg(feature = "audio")]
pub use cpal_backend::CpalBackend;
