//! # Error Types
//!
//! This module defines the error types for the jianpu crate.
//!
//! Parsing numeric shorthand never produces an error: characters outside the
//! grammar are skipped. Errors come from building notes with invalid values,
//! from editing notes that do not exist, from configuration, and from the
//! synthesis backend.
//!
//! ## Error Types
//! - `InvalidNote` - Out-of-range octave or an unknown pitch/duration code
//! - `InvalidTempo` - A tempo of zero beats per minute
//! - `NoteNotFound` - An edit referenced an id the score does not hold
//! - `UnknownKeySignature` - A key name outside the supported set
//! - `ConfigError` - Invalid YAML player configuration
//! - `BackendUnavailable` - No synthesis backend could be opened
//! - `Io` - Reading a configuration file failed
//!
//! ## Usage
//! ```rust
//! use jianpu::{JianpuError, Score};
//!
//! let mut score = Score::new("Scale");
//! match score.update_tempo(0) {
//!     Err(JianpuError::InvalidTempo(bpm)) => eprintln!("rejected tempo {}", bpm),
//!     Err(e) => eprintln!("Error: {}", e),
//!     Ok(()) => unreachable!(),
//! }
//! ```

use crate::ids::NoteId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JianpuError {
    /// A note could not be constructed.
    ///
    /// # Example
    /// ```
    /// # use jianpu::JianpuError;
    /// let err = JianpuError::InvalidNote("octave 7 is outside 2..=6".to_string());
    /// assert_eq!(err.to_string(), "Invalid note: octave 7 is outside 2..=6");
    /// ```
    #[error("Invalid note: {0}")]
    InvalidNote(String),

    /// Tempo must be a positive number of beats per minute.
    #[error("Invalid tempo: {0} BPM (must be positive)")]
    InvalidTempo(u16),

    /// An edit referenced a note id that is not part of the score.
    ///
    /// # Example
    /// ```
    /// # use jianpu::{JianpuError, NoteId};
    /// let err = JianpuError::NoteNotFound(NoteId(12));
    /// assert_eq!(err.to_string(), "Note 12 not found");
    /// ```
    #[error("Note {0} not found")]
    NoteNotFound(NoteId),

    #[error("Unknown key signature: {0}")]
    UnknownKeySignature(String),

    /// Invalid player configuration.
    ///
    /// Occurs when the YAML configuration is malformed or holds values out of range.
    #[error("Invalid config: {0}")]
    ConfigError(String),

    /// The synthesis backend could not be opened (no output device, stream failure).
    ///
    /// This is the only playback failure reported to callers; failures on
    /// individual tones are recovered inside the player.
    #[error("Synthesis backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
