//! Numeric-notation (jianpu) score entry and playback.
//!
//! Melodies typed as digit shorthand (`1 2 3 0 +5 -6 #4`) become notes in a
//! [`Score`], and [`playback::Player`] sounds them back to back on a synthesis
//! backend.

pub mod config;
pub mod editor;
pub mod error;
pub mod ids;
pub mod numeric;
pub mod pitch;
pub mod playback;
pub mod score;

pub use config::{EnvelopeConfig, OutputConfig, PlayerConfig};
pub use editor::NoteUpdate;
pub use error::JianpuError;
pub use ids::{BarId, IdAllocator, NoteId, VoiceId};
pub use numeric::{parse as parse_numeric, NumericNote, NumericParser};
pub use score::*;
