//! # Score Model
//!
//! This module defines the data model shared by the numeric parser and the
//! playback scheduler.
//!
//! ## Type Hierarchy
//! ```text
//! Score
//!   ├── title, composer
//!   ├── tempo (BPM), key_signature, default_time_signature
//!   ├── IdAllocator (private, mints note/bar/voice ids)
//!   └── Vec<Voice>
//!         ├── name, clef (rendering only)
//!         └── Vec<Bar>
//!               ├── time_signature
//!               └── Vec<Note>
//!                     ├── pitch: NoteName (C-B)
//!                     ├── octave: Octave (2..=6, 4 holds middle C)
//!                     ├── duration: Duration (whole, half, quarter, eighth)
//!                     ├── dotted: bool
//!                     ├── accidental: Option<Accidental>
//!                     └── is_rest: bool
//! ```
//!
//! The tree is strict: a score owns its voices, a voice owns its bars and a
//! bar owns its notes. Nothing points back up.
//!
//! ## Key Concepts
//!
//! ### Sounding values are pure
//! - Frequency depends only on (pitch, octave, accidental), see [`crate::pitch`]
//! - Seconds depend only on (duration, dotted, tempo)
//! - Example: dotted whole note at 60 BPM = `1.0 * 4 * 1.5 = 6.0` seconds
//!
//! ### Octave range
//! - [`Octave`] can only hold 2 through 6; building any other value fails
//!   with [`JianpuError::InvalidNote`], so a note never reaches the
//!   scheduler with a pitch it cannot resolve
//!
//! ## Related Modules
//! - `editor` - The mutation API on [`Score`]
//! - `numeric` - Builds notes from numeric shorthand
//! - `playback` - Turns notes into timed tone events

use crate::error::JianpuError;
use crate::ids::{BarId, IdAllocator, NoteId, VoiceId};
use crate::pitch;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Note names C through B
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum NoteName {
    #[default]
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl NoteName {
    pub const ALL: [NoteName; 7] = [
        NoteName::C,
        NoteName::D,
        NoteName::E,
        NoteName::F,
        NoteName::G,
        NoteName::A,
        NoteName::B,
    ];

    /// Position of the letter within the octave, C = 0 through B = 6.
    pub fn index(self) -> i32 {
        match self {
            NoteName::C => 0,
            NoteName::D => 1,
            NoteName::E => 2,
            NoteName::F => 3,
            NoteName::G => 4,
            NoteName::A => 5,
            NoteName::B => 6,
        }
    }

    /// Semitones above C within the same octave.
    pub fn semitone(self) -> i32 {
        match self {
            NoteName::C => 0,
            NoteName::D => 2,
            NoteName::E => 4,
            NoteName::F => 5,
            NoteName::G => 7,
            NoteName::A => 9,
            NoteName::B => 11,
        }
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for NoteName {
    type Err = JianpuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "C" => Ok(NoteName::C),
            "D" => Ok(NoteName::D),
            "E" => Ok(NoteName::E),
            "F" => Ok(NoteName::F),
            "G" => Ok(NoteName::G),
            "A" => Ok(NoteName::A),
            "B" => Ok(NoteName::B),
            other => Err(JianpuError::InvalidNote(format!("unknown pitch '{}'", other))),
        }
    }
}

/// Accidentals that alter the sounding pitch by one semitone (or cancel it)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Accidental {
    Sharp,   // #
    Flat,    // b
    Natural, // explicit natural sign, sounds unaltered
}

/// Octave number, 4 being the octave that contains middle C
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Octave(u8);

impl Octave {
    pub const MIN: u8 = 2;
    pub const MAX: u8 = 6;
    pub const MIDDLE: Octave = Octave(4);

    pub fn new(value: u8) -> Result<Self, JianpuError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(JianpuError::InvalidNote(format!(
                "octave {} is outside {}..={}",
                value,
                Self::MIN,
                Self::MAX
            )))
        }
    }

    /// Clamps any octave number into the supported range.
    pub fn clamped(value: i32) -> Self {
        Self(value.clamp(Self::MIN as i32, Self::MAX as i32) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Octave {
    fn default() -> Self {
        Self::MIDDLE
    }
}

impl TryFrom<u8> for Octave {
    type Error = JianpuError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Octave::new(value)
    }
}

/// Note duration, as a symbolic class rather than a raw fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Duration {
    Whole,   // "1"
    Half,    // "1/2"
    #[default]
    Quarter, // "1/4"
    Eighth,  // "1/8"
}

impl Duration {
    /// Length in beats, where a quarter note gets the beat.
    pub fn beats(self) -> f64 {
        match self {
            Duration::Whole => 4.0,
            Duration::Half => 2.0,
            Duration::Quarter => 1.0,
            Duration::Eighth => 0.5,
        }
    }

    /// Sounding length in seconds at the given tempo.
    ///
    /// `beat = 60 / tempo`; a dotted value lasts 1.5 times as long.
    pub fn seconds(self, dotted: bool, tempo: u16) -> f64 {
        let beat_duration = 60.0 / tempo as f64;
        let duration = beat_duration * self.beats();
        if dotted {
            duration * 1.5
        } else {
            duration
        }
    }

    /// The fraction code used by score editors ("1", "1/2", "1/4", "1/8").
    pub fn code(self) -> &'static str {
        match self {
            Duration::Whole => "1",
            Duration::Half => "1/2",
            Duration::Quarter => "1/4",
            Duration::Eighth => "1/8",
        }
    }
}

impl FromStr for Duration {
    type Err = JianpuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" | "whole" => Ok(Duration::Whole),
            "1/2" | "half" => Ok(Duration::Half),
            "1/4" | "quarter" => Ok(Duration::Quarter),
            "1/8" | "eighth" => Ok(Duration::Eighth),
            other => Err(JianpuError::InvalidNote(format!("unknown duration '{}'", other))),
        }
    }
}

/// Time signature (e.g., 4/4, 3/4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeSignature {
    pub numerator: u8,   // beats per bar
    pub denominator: u8, // which note value gets the beat
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }
}

/// Clef, used only when rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Clef {
    #[default]
    Treble,
    Bass,
}

impl FromStr for Clef {
    type Err = JianpuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "treble" => Ok(Clef::Treble),
            "bass" => Ok(Clef::Bass),
            other => Err(JianpuError::InvalidNote(format!("unknown clef '{}'", other))),
        }
    }
}

/// Supported key signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum KeySignature {
    #[default]
    C,
    G,
    D,
    A,
    F,
    Bb,
    Eb,
}

impl KeySignature {
    pub const ALL: [KeySignature; 7] = [
        KeySignature::C,
        KeySignature::G,
        KeySignature::D,
        KeySignature::A,
        KeySignature::F,
        KeySignature::Bb,
        KeySignature::Eb,
    ];

    /// The sharps or flats this key places on the staff, in signature order.
    pub fn accidentals(self) -> &'static [(NoteName, Accidental)] {
        use Accidental::{Flat, Sharp};
        match self {
            KeySignature::C => &[],
            KeySignature::G => &[(NoteName::F, Sharp)],
            KeySignature::D => &[(NoteName::F, Sharp), (NoteName::C, Sharp)],
            KeySignature::A => &[(NoteName::F, Sharp), (NoteName::C, Sharp), (NoteName::G, Sharp)],
            KeySignature::F => &[(NoteName::B, Flat)],
            KeySignature::Bb => &[(NoteName::B, Flat), (NoteName::E, Flat)],
            KeySignature::Eb => &[(NoteName::B, Flat), (NoteName::E, Flat), (NoteName::A, Flat)],
        }
    }

    /// The accidental the key implies for a pitch, if any.
    /// Renderers use this to decide which accidentals to draw; playback ignores it.
    pub fn accidental_for(self, pitch: NoteName) -> Option<Accidental> {
        self.accidentals()
            .iter()
            .find(|(name, _)| *name == pitch)
            .map(|(_, accidental)| *accidental)
    }
}

impl FromStr for KeySignature {
    type Err = JianpuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "C" => Ok(KeySignature::C),
            "G" => Ok(KeySignature::G),
            "D" => Ok(KeySignature::D),
            "A" => Ok(KeySignature::A),
            "F" => Ok(KeySignature::F),
            "Bb" => Ok(KeySignature::Bb),
            "Eb" => Ok(KeySignature::Eb),
            other => Err(JianpuError::UnknownKeySignature(other.to_string())),
        }
    }
}

/// Optional fields accepted when adding a note
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NoteOptions {
    pub dotted: bool,
    pub accidental: Option<Accidental>,
    pub is_rest: bool,
}

/// A musical note (or rest)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub pitch: NoteName,
    pub octave: Octave,
    pub duration: Duration,
    pub dotted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accidental: Option<Accidental>,
    pub is_rest: bool, // occupies time, never synthesized
}

impl Note {
    /// Sounding frequency in Hz, equal-tempered around A4 = 440 Hz.
    pub fn frequency(&self) -> f64 {
        pitch::frequency(self.pitch, self.octave, self.accidental)
    }

    /// Sounding length in seconds at the given tempo.
    pub fn seconds(&self, tempo: u16) -> f64 {
        self.duration.seconds(self.dotted, tempo)
    }

    /// Vertical staff position used by renderers: letter index plus seven
    /// steps per octave below octave 4.
    pub fn staff_position(&self) -> i32 {
        self.pitch.index() + (4 - self.octave.value() as i32) * 7
    }
}

/// A bar: notes in order plus the time signature they are counted in
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bar {
    pub id: BarId,
    pub notes: Vec<Note>,
    pub time_signature: TimeSignature,
}

/// A named voice made of bars
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Voice {
    pub id: VoiceId,
    pub name: String,
    pub clef: Clef,
    pub bars: Vec<Bar>,
}

/// A complete score
///
/// Construct with [`Score::new`] and edit through the methods in the
/// `editor` module; the voice list, tempo and key stay private so their
/// invariants (at least one voice, tempo > 0) hold.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composer: Option<String>,
    pub(crate) tempo: u16,
    pub(crate) key_signature: KeySignature,
    pub(crate) default_time_signature: TimeSignature,
    pub(crate) voices: Vec<Voice>,
    #[serde(skip)]
    pub(crate) ids: IdAllocator,
}

impl Score {
    /// Tempo in beats per minute (quarter note gets the beat).
    pub fn tempo(&self) -> u16 {
        self.tempo
    }

    pub fn key_signature(&self) -> KeySignature {
        self.key_signature
    }

    pub fn default_time_signature(&self) -> TimeSignature {
        self.default_time_signature
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }
}
