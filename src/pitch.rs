//! Equal-tempered frequency resolution.
//!
//! `freq = 440 * 2^((semitone + 12 * (octave - 4) - 9) / 12)`, which matches
//! the classic C3..B5 lookup table to the hundredth of a hertz and is defined
//! for every octave a note can hold.

use crate::score::{Accidental, NoteName, Octave};

/// Concert pitch for A4.
pub const CONCERT_A: f64 = 440.0;

/// Frequency ratio between two adjacent semitones.
pub fn semitone_ratio() -> f64 {
    2f64.powf(1.0 / 12.0)
}

/// Frequency of an unaltered pitch.
pub fn natural_frequency(pitch: NoteName, octave: Octave) -> f64 {
    let semitones_from_a4 = pitch.semitone() + 12 * (octave.value() as i32 - 4) - 9;
    CONCERT_A * 2f64.powf(semitones_from_a4 as f64 / 12.0)
}

/// Frequency of a pitch after applying its accidental.
///
/// Sharp raises by one semitone, flat lowers by one, natural and no accidental
/// leave the pitch as is.
pub fn frequency(pitch: NoteName, octave: Octave, accidental: Option<Accidental>) -> f64 {
    let base = natural_frequency(pitch, octave);
    match accidental {
        Some(Accidental::Sharp) => base * semitone_ratio(),
        Some(Accidental::Flat) => base / semitone_ratio(),
        Some(Accidental::Natural) | None => base,
    }
}
