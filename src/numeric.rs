//! # Numeric Notation Parser
//!
//! Turns numeric shorthand (jianpu) into notes, one note per digit.
//!
//! ## Grammar
//! Each note is read left to right as:
//!
//! ```text
//! [octave marker] [accidental marker] digit
//!
//! octave marker     +  one octave up        -  one octave down
//! accidental marker #  sharp                b  flat
//! digit             1-7  C D E F G A B
//!                   8 9  C D, one octave above the marked octave
//!                   0    rest
//! ```
//!
//! - The default base octave is 4 (middle C).
//! - Octaves are clamped to 2..=6 after the 8/9 adjustment.
//! - A rest is always C4 with no accidental, whatever modifiers preceded it.
//! - Anything else is skipped. The character after a consumed modifier is
//!   always consumed in the same cycle, so `##1` is a natural C (the second
//!   `#` is skipped) and `+x1` is C4.
//! - A modifier at the end of the input produces nothing.
//!
//! Parsing never fails.
//!
//! ## Example
//! ```rust
//! use jianpu::numeric::parse;
//! use jianpu::{Accidental, NoteName};
//!
//! let notes = parse("1 +#4 0 9");
//!
//! assert_eq!(notes.len(), 4);
//! assert_eq!(notes[1].pitch, NoteName::F);
//! assert_eq!(notes[1].octave.value(), 5);
//! assert_eq!(notes[1].accidental, Some(Accidental::Sharp));
//! assert!(notes[2].is_rest);
//! assert_eq!(notes[3].octave.value(), 5); // 9 = D one octave up
//! ```

use crate::score::{Accidental, NoteName, Octave};
use log::trace;
use serde::Serialize;
use std::iter::Peekable;
use std::str::Chars;

/// One note read from shorthand, before it is given an id and a duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericNote {
    pub pitch: NoteName,
    pub octave: Octave,
    pub accidental: Option<Accidental>,
    pub is_rest: bool,
}

impl NumericNote {
    fn rest() -> Self {
        Self {
            pitch: NoteName::C,
            octave: Octave::MIDDLE,
            accidental: None,
            is_rest: true,
        }
    }
}

/// Parse shorthand with the default base octave.
pub fn parse(input: &str) -> Vec<NumericNote> {
    NumericParser::new(input).collect()
}

/// Maps a digit to its pitch, and whether it names the upper octave.
fn digit_pitch(c: char) -> Option<(NoteName, bool)> {
    match c {
        '1' => Some((NoteName::C, false)),
        '2' => Some((NoteName::D, false)),
        '3' => Some((NoteName::E, false)),
        '4' => Some((NoteName::F, false)),
        '5' => Some((NoteName::G, false)),
        '6' => Some((NoteName::A, false)),
        '7' => Some((NoteName::B, false)),
        '8' => Some((NoteName::C, true)),
        '9' => Some((NoteName::D, true)),
        _ => None,
    }
}

/// Single-pass scanner over shorthand input, yielding one [`NumericNote`] per digit
pub struct NumericParser<'a> {
    chars: Peekable<Chars<'a>>,
    base_octave: Octave,
    position: usize,
}

impl<'a> NumericParser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            base_octave: Octave::MIDDLE,
            position: 0,
        }
    }

    /// Use a different octave for unmarked digits.
    pub fn with_base_octave(mut self, octave: Octave) -> Self {
        self.base_octave = octave;
        self
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.position += 1;
        Some(c)
    }

    /// Reads one note cycle. Returns `None` at end of input, `Some(None)` when
    /// the cycle consumed input without producing a note.
    fn next_cycle(&mut self) -> Option<Option<NumericNote>> {
        let mut c = self.advance()?;
        let mut octave = self.base_octave.value() as i32;

        match c {
            '+' => {
                octave += 1;
                c = self.advance()?;
            }
            '-' => {
                octave -= 1;
                c = self.advance()?;
            }
            _ => {}
        }

        let mut accidental = None;
        match c {
            '#' => {
                accidental = Some(Accidental::Sharp);
                c = self.advance()?;
            }
            'b' => {
                accidental = Some(Accidental::Flat);
                c = self.advance()?;
            }
            _ => {}
        }

        if c == '0' {
            return Some(Some(NumericNote::rest()));
        }

        match digit_pitch(c) {
            Some((pitch, upper)) => {
                let octave = if upper { octave + 1 } else { octave };
                Some(Some(NumericNote {
                    pitch,
                    octave: Octave::clamped(octave),
                    accidental,
                    is_rest: false,
                }))
            }
            None => {
                trace!("skipping {:?} at position {}", c, self.position);
                Some(None)
            }
        }
    }
}

impl<'a> Iterator for NumericParser<'a> {
    type Item = NumericNote;

    fn next(&mut self) -> Option<Self::Item> {
        while self.chars.peek().is_some() {
            if let Some(note) = self.next_cycle()? {
                return Some(note);
            }
        }
        None
    }
}
