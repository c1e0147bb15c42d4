//! Score mutation API.
//!
//! Every edit is synchronous and mutates the score tree in place. New notes
//! go to the current bar, which is the last bar of the first voice; new bars
//! go to the first voice.

use crate::error::JianpuError;
use crate::ids::{IdAllocator, NoteId};
use crate::numeric::NumericParser;
use crate::score::*;
use log::debug;

/// Partial update for a note; `None` fields are left unchanged
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NoteUpdate {
    pub pitch: Option<NoteName>,
    pub duration: Option<Duration>,
    pub octave: Option<Octave>,
    pub dotted: Option<bool>,
    /// `Some(None)` clears the accidental.
    pub accidental: Option<Option<Accidental>>,
    pub is_rest: Option<bool>,
}

impl NoteUpdate {
    fn apply(&self, note: &mut Note) {
        if let Some(pitch) = self.pitch {
            note.pitch = pitch;
        }
        if let Some(duration) = self.duration {
            note.duration = duration;
        }
        if let Some(octave) = self.octave {
            note.octave = octave;
        }
        if let Some(dotted) = self.dotted {
            note.dotted = dotted;
        }
        if let Some(accidental) = self.accidental {
            note.accidental = accidental;
        }
        if let Some(is_rest) = self.is_rest {
            note.is_rest = is_rest;
        }
    }
}

impl Score {
    /// Creates a score with one treble voice holding one empty bar,
    /// at 120 BPM in C major and 4/4.
    pub fn new(title: impl Into<String>) -> Self {
        let mut ids = IdAllocator::new();
        let default_time_signature = TimeSignature::default();
        let bar = Bar {
            id: ids.mint_bar(),
            notes: Vec::new(),
            time_signature: default_time_signature,
        };
        let voice = Voice {
            id: ids.mint_voice(),
            name: "Melody".to_string(),
            clef: Clef::Treble,
            bars: vec![bar],
        };

        Self {
            title: title.into(),
            composer: None,
            tempo: 120,
            key_signature: KeySignature::C,
            default_time_signature,
            voices: vec![voice],
            ids,
        }
    }

    /// The voice edits go to (the first voice).
    pub fn current_voice(&self) -> &Voice {
        &self.voices[0]
    }

    /// The bar new notes are appended to (the last bar of the current voice).
    pub fn current_bar(&self) -> &Bar {
        let bars = &self.current_voice().bars;
        &bars[bars.len() - 1]
    }

    fn current_bar_mut(&mut self) -> &mut Bar {
        let bars = &mut self.voices[0].bars;
        let last = bars.len() - 1;
        &mut bars[last]
    }

    /// All notes of every voice, voice by voice and bar by bar.
    pub fn all_notes(&self) -> impl Iterator<Item = &Note> + '_ {
        self.voices
            .iter()
            .flat_map(|voice| voice.bars.iter())
            .flat_map(|bar| bar.notes.iter())
    }

    pub fn find_note(&self, id: NoteId) -> Option<&Note> {
        self.all_notes().find(|note| note.id == id)
    }

    fn find_note_mut(&mut self, id: NoteId) -> Option<&mut Note> {
        self.voices
            .iter_mut()
            .flat_map(|voice| voice.bars.iter_mut())
            .flat_map(|bar| bar.notes.iter_mut())
            .find(|note| note.id == id)
    }

    /// Appends a note to the current bar and returns it.
    pub fn add_note(
        &mut self,
        pitch: NoteName,
        duration: Duration,
        octave: Octave,
        options: NoteOptions,
    ) -> &Note {
        let note = Note {
            id: self.ids.mint_note(),
            pitch,
            octave,
            duration,
            dotted: options.dotted,
            accidental: options.accidental,
            is_rest: options.is_rest,
        };
        let bar = self.current_bar_mut();
        bar.notes.push(note);
        &bar.notes[bar.notes.len() - 1]
    }

    /// Applies a partial update to the note with the given id.
    pub fn update_note(&mut self, id: NoteId, update: NoteUpdate) -> Result<&Note, JianpuError> {
        let note = self
            .find_note_mut(id)
            .ok_or(JianpuError::NoteNotFound(id))?;
        update.apply(note);
        Ok(note)
    }

    /// Removes the note with the given id from whichever bar holds it.
    /// The id is not handed out again.
    pub fn remove_note(&mut self, id: NoteId) -> Result<Note, JianpuError> {
        for bar in self.voices.iter_mut().flat_map(|voice| voice.bars.iter_mut()) {
            if let Some(index) = bar.notes.iter().position(|note| note.id == id) {
                return Ok(bar.notes.remove(index));
            }
        }
        Err(JianpuError::NoteNotFound(id))
    }

    /// Appends an empty bar in the default time signature to the current voice.
    pub fn add_bar(&mut self) -> &Bar {
        let bar = Bar {
            id: self.ids.mint_bar(),
            notes: Vec::new(),
            time_signature: self.default_time_signature,
        };
        let bars = &mut self.voices[0].bars;
        bars.push(bar);
        &bars[bars.len() - 1]
    }

    /// Appends a voice holding one empty bar.
    pub fn add_voice(&mut self, name: impl Into<String>, clef: Clef) -> &Voice {
        let bar = Bar {
            id: self.ids.mint_bar(),
            notes: Vec::new(),
            time_signature: self.default_time_signature,
        };
        let voice = Voice {
            id: self.ids.mint_voice(),
            name: name.into(),
            clef,
            bars: vec![bar],
        };
        self.voices.push(voice);
        &self.voices[self.voices.len() - 1]
    }

    pub fn update_tempo(&mut self, bpm: u16) -> Result<(), JianpuError> {
        if bpm == 0 {
            return Err(JianpuError::InvalidTempo(bpm));
        }
        self.tempo = bpm;
        Ok(())
    }

    pub fn update_key_signature(&mut self, key: KeySignature) {
        self.key_signature = key;
    }

    /// Parses numeric shorthand and appends each note to the current bar as an
    /// undotted quarter note. Returns the ids of the new notes, in order.
    pub fn add_notes_from_numeric(&mut self, input: &str) -> Vec<NoteId> {
        self.add_notes_from_numeric_at(input, Octave::MIDDLE)
    }

    /// Same as [`Score::add_notes_from_numeric`] with a different base octave
    /// for unmarked digits.
    pub fn add_notes_from_numeric_at(&mut self, input: &str, base_octave: Octave) -> Vec<NoteId> {
        let parsed: Vec<_> = NumericParser::new(input)
            .with_base_octave(base_octave)
            .collect();
        debug!("numeric input {:?} produced {} notes", input, parsed.len());

        parsed
            .into_iter()
            .map(|n| {
                let options = NoteOptions {
                    dotted: false,
                    accidental: n.accidental,
                    is_rest: n.is_rest,
                };
                self.add_note(n.pitch, Duration::Quarter, n.octave, options).id
            })
            .collect()
    }
}
