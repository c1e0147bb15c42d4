//! Identifiers for notes, bars and voices, and the allocator that mints them.
//!
//! Each [`Score`](crate::Score) owns one [`IdAllocator`], so two scores (or two
//! tests) never share counters. Ids are never reused, even after the entity
//! they named has been removed.

use serde::Serialize;
use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifies a note within one score.
    NoteId
);
id_type!(
    /// Identifies a bar within one score.
    BarId
);
id_type!(
    /// Identifies a voice within one score.
    VoiceId
);

/// Mints monotonically increasing ids, one counter per entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    next_note: u32,
    next_bar: u32,
    next_voice: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    /// Creates an allocator whose first id of every kind is 1.
    pub fn new() -> Self {
        Self {
            next_note: 1,
            next_bar: 1,
            next_voice: 1,
        }
    }

    pub fn mint_note(&mut self) -> NoteId {
        let id = NoteId(self.next_note);
        self.next_note += 1;
        id
    }

    pub fn mint_bar(&mut self) -> BarId {
        let id = BarId(self.next_bar);
        self.next_bar += 1;
        id
    }

    pub fn mint_voice(&mut self) -> VoiceId {
        let id = VoiceId(self.next_voice);
        self.next_voice += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_independent() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.mint_note(), NoteId(1));
        assert_eq!(ids.mint_note(), NoteId(2));
        assert_eq!(ids.mint_bar(), BarId(1));
        assert_eq!(ids.mint_voice(), VoiceId(1));
        assert_eq!(ids.mint_note(), NoteId(3));
    }

    #[test]
    fn test_allocators_do_not_share_state() {
        let mut first = IdAllocator::new();
        let mut second = IdAllocator::new();
        first.mint_note();
        first.mint_note();
        assert_eq!(second.mint_note(), NoteId(1));
    }
}
