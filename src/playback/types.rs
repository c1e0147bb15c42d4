//! Playback type definitions
//!
//! This module defines the schedule handed to a synthesis backend and the
//! bookkeeping the player keeps for every tone it registers.

use super::envelope::Envelope;
use crate::ids::NoteId;
use serde::Serialize;
use std::fmt;

/// Playback session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Stopped,
}

/// One timed event in a schedule
///
/// # Fields
/// - `note_id`: The note this event was built from (for highlighting)
/// - `frequency`: Sounding frequency in Hz
/// - `start_time`: Absolute start on the backend clock, in seconds
/// - `duration`: Sounding length in seconds
/// - `is_rest`: Rests keep their slot in time but are never sent to the backend
/// - `envelope`: Amplitude breakpoints, relative to `start_time`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToneEvent {
    pub note_id: NoteId,
    pub frequency: f64,
    pub start_time: f64,
    pub duration: f64,
    pub is_rest: bool,
    pub envelope: Envelope,
}

impl ToneEvent {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

/// A full schedule, built up front before anything is registered
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub tempo: u16,
    pub start_time: f64,
    pub events: Vec<ToneEvent>,
}

impl Schedule {
    /// Where the cursor stands after the last event.
    pub fn end_time(&self) -> f64 {
        self.events
            .last()
            .map(ToneEvent::end_time)
            .unwrap_or(self.start_time)
    }

    pub fn total_duration(&self) -> f64 {
        self.end_time() - self.start_time
    }
}

/// Backend handle for a running oscillator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ToneHandle(pub u64);

/// Backend handle for the gain stage shaping a tone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GainHandle(pub u64);

impl fmt::Display for ToneHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the player keeps for each tone it registered with the backend
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTone {
    pub tone: ToneHandle,
    pub gain: GainHandle,
    pub duration: f64,
}
