//! Synthesis backends.
//!
//! A backend owns the clock and performs timed execution on its own: the
//! player only registers tones at absolute times and asks for them to stop.

use super::types::{GainHandle, ScheduledTone, ToneEvent, ToneHandle};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("no audio output available: {0}")]
    Unavailable(String),

    /// The tone was stopped already, or finished on its own.
    #[error("tone {0} has already stopped")]
    AlreadyStopped(ToneHandle),

    #[error("unknown tone {0}")]
    UnknownTone(ToneHandle),

    #[error("audio stream error: {0}")]
    Stream(String),
}

/// Something that can sound scheduled tones
pub trait SynthBackend {
    /// Current time on the synthesis clock, in seconds.
    fn current_time(&self) -> f64;

    /// Register a tone to start at `event.start_time` and stop at its end,
    /// shaped by `event.envelope`.
    fn schedule_tone(&mut self, event: &ToneEvent) -> Result<ScheduledTone, BackendError>;

    /// Silence a registered tone now.
    fn stop_tone(&mut self, tone: &ScheduledTone) -> Result<(), BackendError>;
}

/// A tone as seen by [`RecordingBackend`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedTone {
    pub handle: ToneHandle,
    pub event: ToneEvent,
    /// Clock time of an explicit stop, if one happened.
    pub stopped_at: Option<f64>,
}

impl RecordedTone {
    /// Whether the tone is sounding at clock time `t`.
    pub fn is_sounding_at(&self, t: f64) -> bool {
        let end = match self.stopped_at {
            Some(stopped) => stopped.min(self.event.end_time()),
            None => self.event.end_time(),
        };
        t >= self.event.start_time && t < end
    }
}

/// In-memory backend with a manually driven clock
///
/// Records every registration and stop instead of making sound. Stopping a
/// tone that was already stopped, or whose end time the clock has passed,
/// fails with [`BackendError::AlreadyStopped`], like a real oscillator would.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    clock: f64,
    next_handle: u64,
    tones: Vec<RecordedTone>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the clock at `time` seconds.
    pub fn starting_at(time: f64) -> Self {
        Self {
            clock: time,
            ..Self::default()
        }
    }

    pub fn advance(&mut self, seconds: f64) {
        self.clock += seconds;
    }

    pub fn set_time(&mut self, time: f64) {
        self.clock = time;
    }

    pub fn tones(&self) -> &[RecordedTone] {
        &self.tones
    }

    pub fn tone(&self, handle: ToneHandle) -> Option<&RecordedTone> {
        self.tones.iter().find(|t| t.handle == handle)
    }

    /// Tones sounding at clock time `t`.
    pub fn sounding_at(&self, t: f64) -> impl Iterator<Item = &RecordedTone> + '_ {
        self.tones.iter().filter(move |tone| tone.is_sounding_at(t))
    }
}

impl SynthBackend for RecordingBackend {
    fn current_time(&self) -> f64 {
        self.clock
    }

    fn schedule_tone(&mut self, event: &ToneEvent) -> Result<ScheduledTone, BackendError> {
        let handle = ToneHandle(self.next_handle);
        self.next_handle += 1;
        self.tones.push(RecordedTone {
            handle,
            event: event.clone(),
            stopped_at: None,
        });
        Ok(ScheduledTone {
            tone: handle,
            gain: GainHandle(handle.0),
            duration: event.duration,
        })
    }

    fn stop_tone(&mut self, tone: &ScheduledTone) -> Result<(), BackendError> {
        let clock = self.clock;
        let recorded = self
            .tones
            .iter_mut()
            .find(|t| t.handle == tone.tone)
            .ok_or(BackendError::UnknownTone(tone.tone))?;

        if recorded.stopped_at.is_some() || clock >= recorded.event.end_time() {
            return Err(BackendError::AlreadyStopped(tone.tone));
        }
        recorded.stopped_at = Some(clock);
        Ok(())
    }
}
