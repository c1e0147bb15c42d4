//! Playback session state machine
//!
//! ```text
//!            start_playing            stop_playing
//!   Idle ─────────────────► Playing ───────────────► Stopped
//!                             ▲  │ start_playing        │
//!                             │  └─ (stops first) ──────┤
//!                             └──────── start_playing ──┘
//! ```

use super::backend::{BackendError, SynthBackend};
use super::engine::build_schedule;
use super::types::{PlaybackState, Schedule, ScheduledTone};
use crate::config::EnvelopeConfig;
use crate::error::JianpuError;
use crate::score::Note;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Connector<B> = Box<dyn FnMut() -> Result<B, BackendError>>;

/// Requests that a running [`Player`] stop registering tones
///
/// Cloneable and `Send`, so another thread can cancel a long schedule. The
/// player checks the flag before registering each note.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives one playback session at a time on a lazily opened backend
///
/// # Example
/// ```rust
/// use jianpu::playback::{PlaybackState, Player, RecordingBackend};
/// use jianpu::Score;
///
/// let mut score = Score::new("Scale");
/// score.add_notes_from_numeric("1 2 3 0 5");
///
/// let mut player = Player::new(|| Ok(RecordingBackend::new()));
/// let schedule = player.start_playing(score.all_notes(), score.tempo())?;
///
/// assert_eq!(player.state(), PlaybackState::Playing);
/// assert_eq!(schedule.events.len(), 5);
/// assert_eq!(player.scheduled().len(), 4); // the rest is not synthesized
///
/// player.stop_playing();
/// player.stop_playing();
/// assert_eq!(player.state(), PlaybackState::Stopped);
/// # Ok::<(), jianpu::JianpuError>(())
/// ```
pub struct Player<B: SynthBackend> {
    connect: Connector<B>,
    backend: Option<B>,
    envelope: EnvelopeConfig,
    state: PlaybackState,
    scheduled: Vec<ScheduledTone>,
    cursor: f64,
    stop_requested: Arc<AtomicBool>,
}

impl<B: SynthBackend> Player<B> {
    /// Creates a player; `connect` opens the backend on first use.
    pub fn new<F>(connect: F) -> Self
    where
        F: FnMut() -> Result<B, BackendError> + 'static,
    {
        Self {
            connect: Box::new(connect),
            backend: None,
            envelope: EnvelopeConfig::default(),
            state: PlaybackState::Idle,
            scheduled: Vec::new(),
            cursor: 0.0,
            stop_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_envelope(mut self, envelope: EnvelopeConfig) -> Self {
        self.envelope = envelope;
        self
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Tones registered by the current session, in schedule order.
    pub fn scheduled(&self) -> &[ScheduledTone] {
        &self.scheduled
    }

    /// End of the current schedule on the backend clock, zero when nothing is scheduled.
    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> Option<&mut B> {
        self.backend.as_mut()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop_requested))
    }

    /// Whether the current session still has sound ahead of the backend clock.
    pub fn is_sounding(&self) -> bool {
        match &self.backend {
            Some(backend) => {
                self.state == PlaybackState::Playing && backend.current_time() < self.cursor
            }
            None => false,
        }
    }

    /// Opens the backend now rather than on the first `start_playing`.
    ///
    /// # Errors
    /// Returns [`JianpuError::BackendUnavailable`] when the backend cannot be opened.
    pub fn connect(&mut self) -> Result<&mut B, JianpuError> {
        let backend = match self.backend.take() {
            Some(backend) => backend,
            None => {
                let backend = (self.connect)()
                    .map_err(|e| JianpuError::BackendUnavailable(e.to_string()))?;
                info!("Synthesis backend opened");
                backend
            }
        };
        Ok(self.backend.insert(backend))
    }

    /// Schedules `notes` back to back at `tempo` and registers every
    /// non-rest tone with the backend.
    ///
    /// A session that is still playing is stopped first, so two sessions
    /// never share the output. Returns once every tone is registered, not
    /// when the audio finishes.
    ///
    /// # Errors
    /// - [`JianpuError::InvalidTempo`] for a tempo of zero
    /// - [`JianpuError::BackendUnavailable`] when no backend can be opened;
    ///   the player state is left unchanged
    pub fn start_playing<'a, I>(&mut self, notes: I, tempo: u16) -> Result<Schedule, JianpuError>
    where
        I: IntoIterator<Item = &'a Note>,
    {
        if self.state == PlaybackState::Playing {
            self.stop_playing();
        }
        if tempo == 0 {
            return Err(JianpuError::InvalidTempo(tempo));
        }

        let start_time = self.connect()?.current_time();
        let schedule = build_schedule(notes, tempo, start_time, &self.envelope)?;

        self.stop_requested.store(false, Ordering::SeqCst);
        self.scheduled.clear();
        self.cursor = schedule.start_time;
        self.state = PlaybackState::Playing;
        info!(
            "Playing {} notes at {} BPM ({:.2}s)",
            schedule.events.len(),
            tempo,
            schedule.total_duration()
        );

        let Some(backend) = self.backend.as_mut() else {
            return Err(JianpuError::BackendUnavailable("backend closed while scheduling".to_string()));
        };

        let mut interrupted = false;
        for event in &schedule.events {
            if self.stop_requested.load(Ordering::SeqCst) {
                interrupted = true;
                break;
            }
            if !event.is_rest {
                match backend.schedule_tone(event) {
                    Ok(tone) => {
                        debug!(
                            "Scheduled note {} at {:.3}s: {:.2} Hz for {:.3}s",
                            event.note_id, event.start_time, event.frequency, event.duration
                        );
                        self.scheduled.push(tone);
                    }
                    Err(e) => warn!("Skipping note {}: {}", event.note_id, e),
                }
            }
            self.cursor = event.end_time();
        }

        if interrupted {
            info!("Stop requested while scheduling; halting after {} tones", self.scheduled.len());
            self.stop_playing();
        }

        Ok(schedule)
    }

    /// Silences every registered tone and clears the session.
    ///
    /// Safe to call at any time, any number of times; tones that already
    /// finished are skipped quietly.
    pub fn stop_playing(&mut self) {
        self.stop_requested.store(true, Ordering::SeqCst);

        if let Some(backend) = self.backend.as_mut() {
            for tone in &self.scheduled {
                if let Err(e) = backend.stop_tone(tone) {
                    debug!("Ignoring stop failure for tone {}: {}", tone.tone, e);
                }
            }
        }
        self.scheduled.clear();
        self.cursor = 0.0;

        if self.state == PlaybackState::Playing {
            info!("Playback stopped");
            self.state = PlaybackState::Stopped;
        }
    }

    /// Stops playback and closes the backend. The next `start_playing`
    /// opens a fresh one.
    pub fn teardown(&mut self) {
        self.stop_playing();
        if self.backend.take().is_some() {
            info!("Synthesis backend closed");
        }
        self.state = PlaybackState::Idle;
    }
}

impl<B: SynthBackend> Drop for Player<B> {
    fn drop(&mut self) {
        self.stop_playing();
    }
}
