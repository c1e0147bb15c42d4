use super::*;
use crate::config::EnvelopeConfig;
use crate::error::JianpuError;
use crate::score::{Duration, NoteName, NoteOptions, Octave};
use crate::Score;
use float_cmp::approx_eq;
use std::cell::Cell;
use std::rc::Rc;

fn score_from(shorthand: &str) -> Score {
    let mut score = Score::new("Test");
    score.add_notes_from_numeric(shorthand);
    score
}

fn recording_player() -> Player<RecordingBackend> {
    Player::new(|| Ok(RecordingBackend::new()))
}

/// Pulls the stop handle after a fixed number of registered tones
struct InterruptingBackend {
    inner: RecordingBackend,
    stop: Option<StopHandle>,
    after: usize,
}

impl SynthBackend for InterruptingBackend {
    fn current_time(&self) -> f64 {
        self.inner.current_time()
    }

    fn schedule_tone(&mut self, event: &ToneEvent) -> Result<ScheduledTone, BackendError> {
        let tone = self.inner.schedule_tone(event)?;
        if self.inner.tones().len() >= self.after {
            if let Some(stop) = &self.stop {
                stop.stop();
            }
        }
        Ok(tone)
    }

    fn stop_tone(&mut self, tone: &ScheduledTone) -> Result<(), BackendError> {
        self.inner.stop_tone(tone)
    }
}

/// Rejects every other tone
#[derive(Default)]
struct FlakyBackend {
    inner: RecordingBackend,
    calls: usize,
}

impl SynthBackend for FlakyBackend {
    fn current_time(&self) -> f64 {
        self.inner.current_time()
    }

    fn schedule_tone(&mut self, event: &ToneEvent) -> Result<ScheduledTone, BackendError> {
        self.calls += 1;
        if self.calls % 2 == 0 {
            return Err(BackendError::Stream("oscillator limit".to_string()));
        }
        self.inner.schedule_tone(event)
    }

    fn stop_tone(&mut self, tone: &ScheduledTone) -> Result<(), BackendError> {
        self.inner.stop_tone(tone)
    }
}

// ============ Envelope ============

#[test]
fn test_envelope_default_breakpoints() {
    let envelope = Envelope::new(0.5, &EnvelopeConfig::default());
    let points = envelope.points();

    assert_eq!(points.len(), 4);
    assert_eq!(points[0], EnvelopePoint { time: 0.0, gain: 0.0 });
    assert_eq!(points[1], EnvelopePoint { time: 0.01, gain: 0.5 });
    assert_eq!(points[2].gain, 0.3);
    assert!(approx_eq!(f64, points[2].time, 0.15, epsilon = 1e-12));
    assert_eq!(points[3], EnvelopePoint { time: 0.5, gain: 0.0 });
}

#[test]
fn test_envelope_gain_at() {
    let envelope = Envelope::new(1.0, &EnvelopeConfig::default());

    assert_eq!(envelope.gain_at(0.0), 0.0);
    assert!(approx_eq!(f64, envelope.gain_at(0.005), 0.25, epsilon = 1e-9));
    assert!(approx_eq!(f64, envelope.gain_at(0.01), 0.5, epsilon = 1e-9));
    assert!(approx_eq!(f64, envelope.gain_at(0.3), 0.3, epsilon = 1e-9));
    assert!(approx_eq!(f64, envelope.gain_at(0.65), 0.15, epsilon = 1e-9));
    assert_eq!(envelope.gain_at(1.0), 0.0);
    assert_eq!(envelope.gain_at(2.0), 0.0);
}

#[test]
fn test_envelope_times_never_go_backwards() {
    // 5 ms is shorter than the attack, and 30% of it lands before the attack end
    let envelope = Envelope::new(0.005, &EnvelopeConfig::default());
    let points = envelope.points();

    assert!(points.windows(2).all(|pair| pair[0].time <= pair[1].time));
    assert_eq!(points[1].time, 0.005);
    assert_eq!(points[3].time, 0.005);
}

// ============ Schedule ============

#[test]
fn test_schedule_start_times_are_contiguous() {
    let score = score_from("1 2 3 4");
    let schedule = build_schedule(score.all_notes(), 120, 3.0, &EnvelopeConfig::default()).unwrap();

    let starts: Vec<f64> = schedule.events.iter().map(|e| e.start_time).collect();
    assert_eq!(starts, vec![3.0, 3.5, 4.0, 4.5]);
    for pair in schedule.events.windows(2) {
        assert_eq!(pair[0].end_time(), pair[1].start_time);
    }
    assert_eq!(schedule.end_time(), 5.0);
    assert_eq!(schedule.total_duration(), 2.0);
}

#[test]
fn test_schedule_mixed_durations() {
    let mut score = Score::new("Durations");
    let middle = Octave::MIDDLE;
    score.add_note(NoteName::C, Duration::Half, middle, NoteOptions::default());
    score.add_note(
        NoteName::D,
        Duration::Quarter,
        middle,
        NoteOptions {
            dotted: true,
            ..NoteOptions::default()
        },
    );
    score.add_note(NoteName::E, Duration::Eighth, middle, NoteOptions::default());

    let schedule = build_schedule(score.all_notes(), 120, 0.0, &EnvelopeConfig::default()).unwrap();

    // half = 1s, dotted quarter = 0.75s, eighth = 0.25s
    assert_eq!(schedule.events[0].duration, 1.0);
    assert_eq!(schedule.events[1].start_time, 1.0);
    assert_eq!(schedule.events[1].duration, 0.75);
    assert_eq!(schedule.events[2].start_time, 1.75);
    assert_eq!(schedule.events[2].duration, 0.25);
}

#[test]
fn test_schedule_dotted_whole_at_60() {
    let mut score = Score::new("Long");
    score.add_note(
        NoteName::C,
        Duration::Whole,
        Octave::MIDDLE,
        NoteOptions {
            dotted: true,
            ..NoteOptions::default()
        },
    );
    let schedule = build_schedule(score.all_notes(), 60, 0.0, &EnvelopeConfig::default()).unwrap();
    assert_eq!(schedule.events[0].duration, 6.0);
}

#[test]
fn test_schedule_keeps_rest_slot() {
    let score = score_from("1 0 3");
    let schedule = build_schedule(score.all_notes(), 120, 0.0, &EnvelopeConfig::default()).unwrap();

    assert_eq!(schedule.events.len(), 3);
    assert!(schedule.events[1].is_rest);
    assert_eq!(schedule.events[1].duration, 0.5);
    assert_eq!(schedule.events[2].start_time, 1.0);
}

#[test]
fn test_schedule_carries_note_ids_and_frequencies() {
    let score = score_from("6");
    let note = score.all_notes().next().unwrap();
    let schedule = build_schedule(score.all_notes(), 120, 0.0, &EnvelopeConfig::default()).unwrap();

    assert_eq!(schedule.events[0].note_id, note.id);
    assert_eq!(schedule.events[0].frequency, 440.0);
}

#[test]
fn test_schedule_rejects_zero_tempo() {
    let score = score_from("1");
    let result = build_schedule(score.all_notes(), 0, 0.0, &EnvelopeConfig::default());
    assert!(matches!(result, Err(JianpuError::InvalidTempo(0))));
}

#[test]
fn test_schedule_empty_input() {
    let score = Score::new("Empty");
    let schedule = build_schedule(score.all_notes(), 120, 1.5, &EnvelopeConfig::default()).unwrap();
    assert!(schedule.events.is_empty());
    assert_eq!(schedule.end_time(), 1.5);
}

// ============ Player ============

#[test]
fn test_player_registers_only_sounding_notes() {
    let score = score_from("1 0 5 0");
    let mut player = recording_player();
    let schedule = player.start_playing(score.all_notes(), 120).unwrap();

    assert_eq!(schedule.events.len(), 4);
    assert_eq!(player.scheduled().len(), 2);

    let backend = player.backend().unwrap();
    let registered: Vec<f64> = backend.tones().iter().map(|t| t.event.start_time).collect();
    assert_eq!(registered, vec![0.0, 1.0]);
    assert!(backend.tones().iter().all(|t| !t.event.is_rest));
}

#[test]
fn test_player_starts_at_backend_clock() {
    let score = score_from("1 2");
    let mut player = Player::new(|| Ok(RecordingBackend::starting_at(7.25)));
    let schedule = player.start_playing(score.all_notes(), 120).unwrap();

    assert_eq!(schedule.start_time, 7.25);
    assert_eq!(schedule.events[1].start_time, 7.75);
    assert_eq!(player.cursor(), 8.25);
}

#[test]
fn test_player_uses_configured_envelope() {
    let envelope = EnvelopeConfig {
        peak: 0.8,
        ..EnvelopeConfig::default()
    };
    let score = score_from("1");
    let mut player = recording_player().with_envelope(envelope);
    let schedule = player.start_playing(score.all_notes(), 120).unwrap();

    assert_eq!(schedule.events[0].envelope.points()[1].gain, 0.8);
}

#[test]
fn test_stop_is_idempotent() {
    let mut player = recording_player();
    player.stop_playing();
    player.stop_playing();
    assert_eq!(player.state(), PlaybackState::Idle);

    let score = score_from("1 2 3");
    player.start_playing(score.all_notes(), 120).unwrap();
    player.stop_playing();
    player.stop_playing();

    assert_eq!(player.state(), PlaybackState::Stopped);
    assert!(player.scheduled().is_empty());
    assert_eq!(player.cursor(), 0.0);
}

#[test]
fn test_stop_silences_registered_tones() {
    let score = score_from("1 2 3");
    let mut player = recording_player();
    player.start_playing(score.all_notes(), 120).unwrap();

    player.backend_mut().unwrap().set_time(0.6);
    player.stop_playing();

    let backend = player.backend().unwrap();
    // The first tone ended at 0.5 on its own; the others were cut at 0.6
    assert_eq!(backend.tones()[0].stopped_at, None);
    assert_eq!(backend.tones()[1].stopped_at, Some(0.6));
    assert_eq!(backend.tones()[2].stopped_at, Some(0.6));
    assert_eq!(backend.sounding_at(0.6).count(), 0);
    assert_eq!(backend.sounding_at(1.2).count(), 0);
}

#[test]
fn test_play_while_playing_stops_previous_session() {
    let first = score_from("1 2 3 4");
    let second = score_from("5 6");
    let mut player = recording_player();

    player.start_playing(first.all_notes(), 120).unwrap();
    player.backend_mut().unwrap().set_time(0.75);
    let schedule = player.start_playing(second.all_notes(), 120).unwrap();

    assert_eq!(player.state(), PlaybackState::Playing);
    assert_eq!(schedule.start_time, 0.75);
    assert_eq!(player.scheduled().len(), 2);

    let backend = player.backend().unwrap();
    let (old, new) = backend.tones().split_at(4);
    for tone in old {
        assert!(!tone.is_sounding_at(schedule.start_time));
        assert!(!tone.is_sounding_at(1.5));
    }
    assert!(new.iter().all(|tone| tone.stopped_at.is_none()));
    assert_eq!(backend.sounding_at(1.0).count(), 1);
}

#[test]
fn test_stop_handle_halts_scheduling() {
    let score = score_from("1 2 3 4 5 6 7");
    let mut player = Player::new(|| {
        Ok(InterruptingBackend {
            inner: RecordingBackend::new(),
            stop: None,
            after: 3,
        })
    });
    let handle = player.stop_handle();
    player.connect().unwrap();
    player.backend_mut().unwrap().stop = Some(handle.clone());

    let schedule = player.start_playing(score.all_notes(), 120).unwrap();

    // The full schedule is still returned, but registration stopped after 3 tones
    assert_eq!(schedule.events.len(), 7);
    let backend = player.backend().unwrap();
    assert_eq!(backend.inner.tones().len(), 3);
    assert!(backend.inner.tones().iter().all(|t| t.stopped_at.is_some()));
    assert_eq!(player.state(), PlaybackState::Stopped);
    assert!(handle.is_stop_requested());
}

#[test]
fn test_stop_handle_resets_on_next_session() {
    let score = score_from("1 2");
    let mut player = recording_player();
    let handle = player.stop_handle();
    handle.stop();

    player.start_playing(score.all_notes(), 120).unwrap();

    assert!(!handle.is_stop_requested());
    assert_eq!(player.scheduled().len(), 2);
    assert_eq!(player.state(), PlaybackState::Playing);
}

#[test]
fn test_backend_unavailable() {
    let score = score_from("1 2");
    let mut player =
        Player::<RecordingBackend>::new(|| Err(BackendError::Unavailable("no device".to_string())));

    let result = player.start_playing(score.all_notes(), 120);

    assert!(matches!(result, Err(JianpuError::BackendUnavailable(_))));
    assert_eq!(player.state(), PlaybackState::Idle);
    assert!(player.backend().is_none());
    assert!(player.scheduled().is_empty());
}

#[test]
fn test_failed_tones_are_skipped() {
    let score = score_from("1 2 3 4");
    let mut player = Player::new(|| Ok(FlakyBackend::default()));
    let schedule = player.start_playing(score.all_notes(), 120).unwrap();

    assert_eq!(schedule.events.len(), 4);
    assert_eq!(player.scheduled().len(), 2);
    assert_eq!(player.cursor(), 2.0);
    assert_eq!(player.state(), PlaybackState::Playing);
}

#[test]
fn test_zero_tempo_leaves_player_untouched() {
    let score = score_from("1");
    let mut player = recording_player();
    let result = player.start_playing(score.all_notes(), 0);

    assert!(matches!(result, Err(JianpuError::InvalidTempo(0))));
    assert_eq!(player.state(), PlaybackState::Idle);
    assert!(player.backend().is_none());
}

#[test]
fn test_backend_is_opened_once() {
    let opened = Rc::new(Cell::new(0));
    let counter = Rc::clone(&opened);
    let mut player = Player::new(move || {
        counter.set(counter.get() + 1);
        Ok(RecordingBackend::new())
    });
    let score = score_from("1 2");

    player.start_playing(score.all_notes(), 120).unwrap();
    player.start_playing(score.all_notes(), 120).unwrap();
    assert_eq!(opened.get(), 1);

    player.teardown();
    assert!(player.backend().is_none());
    assert_eq!(player.state(), PlaybackState::Idle);

    player.start_playing(score.all_notes(), 120).unwrap();
    assert_eq!(opened.get(), 2);
}

#[test]
fn test_is_sounding_follows_clock() {
    let score = score_from("1 2");
    let mut player = recording_player();
    assert!(!player.is_sounding());

    player.start_playing(score.all_notes(), 120).unwrap();
    assert!(player.is_sounding());

    player.backend_mut().unwrap().advance(1.0);
    assert!(!player.is_sounding());
}

#[test]
fn test_recording_backend_stop_errors() {
    let score = score_from("1");
    let schedule = build_schedule(score.all_notes(), 120, 0.0, &EnvelopeConfig::default()).unwrap();
    let mut backend = RecordingBackend::new();
    let tone = backend.schedule_tone(&schedule.events[0]).unwrap();

    assert!(backend.stop_tone(&tone).is_ok());
    assert_eq!(backend.stop_tone(&tone), Err(BackendError::AlreadyStopped(tone.tone)));

    let stranger = ScheduledTone {
        tone: ToneHandle(99),
        gain: GainHandle(99),
        duration: 0.5,
    };
    assert_eq!(backend.stop_tone(&stranger), Err(BackendError::UnknownTone(ToneHandle(99))));
}

#[test]
fn test_schedule_serializes_camel_case() {
    let score = score_from("1");
    let schedule = build_schedule(score.all_notes(), 120, 0.0, &EnvelopeConfig::default()).unwrap();
    let json = serde_json::to_string(&schedule).unwrap();

    assert!(json.contains("\"startTime\":0.0"));
    assert!(json.contains("\"isRest\":false"));
    assert!(json.contains("\"noteId\":1"));
}
