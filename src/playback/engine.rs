//! Schedule building
//!
//! Converts an ordered run of notes into back-to-back tone events. The whole
//! schedule is one synchronous computation; nothing here talks to a backend.

use super::envelope::Envelope;
use super::types::{Schedule, ToneEvent};
use crate::config::EnvelopeConfig;
use crate::error::JianpuError;
use crate::score::Note;

/// Build the schedule for `notes` at `tempo`, starting at `start_time` on the
/// backend clock.
///
/// Each event starts where the previous one ended: start times are
/// `t0, t0 + d1, t0 + d1 + d2, ...` with no gaps and no overlap. Rests get an
/// event of their own duration so later notes keep their place.
///
/// # Example
/// ```rust
/// use jianpu::playback::build_schedule;
/// use jianpu::{EnvelopeConfig, Score};
///
/// let mut score = Score::new("Scale");
/// score.add_notes_from_numeric("1 2 3");
///
/// let schedule = build_schedule(score.all_notes(), 120, 10.0, &EnvelopeConfig::default())?;
///
/// assert_eq!(schedule.events.len(), 3);
/// assert_eq!(schedule.events[0].start_time, 10.0);
/// assert_eq!(schedule.events[1].start_time, 10.5);
/// assert_eq!(schedule.end_time(), 11.5);
/// # Ok::<(), jianpu::JianpuError>(())
/// ```
///
/// # Errors
/// Returns [`JianpuError::InvalidTempo`] for a tempo of zero.
pub fn build_schedule<'a, I>(
    notes: I,
    tempo: u16,
    start_time: f64,
    envelope: &EnvelopeConfig,
) -> Result<Schedule, JianpuError>
where
    I: IntoIterator<Item = &'a Note>,
{
    if tempo == 0 {
        return Err(JianpuError::InvalidTempo(tempo));
    }

    let mut cursor = start_time;
    let mut events = Vec::new();

    for note in notes {
        let duration = note.seconds(tempo);
        events.push(ToneEvent {
            note_id: note.id,
            frequency: note.frequency(),
            start_time: cursor,
            duration,
            is_rest: note.is_rest,
            envelope: Envelope::new(duration, envelope),
        });
        cursor += duration;
    }

    Ok(Schedule {
        tempo,
        start_time,
        events,
    })
}
