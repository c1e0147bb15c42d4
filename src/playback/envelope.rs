//! Linear-ramp amplitude envelope.
//!
//! Four breakpoints, times relative to the tone start:
//!
//! ```text
//! gain
//! peak    /\
//!        /  \
//! sustain     \__
//!      /          \__
//! 0   +---+-------+------+
//!     0  attack  decay   duration
//! ```
//!
//! With the default shape the tone ramps from silence to 0.5 over 10 ms,
//! down to 0.3 at 30% of the note, and back to silence at the note end.

use crate::config::EnvelopeConfig;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnvelopePoint {
    pub time: f64,
    pub gain: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Envelope {
    points: [EnvelopePoint; 4],
}

impl Envelope {
    /// Builds the envelope for a tone of `duration` seconds.
    ///
    /// The attack end is capped at the note end, and the decay breakpoint is
    /// kept between the attack end and the note end so breakpoint times never
    /// go backwards on very short notes.
    pub fn new(duration: f64, config: &EnvelopeConfig) -> Self {
        let duration = duration.max(0.0);
        let attack_end = config.attack.min(duration);
        let decay_end = (duration * config.decay_fraction).clamp(attack_end, duration);

        Self {
            points: [
                EnvelopePoint { time: 0.0, gain: 0.0 },
                EnvelopePoint { time: attack_end, gain: config.peak },
                EnvelopePoint { time: decay_end, gain: config.sustain },
                EnvelopePoint { time: duration, gain: 0.0 },
            ],
        }
    }

    pub fn points(&self) -> &[EnvelopePoint] {
        &self.points
    }

    /// Gain at `t` seconds after the tone start.
    pub fn gain_at(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return self.points[0].gain;
        }
        for pair in self.points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.time {
                let span = b.time - a.time;
                if span <= 0.0 {
                    return b.gain;
                }
                return a.gain + (b.gain - a.gain) * (t - a.time) / span;
            }
        }
        self.points[self.points.len() - 1].gain
    }
}
