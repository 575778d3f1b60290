use crate::{Error, SweepParameters};

use std::{slice::Iter, time::Duration};

/// The frequency sequence of a sweep, lowest tone first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepPlan {
    frequencies: Vec<u16>,
    tone_duration: Duration,
    inter_tone_delay: Duration,
}

impl SweepPlan {
    pub fn new(parameters: &SweepParameters) -> Result<Self, Error> {
        if parameters.start_frequency >= parameters.end_frequency {
            return Err(Error::InvalidParameters {
                reason: "start frequency must be lower than end frequency",
            });
        }

        if parameters.step == 0 {
            return Err(Error::InvalidParameters {
                reason: "frequency step must be greater than zero",
            });
        }

        if parameters.tone_duration.is_zero() {
            return Err(Error::InvalidParameters {
                reason: "tone duration must be greater than zero",
            });
        }

        if parameters.inter_tone_delay.is_zero() {
            return Err(Error::InvalidParameters {
                reason: "delay between tones must be greater than zero",
            });
        }

        let frequencies = (parameters.start_frequency..=parameters.end_frequency)
            .step_by(parameters.step as usize)
            .collect();

        Ok(Self {
            frequencies,
            tone_duration: parameters.tone_duration,
            inter_tone_delay: parameters.inter_tone_delay,
        })
    }

    pub fn iter(&self) -> Iter<'_, u16> {
        self.frequencies.iter()
    }

    pub fn frequencies(&self) -> &[u16] {
        &self.frequencies
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn tone_duration(&self) -> Duration {
        self.tone_duration
    }

    pub fn inter_tone_delay(&self) -> Duration {
        self.inter_tone_delay
    }

    /// Length of one tone plus the pause that follows it.
    pub fn slot_duration(&self) -> Duration {
        self.tone_duration + self.inter_tone_delay
    }

    pub fn total_duration(&self) -> Duration {
        self.slot_duration() * self.frequencies.len() as u32
    }
}
