mod audio;
mod controller;
mod plan;

pub mod signals;

pub use audio::*;
pub use controller::*;
pub use plan::*;

use thiserror::Error;

use std::{io, time::Duration};

pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Input for a stepped sweep, as entered by the user.
///
/// The values are not checked on construction, [`SweepPlan::new`]
/// re-validates them before any audio is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepParameters {
    pub start_frequency: u16,
    pub end_frequency: u16,
    pub step: u16,
    pub tone_duration: Duration,
    pub inter_tone_delay: Duration,
}

pub fn volume_to_amplitude(volume: f32) -> f32 {
    assert!((0.0..=1.0).contains(&volume));

    // https://www.dr-lex.be/info-stuff/volumecontrols.html
    let a = 0.001;
    let b = 6.908;

    if volume < 0.1 {
        volume * 10.0 * a * f32::exp(0.1 * b)
    } else {
        a * f32::exp(b * volume)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid sweep parameters: {reason}")]
    InvalidParameters { reason: &'static str },
    #[error("tone duration yields an empty sample buffer")]
    InvalidDuration,
    #[error(transparent)]
    AudioBackend(#[from] AudioBackendError),
    #[error("error writing a signal")]
    WavWriteFile(#[from] WavWriteError),
}

#[derive(Error, Debug)]
pub enum WavWriteError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("unknown")]
    Other,
}
