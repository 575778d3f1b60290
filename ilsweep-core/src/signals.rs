mod tone;

use std::path::Path;

pub use tone::Tone;

use crate::{Error, WavWriteError};

pub trait FiniteSignal: Send + Sync + ExactSizeIterator<Item = i16> {}

impl<T> FiniteSignal for T where T: Send + Sync + ExactSizeIterator<Item = i16> {}

pub fn write_signal_to_file(
    signal: Box<dyn FiniteSignal<Item = i16>>,
    path: &Path,
) -> Result<(), Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: crate::DEFAULT_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(map_hound_error)?;

    for s in signal {
        writer.write_sample(s).map_err(map_hound_error)?;
    }

    writer.finalize().map_err(map_hound_error)?;

    Ok(())
}

fn map_hound_error(err: hound::Error) -> WavWriteError {
    match err {
        hound::Error::IoError(error) => WavWriteError::Io(error),
        _ => WavWriteError::Other,
    }
}
