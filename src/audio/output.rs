use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info};

use super::SynthesisEngine;
use crate::error::{Error, Result};

/// The process-wide output stream. Dropping it silences everything.
pub struct AudioOutput {
    _stream: cpal::Stream,
    sample_rate: u32,
    channels: usize,
}

impl AudioOutput {
    /// Opens the default output device and returns the stream together with
    /// a synthesis engine feeding it.
    pub fn open_default() -> Result<(Self, SynthesisEngine)> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device".into()))?;
        let config = device
            .default_output_config()
            .map_err(|e| Error::Audio(e.to_string()))?;

        if config.sample_format() != cpal::SampleFormat::F32 {
            return Err(Error::Audio(format!(
                "unsupported sample format {:?}",
                config.sample_format()
            )));
        }

        let stream_config: cpal::StreamConfig = config.into();
        let sample_rate = stream_config.sample_rate;
        let channels = stream_config.channels as usize;

        let (engine, mut mixer) = SynthesisEngine::with_mixer(sample_rate);

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    mixer.process(data, channels);
                },
                |err| error!("audio stream error: {}", err),
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        info!(channels, sample_rate, "audio output started");

        Ok((
            Self {
                _stream: stream,
                sample_rate,
                channels,
            },
            engine,
        ))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }
}
