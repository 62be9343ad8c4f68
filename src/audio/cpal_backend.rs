use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream};
use tracing::{error, info, warn};

use crate::audio::AudioBackend;
use crate::runtime::RenderHost;
use crate::synth::SynthError;

fn audio_error(e: impl std::fmt::Display) -> SynthError {
    SynthError::Audio(e.to_string())
}

/// Output device stream that pulls interleaved f32 blocks from a [`RenderHost`].
///
/// The host is moved into the audio callback on [`AudioBackend::start`]; from
/// then on it is only touched by the audio thread.
pub struct CpalBackend {
    stream: Option<Stream>,
    host: Option<RenderHost>,
}

impl CpalBackend {
    pub fn new(host: RenderHost) -> Self {
        Self {
            stream: None,
            host: Some(host),
        }
    }

    fn select_output_device(&self, host: &cpal::Host) -> Result<cpal::Device, SynthError> {
        if cfg!(target_os = "linux") {
            self.select_linux_output_device(host)
        } else {
            host.default_output_device()
                .ok_or_else(|| audio_error("No output device available"))
        }
    }

    fn select_linux_output_device(&self, host: &cpal::Host) -> Result<cpal::Device, SynthError> {
        let mut device_names = Vec::new();

        for device in host.devices().map_err(audio_error)? {
            let name = device.name().unwrap_or_default();
            if name.to_lowercase().starts_with("default:")
                || name.to_lowercase().contains("pipewire")
            {
                device_names.push(name);
            }
        }

        if device_names.is_empty() {
            return host
                .default_output_device()
                .ok_or_else(|| audio_error("No output device available"));
        }

        println!("Available output devices:");
        for (i, name) in device_names.iter().enumerate() {
            println!("{}. {}", i + 1, name);
        }

        println!("Select device (default 1): ");
        let mut choice = String::new();
        std::io::stdin()
            .read_line(&mut choice)
            .map_err(audio_error)?;
        let choice = choice
            .trim()
            .parse::<usize>()
            .unwrap_or(1)
            .saturating_sub(1);

        let selected_name = device_names
            .get(choice)
            .ok_or_else(|| audio_error("Invalid device selection"))?;

        host.devices()
            .map_err(audio_error)?
            .find(|d| d.name().map(|n| n == *selected_name).unwrap_or(false))
            .ok_or_else(|| audio_error("Selected output device not found"))
    }

    fn build_stream(&mut self) -> Result<Stream, SynthError> {
        let mut render_host = self
            .host
            .take()
            .ok_or_else(|| audio_error("Render host already moved into a stream"))?;

        let host = cpal::default_host();
        let device = self.select_output_device(&host)?;
        info!("Selected device: {}", device.name().unwrap_or_default());

        let supported_config = device.default_output_config().map_err(audio_error)?;
        let mut stream_config: cpal::StreamConfig = supported_config.clone().into();
        stream_config.buffer_size = cpal::BufferSize::Fixed(256);

        let sample_rate = stream_config.sample_rate.0 as f32;
        let channels = stream_config.channels as usize;
        info!("Output stream: {} Hz, {} channel(s)", sample_rate, channels);

        let stream = match supported_config.sample_format() {
            SampleFormat::F32 => device
                .build_output_stream(
                    &stream_config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        render_host.process(data, channels, sample_rate);
                    },
                    |err| error!("Stream error: {}", err),
                    None,
                )
                .map_err(audio_error)?,
            other => return Err(audio_error(format!("Unsupported sample format: {other:?}"))),
        };

        Ok(stream)
    }
}

impl AudioBackend for CpalBackend {
    fn start(&mut self) -> Result<(), SynthError> {
        let stream = self.build_stream()?;
        stream.play().map_err(audio_error)?;
        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = &self.stream {
            if let Err(e) = stream.pause() {
                warn!("Failed to stop stream: {}", e);
            }
        }
    }
}
