use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::HeapRb;
use tracing::{debug, error, info, warn};

use crate::domain::audio::CAPTURE_SAMPLE_RATE;
use crate::domain::{AudioBuffer, DomainError};

type RingProducer = ringbuf::HeapProd<i16>;

fn device_error(context: &str, e: impl std::fmt::Display) -> DomainError {
    DomainError::Capture(format!("{}: {}", context, e))
}

/// Fixed-window microphone capture with cpal.
///
/// Audio is downmixed to mono and resampled to 16 kHz inside the stream
/// callback, then drained from a lock-free ring buffer once the window ends.
pub struct CpalRecorder {
    device_name: Option<String>,
}

impl CpalRecorder {
    /// Record from the named input device, or the system default.
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }

    /// Capture `duration` of audio. Blocks for the whole window.
    pub fn record(&self, duration: Duration) -> Result<AudioBuffer, DomainError> {
        let device = get_device(self.device_name.as_deref())?;
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let supported = device
            .default_input_config()
            .map_err(|e| device_error("Failed to get default config", e))?;
        let sample_format = supported.sample_format();
        let config = StreamConfig {
            channels: supported.channels(),
            sample_rate: supported.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };

        debug!(
            sample_rate = config.sample_rate.0,
            channels = config.channels,
            format = ?sample_format,
            "Input device config"
        );

        // One extra second of headroom for callback jitter.
        let capacity = ((duration.as_secs_f32() + 1.0) * CAPTURE_SAMPLE_RATE as f32) as usize;
        let (producer, mut consumer) = HeapRb::<i16>::new(capacity).split();
        let failed = Arc::new(AtomicBool::new(false));

        let stream = build_stream(&device, &config, sample_format, producer, Arc::clone(&failed))?;
        stream
            .play()
            .map_err(|e| device_error("Failed to start stream", e))?;

        info!(device = %device_name, secs = duration.as_secs_f32(), "Listening");
        thread::sleep(duration);
        drop(stream);

        if failed.load(Ordering::SeqCst) {
            return Err(DomainError::Capture(
                "Error with microphone or recording".to_string(),
            ));
        }

        let mut samples = vec![0i16; consumer.occupied_len()];
        let read = consumer.pop_slice(&mut samples);
        samples.truncate(read);

        info!(samples = samples.len(), "Capture finished");
        Ok(AudioBuffer::from_samples(samples))
    }
}

fn get_device(selected: Option<&str>) -> Result<Device, DomainError> {
    let host = cpal::default_host();

    if let Some(name) = selected {
        let devices = host
            .input_devices()
            .map_err(|e| device_error("Failed to enumerate devices", e))?;
        for device in devices {
            if device.name().is_ok_and(|n| n == name) {
                return Ok(device);
            }
        }
        warn!(device = %name, "Selected device not found, falling back to default");
    }

    host.default_input_device()
        .ok_or_else(|| DomainError::Capture("No default input device available".to_string()))
}

fn build_stream(
    device: &Device,
    config: &StreamConfig,
    sample_format: SampleFormat,
    mut producer: RingProducer,
    failed: Arc<AtomicBool>,
) -> Result<Stream, DomainError> {
    let channels = config.channels as usize;
    let device_rate = config.sample_rate.0;
    let on_error = move |err: cpal::StreamError| {
        error!(?err, "Audio stream error");
        failed.store(true, Ordering::SeqCst);
    };

    let stream = match sample_format {
        SampleFormat::I16 => device.build_input_stream(
            config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                let mono = downmix(data, channels);
                let _ = producer.push_slice(&resample(&mono, device_rate, CAPTURE_SAMPLE_RATE));
            },
            on_error,
            None,
        ),
        SampleFormat::F32 => device.build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let converted: Vec<i16> = data
                    .iter()
                    .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
                    .collect();
                let mono = downmix(&converted, channels);
                let _ = producer.push_slice(&resample(&mono, device_rate, CAPTURE_SAMPLE_RATE));
            },
            on_error,
            None,
        ),
        other => {
            return Err(DomainError::Capture(format!(
                "Unsupported sample format: {:?}",
                other
            )));
        }
    };

    stream.map_err(|e| device_error("Failed to build stream", e))
}

/// Average interleaved channels into mono.
fn downmix(data: &[i16], channels: usize) -> Vec<i16> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels)
        .map(|chunk| {
            let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
            (sum / chunk.len() as i32) as i16
        })
        .collect()
}

/// Linear-interpolation resampler.
fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let idx = pos.floor() as usize;
            let frac = pos.fract();
            match (samples.get(idx), samples.get(idx + 1)) {
                (Some(&s0), Some(&s1)) => (s0 as f64 + (s1 as f64 - s0 as f64) * frac) as i16,
                (Some(&s0), None) => s0,
                _ => 0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_stereo() {
        assert_eq!(downmix(&[100, 300, -50, 50], 2), vec![200, 0]);
        assert_eq!(downmix(&[1, 2, 3], 1), vec![1, 2, 3]);
    }

    #[test]
    fn test_resample_halves_length() {
        let input: Vec<i16> = (0..32).map(|i| i * 10).collect();
        let output = resample(&input, 32_000, 16_000);
        assert_eq!(output.len(), 16);
        assert_eq!(output[0], 0);
        assert_eq!(output[1], 20);
    }

    #[test]
    fn test_resample_same_rate_is_identity() {
        let input = vec![5i16, -5, 7];
        assert_eq!(resample(&input, 16_000, 16_000), input);
    }
}
