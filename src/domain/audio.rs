use zeroize::Zeroize;

/// Sample rate expected by the speech recognizer.
pub const CAPTURE_SAMPLE_RATE: u32 = 16_000;

/// Captured microphone audio at [`CAPTURE_SAMPLE_RATE`], zeroed on drop.
/// Audio never touches disk and is cleared from memory after recognition.
#[derive(Debug, Zeroize)]
#[zeroize(drop)]
pub struct AudioBuffer {
    /// PCM samples (16-bit mono).
    samples: Vec<i16>,
}

impl AudioBuffer {
    pub fn from_samples(samples: Vec<i16>) -> Self {
        Self { samples }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples as f32 in [-1, 1], the recognizer's input format.
    pub fn to_f32(&self) -> Vec<f32> {
        self.samples.iter().map(|&s| s as f32 / 32768.0).collect()
    }
}
