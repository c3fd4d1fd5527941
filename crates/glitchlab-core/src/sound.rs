//! Pixel-to-audio synthesis used by the Data-as-Sound filter.
//!
//! Each pixel becomes a short burst of three summed sines (one per channel),
//! the stream is roughed up with a lo-fi distortion chain and finally encoded
//! as 8-bit mono WAV. The filter reuses the raw WAV bytes as a texture.

use std::f64::consts::PI;
use std::io::{self, Write};

use rand::{Rng, RngCore};

use crate::pixel::Color;

pub const SAMPLE_RATE: u32 = 44_100;
/// Length of the burst synthesized for every pixel, in seconds.
pub const BURST_SECONDS: f64 = 0.0001;

/// Size of the RIFF/WAVE header written by [`encode_wav`].
pub const WAV_HEADER_LEN: usize = 44;

/// WAVE format tag for mu-law encoded samples.
const FORMAT_MU_LAW: u16 = 7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyRange {
    pub min: f64,
    pub max: f64,
    pub offset: f64,
}

impl FrequencyRange {
    /// Map a unit value onto the range.
    pub fn map(&self, value: f64) -> f64 {
        self.offset + value * (self.max - self.min)
    }
}

pub const RED_RANGE: FrequencyRange = FrequencyRange {
    min: 30.0,
    max: 500.0,
    offset: 60.0,
};
pub const GREEN_RANGE: FrequencyRange = FrequencyRange {
    min: 500.0,
    max: 2000.0,
    offset: 250.0,
};
pub const BLUE_RANGE: FrequencyRange = FrequencyRange {
    min: 2000.0,
    max: 10000.0,
    offset: 1000.0,
};

/// Three sine partials, one per color channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequencies: [f64; 3],
    pub amplitudes: [f64; 3],
}

impl Tone {
    /// Channel values become amplitudes, and are also mapped onto the
    /// per-channel frequency bands.
    pub fn from_color(color: Color) -> Self {
        let unit = [
            color.r as f64 / 255.0,
            color.g as f64 / 255.0,
            color.b as f64 / 255.0,
        ];
        Self {
            frequencies: [
                RED_RANGE.map(unit[0]),
                GREEN_RANGE.map(unit[1]),
                BLUE_RANGE.map(unit[2]),
            ],
            amplitudes: unit,
        }
    }

    fn sample(&self, time: f64) -> f64 {
        let sum: f64 = self
            .frequencies
            .iter()
            .zip(self.amplitudes.iter())
            .map(|(f, a)| a * (2.0 * PI * f * time).sin())
            .sum();
        sum / 3.0
    }
}

/// Samples generated per tone at the given rate and burst length.
pub fn samples_per_tone(sample_rate: u32, duration: f64) -> usize {
    (sample_rate as f64 * duration).floor() as usize
}

/// Render one burst per tone, back to back.
pub fn synthesize(tones: &[Tone], sample_rate: u32, duration: f64) -> Vec<f32> {
    let per_tone = samples_per_tone(sample_rate, duration);
    let mut samples = Vec::with_capacity(tones.len() * per_tone);
    for tone in tones {
        for t in 0..per_tone {
            let time = t as f64 / sample_rate as f64;
            samples.push(tone.sample(time) as f32);
        }
    }
    samples
}

const BIT_DEPTH: i32 = 4;
const HOLD_CHANCE: f32 = 0.1;
const DRIVE: f32 = 2.5;
const NOISE_LEVEL: f32 = 0.15;
const MU: f32 = 255.0;

/// Bitcrush, random sample-and-hold, overdrive, hiss, then mu-law compression.
pub fn distort(samples: &[f32], rng: &mut dyn RngCore) -> Vec<f32> {
    let steps = 2f32.powi(BIT_DEPTH);
    let mut distorted: Vec<f32> = Vec::with_capacity(samples.len());
    for &input in samples {
        let mut sample = (input * steps).round() / steps;
        if rng.random::<f32>() < HOLD_CHANCE {
            if let Some(&previous) = distorted.last() {
                sample = previous;
            }
        }
        sample = (sample * DRIVE).clamp(-1.0, 1.0);
        sample += (rng.random::<f32>() - 0.5) * NOISE_LEVEL;
        sample = sample.signum() * (1.0 + MU * sample.abs()).ln() / (1.0 + MU).ln();
        distorted.push(sample);
    }
    distorted
}

/// Write samples as a mono 8-bit WAV stream.
pub fn encode_wav<W: Write>(writer: &mut W, samples: &[f32], sample_rate: u32) -> io::Result<()> {
    let channels: u16 = 1;
    let bits_per_sample: u16 = 8;
    let block_align = channels * bits_per_sample / 8;
    let byte_rate = sample_rate * block_align as u32;
    let data_len = samples.len() as u32 * block_align as u32;

    writer.write_all(b"RIFF")?;
    writer.write_all(&(36 + data_len).to_le_bytes())?;
    writer.write_all(b"WAVE")?;
    writer.write_all(b"fmt ")?;
    writer.write_all(&16u32.to_le_bytes())?;
    writer.write_all(&FORMAT_MU_LAW.to_le_bytes())?;
    writer.write_all(&channels.to_le_bytes())?;
    writer.write_all(&sample_rate.to_le_bytes())?;
    writer.write_all(&byte_rate.to_le_bytes())?;
    writer.write_all(&block_align.to_le_bytes())?;
    writer.write_all(&bits_per_sample.to_le_bytes())?;
    writer.write_all(b"data")?;
    writer.write_all(&data_len.to_le_bytes())?;

    let bytes: Vec<u8> = samples
        .iter()
        .map(|s| (s.clamp(-1.0, 1.0) * 127.0 + 128.0) as u8)
        .collect();
    writer.write_all(&bytes)
}

/// [`encode_wav`] into a fresh byte vector.
pub fn wav_bytes(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(WAV_HEADER_LEN + samples.len());
    // Writing into a Vec cannot fail.
    let _ = encode_wav(&mut bytes, samples, sample_rate);
    bytes
}

/// Repeat `chunk` until `len` bytes are filled; the last copy is truncated.
pub fn tile(chunk: &[u8], len: usize) -> Vec<u8> {
    if chunk.is_empty() {
        return vec![0; len];
    }
    chunk.iter().copied().cycle().take(len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_frequency_mapping() {
        assert_eq!(RED_RANGE.map(0.0), 60.0);
        assert_eq!(RED_RANGE.map(1.0), 530.0);
        assert_eq!(BLUE_RANGE.map(0.5), 5000.0);
    }

    #[test]
    fn test_burst_length() {
        assert_eq!(samples_per_tone(SAMPLE_RATE, BURST_SECONDS), 4);
        let tones = vec![Tone::from_color(Color::new(255, 0, 128, 255)); 3];
        assert_eq!(synthesize(&tones, SAMPLE_RATE, BURST_SECONDS).len(), 12);
    }

    #[test]
    fn test_black_pixel_is_silent() {
        let tone = Tone::from_color(Color::new(0, 0, 0, 255));
        let samples = synthesize(&[tone], SAMPLE_RATE, BURST_SECONDS);
        assert!(samples.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_distortion_stays_in_unit_range() {
        let tones: Vec<Tone> = (0..=255u8)
            .map(|v| Tone::from_color(Color::new(v, 255 - v, v / 2, 255)))
            .collect();
        let samples = synthesize(&tones, SAMPLE_RATE, BURST_SECONDS);
        let mut rng = Pcg32::seed_from_u64(0);
        let distorted = distort(&samples, &mut rng);
        assert_eq!(distorted.len(), samples.len());
        // mu-law of |x| <= 1.075 stays just above 1 at most
        assert!(distorted.iter().all(|s| s.abs() <= 1.02));
    }

    #[test]
    fn test_wav_header() {
        let bytes = wav_bytes(&[0.0, 1.0, -1.0], 8000);
        assert_eq!(bytes.len(), WAV_HEADER_LEN + 3);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 39);
        assert_eq!(&bytes[8..16], b"WAVEfmt ");
        assert_eq!(u16::from_le_bytes([bytes[20], bytes[21]]), 7);
        assert_eq!(u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]), 8000);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(&bytes[44..], &[128, 255, 1]);
    }

    #[test]
    fn test_tile_truncates_tail() {
        assert_eq!(tile(&[1, 2, 3], 7), vec![1, 2, 3, 1, 2, 3, 1]);
        assert_eq!(tile(&[1, 2, 3], 2), vec![1, 2]);
        assert_eq!(tile(&[], 3), vec![0, 0, 0]);
    }
}
