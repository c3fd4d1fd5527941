use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::{FilterContext, ParamRange, PixelCache};
use crate::pixel::{clamp_channel, PixelBuffer, CHANNELS};
use crate::sound::{self, Tone, BURST_SECONDS, SAMPLE_RATE};

pub const BLEND: ParamRange = ParamRange::new(0.0, 1.0, 0.5);

/// Fixed seed for the hiss and sample-and-hold of the audio chain, so the
/// same pixels always produce the same texture.
const NOISE_SEED: u64 = 0x5eed_50d0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsSoundConfig {
    /// Mix of the sound texture over the original pixels.
    pub blend: f32,
    #[serde(skip)]
    pub cache: PixelCache,
}

impl Default for AsSoundConfig {
    fn default() -> Self {
        Self {
            blend: BLEND.default,
            cache: PixelCache::default(),
        }
    }
}

/// Returns the new cache when the sound texture was generated.
///
/// The texture is deterministic, so it is only rebuilt when missing; a
/// refresh request does not discard it.
pub fn apply(ctx: &mut FilterContext<'_>, config: &AsSoundConfig) -> Option<PixelCache> {
    let len = ctx.buffer.data().len();
    let regenerate = config.cache.is_empty() || !config.cache.fits(len);
    let cache = if regenerate {
        PixelCache::new(sound_texture(ctx.buffer, ctx.mask))
    } else {
        config.cache.clone()
    };

    let blend = config.blend;
    let texture = cache.bytes();
    let data = ctx.buffer.data_mut();
    for &index in ctx.mask {
        let i = index as usize * CHANNELS;
        for c in i..i + 3 {
            data[c] = clamp_channel(data[c] as f32 * (1.0 - blend) + texture[c] as f32 * blend);
        }
    }
    regenerate.then_some(cache)
}

/// Synthesize the masked pixels as audio and tile the WAV bytes over a
/// buffer-sized byte array.
fn sound_texture(buffer: &PixelBuffer, mask: &[u32]) -> Vec<u8> {
    let tones: Vec<Tone> = mask
        .iter()
        .map(|&index| Tone::from_color(buffer.pixel(index as usize)))
        .collect();
    let samples = sound::synthesize(&tones, SAMPLE_RATE, BURST_SECONDS);
    let mut rng = Pcg32::seed_from_u64(NOISE_SEED);
    let distorted = sound::distort(&samples, &mut rng);
    let wav = sound::wav_bytes(&distorted, SAMPLE_RATE);
    log::debug!(
        "Synthesized {} samples from {} pixels ({} WAV bytes)",
        distorted.len(),
        tones.len(),
        wav.len()
    );
    sound::tile(&wav, buffer.data().len())
}
