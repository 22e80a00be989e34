//! Ornamental effect overlay
//!
//! Sums a short effect sample (air horn, sweep, ...) into the final mix at a
//! uniformly random interior position: a fixed head margin keeps it off the
//! intro, and the placement always leaves at least the effect's own duration
//! before the tail. The random source is injected, so a fixed seed gives a
//! reproducible position; without one, a different position per run is
//! intentional and fine for an ornament.

use crate::error::{MixdownError, Result};
use crate::types::AudioBuffer;
use rand::Rng;
use tracing::debug;

/// Overlay `effect` onto `mix` in place, returning the start frame used
///
/// Mono effects are summed into every mix channel; multi-channel effects are
/// downmixed first. Placement range is
/// `[head_margin_frames, mix_len - 2 * effect_len]`.
pub fn overlay_effect<R: Rng>(
    mix: &mut AudioBuffer,
    effect: &AudioBuffer,
    head_margin_frames: usize,
    rng: &mut R,
) -> Result<usize> {
    let effect_len = effect.len();
    let mix_len = mix.len();

    // Effect fully inside the mix, an effect-length clear of the tail
    let required = head_margin_frames + 2 * effect_len;
    if effect_len == 0 || mix_len < required {
        return Err(MixdownError::InsufficientLength {
            mix_frames: mix_len,
            required_frames: required,
        });
    }

    let latest_start = mix_len - 2 * effect_len;
    let position = if latest_start > head_margin_frames {
        rng.gen_range(head_margin_frames..=latest_start)
    } else {
        head_margin_frames
    };
    debug!(
        "Overlaying {} effect frames at frame {} of {}",
        effect_len, position, mix_len
    );

    let effect_mono = effect.to_mono();
    for channel in mix.channels_mut() {
        for (i, &sample) in effect_mono.iter().enumerate() {
            channel[position + i] += sample;
        }
    }

    Ok(position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn silent_mix(frames: usize) -> AudioBuffer {
        AudioBuffer::mono(vec![0.0; frames], 1000)
    }

    fn effect(frames: usize) -> AudioBuffer {
        AudioBuffer::mono(vec![0.5; frames], 1000)
    }

    #[test]
    fn placement_respects_both_margins() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let mut mix = silent_mix(10_000);
            let fx = effect(500);
            let pos = overlay_effect(&mut mix, &fx, 1000, &mut rng).unwrap();
            assert!(pos >= 1000, "start before head margin: {pos}");
            assert!(
                pos + 2 * fx.len() <= mix.len(),
                "effect within its own duration of the tail: {pos}"
            );
        }
    }

    #[test]
    fn samples_are_summed_not_replaced() {
        let mut mix = AudioBuffer::mono(vec![0.25; 10_000], 1000);
        let fx = effect(100);
        let pos = overlay_effect(&mut mix, &fx, 500, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(mix.channels()[0][pos], 0.75);
        // Outside the overlay the mix is untouched
        assert_eq!(mix.channels()[0][pos - 1], 0.25);
        assert_eq!(mix.channels()[0][pos + 100], 0.25);
    }

    #[test]
    fn fixed_seed_is_deterministic() {
        let fx = effect(200);
        let mut mix_a = silent_mix(20_000);
        let mut mix_b = silent_mix(20_000);
        let pos_a =
            overlay_effect(&mut mix_a, &fx, 1000, &mut StdRng::seed_from_u64(42)).unwrap();
        let pos_b =
            overlay_effect(&mut mix_b, &fx, 1000, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(pos_a, pos_b);
    }

    #[test]
    fn mono_effect_reaches_every_mix_channel() {
        let mut mix = AudioBuffer::stereo(vec![0.0; 10_000], vec![0.0; 10_000], 1000);
        let fx = effect(100);
        let pos = overlay_effect(&mut mix, &fx, 500, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(mix.channels()[0][pos], 0.5);
        assert_eq!(mix.channels()[1][pos], 0.5);
    }

    #[test]
    fn short_mix_is_an_insufficient_length_error() {
        let mut mix = silent_mix(900);
        let fx = effect(400);
        let err = overlay_effect(&mut mix, &fx, 500, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert!(matches!(err, MixdownError::InsufficientLength { .. }));
    }

    #[test]
    fn empty_effect_is_rejected() {
        let mut mix = silent_mix(10_000);
        let fx = AudioBuffer::mono(Vec::new(), 1000);
        assert!(overlay_effect(&mut mix, &fx, 500, &mut StdRng::seed_from_u64(0)).is_err());
    }

    #[test]
    fn exact_fit_places_at_head_margin() {
        let mut mix = silent_mix(1000);
        let fx = effect(250);
        let pos = overlay_effect(&mut mix, &fx, 500, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(pos, 500);
    }
}
