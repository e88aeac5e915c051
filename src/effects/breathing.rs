//! Slow whole-view scale pulse.

use std::f32::consts::TAU;

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breathing {
    pub enabled: bool,
    phase: f32,
}

impl Breathing {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            enabled: true,
            phase: rng.gen::<f32>() * TAU,
        }
    }

    /// Scale factor about the view centre at `now_ms`.
    pub fn scale(&self, now_ms: u64, amplitude: f32, period_ms: u64) -> f32 {
        if !self.enabled || period_ms == 0 {
            return 1.0;
        }
        let t = (now_ms % period_ms) as f32 / period_ms as f32;
        1.0 + (t * TAU + self.phase).sin() * amplitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn pulse_stays_within_amplitude_and_repeats_each_period() {
        let breathing = Breathing::new(&mut StdRng::seed_from_u64(1));
        for now in (0..40_000).step_by(250) {
            let scale = breathing.scale(now, 0.025, 20_000);
            assert!((0.974..=1.026).contains(&scale));
            assert_eq!(scale, breathing.scale(now + 20_000, 0.025, 20_000));
        }
    }

    #[test]
    fn disabled_is_identity() {
        let mut breathing = Breathing::new(&mut StdRng::seed_from_u64(1));
        breathing.enabled = false;
        assert_eq!(breathing.scale(1_234, 0.025, 20_000), 1.0);
    }
}
