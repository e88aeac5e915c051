//! Random vertical jitter and alpha loss of the terminal layer, applied
//! only while the session is BUGGED.

use rand::Rng;

use crate::params::Params;

/// Probability that a frame takes one of the four chaos outcomes.
pub const CHAOS_PROBABILITY: f64 = 0.6;
/// Probability that a non-normal banded frame also jitters.
pub const BANDED_JITTER_PROBABILITY: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlickerMode {
    #[default]
    Normal,
    Jump,
    Blackout,
    Ghost,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlickerState {
    pub mode: FlickerMode,
}

impl FlickerState {
    pub fn reset(&mut self) {
        self.mode = FlickerMode::Normal;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlickerFrame {
    pub y_offset: f32,
    pub alpha: f32,
}

impl FlickerFrame {
    pub const STEADY: Self = Self {
        y_offset: 0.0,
        alpha: 1.0,
    };
}

fn sign<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    if rng.gen_bool(0.5) {
        -1.0
    } else {
        1.0
    }
}

fn chaos<R: Rng + ?Sized>(line_height: f32, params: &Params, rng: &mut R) -> FlickerFrame {
    let max_lines = params.flicker_max_y_lines as f32;
    match rng.gen_range(0..4) {
        0 => FlickerFrame {
            y_offset: line_height * sign(rng) * max_lines,
            alpha: 0.7 + rng.gen::<f32>() * 0.3,
        },
        1 => FlickerFrame {
            y_offset: line_height * sign(rng),
            alpha: params.flicker_ghost_alpha_min + rng.gen::<f32>() * 0.3,
        },
        2 => FlickerFrame {
            y_offset: 0.0,
            alpha: 0.0,
        },
        _ => FlickerFrame {
            y_offset: line_height * (rng.gen::<f32>() - 0.5) * 2.0,
            alpha: 0.5 + rng.gen::<f32>() * 0.5,
        },
    }
}

/// `normal_pct` percent of rolls are normal; the rest split evenly between
/// jump, blackout and ghost.
pub fn pick_mode<R: Rng + ?Sized>(normal_pct: f32, rng: &mut R) -> FlickerMode {
    let roll = rng.gen::<f32>() * 100.0;
    let band = (100.0 - normal_pct) / 3.0;
    if roll < normal_pct {
        FlickerMode::Normal
    } else if roll < normal_pct + band {
        FlickerMode::Jump
    } else if roll < normal_pct + band * 2.0 {
        FlickerMode::Blackout
    } else {
        FlickerMode::Ghost
    }
}

fn banded<R: Rng + ?Sized>(
    line_height: f32,
    params: &Params,
    state: &mut FlickerState,
    rng: &mut R,
) -> FlickerFrame {
    state.mode = pick_mode(params.flicker_normal_pct, rng);
    let jitter =
        state.mode != FlickerMode::Normal && rng.gen_bool(BANDED_JITTER_PROBABILITY);
    let y_offset = if state.mode == FlickerMode::Jump || jitter {
        let lines = rng.gen_range(1..=params.flicker_max_y_lines.max(1)) as f32;
        line_height * sign(rng) * lines
    } else {
        0.0
    };
    let min = params.flicker_ghost_alpha_min;
    let alpha = match state.mode {
        FlickerMode::Blackout => 0.0,
        FlickerMode::Ghost => min + rng.gen::<f32>() * (1.0 - min) * 0.6,
        _ => 1.0,
    };
    FlickerFrame { y_offset, alpha }
}

pub fn next_frame<R: Rng + ?Sized>(
    line_height: f32,
    params: &Params,
    state: &mut FlickerState,
    rng: &mut R,
) -> FlickerFrame {
    if rng.gen_bool(CHAOS_PROBABILITY) {
        chaos(line_height, params, rng)
    } else {
        banded(line_height, params, state, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn frames_stay_within_bounds() {
        let params = Params::default();
        let mut state = FlickerState::default();
        let mut rng = StdRng::seed_from_u64(11);
        let lh = 20.0;
        let max = lh * params.flicker_max_y_lines as f32;
        for _ in 0..2_000 {
            let frame = next_frame(lh, &params, &mut state, &mut rng);
            assert!((0.0..=1.0).contains(&frame.alpha));
            assert!(frame.y_offset.abs() <= max);
        }
    }

    #[test]
    fn every_mode_is_reachable_with_default_bands() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut seen = [false; 4];
        for _ in 0..500 {
            let index = match pick_mode(20.0, &mut rng) {
                FlickerMode::Normal => 0,
                FlickerMode::Jump => 1,
                FlickerMode::Blackout => 2,
                FlickerMode::Ghost => 3,
            };
            seen[index] = true;
        }
        assert_eq!(seen, [true; 4]);
    }

    #[test]
    fn all_normal_bands_never_pick_other_modes() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            assert_eq!(pick_mode(100.0, &mut rng), FlickerMode::Normal);
        }
    }
}
