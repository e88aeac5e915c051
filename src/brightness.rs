//! Stepped brightness bar.
//!
//! The level maps linearly onto a multiplier fed into the adjustment pass.
//! Manual steps flash the bar to full opacity and let it fade back to idle;
//! the dim animation walks the level down to a target at a fixed cadence.

use tracing::debug;

pub const TOTAL_BLOCKS: u8 = 10;
pub const DEFAULT_LEVEL: u8 = 5;
pub const MIN_MULTIPLIER: f32 = 0.4;
pub const MAX_MULTIPLIER: f32 = 1.8;
pub const IDLE_ALPHA: f32 = 0.12;
pub const ACTIVE_ALPHA: f32 = 0.6;
pub const FADE_MS: u64 = 1_500;

pub fn multiplier_for(level: u8) -> f32 {
    let step = (MAX_MULTIPLIER - MIN_MULTIPLIER) / f32::from(TOTAL_BLOCKS);
    MIN_MULTIPLIER + f32::from(level.min(TOTAL_BLOCKS)) * step
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DimAnim {
    target_level: u8,
    step_ms: u64,
    last_step_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightnessBar {
    level: u8,
    multiplier: f32,
    alpha: f32,
    fade_start_ms: Option<u64>,
    dim: Option<DimAnim>,
}

impl Default for BrightnessBar {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
            multiplier: 1.0,
            alpha: IDLE_ALPHA,
            fade_start_ms: None,
            dim: None,
        }
    }
}

impl BrightnessBar {
    /// Step the level by `delta` and restart the fade. Returns the new multiplier.
    pub fn adjust(&mut self, delta: i8, now_ms: u64) -> f32 {
        let level = (i16::from(self.level) + i16::from(delta)).clamp(0, i16::from(TOTAL_BLOCKS));
        self.level = level as u8;
        self.multiplier = multiplier_for(self.level);
        self.alpha = ACTIVE_ALPHA;
        self.fade_start_ms = Some(now_ms);
        self.multiplier
    }

    pub fn start_dim(&mut self, target_level: u8, step_ms: u64, now_ms: u64) {
        self.alpha = ACTIVE_ALPHA;
        self.fade_start_ms = None;
        self.dim = Some(DimAnim {
            target_level: target_level.min(TOTAL_BLOCKS),
            step_ms,
            last_step_ms: now_ms,
        });
        debug!(from = self.level, to = target_level, "brightness dim started");
    }

    /// Advance fade or dim. The effect stack reads [`Self::multiplier`] on
    /// every sync, so nothing is returned.
    pub fn tick(&mut self, now_ms: u64) {
        if let Some(mut anim) = self.dim {
            if now_ms.saturating_sub(anim.last_step_ms) < anim.step_ms {
                return;
            }
            anim.last_step_ms = now_ms;
            self.level = anim.target_level.max(self.level.saturating_sub(1));
            self.multiplier = multiplier_for(self.level);
            if self.level <= anim.target_level {
                self.dim = None;
                self.fade_start_ms = Some(now_ms);
            } else {
                self.dim = Some(anim);
            }
            return;
        }

        if let Some(start) = self.fade_start_ms {
            let elapsed = now_ms.saturating_sub(start);
            if elapsed >= FADE_MS {
                self.alpha = IDLE_ALPHA;
                self.fade_start_ms = None;
            } else {
                let t = elapsed as f32 / FADE_MS as f32;
                self.alpha = ACTIVE_ALPHA - (ACTIVE_ALPHA - IDLE_ALPHA) * t;
            }
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_dimming(&self) -> bool {
        self.dim.is_some()
    }
}
