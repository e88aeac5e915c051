//! Hold-to-skip escape gesture.
//!
//! A double press within [`DOUBLE_TAP_MS`], or a single press held past
//! [`SINGLE_HOLD_MS`], activates the gesture. While the key stays down,
//! progress ramps linearly to 1 over [`HOLD_MS`]. Releasing early resets it;
//! reaching 1 reports completion once and resets, so the next gesture starts
//! from scratch.

use tracing::debug;

pub const DOUBLE_TAP_MS: u64 = 500;
pub const HOLD_MS: u64 = 1_500;
pub const SINGLE_HOLD_MS: u64 = 50;
pub const LABEL: &str = "HOLD ESC 1.5 SEC.";

/// One frame's reading of the gesture.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EscTick {
    pub progress: f32,
    pub just_activated: bool,
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EscSkip {
    activated: bool,
    holding: bool,
    progress: f32,
    last_down_ms: Option<u64>,
    hold_start_ms: u64,
    single_hold_start_ms: Option<u64>,
}

impl EscSkip {
    /// Key press. Returns true when a double tap activates the gesture.
    pub fn key_down(&mut self, repeat: bool, now_ms: u64) -> bool {
        if self.activated || repeat {
            return false;
        }
        let double_tap = self
            .last_down_ms
            .is_some_and(|last| now_ms.saturating_sub(last) < DOUBLE_TAP_MS);
        if double_tap {
            self.activate(now_ms);
            return true;
        }
        self.last_down_ms = Some(now_ms);
        self.single_hold_start_ms = Some(now_ms);
        false
    }

    /// Key release. Returns whether an active gesture was abandoned.
    pub fn key_up(&mut self) -> bool {
        self.single_hold_start_ms = None;
        if self.activated {
            debug!(progress = self.progress, "escape hold released early");
            self.reset();
            return true;
        }
        false
    }

    pub fn tick(&mut self, now_ms: u64) -> EscTick {
        let mut just_activated = false;
        if !self.activated {
            match self.single_hold_start_ms {
                Some(start) if now_ms.saturating_sub(start) >= SINGLE_HOLD_MS => {
                    self.activate(start);
                    just_activated = true;
                }
                _ => {
                    return EscTick {
                        progress: self.progress,
                        ..EscTick::default()
                    }
                }
            }
        }
        if !self.holding {
            return EscTick {
                progress: self.progress,
                just_activated,
                completed: false,
            };
        }

        self.progress = (now_ms.saturating_sub(self.hold_start_ms) as f32 / HOLD_MS as f32).min(1.0);
        if self.progress >= 1.0 {
            debug!("escape hold completed");
            self.reset();
            self.last_down_ms = None;
            return EscTick {
                progress: 1.0,
                just_activated,
                completed: true,
            };
        }
        EscTick {
            progress: self.progress,
            just_activated,
            completed: false,
        }
    }

    pub fn reset(&mut self) {
        self.activated = false;
        self.holding = false;
        self.progress = 0.0;
        self.single_hold_start_ms = None;
    }

    pub fn is_active(&self) -> bool {
        self.activated
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    fn activate(&mut self, hold_start_ms: u64) {
        self.activated = true;
        self.holding = true;
        self.hold_start_ms = hold_start_ms;
        self.single_hold_start_ms = None;
    }
}

/// Popup geometry in character cells: a label and a bar of blocks under it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EscPopup {
    pub total_blocks: usize,
    pub filled_blocks: usize,
}

impl EscPopup {
    pub fn for_progress(progress: f32) -> Self {
        let total_blocks = LABEL.chars().count();
        Self {
            total_blocks,
            filled_blocks: (total_blocks as f32 * progress.clamp(0.0, 1.0)).floor() as usize,
        }
    }

    /// Bar text: filled blocks then light shade for the rest of the track.
    pub fn bar_text(&self) -> String {
        let mut bar = "█".repeat(self.filled_blocks);
        bar.push_str(&"░".repeat(self.total_blocks - self.filled_blocks));
        bar
    }
}
