//! Sequencing constants and the per-state camera/effect table.
//!
//! Each state declares only what it changes relative to the state before it in
//! [`State::ALL`]. The partials are folded once into a [`StateTable`] so a
//! transition is a plain indexed lookup.

use crate::easing::Easing;
use crate::machine::State;

/// Named on-screen point the camera focus resolves to at transition time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    Center,
    Prompt,
    Spinner,
    BootHint,
    Header,
    Cell { line: u32, col: u32 },
}

/// Fully resolved per-state configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateConfig {
    pub zoom: f32,
    pub focus: FocusTarget,
    pub focus_strength: f32,
    pub duration_ms: u64,
    pub scale: f32,
    pub brightness: f32,
    pub saturation: f32,
    pub exposure: f32,
    pub bloom_strength: f32,
    pub show_input: bool,
    pub show_spinner: bool,
    pub show_meta: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct StatePartial {
    zoom: Option<f32>,
    focus: Option<FocusTarget>,
    focus_strength: Option<f32>,
    duration_ms: Option<u64>,
    scale: Option<f32>,
    brightness: Option<f32>,
    saturation: Option<f32>,
    exposure: Option<f32>,
    bloom_strength: Option<f32>,
    show_input: Option<bool>,
    show_spinner: Option<bool>,
    show_meta: Option<bool>,
}

const NONE: StatePartial = StatePartial {
    zoom: None,
    focus: None,
    focus_strength: None,
    duration_ms: None,
    scale: None,
    brightness: None,
    saturation: None,
    exposure: None,
    bloom_strength: None,
    show_input: None,
    show_spinner: None,
    show_meta: None,
};

const BOOT_BASE: StateConfig = StateConfig {
    zoom: 1.6,
    focus: FocusTarget::Cell { line: 10, col: 40 },
    focus_strength: 0.5,
    duration_ms: 2_500,
    scale: 1.0,
    brightness: 1.0,
    saturation: 1.0,
    exposure: 1.0,
    bloom_strength: 2.0,
    show_input: true,
    show_spinner: false,
    show_meta: false,
};

fn partial_for(state: State) -> StatePartial {
    match state {
        State::Boot => NONE,
        State::BootReady => StatePartial {
            focus: Some(FocusTarget::BootHint),
            show_meta: Some(true),
            duration_ms: Some(400),
            ..NONE
        },
        State::Idle => StatePartial {
            zoom: Some(1.0),
            focus: Some(FocusTarget::Prompt),
            focus_strength: Some(0.6),
            duration_ms: Some(300),
            ..NONE
        },
        State::Browsing => StatePartial {
            zoom: Some(1.35),
            duration_ms: Some(180),
            ..NONE
        },
        State::Demo => StatePartial {
            zoom: Some(0.8),
            focus: Some(FocusTarget::Spinner),
            duration_ms: Some(250),
            show_spinner: Some(true),
            ..NONE
        },
        State::PostDemo => StatePartial {
            zoom: Some(1.15),
            focus: Some(FocusTarget::Prompt),
            duration_ms: Some(2_500),
            scale: Some(3.0),
            brightness: Some(0.4),
            exposure: Some(2.0),
            show_input: Some(true),
            show_spinner: Some(true),
            show_meta: Some(false),
            ..NONE
        },
        State::Bugged => StatePartial {
            zoom: Some(0.65),
            focus: Some(FocusTarget::Center),
            duration_ms: Some(100),
            ..NONE
        },
        State::EscCountdown => StatePartial {
            duration_ms: Some(0),
            scale: Some(1.0),
            brightness: Some(1.0),
            saturation: Some(1.0),
            exposure: Some(1.0),
            bloom_strength: Some(2.0),
            ..NONE
        },
    }
}

impl StatePartial {
    fn fold_onto(self, base: StateConfig) -> StateConfig {
        StateConfig {
            zoom: self.zoom.unwrap_or(base.zoom),
            focus: self.focus.unwrap_or(base.focus),
            focus_strength: self.focus_strength.unwrap_or(base.focus_strength),
            duration_ms: self.duration_ms.unwrap_or(base.duration_ms),
            scale: self.scale.unwrap_or(base.scale),
            brightness: self.brightness.unwrap_or(base.brightness),
            saturation: self.saturation.unwrap_or(base.saturation),
            exposure: self.exposure.unwrap_or(base.exposure),
            bloom_strength: self.bloom_strength.unwrap_or(base.bloom_strength),
            show_input: self.show_input.unwrap_or(base.show_input),
            show_spinner: self.show_spinner.unwrap_or(base.show_spinner),
            show_meta: self.show_meta.unwrap_or(base.show_meta),
        }
    }
}

/// Immutable state → config mapping, resolved once per session.
#[derive(Debug, Clone, PartialEq)]
pub struct StateTable {
    resolved: [StateConfig; State::COUNT],
}

impl StateTable {
    pub fn resolve() -> Self {
        let mut resolved = [BOOT_BASE; State::COUNT];
        let mut previous = BOOT_BASE;
        for state in State::ALL {
            let config = partial_for(state).fold_onto(previous);
            resolved[state.index()] = config;
            previous = config;
        }
        Self { resolved }
    }

    pub fn get(&self, state: State) -> &StateConfig {
        &self.resolved[state.index()]
    }
}

impl Default for StateTable {
    fn default() -> Self {
        Self::resolve()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootTiming {
    pub char_ms: u64,
    pub pre_blink_ms: u64,
    pub blink_ms: u64,
    pub post_type_ms: u64,
    pub detect_line_ms: u64,
    pub post_detect_ms: u64,
}

/// Per-line delay override for a producer's whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstDelays {
    pub action: u64,
    pub bash: u64,
    pub diff: u64,
    pub panel: u64,
    pub error: u64,
    pub mode: u64,
    pub diagram: u64,
    pub promo: u64,
}

/// A slow single-field zoom drift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drift {
    pub target: f32,
    pub duration_ms: u64,
    pub easing: Easing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceTiming {
    pub boot: BootTiming,
    pub burst: BurstDelays,
    /// Elapsed demo time at which the state-diagram insert is queued.
    pub state_diagram_ms: u64,
    /// Elapsed demo time at which the promo insert is queued.
    pub promo_ms: u64,
    pub baseline: Drift,
    pub creep: Drift,
    pub zoom_easing: Easing,
    /// Level and cadence of the brightness dim run on entering POST_DEMO.
    pub dim_level: u8,
    pub dim_step_ms: u64,
}

/// Boot delays are authored against a 100 ms frame.
pub const BASE_FRAME_MS: u64 = 100;

impl SequenceTiming {
    pub fn scaled(&self, ms: u64, frame_ms: u64) -> u64 {
        ((ms as f64) * (frame_ms as f64 / BASE_FRAME_MS as f64)).round() as u64
    }
}

impl Default for SequenceTiming {
    fn default() -> Self {
        Self {
            boot: BootTiming {
                char_ms: 55,
                pre_blink_ms: 800,
                blink_ms: 530,
                post_type_ms: 200,
                detect_line_ms: 120,
                post_detect_ms: 400,
            },
            burst: BurstDelays {
                action: 100,
                bash: 120,
                diff: 80,
                panel: 60,
                error: 100,
                mode: 150,
                diagram: 40,
                promo: 40,
            },
            state_diagram_ms: 20_000,
            promo_ms: 30_000,
            baseline: Drift {
                target: 0.75,
                duration_ms: 25_000,
                easing: Easing::CubicOut,
            },
            creep: Drift {
                target: 1.65,
                duration_ms: 12_000,
                easing: Easing::SineInOut,
            },
            zoom_easing: Easing::CubicInOut,
            dim_level: 3,
            dim_step_ms: 120,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_fields_inherit_from_the_previous_state() {
        let table = StateTable::resolve();
        let boot_ready = table.get(State::BootReady);
        assert_eq!(boot_ready.zoom, 1.6);
        assert_eq!(boot_ready.focus, FocusTarget::BootHint);
        assert!(boot_ready.show_meta);

        let browsing = table.get(State::Browsing);
        assert_eq!(browsing.focus, FocusTarget::Prompt);
        assert_eq!(browsing.focus_strength, 0.6);
        assert_eq!(browsing.duration_ms, 180);
    }

    #[test]
    fn post_demo_effect_targets_carry_into_bugged() {
        let table = StateTable::resolve();
        let post = table.get(State::PostDemo);
        assert_eq!((post.scale, post.brightness, post.exposure), (3.0, 0.4, 2.0));
        let bugged = table.get(State::Bugged);
        assert_eq!(bugged.scale, 3.0);
        assert_eq!(bugged.zoom, 0.65);
    }

    #[test]
    fn escape_countdown_resets_effects_to_neutral() {
        let table = StateTable::resolve();
        let esc = table.get(State::EscCountdown);
        assert_eq!(esc.duration_ms, 0);
        assert_eq!((esc.scale, esc.brightness, esc.exposure), (1.0, 1.0, 1.0));
        assert_eq!(esc.bloom_strength, 2.0);
    }

    #[test]
    fn boot_delays_scale_with_frame_interval() {
        let timing = SequenceTiming::default();
        assert_eq!(timing.scaled(55, 100), 55);
        assert_eq!(timing.scaled(55, 50), 28);
        assert_eq!(timing.scaled(800, 200), 1_600);
    }
}
