//! Per-state camera transitions.
//!
//! On every state entry the controller stops all camera tweens, then tweens
//! zoom, focus and the per-state effect targets toward the new state's
//! config. When the zoom transition finishes the slow baseline drift takes
//! over (preceded by a one-shot creep after the boot sequence).

use tracing::debug;

use crate::config::{FocusTarget, SequenceTiming, StateConfig};
use crate::layout::{Anchors, LayoutCtx};
use crate::machine::State;
use crate::params::{ParamField, Params};
use crate::scene::Scene;
use crate::tween::{TweenSet, TweenTag};

/// Focus point in content space. `x` is zero unless the target names a column.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FocusPoint {
    pub x: f32,
    pub y: f32,
}

pub fn resolve_focus(
    target: FocusTarget,
    scene: &Scene,
    lctx: &LayoutCtx,
    anchors: &Anchors,
) -> FocusPoint {
    let y = match target {
        FocusTarget::Header => scene
            .scroll
            .first()
            .map(|row| row.y())
            .unwrap_or(scene.content_h * 0.3),
        FocusTarget::Spinner => anchors.spinner_y,
        FocusTarget::Prompt => scene.prompt.y,
        FocusTarget::BootHint => scene.boot_hint.y,
        FocusTarget::Center => scene.content_h / 2.0,
        FocusTarget::Cell { line, .. } => line as f32 * lctx.line_height,
    };
    let x = match target {
        FocusTarget::Cell { col, .. } => anchors.left_x + col as f32 * lctx.ch_w,
        _ => 0.0,
    };
    FocusPoint { x, y }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AfterTransition {
    Baseline,
    Creep,
}

#[derive(Debug, Clone)]
pub struct ZoomController {
    sequence: SequenceTiming,
    initial_boot: bool,
    after: AfterTransition,
}

impl ZoomController {
    pub fn new(sequence: SequenceTiming) -> Self {
        Self {
            sequence,
            initial_boot: true,
            after: AfterTransition::Baseline,
        }
    }

    /// Start the idle drift from whatever zoom the session opened with.
    pub fn start_baseline(&self, tweens: &mut TweenSet, params: &Params, now_ms: u64) {
        let drift = self.sequence.baseline;
        tweens.start(
            params,
            ParamField::Zoom,
            drift.target,
            drift.duration_ms,
            drift.easing,
            now_ms,
            TweenTag::Baseline,
        );
    }

    /// Transition the camera for `state`. The very first BOOT entry is
    /// skipped so the opening frame keeps its initial zoom. Returns whether
    /// tweens were started.
    pub fn jumpcut(
        &mut self,
        state: State,
        config: &StateConfig,
        focus: FocusPoint,
        tweens: &mut TweenSet,
        params: &mut Params,
        now_ms: u64,
    ) -> bool {
        if self.initial_boot && state == State::Boot {
            self.initial_boot = false;
            return false;
        }
        self.initial_boot = false;
        self.after = if state == State::BootReady {
            AfterTransition::Creep
        } else {
            AfterTransition::Baseline
        };

        tweens.stop_all();
        let duration = config.duration_ms;
        let easing = self.sequence.zoom_easing;
        let mut tween = |params: &Params, field, to, tag| {
            tweens.start(params, field, to, duration, easing, now_ms, tag);
        };

        tween(params, ParamField::Zoom, config.zoom, TweenTag::ZoomTransition);
        for (field, to) in [
            (ParamField::Scale, config.scale),
            (ParamField::Brightness, config.brightness),
            (ParamField::Saturation, config.saturation),
            (ParamField::Exposure, config.exposure),
            (ParamField::BloomStrength, config.bloom_strength),
        ] {
            tween(params, field, to, TweenTag::EffectTransition);
        }

        if focus.y > 0.0 {
            params.focus_target_y = focus.y;
            params.focus_target_x = focus.x;
            tween(
                params,
                ParamField::FocusStrength,
                config.focus_strength,
                TweenTag::FocusTransition,
            );
        }
        debug!(state = state.name(), zoom = config.zoom, focus_y = focus.y, duration, "camera jumpcut");
        true
    }

    /// Route finished tween tags to the follow-up drift.
    pub fn on_finished(
        &mut self,
        finished: &[TweenTag],
        tweens: &mut TweenSet,
        params: &Params,
        now_ms: u64,
    ) {
        for tag in finished {
            match tag {
                TweenTag::ZoomTransition => match self.after {
                    AfterTransition::Creep => {
                        self.after = AfterTransition::Baseline;
                        let creep = self.sequence.creep;
                        debug!(target = creep.target, "intro creep zoom");
                        tweens.start(
                            params,
                            ParamField::Zoom,
                            creep.target,
                            creep.duration_ms,
                            creep.easing,
                            now_ms,
                            TweenTag::Creep,
                        );
                    }
                    AfterTransition::Baseline => self.start_baseline(tweens, params, now_ms),
                },
                TweenTag::Creep => self.start_baseline(tweens, params, now_ms),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StateTable;

    fn setup() -> (ZoomController, TweenSet, Params, StateTable) {
        (
            ZoomController::new(SequenceTiming::default()),
            TweenSet::new(),
            Params::default(),
            StateTable::resolve(),
        )
    }

    #[test]
    fn first_boot_entry_is_skipped() {
        let (mut zoom, mut tweens, mut params, table) = setup();
        let focus = FocusPoint { x: 0.0, y: 100.0 };
        assert!(!zoom.jumpcut(State::Boot, table.get(State::Boot), focus, &mut tweens, &mut params, 0));
        assert!(tweens.is_empty());
        assert!(zoom.jumpcut(State::Idle, table.get(State::Idle), focus, &mut tweens, &mut params, 0));
        assert!(tweens.is_tag_active(TweenTag::ZoomTransition));
    }

    #[test]
    fn baseline_resumes_only_after_the_transition_completes() {
        let (mut zoom, mut tweens, mut params, table) = setup();
        zoom.initial_boot = false;
        let config = table.get(State::Demo);
        zoom.jumpcut(State::Demo, config, FocusPoint { x: 0.0, y: 300.0 }, &mut tweens, &mut params, 1_000);
        assert_eq!(params.focus_target_y, 300.0);

        let finished = tweens.update(1_100, &mut params);
        assert!(finished.is_empty());
        assert!(!tweens.is_tag_active(TweenTag::Baseline));

        let finished = tweens.update(1_000 + config.duration_ms, &mut params);
        assert!(finished.contains(&TweenTag::ZoomTransition));
        assert!((params.zoom - config.zoom).abs() < 1e-6);
        zoom.on_finished(&finished, &mut tweens, &params, 1_000 + config.duration_ms);
        assert!(tweens.is_tag_active(TweenTag::Baseline));
    }

    #[test]
    fn boot_ready_creeps_before_baseline() {
        let (mut zoom, mut tweens, mut params, table) = setup();
        zoom.initial_boot = false;
        let config = table.get(State::BootReady);
        zoom.jumpcut(State::BootReady, config, FocusPoint::default(), &mut tweens, &mut params, 0);
        let finished = tweens.update(config.duration_ms, &mut params);
        zoom.on_finished(&finished, &mut tweens, &params, config.duration_ms);
        assert!(tweens.is_tag_active(TweenTag::Creep));

        let end = config.duration_ms + SequenceTiming::default().creep.duration_ms;
        let finished = tweens.update(end, &mut params);
        assert_eq!(finished, vec![TweenTag::Creep]);
        zoom.on_finished(&finished, &mut tweens, &params, end);
        assert!(tweens.is_tag_active(TweenTag::Baseline));
    }

    #[test]
    fn new_transition_cancels_in_flight_tweens() {
        let (mut zoom, mut tweens, mut params, table) = setup();
        zoom.initial_boot = false;
        let focus = FocusPoint { x: 0.0, y: 50.0 };
        zoom.jumpcut(State::PostDemo, table.get(State::PostDemo), focus, &mut tweens, &mut params, 0);
        zoom.jumpcut(State::Idle, table.get(State::Idle), focus, &mut tweens, &mut params, 10);
        let owner = tweens.owner(ParamField::Zoom).expect("zoom tween");
        assert_eq!(owner.to, table.get(State::Idle).zoom);
        assert_eq!(owner.start_ms, 10);
    }

    #[test]
    fn non_positive_focus_leaves_focus_untouched() {
        let (mut zoom, mut tweens, mut params, table) = setup();
        zoom.initial_boot = false;
        params.focus_target_y = 42.0;
        zoom.jumpcut(State::Idle, table.get(State::Idle), FocusPoint::default(), &mut tweens, &mut params, 0);
        assert_eq!(params.focus_target_y, 42.0);
        assert!(tweens.owner(ParamField::FocusStrength).is_none());
    }
}
