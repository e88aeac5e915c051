//! Time-bounded interpolation of parameter-store fields.
//!
//! Each [`ParamField`] has at most one owning tween. Starting a tween on a
//! field stops whichever tween owned it before, so the store never has two
//! writers racing for one value.

use tracing::trace;

use crate::easing::{lerp, Easing};
use crate::params::{ParamField, Params};

/// Identifies which controller started a tween, so completions can be routed
/// back to it and a controller can stop only its own tweens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TweenTag {
    ZoomTransition,
    FocusTransition,
    EffectTransition,
    Baseline,
    Creep,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    pub field: ParamField,
    pub from: f32,
    pub to: f32,
    pub start_ms: u64,
    pub duration_ms: u64,
    pub easing: Easing,
    pub tag: TweenTag,
}

impl Tween {
    pub fn value_at(&self, now_ms: u64) -> f32 {
        lerp(self.from, self.to, self.easing.apply(self.progress(now_ms)))
    }

    pub fn progress(&self, now_ms: u64) -> f32 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        let elapsed = now_ms.saturating_sub(self.start_ms);
        (elapsed as f32 / self.duration_ms as f32).min(1.0)
    }

    pub fn is_finished(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.start_ms) >= self.duration_ms
    }
}

#[derive(Debug, Default)]
pub struct TweenSet {
    active: Vec<Tween>,
}

impl TweenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a tween from the field's current value. Any tween already owning
    /// `field` is dropped without completing.
    pub fn start(
        &mut self,
        params: &Params,
        field: ParamField,
        to: f32,
        duration_ms: u64,
        easing: Easing,
        now_ms: u64,
        tag: TweenTag,
    ) {
        self.stop(field);
        trace!(?field, to, duration_ms, ?tag, "tween start");
        self.active.push(Tween {
            field,
            from: params.get(field),
            to,
            start_ms: now_ms,
            duration_ms,
            easing,
            tag,
        });
    }

    pub fn stop(&mut self, field: ParamField) {
        self.active.retain(|tween| tween.field != field);
    }

    pub fn stop_tagged(&mut self, tag: TweenTag) {
        self.active.retain(|tween| tween.tag != tag);
    }

    pub fn stop_all(&mut self) {
        self.active.clear();
    }

    pub fn owner(&self, field: ParamField) -> Option<&Tween> {
        self.active.iter().find(|tween| tween.field == field)
    }

    pub fn is_tag_active(&self, tag: TweenTag) -> bool {
        self.active.iter().any(|tween| tween.tag == tag)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Write every active tween's value into `params` and retire finished
    /// tweens. Returns the tags whose last tween finished during this call,
    /// each at most once.
    pub fn update(&mut self, now_ms: u64, params: &mut Params) -> Vec<TweenTag> {
        let mut finished_tags = Vec::new();
        for tween in &self.active {
            params.set(tween.field, tween.value_at(now_ms));
        }
        let mut index = 0;
        while index < self.active.len() {
            if self.active[index].is_finished(now_ms) {
                let done = self.active.remove(index);
                if !finished_tags.contains(&done.tag) {
                    finished_tags.push(done.tag);
                }
            } else {
                index += 1;
            }
        }
        finished_tags.retain(|tag| !self.is_tag_active(*tag));
        finished_tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tween_reaches_target_and_retires() {
        let mut params = Params::default();
        params.zoom = 1.0;
        let mut tweens = TweenSet::new();
        tweens.start(
            &params,
            ParamField::Zoom,
            2.0,
            100,
            Easing::Linear,
            0,
            TweenTag::ZoomTransition,
        );

        assert!(tweens.update(50, &mut params).is_empty());
        assert!((params.zoom - 1.5).abs() < 1e-6);

        let done = tweens.update(100, &mut params);
        assert_eq!(done, vec![TweenTag::ZoomTransition]);
        assert_eq!(params.zoom, 2.0);
        assert!(tweens.is_empty());
    }

    #[test]
    fn starting_a_tween_replaces_the_previous_owner() {
        let mut params = Params::default();
        params.zoom = 1.0;
        let mut tweens = TweenSet::new();
        tweens.start(
            &params,
            ParamField::Zoom,
            3.0,
            1_000,
            Easing::Linear,
            0,
            TweenTag::Baseline,
        );
        tweens.update(500, &mut params);
        tweens.start(
            &params,
            ParamField::Zoom,
            0.5,
            100,
            Easing::Linear,
            500,
            TweenTag::ZoomTransition,
        );

        assert_eq!(tweens.len(), 1);
        let owner = tweens.owner(ParamField::Zoom).expect("zoom owned");
        assert_eq!(owner.tag, TweenTag::ZoomTransition);
        assert!((owner.from - 2.0).abs() < 1e-6);

        let done = tweens.update(600, &mut params);
        assert_eq!(done, vec![TweenTag::ZoomTransition]);
        assert_eq!(params.zoom, 0.5);
    }

    #[test]
    fn zero_duration_applies_immediately() {
        let mut params = Params::default();
        let mut tweens = TweenSet::new();
        tweens.start(
            &params,
            ParamField::Brightness,
            0.4,
            0,
            Easing::CubicInOut,
            10,
            TweenTag::EffectTransition,
        );
        let done = tweens.update(10, &mut params);
        assert_eq!(done, vec![TweenTag::EffectTransition]);
        assert_eq!(params.brightness, 0.4);
    }

    #[test]
    fn tag_completes_only_after_its_last_tween() {
        let mut params = Params::default();
        let mut tweens = TweenSet::new();
        let tag = TweenTag::EffectTransition;
        tweens.start(&params, ParamField::Scale, 2.0, 100, Easing::Linear, 0, tag);
        tweens.start(&params, ParamField::Exposure, 2.0, 200, Easing::Linear, 0, tag);

        assert!(tweens.update(150, &mut params).is_empty());
        assert_eq!(tweens.update(200, &mut params), vec![tag]);
    }

    #[test]
    fn stop_tagged_leaves_other_owners() {
        let params = Params::default();
        let mut tweens = TweenSet::new();
        tweens.start(
            &params,
            ParamField::Zoom,
            2.0,
            100,
            Easing::Linear,
            0,
            TweenTag::Baseline,
        );
        tweens.start(
            &params,
            ParamField::FocusStrength,
            0.6,
            100,
            Easing::Linear,
            0,
            TweenTag::FocusTransition,
        );
        tweens.stop_tagged(TweenTag::Baseline);
        assert!(tweens.owner(ParamField::Zoom).is_none());
        assert!(tweens.owner(ParamField::FocusStrength).is_some());
    }
}
