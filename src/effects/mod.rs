//! Screen-space effect chain.
//!
//! [`PostStack`] is an ordered list of independently toggleable passes run
//! over the display surface (LCD mask, bloom, adjustment, depth of field).
//! [`Effects`] bundles the stack with the overlays and per-frame effect
//! state that are not passes: dead pixels, glare, breathing and flicker.

pub mod adjust;
pub mod bloom;
pub mod breathing;
pub mod dead_pixels;
pub mod dof;
pub mod flicker;
pub mod glare;
pub mod lcd;

use rand::Rng;
use tiny_skia::Pixmap;

use crate::params::Params;
use crate::theme::Palette;
use adjust::AdjustParams;
use bloom::BloomParams;
use breathing::Breathing;
use dead_pixels::DeadPixelLayer;
use dof::{DofEase, DofParams};
use flicker::FlickerState;
use glare::Glare;
use lcd::LcdParams;

/// Typed parameters for a single pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PassParams {
    Lcd(LcdParams),
    Bloom(BloomParams),
    Adjust(AdjustParams),
    Dof(DofParams),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostPass {
    pub label: &'static str,
    pub enabled: bool,
    pub params: PassParams,
}

impl PostPass {
    fn apply(&self, pixmap: &mut Pixmap) {
        match self.params {
            PassParams::Lcd(params) => lcd::apply(pixmap, params),
            PassParams::Bloom(params) => bloom::apply(pixmap, params),
            PassParams::Adjust(params) => adjust::apply(pixmap, params),
            PassParams::Dof(params) => dof::apply(pixmap, params),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostStack {
    passes: Vec<PostPass>,
}

impl Default for PostStack {
    fn default() -> Self {
        Self::new()
    }
}

impl PostStack {
    /// Standard order with neutral parameters; call [`PostStack::sync`]
    /// before the first frame.
    pub fn new() -> Self {
        Self {
            passes: vec![
                PostPass {
                    label: "lcd",
                    enabled: false,
                    params: PassParams::Lcd(LcdParams { light: false }),
                },
                PostPass {
                    label: "bloom",
                    enabled: false,
                    params: PassParams::Bloom(BloomParams {
                        strength: 0.0,
                        quality: 1,
                    }),
                },
                PostPass {
                    label: "adjust",
                    enabled: true,
                    params: PassParams::Adjust(AdjustParams {
                        brightness: 1.0,
                        saturation: 1.0,
                    }),
                },
                PostPass {
                    label: "dof",
                    enabled: false,
                    params: PassParams::Dof(DofParams {
                        strength: 0.0,
                        max_radius: 0.0,
                        falloff_start: 0.0,
                        direction_deg: 90.0,
                    }),
                },
            ],
        }
    }

    pub fn sync(&mut self, params: &Params, brightness_multiplier: f32, dof_strength: f32, light: bool) {
        for pass in &mut self.passes {
            match &mut pass.params {
                PassParams::Lcd(lcd) => {
                    pass.enabled = params.lcd_enabled;
                    lcd.light = light;
                }
                PassParams::Bloom(bloom) => {
                    pass.enabled = params.bloom_enabled;
                    bloom.strength = params.bloom_strength;
                    bloom.quality = params.bloom_quality;
                }
                PassParams::Adjust(adjust) => {
                    adjust.brightness = params.brightness * params.exposure * brightness_multiplier;
                    adjust.saturation = params.saturation;
                }
                PassParams::Dof(dof) => {
                    pass.enabled = params.dof_enabled && dof_strength > 0.0;
                    dof.strength = dof_strength;
                    dof.max_radius = params.dof_max_radius;
                    dof.falloff_start = params.dof_falloff_start;
                    dof.direction_deg = params.dof_direction_deg;
                }
            }
        }
    }

    pub fn apply(&self, pixmap: &mut Pixmap) {
        for pass in self.passes.iter().filter(|pass| pass.enabled) {
            pass.apply(pixmap);
        }
    }

    pub fn passes(&self) -> &[PostPass] {
        &self.passes
    }

    pub fn pass(&self, label: &str) -> Option<&PostPass> {
        self.passes.iter().find(|pass| pass.label == label)
    }

    pub fn enabled_labels(&self) -> Vec<&'static str> {
        self.passes
            .iter()
            .filter(|pass| pass.enabled)
            .map(|pass| pass.label)
            .collect()
    }
}

/// Everything effect-related the compositor reads each frame.
#[derive(Debug, Clone)]
pub struct Effects {
    pub post: PostStack,
    pub dof: DofEase,
    pub dead_pixels: DeadPixelLayer,
    pub dead_pixels_visible: bool,
    pub glare: Option<Glare>,
    pub glare_opacity: f32,
    pub breathing: Breathing,
    pub flicker: FlickerState,
}

impl Effects {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            post: PostStack::new(),
            dof: DofEase::default(),
            dead_pixels: DeadPixelLayer::default(),
            dead_pixels_visible: true,
            glare: None,
            glare_opacity: 0.0,
            breathing: Breathing::new(rng),
            flicker: FlickerState::default(),
        }
    }

    /// Rebuild the size-dependent overlays.
    pub fn resize<R: Rng + ?Sized>(
        &mut self,
        display: (u32, u32),
        view: (u32, u32),
        palette: &Palette,
        rng: &mut R,
    ) {
        self.dead_pixels = DeadPixelLayer::generate(display.0, display.1, palette, rng);
        self.glare = Glare::new(view.0, view.1);
    }

    /// Per-frame sync from the parameter store. Steps the depth-of-field
    /// ease toward `overlap`.
    pub fn sync(&mut self, params: &Params, brightness_multiplier: f32, overlap: bool, light: bool) {
        let dof_strength = self.dof.step(overlap);
        self.post
            .sync(params, brightness_multiplier, dof_strength, light);
        self.dead_pixels_visible = params.dead_pixels_enabled;
        self.glare_opacity = params.glare_opacity;
        self.breathing.enabled = params.breathing_enabled;
    }
}
