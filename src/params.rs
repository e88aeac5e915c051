//! The flat parameter store every subsystem reads.
//!
//! One instance per session. Numeric fields that animate are addressed through
//! [`ParamField`] so the tween registry can own them one at a time; the rest
//! are plain knobs set at startup or through overrides.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::theme::{Color, Theme, ToneKnobs};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Params {
    // Timing (milliseconds).
    pub frame_ms: u64,
    pub verb_ms: u64,
    pub scroll_ms: u64,
    pub demo_timeout_ms: u64,
    pub bug_timeout_ms: u64,
    pub char_dwell_ms: u64,
    pub token_rate: u32,

    // Colours.
    pub color_verb: Color,
    pub color_ellipsis: Color,
    pub color_meta: Color,
    pub bg_color: Color,
    pub color_highlight: Color,

    // Camera pose.
    pub perspective: f32,
    pub rotate_x: f32,
    pub rotate_y: f32,
    pub rotate_z: f32,
    pub scale: f32,
    pub translate_x: f32,
    pub translate_y: f32,
    pub mouse_translate_x: f32,
    pub mouse_translate_y: f32,
    pub origin_x: f32,
    pub origin_y: f32,
    pub zoom: f32,
    pub mouse_zoom: f32,
    pub scroll_zoom: f32,
    pub focus_target_x: f32,
    pub focus_target_y: f32,
    pub focus_strength: f32,
    pub screen_padding: f32,

    // Text layout.
    pub display_downscale: f32,
    pub font_size: f32,
    pub line_height_offset: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub absolute_x: f32,
    pub absolute_y: f32,

    // Post stack.
    pub lcd_enabled: bool,
    pub dead_pixels_enabled: bool,
    pub bloom_enabled: bool,
    pub bloom_strength: f32,
    pub bloom_quality: u32,
    pub brightness: f32,
    pub saturation: f32,
    pub exposure: f32,
    pub dof_enabled: bool,
    pub dof_max_radius: f32,
    pub dof_falloff_start: f32,
    pub dof_direction_deg: f32,
    pub glare_opacity: f32,
    pub breathing_enabled: bool,
    pub breathing_amplitude: f32,
    pub breathing_period_ms: u64,

    // Glitch flicker.
    pub flicker_normal_pct: f32,
    pub flicker_max_y_lines: u32,
    pub flicker_ghost_alpha_min: f32,
}

impl Default for Params {
    fn default() -> Self {
        Self::for_theme(&Theme::new(Default::default()))
    }
}

impl Params {
    pub fn for_theme(theme: &Theme) -> Self {
        Self {
            frame_ms: 100,
            verb_ms: 4_500,
            scroll_ms: 350,
            demo_timeout_ms: 24 * 60 * 60 * 1000,
            bug_timeout_ms: 6_000,
            char_dwell_ms: 550,
            token_rate: 70,
            color_verb: theme.colors.verb,
            color_ellipsis: theme.colors.ellipsis,
            color_meta: theme.colors.meta,
            bg_color: theme.colors.background,
            color_highlight: theme.colors.highlight,
            perspective: 3000.0,
            rotate_x: 5.0,
            rotate_y: 8.0,
            rotate_z: -4.0,
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
            mouse_translate_x: 0.0,
            mouse_translate_y: 0.0,
            origin_x: 4.8,
            origin_y: 5.3,
            zoom: 1.5,
            mouse_zoom: 1.0,
            scroll_zoom: 1.0,
            focus_target_x: 0.0,
            focus_target_y: 0.0,
            focus_strength: 0.0,
            screen_padding: 0.15,
            display_downscale: 0.5,
            font_size: 48.0,
            line_height_offset: 4.0,
            offset_x: 0.0,
            offset_y: 0.0,
            absolute_x: 0.0,
            absolute_y: 0.0,
            lcd_enabled: true,
            dead_pixels_enabled: true,
            bloom_enabled: true,
            bloom_strength: 2.0,
            bloom_quality: 4,
            brightness: 1.0,
            saturation: 1.0,
            exposure: 1.0,
            dof_enabled: true,
            dof_max_radius: 10.0,
            dof_falloff_start: 0.15,
            dof_direction_deg: 90.0,
            glare_opacity: 0.0,
            breathing_enabled: true,
            breathing_amplitude: 0.025,
            breathing_period_ms: 20_000,
            flicker_normal_pct: 20.0,
            flicker_max_y_lines: 4,
            flicker_ghost_alpha_min: 0.3,
        }
    }

    /// Re-derive the theme-bound colour knobs after a theme switch.
    pub fn apply_theme(&mut self, theme: &Theme) {
        self.color_verb = theme.colors.verb;
        self.color_ellipsis = theme.colors.ellipsis;
        self.color_meta = theme.colors.meta;
        self.bg_color = theme.colors.background;
        self.color_highlight = theme.colors.highlight;
    }

    pub fn tone_knobs(&self) -> ToneKnobs {
        ToneKnobs {
            verb: self.color_verb,
            ellipsis: self.color_ellipsis,
            highlight: self.color_highlight,
            background: self.bg_color,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let intervals = [
            ("frame_ms", self.frame_ms),
            ("verb_ms", self.verb_ms),
            ("scroll_ms", self.scroll_ms),
            ("demo_timeout_ms", self.demo_timeout_ms),
            ("bug_timeout_ms", self.bug_timeout_ms),
            ("char_dwell_ms", self.char_dwell_ms),
            ("breathing_period_ms", self.breathing_period_ms),
        ];
        for (label, value) in intervals {
            if value == 0 {
                bail!("params.{label} must be > 0");
            }
        }

        let ranges: [(&str, f32, f32, f32); 32] = [
            ("perspective", self.perspective, 0.0, 100_000.0),
            ("rotate_x", self.rotate_x, -90.0, 90.0),
            ("rotate_y", self.rotate_y, -90.0, 90.0),
            ("rotate_z", self.rotate_z, -180.0, 180.0),
            ("scale", self.scale, 0.05, 20.0),
            ("translate_x", self.translate_x, -100.0, 100.0),
            ("translate_y", self.translate_y, -100.0, 100.0),
            ("mouse_translate_x", self.mouse_translate_x, -10.0, 10.0),
            ("mouse_translate_y", self.mouse_translate_y, -10.0, 10.0),
            ("origin_x", self.origin_x, -100.0, 200.0),
            ("origin_y", self.origin_y, -100.0, 200.0),
            ("zoom", self.zoom, 0.05, 20.0),
            ("mouse_zoom", self.mouse_zoom, 0.5, 1.5),
            ("scroll_zoom", self.scroll_zoom, 1.0, 10.0),
            ("focus_strength", self.focus_strength, 0.0, 1.0),
            ("screen_padding", self.screen_padding, 0.0, 1.0),
            ("display_downscale", self.display_downscale, 0.1, 8.0),
            ("font_size", self.font_size, 4.0, 512.0),
            ("line_height_offset", self.line_height_offset, -64.0, 64.0),
            ("bloom_strength", self.bloom_strength, 0.0, 10.0),
            ("brightness", self.brightness, 0.0, 4.0),
            ("saturation", self.saturation, 0.0, 4.0),
            ("exposure", self.exposure, 0.0, 4.0),
            ("dof_max_radius", self.dof_max_radius, 0.0, 64.0),
            ("dof_falloff_start", self.dof_falloff_start, 0.0, 1.0),
            ("dof_direction_deg", self.dof_direction_deg, -360.0, 360.0),
            ("glare_opacity", self.glare_opacity, 0.0, 1.0),
            ("breathing_amplitude", self.breathing_amplitude, 0.0, 0.5),
            ("flicker_normal_pct", self.flicker_normal_pct, 0.0, 100.0),
            ("flicker_ghost_alpha_min", self.flicker_ghost_alpha_min, 0.0, 1.0),
            ("offset_x", self.offset_x, -1000.0, 1000.0),
            ("offset_y", self.offset_y, -1000.0, 1000.0),
        ];
        for (label, value, min, max) in ranges {
            if !value.is_finite() {
                bail!("params.{label} must be finite");
            }
            if value < min || value > max {
                bail!("params.{label} must be in [{min}, {max}], got {value}");
            }
        }
        for (label, value) in [
            ("absolute_x", self.absolute_x),
            ("absolute_y", self.absolute_y),
            ("focus_target_x", self.focus_target_x),
            ("focus_target_y", self.focus_target_y),
        ] {
            if !value.is_finite() {
                bail!("params.{label} must be finite");
            }
        }
        if self.bloom_quality == 0 || self.bloom_quality > 16 {
            bail!(
                "params.bloom_quality must be in [1, 16], got {}",
                self.bloom_quality
            );
        }
        Ok(())
    }

    /// Merge a map of snake_case field overrides on top of `self`, then validate.
    pub fn with_overrides(&self, overrides: &BTreeMap<String, Value>) -> Result<Self> {
        if overrides.is_empty() {
            return Ok(self.clone());
        }
        let mut merged = serde_json::to_value(self).context("failed to serialize params")?;
        let object = merged
            .as_object_mut()
            .ok_or_else(|| anyhow!("params did not serialize to an object"))?;
        for (key, value) in overrides {
            if !object.contains_key(key) {
                bail!("unknown param '{key}'");
            }
            object.insert(key.clone(), value.clone());
        }
        let params: Params = serde_json::from_value(merged).context("invalid param override")?;
        params.validate()?;
        Ok(params)
    }

    pub fn get(&self, field: ParamField) -> f32 {
        match field {
            ParamField::Zoom => self.zoom,
            ParamField::FocusStrength => self.focus_strength,
            ParamField::FocusTargetX => self.focus_target_x,
            ParamField::FocusTargetY => self.focus_target_y,
            ParamField::Scale => self.scale,
            ParamField::Brightness => self.brightness,
            ParamField::Saturation => self.saturation,
            ParamField::Exposure => self.exposure,
            ParamField::BloomStrength => self.bloom_strength,
            ParamField::GlareOpacity => self.glare_opacity,
        }
    }

    pub fn set(&mut self, field: ParamField, value: f32) {
        let slot = match field {
            ParamField::Zoom => &mut self.zoom,
            ParamField::FocusStrength => &mut self.focus_strength,
            ParamField::FocusTargetX => &mut self.focus_target_x,
            ParamField::FocusTargetY => &mut self.focus_target_y,
            ParamField::Scale => &mut self.scale,
            ParamField::Brightness => &mut self.brightness,
            ParamField::Saturation => &mut self.saturation,
            ParamField::Exposure => &mut self.exposure,
            ParamField::BloomStrength => &mut self.bloom_strength,
            ParamField::GlareOpacity => &mut self.glare_opacity,
        };
        *slot = value;
    }

    /// Line height derived from font size plus the configured offset.
    pub fn line_height(&self) -> f32 {
        (self.font_size * LINE_HEIGHT_RATIO).round() + self.line_height_offset
    }
}

pub const LINE_HEIGHT_RATIO: f32 = 1.24;

/// Display (offscreen) surface size for a viewport and downscale factor.
pub fn display_size(view_w: u32, view_h: u32, downscale: f32) -> (u32, u32) {
    let downscale = if downscale > 0.0 { downscale } else { 1.0 };
    (
        (view_w as f32 / downscale).ceil() as u32,
        (view_h as f32 / downscale).ceil() as u32,
    )
}

/// Numeric fields that tweens may own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamField {
    Zoom,
    FocusStrength,
    FocusTargetX,
    FocusTargetY,
    Scale,
    Brightness,
    Saturation,
    Exposure,
    BloomStrength,
    GlareOpacity,
}

/// A single `key=value` override from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamOverride {
    pub key: String,
    pub value: Value,
}

impl ParamOverride {
    pub fn parse(raw: &str) -> Result<Self> {
        let (key, value) = raw
            .split_once('=')
            .ok_or_else(|| anyhow!("override '{raw}' must look like key=value"))?;
        let key = key.trim();
        if key.is_empty() {
            bail!("override '{raw}' has an empty key");
        }
        let value = value.trim();
        let parsed: Value = serde_yaml::from_str(value)
            .with_context(|| format!("override '{key}' has an unparseable value '{value}'"))?;
        Ok(Self {
            key: key.to_owned(),
            value: parsed,
        })
    }
}

/// Load a YAML or JSON file of param overrides (a flat map of field → value).
pub fn load_param_overrides(path: &Path) -> Result<BTreeMap<String, Value>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read params file {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let map = if is_json {
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse params JSON {}", path.display()))?
    } else {
        serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse params YAML {}", path.display()))?
    };
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ThemeMode;

    #[test]
    fn defaults_validate() {
        Params::default().validate().expect("defaults should be valid");
        Params::for_theme(&Theme::new(ThemeMode::Light))
            .validate()
            .expect("light defaults should be valid");
    }

    #[test]
    fn override_updates_known_field() {
        let mut overrides = BTreeMap::new();
        overrides.insert("bloom_strength".to_owned(), Value::from(3.5));
        overrides.insert("lcd_enabled".to_owned(), Value::from(false));
        let params = Params::default().with_overrides(&overrides).unwrap();
        assert_eq!(params.bloom_strength, 3.5);
        assert!(!params.lcd_enabled);
    }

    #[test]
    fn override_rejects_unknown_field() {
        let mut overrides = BTreeMap::new();
        overrides.insert("warp_drive".to_owned(), Value::from(1));
        let error = Params::default().with_overrides(&overrides).unwrap_err();
        assert!(error.to_string().contains("unknown param 'warp_drive'"));
    }

    #[test]
    fn override_rejects_out_of_range_value() {
        let mut overrides = BTreeMap::new();
        overrides.insert("focus_strength".to_owned(), Value::from(2.0));
        let error = Params::default().with_overrides(&overrides).unwrap_err();
        assert!(error.to_string().contains("focus_strength"));
    }

    #[test]
    fn override_parses_scalar_types() {
        let float = ParamOverride::parse("zoom=1.25").unwrap();
        assert_eq!(float.value, Value::from(1.25));
        let boolean = ParamOverride::parse("bloom_enabled=false").unwrap();
        assert_eq!(boolean.value, Value::from(false));
        let color = ParamOverride::parse("bg_color=\"#101010\"").unwrap();
        assert_eq!(color.value, Value::from("#101010"));
        assert!(ParamOverride::parse("zoom").is_err());
        assert!(ParamOverride::parse("=1").is_err());
    }

    #[test]
    fn color_overrides_round_trip_through_hex() {
        let mut overrides = BTreeMap::new();
        overrides.insert("color_verb".to_owned(), Value::from("#123456"));
        let params = Params::default().with_overrides(&overrides).unwrap();
        assert_eq!(params.color_verb.to_hex(), "#123456");
    }

    #[test]
    fn field_accessors_cover_every_tweenable_field() {
        let mut params = Params::default();
        for field in [
            ParamField::Zoom,
            ParamField::FocusStrength,
            ParamField::FocusTargetX,
            ParamField::FocusTargetY,
            ParamField::Scale,
            ParamField::Brightness,
            ParamField::Saturation,
            ParamField::Exposure,
            ParamField::BloomStrength,
            ParamField::GlareOpacity,
        ] {
            params.set(field, 0.42);
            assert_eq!(params.get(field), 0.42, "{field:?}");
        }
    }

    #[test]
    fn display_size_rounds_up() {
        assert_eq!(display_size(101, 51, 0.5), (202, 102));
        assert_eq!(display_size(101, 51, 2.0), (51, 26));
    }

    #[test]
    fn line_height_uses_ratio_and_offset() {
        let params = Params::default();
        assert_eq!(params.line_height(), (48.0_f32 * 1.24).round() + 4.0);
    }
}
