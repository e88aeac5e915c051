//! Light/dark palette context.
//!
//! A [`Theme`] is derived once from a [`ThemeMode`] and handed explicitly to
//! scene construction and the post stack. Switching themes builds a new value
//! instead of mutating shared palette state.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const BLACK: Color = Color([0, 0, 0]);
    pub const WHITE: Color = Color([255, 255, 255]);

    pub const fn from_u32(value: u32) -> Self {
        Self([
            ((value >> 16) & 0xff) as u8,
            ((value >> 8) & 0xff) as u8,
            (value & 0xff) as u8,
        ])
    }

    pub fn to_u32(self) -> u32 {
        (u32::from(self.0[0]) << 16) | (u32::from(self.0[1]) << 8) | u32::from(self.0[2])
    }

    pub fn parse_hex(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix('#')
            .ok_or_else(|| anyhow!("color '{trimmed}' must start with '#'"))?;
        if digits.len() != 6 {
            bail!("color '{trimmed}' must have six hex digits");
        }
        let value = u32::from_str_radix(digits, 16)
            .map_err(|error| anyhow!("invalid color '{trimmed}': {error}"))?;
        Ok(Self::from_u32(value))
    }

    pub fn to_hex(self) -> String {
        format!("#{:06x}", self.to_u32())
    }

    /// Linear blend toward `other`; `t` is clamped to `[0, 1]`.
    pub fn mix(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mut out = [0_u8; 3];
        for (channel, slot) in out.iter_mut().enumerate() {
            let a = f32::from(self.0[channel]);
            let b = f32::from(other.0[channel]);
            *slot = (a + (b - a) * t).round() as u8;
        }
        Color(out)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        Self::parse_hex(raw)
    }
}

impl TryFrom<String> for Color {
    type Error = anyhow::Error;

    fn try_from(raw: String) -> Result<Self> {
        Self::parse_hex(&raw)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    pub fn is_light(self) -> bool {
        matches!(self, Self::Light)
    }
}

impl FromStr for ThemeMode {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            other => bail!("unknown theme '{other}'. Supported: dark, light"),
        }
    }
}

/// Semantic colour slot for generated lines and chrome. Resolved through the
/// active [`Theme`] at draw time so a theme switch recolours existing rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Border,
    Dim,
    LineNum,
    Tool,
    Path,
    Ok,
    Warn,
    Error,
    Prompt,
    Accent,
    Suggestion,
    Active,
    /// Plain tool output.
    Output,
    /// Spacer line painted in the background colour.
    Blank,
    Verb,
    Ellipsis,
    Highlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub border: Color,
    pub dim: Color,
    pub line_num: Color,
    pub tool: Color,
    pub path: Color,
    pub ok: Color,
    pub warn: Color,
    pub error: Color,
    pub prompt: Color,
    pub accent: Color,
    pub suggestion: Color,
    pub active: Color,
    pub dead_pixel: Color,
    pub dead_pixel_red: Color,
    pub dead_pixel_blue: Color,
    pub dead_pixel_green: Color,
}

const DARK_PALETTE: Palette = Palette {
    border: Color::from_u32(0x30363d),
    dim: Color::from_u32(0x6e7681),
    line_num: Color::from_u32(0x484f58),
    tool: Color::from_u32(0x8b949e),
    path: Color::from_u32(0xc9d1d9),
    ok: Color::from_u32(0x4ade80),
    warn: Color::from_u32(0xd29922),
    error: Color::from_u32(0xf85149),
    prompt: Color::from_u32(0xbc8cff),
    accent: Color::from_u32(0x79c0ff),
    suggestion: Color::from_u32(0x555555),
    active: Color::from_u32(0xffffff),
    dead_pixel: Color::from_u32(0x0a0c10),
    dead_pixel_red: Color::from_u32(0x3a0808),
    dead_pixel_blue: Color::from_u32(0x08083a),
    dead_pixel_green: Color::from_u32(0x083a08),
};

const LIGHT_PALETTE: Palette = Palette {
    border: Color::from_u32(0xd0d7de),
    dim: Color::from_u32(0x6e7781),
    line_num: Color::from_u32(0x9ca3af),
    tool: Color::from_u32(0x57606a),
    path: Color::from_u32(0x24292f),
    ok: Color::from_u32(0x22c55e),
    warn: Color::from_u32(0xd97706),
    error: Color::from_u32(0xdc2626),
    prompt: Color::from_u32(0x7c3aed),
    accent: Color::from_u32(0x0969da),
    suggestion: Color::from_u32(0x8b8b8b),
    active: Color::from_u32(0x000000),
    dead_pixel: Color::from_u32(0xd0d0d0),
    dead_pixel_red: Color::from_u32(0xe8a0a0),
    dead_pixel_blue: Color::from_u32(0xa0a0e8),
    dead_pixel_green: Color::from_u32(0xa0e8a0),
};

/// Theme-dependent defaults for the colour knobs in the parameter store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeColors {
    pub verb: Color,
    pub ellipsis: Color,
    pub meta: Color,
    pub background: Color,
    pub highlight: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub mode: ThemeMode,
    pub palette: Palette,
    pub colors: ThemeColors,
}

impl Theme {
    pub fn new(mode: ThemeMode) -> Self {
        let (palette, colors) = match mode {
            ThemeMode::Dark => (
                DARK_PALETTE,
                ThemeColors {
                    verb: Color::from_u32(0xd78787),
                    ellipsis: Color::from_u32(0xa2a2a2),
                    meta: Color::from_u32(0x555555),
                    background: Color::from_u32(0x0d1117),
                    highlight: Color::from_u32(0x56533e),
                },
            ),
            ThemeMode::Light => (
                LIGHT_PALETTE,
                ThemeColors {
                    verb: Color::from_u32(0xb45454),
                    ellipsis: Color::from_u32(0x737373),
                    meta: Color::from_u32(0x8b8b8b),
                    background: Color::from_u32(0xf5f5f5),
                    highlight: Color::from_u32(0xe0d9c2),
                },
            ),
        };
        Self {
            mode,
            palette,
            colors,
        }
    }

    pub fn is_light(&self) -> bool {
        self.mode.is_light()
    }

    /// Palette lookup for a semantic tone. Tones bound to parameter-store
    /// colours (verb, ellipsis, highlight, background) read the supplied
    /// parameter values so devtools-style overrides take effect.
    pub fn resolve(&self, tone: Tone, knobs: &ToneKnobs) -> Color {
        let p = &self.palette;
        match tone {
            Tone::Border => p.border,
            Tone::Dim => p.dim,
            Tone::LineNum => p.line_num,
            Tone::Tool => p.tool,
            Tone::Path => p.path,
            Tone::Ok => p.ok,
            Tone::Warn => p.warn,
            Tone::Error => p.error,
            Tone::Prompt => p.prompt,
            Tone::Accent => p.accent,
            Tone::Suggestion => p.suggestion,
            Tone::Active => p.active,
            Tone::Output => p.dim,
            Tone::Blank => knobs.background,
            Tone::Verb => knobs.verb,
            Tone::Ellipsis => knobs.ellipsis,
            Tone::Highlight => knobs.highlight,
        }
    }
}

/// Colour knobs from the parameter store that tones may resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneKnobs {
    pub verb: Color,
    pub ellipsis: Color,
    pub highlight: Color,
    pub background: Color,
}
