//! verbscope: a pseudo-3D CRT terminal animation engine.
//!
//! A fake coding-agent terminal is typeset onto a display surface, warped
//! through a curved-screen mesh and run through a post-process chain. A small
//! state machine drives boot, browse, demo and post-demo phases; every
//! animated knob lives in one [`params::Params`] store that tweens and
//! controllers write and the renderer reads.
//!
//! [`session::Session`] owns everything and is driven by host input and a
//! per-frame callback. The [`compositor`] renders headlessly into a
//! `tiny_skia::Pixmap`.

pub mod boot;
pub mod brightness;
pub mod camera;
pub mod compositor;
pub mod config;
pub mod content;
pub mod easing;
pub mod effects;
pub mod esc_skip;
pub mod generator;
pub mod glyphs;
pub mod header;
pub mod host;
pub mod input;
pub mod layout;
pub mod logging;
pub mod machine;
pub mod mobile;
pub mod params;
pub mod parallax;
pub mod pool;
pub mod scene;
pub mod scheduler;
pub mod script;
pub mod scroll_zoom;
pub mod session;
pub mod theme;
pub mod ticker;
pub mod tween;
pub mod zoom;
