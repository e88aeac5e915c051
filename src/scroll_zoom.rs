//! Wheel zoom with spring-back.
//!
//! Wheel input in the zoom-in direction raises a multiplier (capped) about
//! the cursor. Once input has been quiet for [`HOLD_MS`] a damped spring
//! pulls the multiplier back to 1, stepping once per frame, and snaps to
//! exactly 1 when both displacement and velocity fall under the rest
//! threshold.

use tracing::trace;

use crate::params::Params;

pub const MAX_ZOOM: f32 = 2.5;
pub const HOLD_MS: u64 = 600;
pub const SCROLL_SENSITIVITY: f32 = 0.0015;
pub const REST_THRESHOLD: f32 = 0.002;
pub const SPRING_STIFFNESS: f32 = 120.0;
pub const SPRING_DAMPING: f32 = 18.0;
/// Fixed spring step; one per frame.
pub const SPRING_DT: f32 = 1.0 / 60.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollZoom {
    zoom: f32,
    velocity: f32,
    pivot: (f32, f32),
    last_input_ms: Option<u64>,
    springing: bool,
    enabled: bool,
}

impl Default for ScrollZoom {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            velocity: 0.0,
            pivot: (0.0, 0.0),
            last_input_ms: None,
            springing: false,
            enabled: true,
        }
    }
}

impl ScrollZoom {
    /// `delta_y` follows wheel conventions: negative scrolls up and zooms in.
    /// `x`/`y` is the cursor in view pixels.
    pub fn wheel(&mut self, delta_y: f32, x: f32, y: f32, now_ms: u64) {
        if !self.enabled {
            return;
        }
        self.springing = false;
        self.velocity = 0.0;
        let delta = -delta_y * SCROLL_SENSITIVITY;
        if delta > 0.0 {
            self.zoom = (self.zoom + delta).min(MAX_ZOOM);
            self.pivot = (x, y);
        }
        self.last_input_ms = Some(now_ms);
    }

    /// Advance one frame and publish the multiplier into `params`.
    /// Returns whether the multiplier is still moving.
    pub fn step(&mut self, now_ms: u64, params: &mut Params) -> bool {
        if let Some(last) = self.last_input_ms {
            if now_ms.saturating_sub(last) >= HOLD_MS {
                self.last_input_ms = None;
                self.springing = self.zoom != 1.0;
            }
        }
        if self.springing {
            let displacement = self.zoom - 1.0;
            let accel = -SPRING_STIFFNESS * displacement - SPRING_DAMPING * self.velocity;
            self.velocity += accel * SPRING_DT;
            self.zoom += self.velocity * SPRING_DT;
            if (self.zoom - 1.0).abs() < REST_THRESHOLD && self.velocity.abs() < REST_THRESHOLD {
                self.zoom = 1.0;
                self.velocity = 0.0;
                self.springing = false;
                trace!("scroll zoom at rest");
            }
        }
        params.scroll_zoom = self.zoom;
        self.springing
    }

    /// Stop reacting to wheel input and drop any zoom immediately.
    pub fn disable(&mut self, params: &mut Params) {
        *self = Self {
            enabled: false,
            ..Self::default()
        };
        params.scroll_zoom = 1.0;
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn pivot(&self) -> (f32, f32) {
        self.pivot
    }

    pub fn is_springing(&self) -> bool {
        self.springing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_up_zooms_about_cursor_and_caps() {
        let mut ctl = ScrollZoom::default();
        ctl.wheel(-100.0, 40.0, 30.0, 0);
        assert!((ctl.zoom() - 1.15).abs() < 1e-6);
        assert_eq!(ctl.pivot(), (40.0, 30.0));
        for _ in 0..50 {
            ctl.wheel(-500.0, 40.0, 30.0, 0);
        }
        assert_eq!(ctl.zoom(), MAX_ZOOM);
    }

    #[test]
    fn wheel_down_never_zooms_out() {
        let mut ctl = ScrollZoom::default();
        ctl.wheel(300.0, 10.0, 10.0, 0);
        assert_eq!(ctl.zoom(), 1.0);
        assert_eq!(ctl.pivot(), (0.0, 0.0));
    }

    #[test]
    fn spring_waits_for_the_debounce_window() {
        let mut ctl = ScrollZoom::default();
        let mut params = Params::default();
        ctl.wheel(-200.0, 0.0, 0.0, 1_000);
        assert!(!ctl.step(1_000 + HOLD_MS - 1, &mut params));
        assert!((params.scroll_zoom - 1.3).abs() < 1e-6);
        assert!(ctl.step(1_000 + HOLD_MS, &mut params));
        assert!(params.scroll_zoom < 1.3);
    }

    #[test]
    fn spring_settles_exactly_at_one_and_stops() {
        let mut ctl = ScrollZoom::default();
        let mut params = Params::default();
        ctl.wheel(-1_000.0, 0.0, 0.0, 0);
        let mut now = HOLD_MS;
        let mut frames = 0;
        while ctl.step(now, &mut params) {
            now += 16;
            frames += 1;
            assert!(frames < 600, "spring never settled");
        }
        assert_eq!(params.scroll_zoom, 1.0);
        assert_eq!(ctl.velocity(), 0.0);
        assert!(!ctl.step(now + 16, &mut params));
        assert_eq!(ctl.zoom(), 1.0);
    }

    #[test]
    fn new_input_interrupts_spring() {
        let mut ctl = ScrollZoom::default();
        let mut params = Params::default();
        ctl.wheel(-400.0, 0.0, 0.0, 0);
        ctl.step(HOLD_MS, &mut params);
        assert!(ctl.is_springing());
        ctl.wheel(-10.0, 0.0, 0.0, HOLD_MS + 16);
        assert!(!ctl.is_springing());
        assert_eq!(ctl.velocity(), 0.0);
    }

    #[test]
    fn disabled_controller_ignores_wheel() {
        let mut ctl = ScrollZoom::default();
        let mut params = Params::default();
        ctl.wheel(-400.0, 0.0, 0.0, 0);
        ctl.disable(&mut params);
        ctl.wheel(-400.0, 0.0, 0.0, 10);
        assert_eq!(ctl.zoom(), 1.0);
        assert_eq!(params.scroll_zoom, 1.0);
    }
}
