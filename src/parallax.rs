//! Pointer parallax: a low-pass filtered translate/zoom offset layered on top
//! of the tweened camera parameters.

use crate::params::Params;

pub const TRANSLATE_RANGE: f32 = 1.2;
pub const ZOOM_FACTOR: f32 = 0.016;
pub const LERP_FACTOR: f32 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parallax {
    target_tx: f32,
    target_ty: f32,
    target_zoom: f32,
    current_tx: f32,
    current_ty: f32,
    current_zoom: f32,
}

impl Default for Parallax {
    fn default() -> Self {
        Self {
            target_tx: 0.0,
            target_ty: 0.0,
            target_zoom: 1.0,
            current_tx: 0.0,
            current_ty: 0.0,
            current_zoom: 1.0,
        }
    }
}

impl Parallax {
    /// `x`/`y` are the pointer position normalised to the viewport, 0..1.
    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        let (dx, dy) = (x - 0.5, y - 0.5);
        self.target_tx = dx * -TRANSLATE_RANGE;
        self.target_ty = dy * -TRANSLATE_RANGE;
        self.target_zoom = 1.0 - dx.hypot(dy) * ZOOM_FACTOR;
    }

    /// One frame of smoothing, written into the pointer fields of `params`.
    /// The tweened fields are never touched.
    pub fn step(&mut self, params: &mut Params) {
        self.current_tx += (self.target_tx - self.current_tx) * LERP_FACTOR;
        self.current_ty += (self.target_ty - self.current_ty) * LERP_FACTOR;
        self.current_zoom += (self.target_zoom - self.current_zoom) * LERP_FACTOR;
        params.mouse_translate_x = self.current_tx;
        params.mouse_translate_y = self.current_ty;
        params.mouse_zoom = self.current_zoom;
    }

    pub fn current(&self) -> (f32, f32, f32) {
        (self.current_tx, self.current_ty, self.current_zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centred_pointer_is_neutral() {
        let mut parallax = Parallax::default();
        let mut params = Params::default();
        parallax.pointer_moved(0.5, 0.5);
        parallax.step(&mut params);
        assert_eq!(parallax.current(), (0.0, 0.0, 1.0));
    }

    #[test]
    fn offsets_converge_slowly_toward_target() {
        let mut parallax = Parallax::default();
        let mut params = Params::default();
        let zoom_before = params.zoom;
        parallax.pointer_moved(1.0, 0.0);

        parallax.step(&mut params);
        let first = params.mouse_translate_x;
        assert!((first - (-0.6 * LERP_FACTOR)).abs() < 1e-6);

        for _ in 0..2_000 {
            parallax.step(&mut params);
        }
        assert!((params.mouse_translate_x + 0.6).abs() < 1e-3);
        assert!((params.mouse_translate_y - 0.6).abs() < 1e-3);
        assert!(params.mouse_zoom < 1.0);
        assert_eq!(params.zoom, zoom_before);
    }
}
