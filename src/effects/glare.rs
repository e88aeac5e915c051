//! Ambient glare: a soft radial highlight near the top-right corner,
//! screen-blended over the final frame.

use tiny_skia::{
    BlendMode, Color, FilterQuality, GradientStop, Paint, Pixmap, PixmapPaint, Point, Rect,
    RadialGradient, SpreadMode, Transform,
};

#[derive(Debug, Clone)]
pub struct Glare {
    sprite: Pixmap,
    x: f32,
    y: f32,
}

impl Glare {
    /// Sized from the larger viewport side; `None` for a degenerate viewport.
    pub fn new(view_w: u32, view_h: u32) -> Option<Self> {
        let vmax = view_w.max(view_h) as f32;
        let gw = (vmax * 0.6).round() as u32;
        let gh = (vmax * 0.4).round() as u32;
        let mut sprite = Pixmap::new(gw, gh)?;
        let (cx, cy) = (gw as f32 / 2.0, gh as f32 / 2.0);
        let radius = gw.max(gh) as f32 * 0.7;
        let shader = RadialGradient::new(
            Point::from_xy(cx, cy),
            Point::from_xy(cx, cy),
            radius,
            vec![
                GradientStop::new(0.0, Color::from_rgba8(255, 255, 255, 20)),
                GradientStop::new(0.4, Color::from_rgba8(255, 255, 255, 5)),
                GradientStop::new(0.7, Color::from_rgba8(255, 255, 255, 0)),
            ],
            SpreadMode::Pad,
            Transform::identity(),
        )?;
        let paint = Paint {
            shader,
            anti_alias: false,
            ..Paint::default()
        };
        let rect = Rect::from_xywh(0.0, 0.0, gw as f32, gh as f32)?;
        sprite.fill_rect(rect, &paint, Transform::identity(), None);
        Some(Self {
            x: view_w as f32 - gw as f32 * 0.4,
            y: -(view_h as f32) * 0.1,
            sprite,
        })
    }

    pub fn draw(&self, target: &mut Pixmap, opacity: f32) {
        if opacity <= 0.0 {
            return;
        }
        let paint = PixmapPaint {
            opacity: opacity.min(1.0),
            blend_mode: BlendMode::Screen,
            quality: FilterQuality::Bilinear,
        };
        target.draw_pixmap(
            0,
            0,
            self.sprite.as_ref(),
            &paint,
            Transform::from_translate(self.x, self.y),
            None,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glare_brightens_the_top_right_only() {
        let glare = Glare::new(200, 100).expect("glare");
        let mut frame = Pixmap::new(200, 100).expect("pixmap");
        frame.fill(Color::BLACK);
        glare.draw(&mut frame, 1.0);
        assert!(frame.pixel(199, 2).expect("in bounds").red() > 0);
        assert_eq!(frame.pixel(0, 99).expect("in bounds").red(), 0);
    }

    #[test]
    fn zero_opacity_draws_nothing() {
        let glare = Glare::new(200, 100).expect("glare");
        let mut frame = Pixmap::new(200, 100).expect("pixmap");
        frame.fill(Color::BLACK);
        glare.draw(&mut frame, 0.0);
        assert!(frame.data().chunks_exact(4).all(|px| px[0] == 0));
    }
}
