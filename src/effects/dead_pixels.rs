//! Static dead and stuck pixel overlay, regenerated on every resize.
//!
//! Dots are snapped to the LCD grid so they line up with the sub-pixel mask.
//! Most darken the content they sit on; the stuck ones add red regardless
//! of what is underneath.

use rand::Rng;
use tiny_skia::Pixmap;

use super::lcd::LCD_GRID;
use crate::theme::{Color, Palette};

pub const DEAD_PIXEL_COUNT: usize = 12;
const STUCK_RED: [usize; 2] = [4, 9];
const STUCK_COLOR: Color = Color([0xff, 0x00, 0x00]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DotBlend {
    Multiply,
    Add,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dot {
    pub x: u32,
    pub y: u32,
    pub color: Color,
    pub blend: DotBlend,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeadPixelLayer {
    dots: Vec<Dot>,
}

impl DeadPixelLayer {
    /// Scatter dots over the central band of a `w`×`h` display surface.
    pub fn generate<R: Rng + ?Sized>(w: u32, h: u32, palette: &Palette, rng: &mut R) -> Self {
        let snap = |v: f32| (v / LCD_GRID as f32).floor() as u32 * LCD_GRID;
        let dots = (0..DEAD_PIXEL_COUNT)
            .map(|index| {
                let x = snap((0.15 + rng.gen::<f32>() * 0.7) * w as f32);
                let y = snap((0.1 + rng.gen::<f32>() * 0.6) * h as f32);
                let (color, blend) = if STUCK_RED.contains(&index) {
                    (STUCK_COLOR, DotBlend::Add)
                } else {
                    let color = match index {
                        3 => palette.dead_pixel_red,
                        7 => palette.dead_pixel_blue,
                        10 => palette.dead_pixel_green,
                        _ => palette.dead_pixel,
                    };
                    (color, DotBlend::Multiply)
                };
                Dot { x, y, color, blend }
            })
            .collect();
        Self { dots }
    }

    pub fn dots(&self) -> &[Dot] {
        &self.dots
    }

    pub fn apply(&self, pixmap: &mut Pixmap) {
        let (width, height) = (pixmap.width(), pixmap.height());
        let data = pixmap.data_mut();
        for dot in &self.dots {
            for y in dot.y..(dot.y + LCD_GRID).min(height) {
                for x in dot.x..(dot.x + LCD_GRID).min(width) {
                    let at = ((y * width + x) * 4) as usize;
                    let alpha = data[at + 3] as u32;
                    for (channel, &tint) in dot.color.0.iter().enumerate() {
                        let base = data[at + channel] as u32;
                        let tint = tint as u32;
                        let value = match dot.blend {
                            DotBlend::Multiply => (base * tint + 127) / 255,
                            DotBlend::Add => (base + tint).min(alpha),
                        };
                        data[at + channel] = value as u8;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::{Theme, ThemeMode};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn layer(w: u32, h: u32) -> DeadPixelLayer {
        let theme = Theme::new(ThemeMode::Dark);
        DeadPixelLayer::generate(w, h, &theme.palette, &mut StdRng::seed_from_u64(3))
    }

    #[test]
    fn dots_are_grid_aligned_inside_the_central_band() {
        let layer = layer(400, 300);
        assert_eq!(layer.dots().len(), DEAD_PIXEL_COUNT);
        for dot in layer.dots() {
            assert_eq!(dot.x % LCD_GRID, 0);
            assert_eq!(dot.y % LCD_GRID, 0);
            assert!(dot.x >= 56 && dot.x <= 340, "x = {}", dot.x);
            assert!(dot.y >= 28 && dot.y <= 210, "y = {}", dot.y);
        }
        let stuck: Vec<_> = layer
            .dots()
            .iter()
            .enumerate()
            .filter(|(_, dot)| dot.blend == DotBlend::Add)
            .map(|(index, _)| index)
            .collect();
        assert_eq!(stuck, vec![4, 9]);
    }

    #[test]
    fn stuck_dots_add_and_dead_dots_darken() {
        let layer = DeadPixelLayer {
            dots: vec![
                Dot {
                    x: 0,
                    y: 0,
                    color: STUCK_COLOR,
                    blend: DotBlend::Add,
                },
                Dot {
                    x: 8,
                    y: 0,
                    color: Color([0x80, 0x80, 0x80]),
                    blend: DotBlend::Multiply,
                },
            ],
        };
        let mut pixmap = Pixmap::new(16, 8).expect("pixmap");
        pixmap.fill(tiny_skia::Color::BLACK);
        layer.apply(&mut pixmap);
        let px = pixmap.pixel(1, 1).expect("in bounds");
        assert_eq!((px.red(), px.green()), (255, 0));

        pixmap.fill(tiny_skia::Color::WHITE);
        layer.apply(&mut pixmap);
        assert_eq!(pixmap.pixel(9, 1).expect("in bounds").red(), 128);
        assert_eq!(pixmap.pixel(12, 1).expect("in bounds").red(), 255);
    }
}
