//! Glyph rasterisation for the software compositor.
//!
//! With a TTF/OTF supplied, glyphs come from fontdue and are cached per
//! raster config. Without one, a built-in monospace block face draws box
//! drawing, block elements and shades exactly, and greeks every other
//! character into an ink bar sized by its letter class.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use fontdue::layout::{CoordinateSystem, GlyphRasterConfig, Layout, LayoutSettings, TextStyle};
use fontdue::{Font, FontSettings};
use tiny_skia::Pixmap;

/// Advance width of the block face relative to the font size.
pub const BLOCK_ADVANCE_RATIO: f32 = 0.6;

#[derive(Debug, Clone)]
struct GlyphBitmap {
    width: usize,
    height: usize,
    bitmap: Vec<u8>,
}

enum Face {
    Font {
        font: Box<Font>,
        cache: HashMap<GlyphRasterConfig, GlyphBitmap>,
    },
    Blocks {
        cache: HashMap<(char, u32), GlyphBitmap>,
    },
}

pub struct GlyphCache {
    face: Face,
}

impl std::fmt::Debug for GlyphCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.face {
            Face::Font { .. } => "font",
            Face::Blocks { .. } => "blocks",
        };
        f.debug_struct("GlyphCache").field("face", &kind).finish()
    }
}

impl GlyphCache {
    pub fn blocks() -> Self {
        Self {
            face: Face::Blocks {
                cache: HashMap::new(),
            },
        }
    }

    pub fn from_font_file(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("failed to read font file {}", path.display()))?;
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|error| anyhow!("failed to parse font {}: {error}", path.display()))?;
        Ok(Self {
            face: Face::Font {
                font: Box::new(font),
                cache: HashMap::new(),
            },
        })
    }

    pub fn is_block_face(&self) -> bool {
        matches!(self.face, Face::Blocks { .. })
    }

    /// Advance of `M` at `font_size`, used as the layout cell width.
    pub fn char_width(&self, font_size: f32) -> f32 {
        match &self.face {
            Face::Font { font, .. } => font.metrics('M', font_size).advance_width,
            Face::Blocks { .. } => block_advance(font_size) as f32,
        }
    }

    /// Draw `text` with its line box top at (`x`, `y`). `color` is straight
    /// RGBA; alpha scales glyph coverage.
    pub fn draw_text(
        &mut self,
        pixmap: &mut Pixmap,
        x: f32,
        y: f32,
        text: &str,
        font_size: f32,
        color: [u8; 4],
    ) {
        if text.is_empty() || color[3] == 0 || font_size <= 0.0 {
            return;
        }
        match &mut self.face {
            Face::Font { font, cache } => {
                let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
                layout.reset(&LayoutSettings {
                    x,
                    y,
                    ..LayoutSettings::default()
                });
                layout.append(&[&**font], &TextStyle::new(text, font_size, 0));
                for glyph in layout.glyphs() {
                    if glyph.width == 0 || glyph.height == 0 {
                        continue;
                    }
                    let bitmap = cache.entry(glyph.key).or_insert_with(|| {
                        let (_, bitmap) = font.rasterize_config(glyph.key);
                        GlyphBitmap {
                            width: glyph.width,
                            height: glyph.height,
                            bitmap,
                        }
                    });
                    blend_glyph(
                        pixmap,
                        glyph.x.round() as i32,
                        glyph.y.round() as i32,
                        bitmap,
                        color,
                    );
                }
            }
            Face::Blocks { cache } => {
                let size = font_size.round().max(1.0) as u32;
                let advance = block_advance(font_size) as i32;
                let (ox, oy) = (x.round() as i32, y.round() as i32);
                for (index, ch) in text.chars().enumerate() {
                    if ch == ' ' {
                        continue;
                    }
                    let bitmap = cache
                        .entry((ch, size))
                        .or_insert_with(|| block_glyph(ch, size));
                    blend_glyph(pixmap, ox + index as i32 * advance, oy, bitmap, color);
                }
            }
        }
    }
}

fn block_advance(font_size: f32) -> u32 {
    (font_size * BLOCK_ADVANCE_RATIO).round().max(1.0) as u32
}

/// Source-over blend of a coverage mask into a premultiplied pixmap.
fn blend_glyph(pixmap: &mut Pixmap, x: i32, y: i32, glyph: &GlyphBitmap, color: [u8; 4]) {
    let (width, height) = (pixmap.width() as i32, pixmap.height() as i32);
    let data = pixmap.data_mut();
    for row in 0..glyph.height {
        let py = y + row as i32;
        if py < 0 || py >= height {
            continue;
        }
        for col in 0..glyph.width {
            let px = x + col as i32;
            if px < 0 || px >= width {
                continue;
            }
            let mask = glyph.bitmap[row * glyph.width + col];
            if mask == 0 {
                continue;
            }
            let alpha = u32::from(mask) * u32::from(color[3]) / 255;
            let inv = 255 - alpha;
            let idx = ((py * width + px) * 4) as usize;
            for channel in 0..3 {
                let src = u32::from(color[channel]) * alpha / 255;
                let dst = u32::from(data[idx + channel]) * inv / 255;
                data[idx + channel] = (src + dst).min(255) as u8;
            }
            let dst_alpha = u32::from(data[idx + 3]) * inv / 255;
            data[idx + 3] = (alpha + dst_alpha).min(255) as u8;
        }
    }
}

/// Which edges of the cell a box-drawing character connects to.
#[derive(Clone, Copy, Default)]
struct Arms {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    double: bool,
}

fn box_arms(ch: char) -> Option<Arms> {
    let arms = |up, down, left, right, double| Arms {
        up,
        down,
        left,
        right,
        double,
    };
    Some(match ch {
        '─' => arms(false, false, true, true, false),
        '│' => arms(true, true, false, false, false),
        '┌' | '╭' => arms(false, true, false, true, false),
        '┐' | '╮' => arms(false, true, true, false, false),
        '└' | '╰' => arms(true, false, false, true, false),
        '┘' | '╯' => arms(true, false, true, false, false),
        '├' => arms(true, true, false, true, false),
        '┤' => arms(true, true, true, false, false),
        '┬' => arms(false, true, true, true, false),
        '┴' => arms(true, false, true, true, false),
        '┼' => arms(true, true, true, true, false),
        '═' => arms(false, false, true, true, true),
        '║' => arms(true, true, false, false, true),
        '╔' => arms(false, true, false, true, true),
        '╗' => arms(false, true, true, false, true),
        '╚' => arms(true, false, false, true, true),
        '╝' => arms(true, false, true, false, true),
        _ => return None,
    })
}

fn block_glyph(ch: char, size: u32) -> GlyphBitmap {
    let width = block_advance(size as f32) as usize;
    // Line box height matches the layout's line-height ratio closely enough
    // for box rows to join.
    let height = (size as f32 * 1.24).round().max(1.0) as usize;
    let mut bitmap = vec![0_u8; width * height];
    let mut fill = |x0: usize, y0: usize, x1: usize, y1: usize, value: u8| {
        for y in y0.min(height)..y1.min(height) {
            for x in x0.min(width)..x1.min(width) {
                bitmap[y * width + x] = bitmap[y * width + x].max(value);
            }
        }
    };

    let stroke = (size / 12).max(1) as usize;
    let (cx, cy) = (width / 2, height / 2);
    if let Some(arms) = box_arms(ch) {
        let offsets: &[isize] = if arms.double {
            &[-(stroke as isize) - 1, stroke as isize + 1]
        } else {
            &[0]
        };
        for &offset in offsets {
            let hx = (cx as isize + offset).max(0) as usize;
            let hy = (cy as isize + offset).max(0) as usize;
            let (x0, x1) = (hx.saturating_sub(stroke / 2), hx + stroke.div_ceil(2));
            let (y0, y1) = (hy.saturating_sub(stroke / 2), hy + stroke.div_ceil(2));
            if arms.up {
                fill(x0, 0, x1, y1, 255);
            }
            if arms.down {
                fill(x0, y0, x1, height, 255);
            }
            if arms.left {
                fill(0, y0, x1, y1, 255);
            }
            if arms.right {
                fill(x0, y0, width, y1, 255);
            }
        }
        return GlyphBitmap {
            width,
            height,
            bitmap,
        };
    }

    match ch {
        '█' => fill(0, 0, width, height, 255),
        '▀' => fill(0, 0, width, height / 2, 255),
        '▄' => fill(0, height / 2, width, height, 255),
        '▌' => fill(0, 0, width / 2, height, 255),
        '▐' => fill(width / 2, 0, width, height, 255),
        '░' => fill(0, 0, width, height, 64),
        '▒' => fill(0, 0, width, height, 128),
        '▓' => fill(0, 0, width, height, 192),
        _ => {
            // Greeked glyph: an ink bar whose vertical extent follows the
            // character's class.
            let top = height / 6;
            let baseline = height * 3 / 4;
            let x_height = height * 2 / 5;
            let (y0, y1) = if ch.is_ascii_lowercase() {
                let descends = matches!(ch, 'g' | 'j' | 'p' | 'q' | 'y');
                let ascends = matches!(ch, 'b' | 'd' | 'f' | 'h' | 'k' | 'l' | 't');
                (
                    if ascends { top } else { x_height },
                    if descends { height - height / 8 } else { baseline },
                )
            } else if ch.is_ascii_punctuation() || matches!(ch, '·' | '…' | '∙') {
                (baseline.saturating_sub(stroke * 2), baseline)
            } else {
                (top, baseline)
            };
            let inset = (width / 6).max(1);
            fill(inset, y0, width - inset, y1, 220);
        }
    }
    GlyphBitmap {
        width,
        height,
        bitmap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ink(pixmap: &Pixmap) -> usize {
        pixmap.data().chunks_exact(4).filter(|px| px[3] > 0).count()
    }

    #[test]
    fn block_face_advance_follows_font_size() {
        let glyphs = GlyphCache::blocks();
        assert_eq!(glyphs.char_width(20.0), 12.0);
        assert_eq!(glyphs.char_width(48.0), 29.0);
        assert!(glyphs.is_block_face());
    }

    #[test]
    fn spaces_draw_nothing_and_text_draws_ink() {
        let mut glyphs = GlyphCache::blocks();
        let mut pixmap = Pixmap::new(200, 40).expect("pixmap");
        glyphs.draw_text(&mut pixmap, 0.0, 0.0, "    ", 20.0, [255, 255, 255, 255]);
        assert_eq!(ink(&pixmap), 0);
        glyphs.draw_text(&mut pixmap, 0.0, 0.0, "Read", 20.0, [255, 255, 255, 255]);
        assert!(ink(&pixmap) > 0);
    }

    #[test]
    fn horizontal_rules_join_across_cells() {
        let mut glyphs = GlyphCache::blocks();
        let mut pixmap = Pixmap::new(60, 30).expect("pixmap");
        glyphs.draw_text(&mut pixmap, 0.0, 0.0, "─────", 20.0, [255, 0, 0, 255]);
        let row = 25 / 2;
        let lit = (0..60)
            .filter(|x| pixmap.pixel(*x, row).is_some_and(|px| px.alpha() > 0))
            .count();
        assert_eq!(lit, 60);
    }

    #[test]
    fn clipped_text_does_not_panic() {
        let mut glyphs = GlyphCache::blocks();
        let mut pixmap = Pixmap::new(10, 10).expect("pixmap");
        glyphs.draw_text(&mut pixmap, -15.0, -5.0, "████████", 20.0, [0, 255, 0, 128]);
        assert!(ink(&pixmap) > 0);
    }

    #[test]
    fn missing_font_file_reports_path() {
        let error = GlyphCache::from_font_file(Path::new("/nonexistent/face.ttf"))
            .expect_err("missing font");
        assert!(format!("{error:#}").contains("/nonexistent/face.ttf"));
    }
}
