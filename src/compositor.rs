//! Software compositor.
//!
//! Draws the scene into the padded display surface, runs the dead-pixel
//! overlay and the post stack over it, then texture-maps the display onto
//! the view through the camera mesh one triangle at a time. Breathing and
//! wheel zoom are applied to the projected vertices; glare goes on last.

use std::path::Path;

use anyhow::{Context, Result};
use image::{ImageFormat, RgbaImage};
use sha2::{Digest, Sha256};
use tiny_skia::{
    Color as SkColor, FillRule, FilterQuality, Paint, PathBuilder, Pattern, Pixmap, Rect,
    SpreadMode, Stroke, Transform,
};

use crate::brightness::{BrightnessBar, TOTAL_BLOCKS};
use crate::camera::Camera;
use crate::effects::Effects;
use crate::esc_skip::{EscPopup, LABEL as ESC_LABEL};
use crate::glyphs::GlyphCache;
use crate::params::Params;
use crate::scene::{Scene, ScrollRow, TextNode};
use crate::theme::{Color, Theme, Tone, ToneKnobs};

/// Everything one composite reads. Borrowed from the session for the call.
pub struct FrameView<'a> {
    pub scene: &'a Scene,
    pub params: &'a Params,
    pub theme: &'a Theme,
    pub effects: &'a Effects,
    pub camera: &'a Camera,
    pub ch_w: f32,
    pub line_height: f32,
    pub now_ms: u64,
    pub scroll_zoom: f32,
    pub scroll_pivot: (f32, f32),
    pub esc_progress: Option<f32>,
    pub brightness: &'a BrightnessBar,
}

#[derive(Debug)]
pub struct Compositor {
    glyphs: GlyphCache,
    display: Pixmap,
    view: Pixmap,
}

impl Compositor {
    pub fn new(glyphs: GlyphCache, view_w: u32, view_h: u32) -> Result<Self> {
        Ok(Self {
            glyphs,
            display: new_pixmap(1, 1)?,
            view: new_pixmap(view_w, view_h)?,
        })
    }

    pub fn glyphs(&self) -> &GlyphCache {
        &self.glyphs
    }

    pub fn resize(&mut self, view_w: u32, view_h: u32) -> Result<()> {
        if (self.view.width(), self.view.height()) != (view_w, view_h) {
            self.view = new_pixmap(view_w, view_h)?;
        }
        Ok(())
    }

    pub fn view_size(&self) -> (u32, u32) {
        (self.view.width(), self.view.height())
    }

    /// Composite one frame and return the finished view.
    pub fn render(&mut self, frame: &FrameView<'_>) -> Result<&Pixmap> {
        let (dw, dh) = frame.scene.surface_size();
        if (self.display.width(), self.display.height()) != (dw, dh) {
            self.display = new_pixmap(dw, dh)?;
        }
        let bg = sk_color(frame.params.bg_color, 1.0);
        self.display.fill(bg);

        self.draw_scene(frame);
        self.draw_brightness_bar(frame);
        if let Some(progress) = frame.esc_progress {
            self.draw_esc_popup(frame, progress);
        }

        if frame.effects.dead_pixels_visible {
            frame.effects.dead_pixels.apply(&mut self.display);
        }
        frame.effects.post.apply(&mut self.display);

        self.view.fill(bg);
        self.warp_display(frame);
        if let Some(glare) = &frame.effects.glare {
            glare.draw(&mut self.view, frame.effects.glare_opacity);
        }
        Ok(&self.view)
    }

    fn draw_scene(&mut self, frame: &FrameView<'_>) {
        let scene = frame.scene;
        let knobs = frame.params.tone_knobs();
        let alpha = (scene.tui_alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        if alpha == 0 {
            return;
        }
        let ox = scene.pad_x;
        let oy = scene.pad_y + scene.tui_offset_y;
        let font_size = frame.params.font_size;

        for row in &scene.scroll {
            match row {
                ScrollRow::Line(line) => {
                    if !line.visible || line.tone == Tone::Blank {
                        continue;
                    }
                    let color = rgba(frame.theme.resolve(line.tone, &knobs), alpha);
                    self.glyphs.draw_text(
                        &mut self.display,
                        ox + line.x,
                        oy + line.y,
                        &line.text,
                        line.font_size,
                        color,
                    );
                }
                ScrollRow::Header(header) => {
                    let mut x = ox + header.x;
                    for part in &header.parts {
                        let color = rgba(frame.theme.resolve(part.tone, &knobs), alpha);
                        self.glyphs
                            .draw_text(&mut self.display, x, oy + header.y, &part.text, font_size, color);
                        x += part.text.chars().count() as f32 * frame.ch_w;
                    }
                }
            }
        }

        for node in scene.nodes() {
            self.draw_node(node, ox, oy, font_size, frame, &knobs, alpha);
        }
    }

    fn draw_node(
        &mut self,
        node: &TextNode,
        ox: f32,
        oy: f32,
        font_size: f32,
        frame: &FrameView<'_>,
        knobs: &ToneKnobs,
        alpha: u8,
    ) {
        if !node.visible || node.text.is_empty() {
            return;
        }
        let color = rgba(frame.theme.resolve(node.tone, knobs), alpha);
        for (index, line) in node.text.lines().enumerate() {
            self.glyphs.draw_text(
                &mut self.display,
                ox + node.x,
                oy + node.y + index as f32 * frame.line_height,
                line,
                font_size,
                color,
            );
        }
    }

    fn draw_brightness_bar(&mut self, frame: &FrameView<'_>) {
        let bar = frame.brightness;
        let scene = frame.scene;
        let ch_w = frame.ch_w.max(1.0);
        let block_h = ch_w.round();
        let gap = 2.0;
        let bar_h = f32::from(TOTAL_BLOCKS) * (block_h + gap) - gap;
        let bar_w = (ch_w * 1.5).round();
        let x = scene.pad_x + scene.content_w - 2.0 * ch_w - bar_w;
        let y = scene.pad_y + ((scene.content_h - bar_h) / 2.0).round();
        let palette = &frame.theme.palette;

        fill_rect(&mut self.display, x, y, bar_w, bar_h, palette.border, 0.3 * bar.alpha());
        for index in 0..bar.level() {
            let block_y = y + bar_h - f32::from(index + 1) * (block_h + gap) + gap;
            fill_rect(&mut self.display, x, block_y, bar_w, block_h, palette.prompt, bar.alpha());
        }
    }

    fn draw_esc_popup(&mut self, frame: &FrameView<'_>, progress: f32) {
        let scene = frame.scene;
        let ch_w = frame.ch_w.max(1.0);
        let font_size = frame.params.font_size;
        let palette = &frame.theme.palette;
        let popup = EscPopup::for_progress(progress);

        let pad = (ch_w * 3.0).round();
        let bar_w = (popup.total_blocks as f32 * ch_w).round();
        let bar_h = (font_size * 0.3).round().max(1.0);
        let box_w = bar_w + pad * 2.0;
        let box_h = (font_size * 5.0).round();
        let x = scene.pad_x + ((scene.content_w - box_w) / 2.0).round();
        let y = scene.pad_y + ((scene.content_h - box_h) / 2.0).round();
        let shadow = (ch_w * 0.5).round();

        fill_rect(&mut self.display, x + shadow, y + shadow, box_w, box_h, Color::BLACK, 0.5);
        fill_rect(&mut self.display, x, y, box_w, box_h, Color::BLACK, 0.9);
        stroke_rect(&mut self.display, x, y, box_w, box_h, palette.border);
        self.glyphs.draw_text(
            &mut self.display,
            x + pad,
            y + (box_h * 0.22).round(),
            ESC_LABEL,
            font_size,
            [255, 255, 255, 255],
        );

        let bar_y = y + (box_h * 0.62).round();
        fill_rect(&mut self.display, x + pad, bar_y, bar_w, bar_h, palette.border, 1.0);
        for block in 0..popup.filled_blocks {
            let block_x = x + pad + block as f32 * ch_w;
            fill_rect(&mut self.display, block_x, bar_y, ch_w - 2.0, bar_h, palette.prompt, 1.0);
        }
    }

    fn warp_display(&mut self, frame: &FrameView<'_>) {
        let geometry = frame.camera.geometry();
        let projected = frame.camera.projected();
        let (vw, vh) = (self.view.width() as f32, self.view.height() as f32);
        let (dw, dh) = (self.display.width() as f32, self.display.height() as f32);
        let breathing = frame.effects.breathing.scale(
            frame.now_ms,
            frame.params.breathing_amplitude,
            frame.params.breathing_period_ms,
        );
        let view_xform = ViewTransform {
            centre: (vw / 2.0, vh / 2.0),
            breathing,
            pivot: frame.scroll_pivot,
            zoom: frame.scroll_zoom,
        };

        let mut triangles = 0usize;
        for [a, b, c] in geometry.triangles() {
            let src = [a, b, c].map(|i| [geometry.uvs[i][0] * dw, geometry.uvs[i][1] * dh]);
            let dst = [a, b, c].map(|i| view_xform.apply(projected[i]));
            let Some(transform) = triangle_affine(src, dst) else {
                continue;
            };
            let mut builder = PathBuilder::new();
            builder.move_to(dst[0][0], dst[0][1]);
            builder.line_to(dst[1][0], dst[1][1]);
            builder.line_to(dst[2][0], dst[2][1]);
            builder.close();
            let Some(path) = builder.finish() else {
                continue;
            };
            let paint = Paint {
                shader: Pattern::new(
                    self.display.as_ref(),
                    SpreadMode::Pad,
                    FilterQuality::Bilinear,
                    1.0,
                    transform,
                ),
                anti_alias: false,
                ..Paint::default()
            };
            self.view
                .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
            triangles += 1;
        }
        tracing::trace!(triangles, "mesh warp");
    }
}

/// Breathing about the view centre followed by wheel zoom about the cursor.
#[derive(Debug, Clone, Copy)]
struct ViewTransform {
    centre: (f32, f32),
    breathing: f32,
    pivot: (f32, f32),
    zoom: f32,
}

impl ViewTransform {
    fn apply(&self, [x, y]: [f32; 2]) -> [f32; 2] {
        let bx = self.centre.0 + (x - self.centre.0) * self.breathing;
        let by = self.centre.1 + (y - self.centre.1) * self.breathing;
        [
            self.pivot.0 + (bx - self.pivot.0) * self.zoom,
            self.pivot.1 + (by - self.pivot.1) * self.zoom,
        ]
    }
}

/// Affine map taking the three `src` points onto `dst`; `None` when the
/// source triangle is degenerate.
pub fn triangle_affine(src: [[f32; 2]; 3], dst: [[f32; 2]; 3]) -> Option<Transform> {
    let (e1x, e1y) = (src[1][0] - src[0][0], src[1][1] - src[0][1]);
    let (e2x, e2y) = (src[2][0] - src[0][0], src[2][1] - src[0][1]);
    let det = e1x * e2y - e2x * e1y;
    if det.abs() < 1e-6 {
        return None;
    }
    let (f1x, f1y) = (dst[1][0] - dst[0][0], dst[1][1] - dst[0][1]);
    let (f2x, f2y) = (dst[2][0] - dst[0][0], dst[2][1] - dst[0][1]);
    let sx = (f1x * e2y - f2x * e1y) / det;
    let kx = (f2x * e1x - f1x * e2x) / det;
    let ky = (f1y * e2y - f2y * e1y) / det;
    let sy = (f2y * e1x - f1y * e2x) / det;
    let tx = dst[0][0] - sx * src[0][0] - kx * src[0][1];
    let ty = dst[0][1] - ky * src[0][0] - sy * src[0][1];
    Some(Transform::from_row(sx, ky, kx, sy, tx, ty))
}

fn new_pixmap(width: u32, height: u32) -> Result<Pixmap> {
    Pixmap::new(width.max(1), height.max(1))
        .with_context(|| format!("failed to allocate {width}x{height} surface"))
}

fn sk_color(color: Color, alpha: f32) -> SkColor {
    let [r, g, b] = color.0;
    SkColor::from_rgba8(r, g, b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn rgba(color: Color, alpha: u8) -> [u8; 4] {
    let [r, g, b] = color.0;
    [r, g, b, alpha]
}

fn fill_rect(pixmap: &mut Pixmap, x: f32, y: f32, w: f32, h: f32, color: Color, alpha: f32) {
    let Some(rect) = Rect::from_xywh(x, y, w, h) else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color(sk_color(color, alpha));
    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
}

fn stroke_rect(pixmap: &mut Pixmap, x: f32, y: f32, w: f32, h: f32, color: Color) {
    let Some(rect) = Rect::from_xywh(x + 0.5, y + 0.5, w - 1.0, h - 1.0) else {
        return;
    };
    let path = PathBuilder::from_rect(rect);
    let mut paint = Paint::default();
    paint.set_color(sk_color(color, 1.0));
    let stroke = Stroke {
        width: 1.0,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

/// Write the pixmap as a straight-alpha PNG.
pub fn write_png(pixmap: &Pixmap, path: &Path) -> Result<()> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        rgba.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }
    let image = RgbaImage::from_raw(pixmap.width(), pixmap.height(), rgba)
        .context("pixel buffer does not match surface size")?;
    image
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("failed to write frame {}", path.display()))
}

/// SHA-256 of the raw premultiplied pixels, lowercase hex.
pub fn frame_digest(pixmap: &Pixmap) -> String {
    let digest = Sha256::digest(pixmap.data());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::theme::ThemeMode;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn apply(transform: Transform, [x, y]: [f32; 2]) -> [f32; 2] {
        [
            transform.sx * x + transform.kx * y + transform.tx,
            transform.ky * x + transform.sy * y + transform.ty,
        ]
    }

    #[test]
    fn affine_maps_source_corners_onto_destination() {
        let src = [[0.0, 0.0], [10.0, 0.0], [0.0, 10.0]];
        let dst = [[5.0, 5.0], [25.0, 8.0], [2.0, 30.0]];
        let transform = triangle_affine(src, dst).expect("non-degenerate");
        for (s, d) in src.iter().zip(&dst) {
            let mapped = apply(transform, *s);
            assert!((mapped[0] - d[0]).abs() < 1e-4 && (mapped[1] - d[1]).abs() < 1e-4);
        }
    }

    #[test]
    fn degenerate_source_triangle_is_skipped() {
        let src = [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]];
        assert!(triangle_affine(src, src).is_none());
    }

    #[test]
    fn view_transform_zooms_about_the_pivot() {
        let xform = ViewTransform {
            centre: (50.0, 50.0),
            breathing: 1.0,
            pivot: (20.0, 20.0),
            zoom: 2.0,
        };
        assert_eq!(xform.apply([20.0, 20.0]), [20.0, 20.0]);
        assert_eq!(xform.apply([30.0, 20.0]), [40.0, 20.0]);
    }

    #[test]
    fn render_produces_a_view_sized_frame_with_text_ink() {
        let theme = Theme::new(ThemeMode::Dark);
        let mut params = Params::for_theme(&theme);
        params.font_size = 12.0;
        params.breathing_enabled = false;
        let mut rng = StdRng::seed_from_u64(5);
        let mut scene = Scene::new();
        scene.resize(80.0, 60.0, params.screen_padding);
        scene.verb.at(10.0, 20.0);
        let mut effects = Effects::new(&mut rng);
        effects.resize(scene.surface_size(), (160, 120), &theme.palette, &mut rng);
        effects.sync(&params, 1.0, false, false);
        let mut camera = Camera::new(160.0, 120.0, params.screen_padding);
        camera.update(&params);
        let brightness = BrightnessBar::default();

        let mut compositor = Compositor::new(GlyphCache::blocks(), 160, 120).expect("compositor");
        let ch_w = compositor.glyphs().char_width(params.font_size);
        let view = FrameView {
            scene: &scene,
            params: &params,
            theme: &theme,
            effects: &effects,
            camera: &camera,
            ch_w,
            line_height: params.line_height(),
            now_ms: 0,
            scroll_zoom: 1.0,
            scroll_pivot: (0.0, 0.0),
            esc_progress: Some(0.5),
            brightness: &brightness,
        };
        let first = {
            let frame = compositor.render(&view).expect("render");
            assert_eq!((frame.width(), frame.height()), (160, 120));
            frame_digest(frame)
        };
        let second = frame_digest(compositor.render(&view).expect("render"));
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn png_output_round_trips_dimensions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("frame.png");
        let mut pixmap = Pixmap::new(7, 3).expect("pixmap");
        pixmap.fill(SkColor::from_rgba8(10, 20, 30, 255));
        write_png(&pixmap, &path).expect("write");
        let decoded = image::open(&path).expect("decode").to_rgba8();
        assert_eq!(decoded.dimensions(), (7, 3));
        assert_eq!(decoded.get_pixel(3, 1).0, [10, 20, 30, 255]);
    }
}
