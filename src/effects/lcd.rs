//! LCD sub-pixel mask: sampling snaps to a coarse grid, each column of a cell
//! is tinted toward one primary, and the last row of a cell is dimmed.

use tiny_skia::Pixmap;

pub const LCD_GRID: u32 = 4;

const DARK_MASKS: [[f32; 3]; 4] = [
    [1.0, 0.2, 0.2],
    [0.2, 1.0, 0.2],
    [0.2, 0.2, 1.0],
    [0.4, 0.4, 0.4],
];
const DARK_ROW_FADE: f32 = 0.6;

// On a light background the full-strength mask reads as a dark screen door.
const LIGHT_MASKS: [[f32; 3]; 4] = [
    [1.0, 0.75, 0.75],
    [0.75, 1.0, 0.75],
    [0.75, 0.75, 1.0],
    [0.85, 0.85, 0.85],
];
const LIGHT_ROW_FADE: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LcdParams {
    pub light: bool,
}

pub fn apply(pixmap: &mut Pixmap, params: LcdParams) {
    let (width, height) = (pixmap.width(), pixmap.height());
    if width == 0 || height == 0 {
        return;
    }
    let (masks, row_fade) = if params.light {
        (&LIGHT_MASKS, LIGHT_ROW_FADE)
    } else {
        (&DARK_MASKS, DARK_ROW_FADE)
    };
    let source = pixmap.data().to_vec();
    let data = pixmap.data_mut();
    let half = LCD_GRID / 2;
    for y in 0..height {
        let sample_y = ((y / LCD_GRID) * LCD_GRID + half).min(height - 1);
        let fade = if y % LCD_GRID < LCD_GRID - 1 { 1.0 } else { row_fade };
        for x in 0..width {
            let sample_x = ((x / LCD_GRID) * LCD_GRID + half).min(width - 1);
            let src = ((sample_y * width + sample_x) * 4) as usize;
            let dst = ((y * width + x) * 4) as usize;
            let mask = masks[(x % LCD_GRID) as usize];
            for channel in 0..3 {
                let value = source[src + channel] as f32 * mask[channel] * fade;
                data[dst + channel] = value.round().min(255.0) as u8;
            }
            data[dst + 3] = source[src + 3];
        }
    }
}
