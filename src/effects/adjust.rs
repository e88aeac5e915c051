//! Brightness and saturation adjustment.

use tiny_skia::Pixmap;

const LUMA: [f32; 3] = [0.2125, 0.7154, 0.0721];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustParams {
    /// Already multiplied by exposure and the brightness-bar multiplier.
    pub brightness: f32,
    pub saturation: f32,
}

impl AdjustParams {
    pub fn is_identity(&self) -> bool {
        self.brightness == 1.0 && self.saturation == 1.0
    }
}

pub fn apply(pixmap: &mut Pixmap, params: AdjustParams) {
    if params.is_identity() {
        return;
    }
    for px in pixmap.data_mut().chunks_exact_mut(4) {
        let alpha = px[3] as f32;
        let rgb = [
            px[0] as f32 * params.brightness,
            px[1] as f32 * params.brightness,
            px[2] as f32 * params.brightness,
        ];
        let luma = rgb[0] * LUMA[0] + rgb[1] * LUMA[1] + rgb[2] * LUMA[2];
        for channel in 0..3 {
            let value = luma + (rgb[channel] - luma) * params.saturation;
            px[channel] = value.round().clamp(0.0, alpha) as u8;
        }
    }
}
