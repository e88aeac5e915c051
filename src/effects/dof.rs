//! Directional depth-of-field blur.
//!
//! Blur radius grows with distance along `direction_deg` past
//! `falloff_start`, sampled with a 12-tap Poisson disc plus the centre tap.
//! Strength eases toward 1 while the host signals an overlap and back
//! toward 0 otherwise.

use tiny_skia::Pixmap;

use crate::easing::smoothstep;

const POISSON_TAPS: [[f32; 2]; 12] = [
    [-0.326, -0.406],
    [-0.840, -0.074],
    [-0.696, 0.457],
    [-0.203, 0.621],
    [0.962, -0.195],
    [0.473, -0.480],
    [0.519, 0.767],
    [0.185, -0.893],
    [0.507, 0.064],
    [0.896, 0.412],
    [-0.322, -0.933],
    [-0.792, -0.598],
];

/// Fraction of the remaining distance covered per frame.
pub const DOF_EASE: f32 = 0.08;
const SNAP: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DofParams {
    pub strength: f32,
    pub max_radius: f32,
    pub falloff_start: f32,
    pub direction_deg: f32,
}

/// Smoothed blur strength.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DofEase {
    strength: f32,
}

impl DofEase {
    pub fn step(&mut self, overlap: bool) -> f32 {
        let target = if overlap { 1.0 } else { 0.0 };
        self.strength += (target - self.strength) * DOF_EASE;
        if (target - self.strength).abs() < SNAP {
            self.strength = target;
        }
        self.strength
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }
}

pub fn apply(pixmap: &mut Pixmap, params: DofParams) {
    if params.strength <= 0.0 || params.max_radius <= 0.0 {
        return;
    }
    let (width, height) = (pixmap.width() as usize, pixmap.height() as usize);
    if width == 0 || height == 0 {
        return;
    }
    let (dir_y, dir_x) = params.direction_deg.to_radians().sin_cos();
    let source = pixmap.data().to_vec();
    let data = pixmap.data_mut();
    let sample = |x: f32, y: f32| {
        let sx = (x.round() as isize).clamp(0, width as isize - 1) as usize;
        let sy = (y.round() as isize).clamp(0, height as isize - 1) as usize;
        (sy * width + sx) * 4
    };

    for y in 0..height {
        let v = (y as f32 + 0.5) / height as f32 - 0.5;
        for x in 0..width {
            let u = (x as f32 + 0.5) / width as f32 - 0.5;
            let dist = u * dir_x + v * dir_y + 0.5;
            let t = smoothstep(params.falloff_start, 1.0, dist);
            let radius = t * params.strength * params.max_radius;
            if radius < 0.5 {
                continue;
            }
            let mut acc = [0u32; 4];
            let centre = (y * width + x) * 4;
            for channel in 0..4 {
                acc[channel] += source[centre + channel] as u32;
            }
            for [ox, oy] in POISSON_TAPS {
                let at = sample(x as f32 + ox * radius, y as f32 + oy * radius);
                for channel in 0..4 {
                    acc[channel] += source[at + channel] as u32;
                }
            }
            let taps = POISSON_TAPS.len() as u32 + 1;
            for channel in 0..4 {
                data[centre + channel] = ((acc[channel] + taps / 2) / taps) as u8;
            }
        }
    }
}
