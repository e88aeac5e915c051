//! Bloom: a blurred copy of the frame screen-blended over itself.
//!
//! The blur is `quality` rounds of separable box blur, which converges on a
//! gaussian; `strength` is the box radius in pixels.

use tiny_skia::Pixmap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomParams {
    pub strength: f32,
    pub quality: u32,
}

pub fn apply(pixmap: &mut Pixmap, params: BloomParams) {
    let radius = params.strength.round().max(0.0) as usize;
    if radius == 0 || params.quality == 0 {
        return;
    }
    let (width, height) = (pixmap.width() as usize, pixmap.height() as usize);
    let mut blurred = pixmap.data().to_vec();
    let mut scratch = vec![0u8; blurred.len()];
    for _ in 0..params.quality {
        box_blur_rows(&blurred, &mut scratch, width, height, radius);
        box_blur_cols(&scratch, &mut blurred, width, height, radius);
    }

    for (dst, glow) in pixmap.data_mut().chunks_exact_mut(4).zip(blurred.chunks_exact(4)) {
        let alpha = dst[3];
        for channel in 0..3 {
            let base = dst[channel] as u32;
            let add = glow[channel] as u32;
            let screened = base + add - (base * add + 127) / 255;
            dst[channel] = screened.min(alpha as u32) as u8;
        }
    }
}

pub(crate) fn box_blur_rows(src: &[u8], dst: &mut [u8], width: usize, height: usize, radius: usize) {
    let window = (2 * radius + 1) as u32;
    for y in 0..height {
        let row = y * width;
        for channel in 0..4 {
            let at = |x: usize| src[(row + x) * 4 + channel] as u32;
            let mut sum: u32 = (0..=2 * radius)
                .map(|i| at(clamp_index(i as isize - radius as isize, width)))
                .sum();
            for x in 0..width {
                dst[(row + x) * 4 + channel] = (sum / window) as u8;
                let leaving = clamp_index(x as isize - radius as isize, width);
                let entering = clamp_index(x as isize + radius as isize + 1, width);
                sum = sum + at(entering) - at(leaving);
            }
        }
    }
}

pub(crate) fn box_blur_cols(src: &[u8], dst: &mut [u8], width: usize, height: usize, radius: usize) {
    let window = (2 * radius + 1) as u32;
    for x in 0..width {
        for channel in 0..4 {
            let at = |y: usize| src[(y * width + x) * 4 + channel] as u32;
            let mut sum: u32 = (0..=2 * radius)
                .map(|i| at(clamp_index(i as isize - radius as isize, height)))
                .sum();
            for y in 0..height {
                dst[(y * width + x) * 4 + channel] = (sum / window) as u8;
                let leaving = clamp_index(y as isize - radius as isize, height);
                let entering = clamp_index(y as isize + radius as isize + 1, height);
                sum = sum + at(entering) - at(leaving);
            }
        }
    }
}

fn clamp_index(index: isize, len: usize) -> usize {
    index.clamp(0, len as isize - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::Color;

    fn dot() -> Pixmap {
        let mut pixmap = Pixmap::new(9, 9).expect("pixmap");
        pixmap.fill(Color::BLACK);
        let centre = (4 * 9 + 4) * 4;
        pixmap.data_mut()[centre..centre + 3].copy_from_slice(&[255, 255, 255]);
        pixmap
    }

    #[test]
    fn glow_spreads_around_bright_pixels() {
        let mut pixmap = dot();
        apply(&mut pixmap, BloomParams { strength: 2.0, quality: 1 });
        let neighbour = pixmap.pixel(5, 4).expect("in bounds");
        assert!(neighbour.red() > 0);
        assert_eq!(pixmap.pixel(4, 4).expect("in bounds").red(), 255);
        assert_eq!(pixmap.pixel(0, 0).expect("in bounds").red(), 0);
    }

    #[test]
    fn zero_strength_is_a_no_op() {
        let mut pixmap = dot();
        let before = pixmap.data().to_vec();
        apply(&mut pixmap, BloomParams { strength: 0.0, quality: 4 });
        assert_eq!(pixmap.data(), before.as_slice());
    }

    #[test]
    fn box_blur_preserves_flat_fields() {
        let src = vec![100u8; 5 * 3 * 4];
        let mut dst = vec![0u8; src.len()];
        box_blur_rows(&src, &mut dst, 5, 3, 2);
        assert!(dst.iter().all(|&v| v == 100));
    }
}
