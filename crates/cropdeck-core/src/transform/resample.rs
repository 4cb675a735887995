//! Separable resampling from a fractional source window.
//!
//! `image::imageops::resize` only works on whole pixels, so a crop that
//! starts or ends inside a source pixel is resampled here instead. Each
//! destination pixel `d` samples the source at
//! `window.x + (d + 0.5) * window.width / width`, with pixel centers at
//! `i + 0.5`. When shrinking, the kernel is widened by the scale factor.
//! Taps that fall outside the image repeat the edge pixel.

use std::f64::consts::PI;

use crate::decode::{DecodedImage, FilterType};

use super::coords::NativeRect;

/// Weights for one destination pixel along one axis.
struct Taps {
    first: usize,
    weights: Vec<f64>,
}

fn support(filter: FilterType) -> f64 {
    match filter {
        FilterType::Nearest => 0.5,
        FilterType::Bilinear => 1.0,
        FilterType::CatmullRom => 2.0,
        FilterType::Lanczos3 => 3.0,
    }
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let a = PI * x;
        a.sin() / a
    }
}

fn kernel(filter: FilterType, x: f64) -> f64 {
    let x = x.abs();
    match filter {
        FilterType::Nearest => {
            if x < 0.5 {
                1.0
            } else {
                0.0
            }
        }
        FilterType::Bilinear => (1.0 - x).max(0.0),
        FilterType::CatmullRom => {
            if x < 1.0 {
                1.5 * x * x * x - 2.5 * x * x + 1.0
            } else if x < 2.0 {
                -0.5 * x * x * x + 2.5 * x * x - 4.0 * x + 2.0
            } else {
                0.0
            }
        }
        FilterType::Lanczos3 => {
            if x < 3.0 {
                sinc(x) * sinc(x / 3.0)
            } else {
                0.0
            }
        }
    }
}

fn axis_taps(offset: f64, span: f64, out_len: u32, src_len: u32, filter: FilterType) -> Vec<Taps> {
    let step = span / out_len as f64;
    let last = i64::from(src_len.saturating_sub(1));

    (0..out_len)
        .map(|d| {
            let pos = offset + (d as f64 + 0.5) * step;
            let nearest = Taps {
                first: (pos.floor() as i64).clamp(0, last) as usize,
                weights: vec![1.0],
            };
            if filter == FilterType::Nearest {
                return nearest;
            }

            let center = pos - 0.5;
            let scale = step.max(1.0);
            let reach = support(filter) * scale;
            let lo = (center - reach).floor() as i64;
            let hi = (center + reach).ceil() as i64;
            let first = lo.clamp(0, last);
            let end = hi.clamp(0, last);

            let mut weights = vec![0.0; (end - first + 1) as usize];
            for i in lo..=hi {
                let slot = (i.clamp(0, last) - first) as usize;
                weights[slot] += kernel(filter, (i as f64 - center) / scale);
            }

            let sum: f64 = weights.iter().sum();
            if sum.abs() < f64::EPSILON {
                return nearest;
            }
            weights.iter_mut().for_each(|w| *w /= sum);
            Taps {
                first: first as usize,
                weights,
            }
        })
        .collect()
}

/// Resample `window` of `image` onto a `width` x `height` buffer.
///
/// `window` must already be clamped to the image and both output
/// dimensions must be non-zero.
pub(crate) fn resample_window(
    image: &DecodedImage,
    window: &NativeRect,
    width: u32,
    height: u32,
    filter: FilterType,
) -> DecodedImage {
    let columns = axis_taps(window.x, window.width, width, image.width, filter);
    let rows = axis_taps(window.y, window.height, height, image.height, filter);

    let row_first = rows.iter().map(|t| t.first).min().unwrap_or(0);
    let row_end = rows
        .iter()
        .map(|t| t.first + t.weights.len())
        .max()
        .unwrap_or(0);

    let stride = image.width as usize * 3;
    let out_width = width as usize;

    // Horizontal pass, only over the source rows the vertical taps reach.
    let mut horizontal = vec![0.0f64; (row_end - row_first) * out_width * 3];
    for (r, y) in (row_first..row_end).enumerate() {
        let src_row = &image.pixels[y * stride..(y + 1) * stride];
        for (dx, taps) in columns.iter().enumerate() {
            let mut acc = [0.0f64; 3];
            for (k, w) in taps.weights.iter().enumerate() {
                let p = (taps.first + k) * 3;
                for (a, s) in acc.iter_mut().zip(&src_row[p..p + 3]) {
                    *a += w * f64::from(*s);
                }
            }
            let o = (r * out_width + dx) * 3;
            horizontal[o..o + 3].copy_from_slice(&acc);
        }
    }

    let mut pixels = Vec::with_capacity(out_width * height as usize * 3);
    for taps in &rows {
        for dx in 0..out_width {
            let mut acc = [0.0f64; 3];
            for (k, w) in taps.weights.iter().enumerate() {
                let o = ((taps.first + k - row_first) * out_width + dx) * 3;
                for (a, s) in acc.iter_mut().zip(&horizontal[o..o + 3]) {
                    *a += w * s;
                }
            }
            pixels.extend(acc.iter().map(|v| v.round().clamp(0.0, 255.0) as u8));
        }
    }

    DecodedImage::new(width, height, pixels)
}
