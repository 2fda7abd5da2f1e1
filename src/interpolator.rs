use crate::enums::Interpolation;

use nalgebra::Vector3;
use ndarray::ArrayView3;
use std::f64::consts::PI;

/// Default support radius of the windowed-sinc kernel, in samples.
pub const DEFAULT_SINC_RADIUS: usize = 3;

/// Largest accepted windowed-sinc radius.
pub const MAX_SINC_RADIUS: usize = 16;

pub(crate) struct Interpolator;

impl Interpolator {
    /// Sample `data` at the continuous (x, y, z) `index`.
    ///
    /// The caller is expected to have checked the index against the buffer;
    /// kernel taps beyond the edge reuse the nearest edge sample.
    pub(crate) fn evaluate(
        interpolation: Interpolation,
        data: &ArrayView3<u8>,
        index: &Vector3<f64>,
        sinc_radius: usize,
    ) -> f64 {
        match interpolation {
            Interpolation::WindowedSinc => {
                Self::windowed_sinc_interpolate(data, index.z, index.y, index.x, sinc_radius)
            }
            Interpolation::Trilinear => Self::trilinear_interpolate(data, index.z, index.y, index.x),
            Interpolation::Nearest => Self::nearest_interpolate(data, index.z, index.y, index.x),
        }
    }

    #[inline]
    fn clamp_index(value: isize, len: usize) -> usize {
        value.clamp(0, len as isize - 1) as usize
    }

    #[inline]
    pub(crate) fn nearest_interpolate(data: &ArrayView3<u8>, z: f64, y: f64, x: f64) -> f64 {
        let (depth, height, width) = data.dim();
        let z = Self::clamp_index(z.round() as isize, depth);
        let y = Self::clamp_index(y.round() as isize, height);
        let x = Self::clamp_index(x.round() as isize, width);
        data[[z, y, x]] as f64
    }

    #[inline]
    pub(crate) fn trilinear_interpolate(data: &ArrayView3<u8>, z: f64, y: f64, x: f64) -> f64 {
        let (depth, height, width) = data.dim();

        let z = z.clamp(0.0, (depth - 1) as f64);
        let y = y.clamp(0.0, (height - 1) as f64);
        let x = x.clamp(0.0, (width - 1) as f64);

        let z0 = z.floor() as usize;
        let y0 = y.floor() as usize;
        let x0 = x.floor() as usize;
        let z1 = (z0 + 1).min(depth - 1);
        let y1 = (y0 + 1).min(height - 1);
        let x1 = (x0 + 1).min(width - 1);

        let dz = z - z0 as f64;
        let dy = y - y0 as f64;
        let dx = x - x0 as f64;
        let one_minus_dx = 1.0 - dx;
        let one_minus_dy = 1.0 - dy;
        let one_minus_dz = 1.0 - dz;

        let v = |z: usize, y: usize, x: usize| data[[z, y, x]] as f64;

        let v00 = v(z0, y0, x0).mul_add(one_minus_dx, v(z0, y0, x1) * dx);
        let v01 = v(z0, y1, x0).mul_add(one_minus_dx, v(z0, y1, x1) * dx);
        let v10 = v(z1, y0, x0).mul_add(one_minus_dx, v(z1, y0, x1) * dx);
        let v11 = v(z1, y1, x0).mul_add(one_minus_dx, v(z1, y1, x1) * dx);

        let v0 = v00.mul_add(one_minus_dy, v01 * dy);
        let v1 = v10.mul_add(one_minus_dy, v11 * dy);

        v0.mul_add(one_minus_dz, v1 * dz)
    }

    /// Hamming-windowed sinc: `sinc(d) * (0.54 + 0.46 cos(pi d / radius))`.
    #[inline]
    fn windowed_sinc(distance: f64, radius: usize) -> f64 {
        let radius = radius as f64;
        if distance.abs() >= radius {
            return 0.0;
        }
        let window = 0.54 + 0.46 * (PI * distance / radius).cos();
        if distance.abs() < 1e-12 {
            return window;
        }
        let px = PI * distance;
        px.sin() / px * window
    }

    /// First tap index and normalised weights for one axis.
    fn sinc_weights(position: f64, radius: usize) -> (isize, Vec<f64>) {
        let base = position.floor();
        let first = base as isize - radius as isize + 1;
        let mut weights: Vec<f64> = (0..2 * radius)
            .map(|k| Self::windowed_sinc(position - (first + k as isize) as f64, radius))
            .collect();
        let sum: f64 = weights.iter().sum();
        if sum.abs() > f64::EPSILON {
            weights.iter_mut().for_each(|w| *w /= sum);
        }
        (first, weights)
    }

    pub(crate) fn windowed_sinc_interpolate(
        data: &ArrayView3<u8>,
        z: f64,
        y: f64,
        x: f64,
        radius: usize,
    ) -> f64 {
        let radius = radius.max(1);
        let (depth, height, width) = data.dim();

        let (z_first, z_weights) = Self::sinc_weights(z, radius);
        let (y_first, y_weights) = Self::sinc_weights(y, radius);
        let (x_first, x_weights) = Self::sinc_weights(x, radius);

        let mut value = 0.0;
        for (kz, wz) in z_weights.iter().enumerate() {
            if *wz == 0.0 {
                continue;
            }
            let zi = Self::clamp_index(z_first + kz as isize, depth);
            for (ky, wy) in y_weights.iter().enumerate() {
                if *wy == 0.0 {
                    continue;
                }
                let yi = Self::clamp_index(y_first + ky as isize, height);
                let row: f64 = x_weights
                    .iter()
                    .enumerate()
                    .filter(|(_, wx)| **wx != 0.0)
                    .map(|(kx, wx)| {
                        let xi = Self::clamp_index(x_first + kx as isize, width);
                        wx * data[[zi, yi, xi]] as f64
                    })
                    .sum();
                value += wz * wy * row;
            }
        }
        value
    }
}
