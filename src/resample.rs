use crate::enums::Interpolation;
use crate::interpolator::{DEFAULT_SINC_RADIUS, Interpolator, MAX_SINC_RADIUS};
use crate::transform::{AffineTransform, TransformError, TransformPipeline};
use crate::volume::Volume;

use log::{debug, info};
use ndarray::Array3;
use rayon::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResampleError {
    #[error("cannot resample an empty volume")]
    EmptyVolume,

    #[error("sinc radius {0} is outside 1..={max}", max = MAX_SINC_RADIUS)]
    InvalidSincRadius(usize),

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResampleParams {
    pub interpolation: Interpolation,
    /// Support radius of the windowed-sinc kernel, in samples.
    pub sinc_radius: usize,
    /// Value written where the mapped point falls outside the input.
    pub default_value: u8,
}

impl Default for ResampleParams {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::WindowedSinc,
            sinc_radius: DEFAULT_SINC_RADIUS,
            default_value: 0,
        }
    }
}

/// Resamples a volume onto its own grid through an affine transform.
///
/// Each output sample at physical point `p` reads the input at `T⁻¹(p)`.
#[derive(Clone, Debug, Default)]
pub struct Resampler {
    params: ResampleParams,
}

impl Resampler {
    pub fn new(params: ResampleParams) -> Self {
        Self { params }
    }

    pub fn resample(
        &self,
        input: &Volume,
        transform: &AffineTransform,
    ) -> Result<Volume, ResampleError> {
        if input.data().is_empty() {
            return Err(ResampleError::EmptyVolume);
        }
        if !(1..=MAX_SINC_RADIUS).contains(&self.params.sinc_radius) {
            return Err(ResampleError::InvalidSincRadius(self.params.sinc_radius));
        }
        let inverse = transform.inverse()?;
        debug!("resampling through inverse parameters {:?}", inverse.parameters());

        let (depth, height, width) = input.dim();
        let view = input.data().view();
        let ResampleParams {
            interpolation,
            sinc_radius,
            default_value,
        } = self.params;

        let pixel_data: Vec<u8> = (0..depth)
            .into_par_iter()
            .flat_map(|z| {
                let mut slice = Vec::with_capacity(height * width);
                for y in 0..height {
                    for x in 0..width {
                        let source = inverse.apply(&input.index_to_physical(x, y, z));
                        let index = input.physical_to_continuous_index(&source);
                        let value = if input.is_inside_buffer(&index) {
                            let value =
                                Interpolator::evaluate(interpolation, &view, &index, sinc_radius);
                            value.round().clamp(0.0, 255.0) as u8
                        } else {
                            default_value
                        };
                        slice.push(value);
                    }
                }
                slice
            })
            .collect();

        let data = Array3::from_shape_vec((depth, height, width), pixel_data)?;
        Ok(input.with_data(data))
    }

    /// Run every pass of `pipeline` over `input`.
    ///
    /// An empty pipeline returns a copy of the input without resampling.
    pub fn apply(
        &self,
        input: &Volume,
        pipeline: &TransformPipeline,
    ) -> Result<Volume, ResampleError> {
        let passes = pipeline.passes();
        if passes.is_empty() {
            info!("no transform requested, volume left unchanged");
            return Ok(input.clone());
        }

        let mut current = input.clone();
        for (kind, transform) in &passes {
            match kind {
                Some(kind) => info!("resampling with {kind} ({:?} policy)", pipeline.policy),
                None => info!(
                    "resampling with {} composed transforms",
                    pipeline.steps.len()
                ),
            }
            current = self.resample(&current, transform)?;
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::TransformPolicy;
    use crate::transform::{TransformKind, TransformParams};
    use nalgebra::{Point3, Vector3};

    fn ramp() -> Volume {
        Volume::from_data(Array3::from_shape_fn((8, 8, 8), |(z, y, x)| {
            (20 * x + 10 * y + 5 * z) as u8
        }))
    }

    fn single_voxel() -> Volume {
        let mut data = Array3::zeros((4, 4, 4));
        data[[2, 2, 2]] = 200;
        Volume::from_data(data)
    }

    fn trilinear() -> Resampler {
        Resampler::new(ResampleParams {
            interpolation: Interpolation::Trilinear,
            ..Default::default()
        })
    }

    #[test]
    fn zero_rotation_is_a_no_op() {
        let volume = ramp();
        let rotation = AffineTransform::rotation_z(0.0).centered(&volume.center());
        let output = Resampler::default().resample(&volume, &rotation).unwrap();
        assert_eq!(output.data(), volume.data());
    }

    #[test]
    fn translation_moves_content_towards_positive_x() {
        let volume = single_voxel();
        let shift = AffineTransform::translation(Vector3::new(1.0, 0.0, 0.0));
        let output = Resampler::default().resample(&volume, &shift).unwrap();
        assert_eq!(output.data()[[2, 2, 3]], 200);
        assert_eq!(output.data()[[2, 2, 2]], 0);
        assert_eq!(output.spacing, volume.spacing);
        assert_eq!(output.origin, volume.origin);
    }

    #[test]
    fn samples_mapped_outside_get_the_default_value() {
        let volume = Volume::from_data(Array3::from_elem((4, 4, 4), 90));
        let resampler = Resampler::new(ResampleParams {
            default_value: 7,
            ..Default::default()
        });
        let shift = AffineTransform::translation(Vector3::new(2.0, 0.0, 0.0));
        let output = resampler.resample(&volume, &shift).unwrap();
        assert_eq!(output.data()[[0, 0, 0]], 7);
        assert_eq!(output.data()[[0, 0, 1]], 7);
        assert_eq!(output.data()[[0, 0, 2]], 90);
        assert_eq!(output.data()[[3, 3, 3]], 90);
    }

    #[test]
    fn singular_transform_is_rejected() {
        let volume = ramp();
        let result = Resampler::default().resample(&volume, &AffineTransform::uniform_scale(0.0));
        assert!(matches!(result, Err(ResampleError::Transform(_))));
    }

    #[test]
    fn empty_volume_is_rejected() {
        let volume = Volume::default();
        let result = Resampler::default().resample(&volume, &AffineTransform::identity());
        assert!(matches!(result, Err(ResampleError::EmptyVolume)));
    }

    #[test]
    fn out_of_range_sinc_radius_is_rejected() {
        let volume = single_voxel();
        let shift = AffineTransform::translation(Vector3::new(0.3, 0.0, 0.0));
        for sinc_radius in [0, MAX_SINC_RADIUS + 1, usize::MAX] {
            let resampler = Resampler::new(ResampleParams {
                sinc_radius,
                ..Default::default()
            });
            let result = resampler.resample(&volume, &shift);
            assert!(
                matches!(result, Err(ResampleError::InvalidSincRadius(r)) if r == sinc_radius),
                "radius {sinc_radius} was accepted"
            );
        }
    }

    #[test]
    fn largest_sinc_radius_is_accepted() {
        let volume = single_voxel();
        let resampler = Resampler::new(ResampleParams {
            sinc_radius: MAX_SINC_RADIUS,
            ..Default::default()
        });
        let output = resampler
            .resample(&volume, &AffineTransform::identity())
            .unwrap();
        assert_eq!(output.data(), volume.data());
    }

    #[test]
    fn identity_parameters_leave_the_volume_untouched() {
        let volume = ramp();
        let pipeline = TransformPipeline::from_params(
            &TransformParams::default(),
            &volume.center(),
            TransformPolicy::Compose,
        );
        let output = Resampler::default().apply(&volume, &pipeline).unwrap();
        assert_eq!(output, volume);
    }

    #[test]
    fn rotation_and_its_inverse_compose_to_identity() {
        let volume = ramp();
        let center = volume.center();
        let mut pipeline = TransformPipeline::new(TransformPolicy::Compose);
        pipeline.push(
            TransformKind::RotationZ,
            AffineTransform::rotation_z(0.4).centered(&center),
        );
        pipeline.push(
            TransformKind::RotationZ,
            AffineTransform::rotation_z(-0.4).centered(&center),
        );
        let output = Resampler::default().apply(&volume, &pipeline).unwrap();
        assert_eq!(output.data(), volume.data());
    }

    #[test]
    fn sequential_rotation_round_trip_stays_close_in_the_interior() {
        let volume = ramp();
        let center = volume.center();
        let mut pipeline = TransformPipeline::new(TransformPolicy::Sequential);
        pipeline.push(
            TransformKind::RotationZ,
            AffineTransform::rotation_z(0.1).centered(&center),
        );
        pipeline.push(
            TransformKind::RotationZ,
            AffineTransform::rotation_z(-0.1).centered(&center),
        );
        let output = trilinear().apply(&volume, &pipeline).unwrap();
        for z in 0..8 {
            for y in 2..6 {
                for x in 2..6 {
                    let expected = volume.data()[[z, y, x]] as i32;
                    let actual = output.data()[[z, y, x]] as i32;
                    assert!(
                        (expected - actual).abs() <= 2,
                        "({x}, {y}, {z}): expected {expected}, got {actual}"
                    );
                }
            }
        }
    }

    #[test]
    fn last_wins_ignores_earlier_steps() {
        let volume = single_voxel();
        let params = TransformParams {
            rotation: Vector3::new(0.0, 0.0, 0.3),
            scale: 1.0,
            translation: Vector3::new(1.0, 0.0, 0.0),
        };
        let pipeline =
            TransformPipeline::from_params(&params, &volume.center(), TransformPolicy::LastWins);
        let output = Resampler::default().apply(&volume, &pipeline).unwrap();

        let shift = AffineTransform::translation(Vector3::new(1.0, 0.0, 0.0));
        let expected = Resampler::default().resample(&volume, &shift).unwrap();
        assert_eq!(output, expected);
    }

    #[test]
    fn scaling_pivots_around_the_center() {
        let mut data = Array3::zeros((5, 5, 5));
        data[[2, 2, 2]] = 120;
        let volume = Volume::new(data, Vector3::new(1.0, 1.0, 1.0), Point3::new(-2.5, -2.5, -2.5));
        assert_eq!(volume.center(), Point3::origin());
        let pipeline = TransformPipeline::from_params(
            &TransformParams {
                scale: 2.0,
                ..Default::default()
            },
            &volume.center(),
            TransformPolicy::Compose,
        );
        let output = Resampler::new(ResampleParams {
            interpolation: Interpolation::Nearest,
            ..Default::default()
        })
        .apply(&volume, &pipeline)
        .unwrap();
        assert_eq!(output.data()[[2, 2, 2]], 120);
    }
}
