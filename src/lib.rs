//! # volume-filters
//!
//! Two small volume processing tools and the library behind them:
//!
//!  - `otsu-threshold` binarises a volume with Otsu's method
//!  - `affine-transform` rotates, scales and translates a volume about its
//!    center by resampling it with a windowed-sinc kernel
//!
//! Volumes are 8-bit, carry a physical spacing and origin, and are read from
//! NIfTI/Analyze files, single DICOM files or directories of DICOM slices.
//! Results are written as NIfTI. Resampling and histogram accumulation run
//! on rayon's thread pool.
//!
//! Rotation and scaling always pivot around the volume center
//! (`origin + spacing * size / 2`). Several requested transforms are by
//! default multiplied into one matrix and applied in a single pass, in the
//! order x-rotation, y-rotation, z-rotation, scale, translation. The
//! [`TransformPolicy`] enum also offers one pass per transform and a
//! last-transform-only mode.
//!
//! # Examples
//!
//! ## Thresholding a volume
//!
//! ```no_run
//! # use volume_filters::{OtsuThresholdFilter, VolumeLoader, VolumeWriter};
//! let volume = VolumeLoader::load("brain.nii.gz").expect("should have loaded the volume");
//! let result = OtsuThresholdFilter::default().apply(&volume);
//! println!("Threshold = {}", result.threshold);
//! VolumeWriter::save(&result.output, "mask.nii").expect("should have written the mask");
//! ```
//!
//! ## Rotating a volume about its center
//!
//! ```no_run
//! # use volume_filters::{Resampler, TransformParams, TransformPipeline, TransformPolicy, VolumeLoader};
//! # use nalgebra::Vector3;
//! let volume = VolumeLoader::load("brain.nii.gz").expect("should have loaded the volume");
//! let params = TransformParams {
//!     rotation: Vector3::new(0.0, 0.0, std::f64::consts::FRAC_PI_4),
//!     ..Default::default()
//! };
//! let pipeline = TransformPipeline::from_params(&params, &volume.center(), TransformPolicy::Compose);
//! let rotated = Resampler::default()
//!     .apply(&volume, &pipeline)
//!     .expect("should have resampled the volume");
//! ```

pub mod enums;
mod interpolator;
pub mod resample;
pub mod runner;
pub mod threshold;
pub mod transform;
pub mod volume;
pub mod volume_loader;
pub mod volume_writer;

pub use enums::{Interpolation, Orientation, SortBy, TransformPolicy};
pub use interpolator::{DEFAULT_SINC_RADIUS, MAX_SINC_RADIUS};
pub use resample::{ResampleError, ResampleParams, Resampler};
pub use runner::{AffineJob, DEFAULT_OTSU_OUTPUT, OtsuJob, StageError};
pub use threshold::{
    Histogram, OtsuThresholdFilter, ThresholdParams, ThresholdResult, otsu_threshold,
};
pub use transform::{
    AffineTransform, TransformError, TransformKind, TransformParams, TransformPipeline,
};
pub use volume::Volume;
pub use volume_loader::{VolumeLoader, VolumeLoaderError};
pub use volume_writer::{VolumeWriter, VolumeWriterError};
