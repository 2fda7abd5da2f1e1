//! Read, process and write stages shared by the command-line tools.
//!
//! Each job performs one read, one computation and one write. Errors carry
//! the stage and the path involved so callers can report them as-is.

use crate::enums::{Orientation, TransformPolicy};
use crate::resample::{ResampleError, ResampleParams, Resampler};
use crate::threshold::{OtsuThresholdFilter, ThresholdParams, ThresholdResult};
use crate::transform::{TransformParams, TransformPipeline};
use crate::volume::Volume;
use crate::volume_loader::{VolumeLoader, VolumeLoaderError};
use crate::volume_writer::{VolumeWriter, VolumeWriterError};

use log::info;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Output location used by the thresholding tool when none is given.
pub const DEFAULT_OTSU_OUTPUT: &str = "Output_Images/otsu_threshold_image.nii";

#[derive(Debug, Error)]
pub enum StageError {
    #[error("failed to read volume from {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: VolumeLoaderError,
    },

    #[error("failed to resample volume: {source}")]
    Resample { source: ResampleError },

    #[error("failed to write volume to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: VolumeWriterError,
    },

    #[error("failed to write preview to {}: {source}", path.display())]
    Preview {
        path: PathBuf,
        source: image::ImageError,
    },
}

fn read(path: &Path) -> Result<Volume, StageError> {
    VolumeLoader::load(path).map_err(|source| StageError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write(volume: &Volume, path: &Path) -> Result<(), StageError> {
    VolumeWriter::save(volume, path).map_err(|source| StageError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn preview(volume: &Volume, path: Option<&Path>) -> Result<(), StageError> {
    let Some(path) = path else {
        return Ok(());
    };
    volume
        .save_preview(path, Orientation::Axial)
        .map_err(|source| StageError::Preview {
            path: path.to_path_buf(),
            source,
        })?;
    info!("wrote preview {}", path.display());
    Ok(())
}

#[derive(Clone, Debug)]
pub struct OtsuJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub params: ThresholdParams,
    pub preview: Option<PathBuf>,
}

impl OtsuJob {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: PathBuf::from(DEFAULT_OTSU_OUTPUT),
            params: ThresholdParams::default(),
            preview: None,
        }
    }

    /// Read the input and threshold it.
    pub fn compute(&self) -> Result<ThresholdResult, StageError> {
        let volume = read(&self.input)?;
        let result = OtsuThresholdFilter::new(self.params).apply(&volume);
        info!(
            "otsu threshold for {} is {}",
            self.input.display(),
            result.threshold
        );
        Ok(result)
    }

    /// Write the binary volume and the optional preview.
    pub fn save(&self, result: &ThresholdResult) -> Result<(), StageError> {
        write(&result.output, &self.output)?;
        preview(&result.output, self.preview.as_deref())
    }

    /// Threshold the input and write the binary volume; returns the threshold.
    pub fn run(&self) -> Result<u8, StageError> {
        let result = self.compute()?;
        self.save(&result)?;
        Ok(result.threshold)
    }
}

#[derive(Clone, Debug)]
pub struct AffineJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub transform: TransformParams,
    pub policy: TransformPolicy,
    pub resample: ResampleParams,
    pub preview: Option<PathBuf>,
}

impl AffineJob {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            transform: TransformParams::default(),
            policy: TransformPolicy::default(),
            resample: ResampleParams::default(),
            preview: None,
        }
    }

    /// Transform the input about its center and write the result.
    pub fn run(&self) -> Result<(), StageError> {
        let volume = read(&self.input)?;
        let pipeline =
            TransformPipeline::from_params(&self.transform, &volume.center(), self.policy);
        let output = Resampler::new(self.resample)
            .apply(&volume, &pipeline)
            .map_err(|source| StageError::Resample { source })?;
        write(&output, &self.output)?;
        preview(&output, self.preview.as_deref())
    }
}
