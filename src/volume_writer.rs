use crate::volume::Volume;

use log::info;
use nifti::{NiftiHeader, writer::WriterOptions};
use std::{fs, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VolumeWriterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("NIfTI error: {0}")]
    Nifti(#[from] nifti::NiftiError),
}

/// NIFTI_UNITS_MM
const UNITS_MM: u8 = 2;

pub struct VolumeWriter;

impl VolumeWriter {
    /// Write `volume` as NIfTI-1.
    ///
    /// The file layout follows the extension: `.nii`, `.nii.gz`, or a
    /// `.hdr`/`.img` pair. Missing parent directories are created.
    pub fn save(volume: &Volume, path: impl AsRef<Path>) -> Result<(), VolumeWriterError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let header = Self::header_for(volume);
        // Volumes are stored [z, y, x]; NIfTI expects [x, y, z].
        let data = volume.data().view().reversed_axes();
        WriterOptions::new(path)
            .reference_header(&header)
            .write_nifti(&data)?;

        info!("wrote {} with size {:?}", path.display(), volume.size());
        Ok(())
    }

    fn header_for(volume: &Volume) -> NiftiHeader {
        let spacing = volume.spacing;
        let origin = volume.origin;
        NiftiHeader {
            pixdim: [
                1.0,
                spacing.x as f32,
                spacing.y as f32,
                spacing.z as f32,
                1.0,
                1.0,
                1.0,
                1.0,
            ],
            qform_code: 1,
            sform_code: 0,
            quatern_b: 0.0,
            quatern_c: 0.0,
            quatern_d: 0.0,
            quatern_x: origin.x as f32,
            quatern_y: origin.y as f32,
            quatern_z: origin.z as f32,
            xyzt_units: UNITS_MM,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume_loader::VolumeLoader;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};
    use ndarray::Array3;

    fn sample_volume() -> Volume {
        Volume::new(
            Array3::from_shape_fn((3, 4, 5), |(z, y, x)| (x + 5 * y + 20 * z) as u8),
            Vector3::new(0.5, 1.25, 2.0),
            Point3::new(-10.0, 4.0, 7.5),
        )
    }

    #[test]
    fn nifti_keeps_samples_and_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("volume.nii");
        let volume = sample_volume();

        VolumeWriter::save(&volume, &path).unwrap();
        let loaded = VolumeLoader::load(&path).unwrap();

        assert_eq!(loaded.data(), volume.data());
        assert_relative_eq!(loaded.spacing, volume.spacing, epsilon = 1e-6);
        assert_relative_eq!(loaded.origin, volume.origin, epsilon = 1e-6);
    }

    #[test]
    fn gzipped_nifti_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volume.nii.gz");
        let volume = sample_volume();

        VolumeWriter::save(&volume, &path).unwrap();
        let loaded = VolumeLoader::load(&path).unwrap();
        assert_eq!(loaded.data()[[2, 3, 4]], volume.data()[[2, 3, 4]]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = VolumeLoader::load(dir.path().join("absent.nii"));
        assert!(result.is_err());
    }

    #[test]
    fn directory_without_dicom_files_has_no_images() {
        let dir = tempfile::tempdir().unwrap();
        let result = VolumeLoader::load(dir.path());
        assert!(matches!(
            result,
            Err(crate::volume_loader::VolumeLoaderError::NoValidImages)
        ));
    }
}
