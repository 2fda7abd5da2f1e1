use crate::{enums::SortBy, volume::Volume};

use dicom::{
    object::{FileDicomObject, InMemDicomObject, open_file},
    pixeldata::{ConvertOptions, PixelDecoder, VoiLutOption},
};
use dicom_dictionary_std::tags;
use log::{debug, info, warn};
use nalgebra::{Point3, Vector3};
use ndarray::{Array2, Array3, Axis, Ix3, s};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use std::{fs, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("No valid DICOM images found")]
    NoValidImages,

    #[error("Inconsistent image dimensions")]
    InconsistentDimensions,

    #[error("Missing spacing information")]
    MissingSpacing,

    #[error("Unsupported dimensionality: dimensions beyond the third must be 1, got shape {0:?}")]
    UnsupportedDimensionality(Vec<usize>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),

    #[error("NIfTI error: {0}")]
    Nifti(#[from] nifti::NiftiError),

    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// One decoded DICOM slice with the keys used to stack it.
struct SliceImage {
    order: Option<f32>,
    position: Option<Point3<f64>>,
    pixels: Array2<u8>,
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Load a volume from any supported location.
    ///
    /// Directories are read as DICOM series, `.dcm` files as single DICOM
    /// images and everything else as NIfTI-1/Analyze (`.nii`, `.nii.gz`,
    /// `.hdr`, `.img`).
    pub fn load(path: impl AsRef<Path>) -> Result<Volume, VolumeLoaderError> {
        let path = path.as_ref();
        let volume = if path.is_dir() {
            Self::load_from_directory(path, SortBy::default())?
        } else if Self::has_extension(path, "dcm") {
            Self::load_from_file_paths(&[path], SortBy::None)?
        } else {
            Self::load_nifti(path)?
        };
        info!(
            "loaded {} with size {:?}, spacing {:?}, origin {:?}",
            path.display(),
            volume.size(),
            volume.spacing.as_slice(),
            volume.origin.coords.as_slice()
        );
        Ok(volume)
    }

    /// Load a NIfTI-1 or Analyze volume, casting intensities to u8.
    pub fn load_nifti(path: impl AsRef<Path>) -> Result<Volume, VolumeLoaderError> {
        let object = ReaderOptions::new().read_file(path.as_ref())?;
        let header = object.header().clone();
        let array = object.into_volume().into_ndarray::<u8>()?;

        let shape = array.shape().to_vec();
        if shape.iter().skip(3).any(|&n| n != 1) {
            return Err(VolumeLoaderError::UnsupportedDimensionality(shape));
        }
        let mut array = array;
        while array.ndim() > 3 {
            let last = Axis(array.ndim() - 1);
            array = array.index_axis_move(last, 0);
        }
        while array.ndim() < 3 {
            let next = Axis(array.ndim());
            array = array.insert_axis(next);
        }
        let array = array.into_dimensionality::<Ix3>()?;

        // NIfTI arrays are indexed [x, y, z]; volumes are stored [z, y, x].
        let data = array.reversed_axes().as_standard_layout().into_owned();

        Ok(Volume::new(
            data,
            Self::nifti_spacing(&header),
            Self::nifti_origin(&header),
        ))
    }

    fn nifti_spacing(header: &NiftiHeader) -> Vector3<f64> {
        Vector3::from_fn(|i, _| {
            let spacing = header.pixdim[i + 1] as f64;
            if spacing > 0.0 {
                spacing
            } else {
                warn!("non-positive pixdim[{}] = {spacing}, using 1.0", i + 1);
                1.0
            }
        })
    }

    fn nifti_origin(header: &NiftiHeader) -> Point3<f64> {
        if header.qform_code > 0 {
            Point3::new(
                header.quatern_x as f64,
                header.quatern_y as f64,
                header.quatern_z as f64,
            )
        } else if header.sform_code > 0 {
            Point3::new(
                header.srow_x[3] as f64,
                header.srow_y[3] as f64,
                header.srow_z[3] as f64,
            )
        } else {
            Point3::origin()
        }
    }

    /// Load a volume from DICOM objects
    ///
    /// # Arguments
    ///
    /// * `dicom_objects` - Slice of DICOM file objects
    /// * `sort_by` - Method to sort the slices
    ///
    /// # Errors
    ///
    /// Returns error if no valid images found or dimensions are inconsistent
    pub fn load_from_dicom_objects(
        dicom_objects: &[FileDicomObject<InMemDicomObject>],
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let mut images: Vec<_> = dicom_objects
            .iter()
            .filter_map(|dicom_object| Self::extract_image_with_order(dicom_object, &sort_by))
            .collect();

        if images.is_empty() {
            return Err(VolumeLoaderError::NoValidImages);
        }

        Self::sort_images(&mut images, sort_by);
        Self::validate_dimensions(&images)?;

        let origin = images[0].position.unwrap_or_else(Point3::origin);
        let volume_array = Self::build_volume_array(&images);
        let spacing = Self::get_spacing(dicom_objects).ok_or(VolumeLoaderError::MissingSpacing)?;
        debug!("stacked {} DICOM slices", images.len());

        Ok(Volume::new(volume_array, spacing, origin))
    }

    /// Load a volume from file paths
    pub fn load_from_file_paths(
        paths: &[impl AsRef<Path>],
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let objects: Result<Vec<_>, _> =
            paths.iter().map(|path| open_file(path.as_ref())).collect();

        Self::load_from_dicom_objects(&objects?, sort_by)
    }

    /// Load a volume from a directory containing .dcm files
    pub fn load_from_directory(
        path: impl AsRef<Path>,
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let paths: Vec<_> = fs::read_dir(path.as_ref())?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| Self::has_extension(path, "dcm"))
            .collect();

        if paths.is_empty() {
            return Err(VolumeLoaderError::NoValidImages);
        }

        Self::load_from_file_paths(&paths, sort_by)
    }

    fn has_extension(path: &Path, extension: &str) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
    }

    fn extract_image_with_order(
        dicom_object: &FileDicomObject<InMemDicomObject>,
        sort_by: &SortBy,
    ) -> Option<SliceImage> {
        let order = Self::get_sort_order(dicom_object, sort_by)?;
        let pixels = Self::decode_image(dicom_object)?;
        Some(SliceImage {
            order,
            position: Self::get_position(dicom_object),
            pixels,
        })
    }

    fn get_sort_order(
        dicom_object: &FileDicomObject<InMemDicomObject>,
        sort_by: &SortBy,
    ) -> Option<Option<f32>> {
        match sort_by {
            SortBy::ImagePositionPatient => {
                let pos = dicom_object
                    .element(tags::IMAGE_POSITION_PATIENT)
                    .ok()?
                    .to_multi_float32()
                    .ok()?;
                Some(pos.get(2).copied())
            }
            SortBy::TablePosition => {
                let pos = dicom_object
                    .element(tags::TABLE_POSITION)
                    .ok()?
                    .to_float32()
                    .ok();
                Some(pos)
            }
            SortBy::InstanceNumber => {
                let num = dicom_object
                    .element(tags::INSTANCE_NUMBER)
                    .ok()?
                    .to_int::<i32>()
                    .ok()
                    .map(|n| n as f32);
                Some(num)
            }
            SortBy::None => Some(Some(0.0)),
        }
    }

    fn get_position(dicom_object: &FileDicomObject<InMemDicomObject>) -> Option<Point3<f64>> {
        let pos = dicom_object
            .element(tags::IMAGE_POSITION_PATIENT)
            .ok()?
            .to_multi_float32()
            .ok()?;
        match pos.as_slice() {
            [x, y, z, ..] => Some(Point3::new(*x as f64, *y as f64, *z as f64)),
            _ => None,
        }
    }

    fn decode_image(dicom_object: &FileDicomObject<InMemDicomObject>) -> Option<Array2<u8>> {
        let pixel_data = dicom_object.decode_pixel_data().ok()?;
        let options = ConvertOptions::new().with_voi_lut(VoiLutOption::First);
        pixel_data
            .to_ndarray_with_options::<u8>(&options)
            .ok()
            .map(|arr| arr.slice_move(s![0, .., .., 0]))
    }

    fn sort_images(images: &mut [SliceImage], sort_by: SortBy) {
        if !matches!(sort_by, SortBy::None) {
            images.sort_by(|a, b| {
                a.order
                    .partial_cmp(&b.order)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
    }

    fn validate_dimensions(images: &[SliceImage]) -> Result<(), VolumeLoaderError> {
        let first_dim = images[0].pixels.dim();
        if images.iter().any(|img| img.pixels.dim() != first_dim) {
            return Err(VolumeLoaderError::InconsistentDimensions);
        }
        Ok(())
    }

    fn build_volume_array(images: &[SliceImage]) -> Array3<u8> {
        let (height, width) = images[0].pixels.dim();
        let depth = images.len();
        let mut volume = Array3::<u8>::zeros((depth, height, width));

        for (i, image) in images.iter().enumerate() {
            volume.slice_mut(s![i, .., ..]).assign(&image.pixels);
        }

        volume
    }

    /// (column, row, slice) spacing from PixelSpacing and SliceThickness.
    fn get_spacing(dicom_objects: &[FileDicomObject<InMemDicomObject>]) -> Option<Vector3<f64>> {
        dicom_objects.iter().find_map(|dicom_object| {
            let pixel_spacing = dicom_object
                .element(tags::PIXEL_SPACING)
                .ok()?
                .to_multi_float32()
                .ok()?;

            let slice_thickness = dicom_object
                .element(tags::SLICE_THICKNESS)
                .ok()?
                .to_float32()
                .ok()?;

            Some(Vector3::new(
                *pixel_spacing.get(1)? as f64,
                *pixel_spacing.first()? as f64,
                slice_thickness as f64,
            ))
        })
    }
}
