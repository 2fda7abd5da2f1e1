use crate::enums::Orientation;

use image::GrayImage;
use image::ImageBuffer;
use nalgebra::{Point3, Vector3};
use ndarray::Array3;
use ndarray::ArrayView2;
use ndarray::s;
use rayon::prelude::*;
use std::path::Path;

/// An 8-bit volume with physical placement.
///
/// Samples are stored `[z, y, x]` (depth, height, width) while `spacing` and
/// `origin` are in (x, y, z) order.
#[derive(Clone, Debug, PartialEq)]
pub struct Volume {
    pub data: Array3<u8>,
    pub spacing: Vector3<f64>,
    pub origin: Point3<f64>,
}

impl Default for Volume {
    fn default() -> Self {
        Self {
            data: Array3::zeros((0, 0, 0)),
            spacing: Vector3::new(1.0, 1.0, 1.0),
            origin: Point3::origin(),
        }
    }
}

impl Volume {
    pub fn new(data: Array3<u8>, spacing: Vector3<f64>, origin: Point3<f64>) -> Self {
        Self {
            data,
            spacing,
            origin,
        }
    }

    /// A volume with unit spacing and its first sample at the physical origin.
    pub fn from_data(data: Array3<u8>) -> Self {
        Self {
            data,
            ..Default::default()
        }
    }

    /// Get the dimensions of the volume (depth, height, width)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Number of samples along (x, y, z).
    pub fn size(&self) -> [usize; 3] {
        let (depth, height, width) = self.data.dim();
        [width, height, depth]
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<u8> {
        &self.data
    }

    /// A volume on the same grid holding `data`.
    pub fn with_data(&self, data: Array3<u8>) -> Self {
        debug_assert_eq!(data.dim(), self.data.dim());
        Self {
            data,
            spacing: self.spacing,
            origin: self.origin,
        }
    }

    /// Pivot used by rotation and scaling: `origin + spacing * size / 2` per axis.
    pub fn center(&self) -> Point3<f64> {
        let [nx, ny, nz] = self.size();
        let extent = Vector3::new(nx as f64, ny as f64, nz as f64);
        self.origin + self.spacing.component_mul(&extent) / 2.0
    }

    /// Physical position of the sample at (x, y, z).
    pub fn index_to_physical(&self, x: usize, y: usize, z: usize) -> Point3<f64> {
        let index = Vector3::new(x as f64, y as f64, z as f64);
        self.origin + self.spacing.component_mul(&index)
    }

    /// Continuous (x, y, z) index of a physical point.
    pub fn physical_to_continuous_index(&self, point: &Point3<f64>) -> Vector3<f64> {
        (point - self.origin).component_div(&self.spacing)
    }

    /// Whether a continuous index lies within half a sample of the buffer.
    pub fn is_inside_buffer(&self, index: &Vector3<f64>) -> bool {
        self.size()
            .iter()
            .zip(index.iter())
            .all(|(&n, &i)| i >= -0.5 && i <= n as f64 - 0.5)
    }

    pub fn get_slice_from_axis(
        &self,
        index: usize,
        orientation: &Orientation,
    ) -> Option<ArrayView2<'_, u8>> {
        if !self.is_valid_index(index, orientation) {
            return None;
        }
        let slice_result = match orientation {
            Orientation::Axial => self.data().slice(s![index, .., ..]),
            Orientation::Coronal => self.data().slice(s![.., index, ..]),
            Orientation::Sagittal => self.data().slice(s![.., .., index]),
        };
        Some(slice_result)
    }

    fn slice_to_image(slice: &ArrayView2<'_, u8>) -> Option<GrayImage> {
        let (height, width) = slice.dim();
        let pixel_data: Vec<u8> = slice.into_par_iter().copied().collect();
        ImageBuffer::from_raw(width as u32, height as u32, pixel_data)
    }

    pub fn get_image_from_axis(&self, index: usize, orientation: Orientation) -> Option<GrayImage> {
        let slice = self.get_slice_from_axis(index, &orientation)?;
        Self::slice_to_image(&slice)
    }

    /// Write the middle slice of `orientation` as a grayscale PNG.
    pub fn save_preview(
        &self,
        path: impl AsRef<Path>,
        orientation: Orientation,
    ) -> Result<(), image::ImageError> {
        let (depth, height, width) = self.dim();
        let index = match orientation {
            Orientation::Axial => depth / 2,
            Orientation::Coronal => height / 2,
            Orientation::Sagittal => width / 2,
        };
        let image = self.get_image_from_axis(index, orientation).ok_or_else(|| {
            image::ImageError::Parameter(image::error::ParameterError::from_kind(
                image::error::ParameterErrorKind::DimensionMismatch,
            ))
        })?;
        image.save(path)
    }

    fn is_valid_index(&self, index: usize, orientation: &Orientation) -> bool {
        let dim = self.data.dim();
        let max_index = match orientation {
            Orientation::Axial => dim.0,
            Orientation::Coronal => dim.1,
            Orientation::Sagittal => dim.2,
        };
        index < max_index
    }
}
