//! This module defines the voxel volume API, as well as an in-memory volume
//! type. An integration with `ndarray` is also available for moving voxel
//! data in and out of the crate.

pub mod inmem;
pub mod ndarray;
pub mod shape;

pub use self::inmem::InMemVolume;
pub use self::ndarray::IntoNdArray;
use self::shape::Dim;
use crate::error::Result;
use crate::typedef::DataType;

/// Public API for voxel data, exposed as a multi-dimensional voxel array
/// with random access reads.
///
/// Volumes are shared between worker threads during an operation, so
/// implementations are expected to be `Sync` wherever they are handed to the
/// transfer engine.
pub trait VoxelVolume {
    /// Get the dimensions of the volume.
    fn dim(&self) -> &Dim;

    /// Get the volume's number of dimensions.
    fn dimensionality(&self) -> usize {
        self.dim().rank()
    }

    /// Fetch a single voxel's value in the given voxel index coordinates
    /// as a double precision floating point value.
    ///
    /// # Errors
    ///
    /// - `GridError::OutOfBounds` if the given coordinates surpass this
    /// volume's boundaries.
    fn get_f64(&self, coords: &[usize]) -> Result<f64>;

    /// Get this volume's data type.
    fn data_type(&self) -> DataType;

    /// Fetch a single voxel as a mask value. Any non-zero, non-NaN value is
    /// considered to be set.
    fn get_bool(&self, coords: &[usize]) -> Result<bool> {
        let v = self.get_f64(coords)?;
        Ok(v != 0. && !v.is_nan())
    }
}

impl<'a, V: VoxelVolume + ?Sized> VoxelVolume for &'a V {
    fn dim(&self) -> &Dim {
        (**self).dim()
    }

    fn get_f64(&self, coords: &[usize]) -> Result<f64> {
        (**self).get_f64(coords)
    }

    fn data_type(&self) -> DataType {
        (**self).data_type()
    }

    fn get_bool(&self, coords: &[usize]) -> Result<bool> {
        (**self).get_bool(coords)
    }
}
