//! Module holding an in-memory implementation of a voxel volume.

use super::shape::Dim;
use super::VoxelVolume;
use crate::error::{GridError, Result};
use crate::typedef::DataType;

/// A voxel volume contained in memory.
///
/// Voxels are kept as `f64` in column major order (axis 0 varies fastest),
/// already converted to the value range of `datatype`.
#[derive(Debug, PartialEq, Clone)]
pub struct InMemVolume {
    dim: Dim,
    datatype: DataType,
    data: Vec<f64>,
}

impl InMemVolume {
    /// Create a volume from column major voxel data.
    ///
    /// Values are quantized to `datatype` on construction.
    ///
    /// # Errors
    ///
    /// - `GridError::InvalidGrid` if the number of voxels does not match the
    /// shape.
    pub fn from_raw_data(dim: Dim, datatype: DataType, mut data: Vec<f64>) -> Result<Self> {
        if data.len() != dim.element_count() {
            return Err(GridError::InvalidGrid(format!(
                "expected {} voxels for shape {:?}, got {}",
                dim.element_count(),
                dim.as_ref(),
                data.len()
            )));
        }
        if datatype != DataType::Float64 {
            for v in &mut data {
                *v = datatype.quantize(*v);
            }
        }
        Ok(InMemVolume {
            dim,
            datatype,
            data,
        })
    }

    /// Create a volume by evaluating `f` at every voxel coordinate.
    pub fn from_fn<F>(dim: Dim, datatype: DataType, mut f: F) -> Self
    where
        F: FnMut(&[usize]) -> f64,
    {
        let data = dim
            .index_iter()
            .map(|idx| datatype.quantize(f(idx.as_ref())))
            .collect();
        InMemVolume {
            dim,
            datatype,
            data,
        }
    }

    /// Create a volume where every voxel holds the same value.
    pub fn filled(dim: Dim, datatype: DataType, value: f64) -> Self {
        InMemVolume {
            dim,
            datatype,
            data: vec![datatype.quantize(value); dim.element_count()],
        }
    }

    /// Retrieve a reference to the voxel data, in column major order.
    pub fn raw_data(&self) -> &[f64] {
        &self.data
    }

    /// Retrieve the voxel data, consuming the volume.
    pub fn into_raw_data(self) -> Vec<f64> {
        self.data
    }

    /// Write a single voxel, quantized to this volume's data type.
    pub fn set_f64(&mut self, coords: &[usize], value: f64) -> Result<()> {
        let index = self.dim.linear_index(coords)?;
        self.data[index] = self.datatype.quantize(value);
        Ok(())
    }
}

impl VoxelVolume for InMemVolume {
    fn dim(&self) -> &Dim {
        &self.dim
    }

    fn get_f64(&self, coords: &[usize]) -> Result<f64> {
        let index = self.dim.linear_index(coords)?;
        Ok(self.data[index])
    }

    fn data_type(&self) -> DataType {
        self.datatype
    }
}
