//! Interfaces and implementations specific to integration with `ndarray`.
//!
//! #### Note on memory order
//!
//! Volumes are kept in column major order (also called Fortran order), the
//! same order in which NIfTI volumes are stored on disk. Arrays produced here
//! are therefore in this memory order as well, rather than the usual row
//! major order.
use super::shape::Dim;
use super::InMemVolume;
use crate::error::{GridError, Result};
use crate::typedef::DataType;
use ::ndarray::{Array, ArrayBase, Data, Dimension, IxDyn, ShapeBuilder};

/// Trait for volumes which can be converted to an ndarray.
pub trait IntoNdArray {
    /// Consume the volume into an ndarray with the same number of dimensions.
    fn into_ndarray(self) -> Result<Array<f64, IxDyn>>;
}

impl IntoNdArray for InMemVolume {
    fn into_ndarray(self) -> Result<Array<f64, IxDyn>> {
        let dim = *super::VoxelVolume::dim(&self);
        Array::from_shape_vec(IxDyn(dim.as_ref()).f(), self.into_raw_data())
            .map_err(|e| GridError::InvalidGrid(e.to_string()))
    }
}

impl InMemVolume {
    /// Copy the contents of an array of any memory layout into a new volume.
    pub fn from_ndarray<S, D>(array: &ArrayBase<S, D>, datatype: DataType) -> Result<Self>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let dim = Dim::from_slice(array.shape())?;
        // iterating the reversed axes in logical order visits axis 0 fastest
        let data: Vec<f64> = array.view().reversed_axes().iter().cloned().collect();
        InMemVolume::from_raw_data(dim, datatype, data)
    }
}

#[cfg(test)]
mod tests {
    use super::IntoNdArray;
    use crate::volume::{InMemVolume, VoxelVolume};
    use crate::DataType;
    use ndarray::Array3;

    #[test]
    fn ndarray_round_trip_keeps_coordinates() {
        let array = Array3::from_shape_fn((3, 4, 2), |(i, j, k)| (i + 10 * j + 100 * k) as f64);
        let vol = InMemVolume::from_ndarray(&array, DataType::Float64).unwrap();
        assert_eq!(vol.dim().as_ref(), &[3, 4, 2]);
        assert_eq!(vol.get_f64(&[2, 3, 1]).unwrap(), 132.);
        assert_eq!(vol.raw_data()[1], 1.);

        let back = vol.into_ndarray().unwrap();
        assert_eq!(back.shape(), &[3, 4, 2]);
        assert_eq!(back[[2, 3, 1]], 132.);
        assert_eq!(back.into_dimensionality::<ndarray::Ix3>().unwrap(), array);
    }
}
