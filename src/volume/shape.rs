//! Shape and N-dimensional index constructs.
//!
//! Grids in this crate follow the NIfTI-1 dimensionality limit of 7. The
//! types [`Dim`] and [`Idx`] hold a rank and up to 7 per-axis values on the
//! stack, so that they can be created inside per-voxel loops without
//! allocating.
//!
//! Linear voxel indices are in column major order: axis 0 varies fastest.
//!
//! [`Dim`]: ./struct.Dim.html
//! [`Idx`]: ./struct.Idx.html
use crate::error::{GridError, Result};

/// Maximum supported number of axes.
pub const MAX_RANK: usize = 7;

/// Largest number of voxels an in-memory volume can hold.
pub const MAX_ELEMENTS: usize = isize::MAX as usize / std::mem::size_of::<f64>();

/// Number of voxels of a shape with the given axis lengths, or `None` if it
/// exceeds [`MAX_ELEMENTS`].
///
/// [`MAX_ELEMENTS`]: ./constant.MAX_ELEMENTS.html
pub fn checked_element_count(dim: &[usize]) -> Option<usize> {
    dim.iter()
        .try_fold(1usize, |acc, d| acc.checked_mul(*d))
        .filter(|n| *n <= MAX_ELEMENTS)
}

/// An N-dimensional voxel index.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub struct Idx {
    rank: usize,
    idx: [usize; MAX_RANK],
}

impl Idx {
    /// Create a new N-dimensional index from the given per-axis positions.
    ///
    /// # Example
    ///
    /// ```
    /// # use nifti_grid::volume::shape::Idx;
    /// let idx = Idx::from_slice(&[1, 2, 5])?;
    /// assert_eq!(idx.as_ref(), &[1, 2, 5]);
    /// # Ok::<(), nifti_grid::GridError>(())
    /// ```
    pub fn from_slice(idx: &[usize]) -> Result<Self> {
        if idx.is_empty() || idx.len() > MAX_RANK {
            return Err(GridError::InconsistentDim(idx.len()));
        }
        let mut raw = [0; MAX_RANK];
        raw[..idx.len()].copy_from_slice(idx);
        Ok(Idx {
            rank: idx.len(),
            idx: raw,
        })
    }

    /// An index of the given rank with every position at zero.
    pub(crate) fn zeros(rank: usize) -> Self {
        debug_assert!(rank >= 1 && rank <= MAX_RANK);
        Idx {
            rank,
            idx: [0; MAX_RANK],
        }
    }

    /// Retrieve the rank of this index (dimensionality)
    pub fn rank(&self) -> usize {
        self.rank
    }
}

impl AsRef<[usize]> for Idx {
    fn as_ref(&self) -> &[usize] {
        &self.idx[..self.rank]
    }
}

impl AsMut<[usize]> for Idx {
    fn as_mut(&mut self) -> &mut [usize] {
        &mut self.idx[..self.rank]
    }
}

/// A validated volume shape: between 1 and 7 axes, each of positive length.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub struct Dim(Idx);

impl Dim {
    /// Create a new volume shape from the length of each axis.
    ///
    /// # Example
    ///
    /// ```
    /// # use nifti_grid::volume::shape::Dim;
    /// let dim = Dim::from_slice(&[64, 32, 16])?;
    /// assert_eq!(dim.as_ref(), &[64, 32, 16]);
    /// assert!(Dim::from_slice(&[64, 0, 16]).is_err());
    /// # Ok::<(), nifti_grid::GridError>(())
    /// ```
    pub fn from_slice(dim: &[usize]) -> Result<Self> {
        let idx = Idx::from_slice(dim)?;
        if let Some(axis) = dim.iter().position(|d| *d == 0) {
            return Err(GridError::InvalidGrid(format!("axis {} has zero length", axis)));
        }
        if checked_element_count(dim).is_none() {
            return Err(GridError::InvalidGrid(format!(
                "shape {:?} holds more than {} voxels",
                dim, MAX_ELEMENTS
            )));
        }
        Ok(Dim(idx))
    }

    /// Retrieve the rank of this shape (dimensionality)
    pub fn rank(&self) -> usize {
        self.0.rank()
    }

    /// Calculate the number of elements in this shape, which never exceeds
    /// `MAX_ELEMENTS`.
    pub fn element_count(&self) -> usize {
        self.as_ref().iter().product()
    }

    /// Whether the given coordinates lie within this shape.
    pub fn contains(&self, coords: &[usize]) -> bool {
        coords.len() == self.rank() && coords.iter().zip(self.as_ref()).all(|(c, d)| c < d)
    }

    /// Map coordinates to a column major linear index.
    pub fn linear_index(&self, coords: &[usize]) -> Result<usize> {
        if !self.contains(coords) {
            return Err(GridError::OutOfBounds(coords.to_vec()));
        }
        let index = coords
            .iter()
            .zip(self.as_ref())
            .rev()
            .fold(0, |acc, (c, d)| acc * d + c);
        Ok(index)
    }

    /// Map a column major linear index back to coordinates.
    ///
    /// The index is expected to be below `element_count()`.
    pub fn coords_of(&self, mut index: usize) -> Idx {
        let mut out = Idx::zeros(self.rank());
        for (c, d) in out.as_mut().iter_mut().zip(self.as_ref()) {
            *c = index % d;
            index /= d;
        }
        out
    }

    /// Provide an iterator traversing through all possible indices of a
    /// hypothetical volume with this shape.
    pub fn index_iter(&self) -> DimIter {
        DimIter::new(*self)
    }
}

impl AsRef<[usize]> for Dim {
    fn as_ref(&self) -> &[usize] {
        self.0.as_ref()
    }
}

/// An iterator of all indices in a multi-dimensional volume.
///
/// Traversal is in column major order.
#[derive(Debug, Clone)]
pub struct DimIter {
    shape: Dim,
    state: DimIterState,
}

#[derive(Debug, Copy, Clone)]
enum DimIterState {
    First,
    Middle(Idx),
    Fused,
}

impl DimIter {
    fn new(shape: Dim) -> Self {
        DimIter {
            shape,
            state: DimIterState::First,
        }
    }
}

impl Iterator for DimIter {
    type Item = Idx;

    fn next(&mut self) -> Option<Self::Item> {
        let (out, next_state) = match self.state {
            DimIterState::First => {
                let out = Idx::zeros(self.shape.rank());
                (Some(out), DimIterState::Middle(out))
            }
            DimIterState::Fused => (None, DimIterState::Fused),
            DimIterState::Middle(mut current) => {
                let mut good = false;
                for (c, s) in Iterator::zip(current.as_mut().iter_mut(), self.shape.as_ref().iter())
                {
                    if *c < *s - 1 {
                        *c += 1;
                        good = true;
                        break;
                    }
                    *c = 0;
                }
                if good {
                    (Some(current), DimIterState::Middle(current))
                } else {
                    (None, DimIterState::Fused)
                }
            }
        };
        self.state = next_state;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{checked_element_count, Dim, Idx, MAX_ELEMENTS};
    use crate::GridError;

    #[test]
    fn test_dim() {
        let dim = Dim::from_slice(&[256, 256, 100]).unwrap();
        assert_eq!(dim.as_ref(), &[256, 256, 100]);
        assert_eq!(dim.element_count(), 6553600);
        assert!(Dim::from_slice(&[]).is_err());
        assert!(Dim::from_slice(&[1; 8]).is_err());
    }

    #[test]
    fn oversized_shapes_are_rejected() {
        let huge = [usize::MAX / 2, 3, 1];
        assert_eq!(checked_element_count(&huge), None);
        assert!(matches!(Dim::from_slice(&huge), Err(GridError::InvalidGrid(_))));
        assert_eq!(checked_element_count(&[MAX_ELEMENTS]), Some(MAX_ELEMENTS));
        assert_eq!(checked_element_count(&[MAX_ELEMENTS, 2]), None);
        assert_eq!(checked_element_count(&[4, 5, 6]), Some(120));
    }

    #[test]
    fn test_linear_index() {
        let dim = Dim::from_slice(&[16, 16, 3]).unwrap();
        assert!(dim.linear_index(&[0, 0]).is_err());
        assert_eq!(dim.linear_index(&[0, 0, 0]).unwrap(), 0);
        assert_eq!(dim.linear_index(&[1, 0, 0]).unwrap(), 1);
        assert_eq!(dim.linear_index(&[0, 1, 0]).unwrap(), 16);
        assert_eq!(dim.linear_index(&[0, 0, 1]).unwrap(), 256);
        assert_eq!(dim.linear_index(&[1, 1, 1]).unwrap(), 273);
        assert_eq!(dim.linear_index(&[15, 15, 2]).unwrap(), 16 * 16 * 3 - 1);
        assert!(dim.linear_index(&[16, 15, 2]).is_err());

        for i in &[0, 1, 17, 273, 767] {
            let coords = dim.coords_of(*i);
            assert_eq!(dim.linear_index(coords.as_ref()).unwrap(), *i);
        }
    }

    #[test]
    fn test_dim_iter() {
        let dim = Dim::from_slice(&[3, 4]).unwrap();
        assert_eq!(dim.element_count(), 12);

        let idx: Vec<_> = dim.index_iter().take(13).collect();
        assert_eq!(idx.len(), dim.element_count());
        for (i, got) in idx.into_iter().enumerate() {
            let expected = Idx::from_slice(&[i % 3, i / 3]).unwrap();
            assert_eq!(got, expected, "#{} not ok", i);
            assert_eq!(dim.coords_of(i), expected);
        }
    }
}
