//! This module defines the `GridDescriptor` struct, which holds the sampling
//! lattice of an image: its axis extents, voxel spacing and the affine
//! transform from voxel indices to world coordinates.
//!
//! Descriptors are immutable. New ones are made with a [`GridBuilder`],
//! either from scratch or starting from an existing descriptor, and the
//! builder checks that the result is complete and consistent before handing
//! it out.
//!
//! [`GridBuilder`]: ./struct.GridBuilder.html

use crate::affine::{self, Affine4};
use crate::error::{GridError, Result};
use crate::typedef::DataType;
use crate::volume::shape::Dim;
use approx::relative_eq;

/// Number of axes with a spatial meaning.
pub const SPATIAL_AXES: usize = 3;

/// Relative tolerance between a transform column norm and the axis spacing.
const SPACING_TOLERANCE: f64 = 1e-4;

/// Description of an image's voxel grid.
///
/// # Invariants
///
/// - the grid has at least 3 axes;
/// - there is one positive spacing per axis;
/// - the norm of each of the first 3 columns of `transform` equals the spacing
///   of the corresponding axis. Higher axes have no spatial transform.
///
/// # Examples
///
/// ```
/// use nifti_grid::{DataType, GridBuilder};
/// # use nifti_grid::Result;
///
/// # fn run() -> Result<()> {
/// let grid = GridBuilder::new()
///     .dim(&[64, 64, 10])
///     .spacing(&[3., 3., 3.])
///     .datatype(DataType::Uint8)
///     .build()?;
/// assert_eq!(grid.size(2), 10);
/// assert_eq!(grid.spatial_spacing(), [3., 3., 3.]);
/// # Ok(())
/// # }
/// # run().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GridDescriptor {
    dim: Dim,
    spacing: Vec<f64>,
    transform: Affine4,
    datatype: DataType,
    comments: Vec<String>,
}

impl GridDescriptor {
    /// The shape of the grid.
    pub fn dim(&self) -> &Dim {
        &self.dim
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.dim.rank()
    }

    /// Number of voxels along `axis`.
    ///
    /// # Panic
    ///
    /// Panics if `axis` is not below `ndim()`.
    pub fn size(&self, axis: usize) -> usize {
        self.dim.as_ref()[axis]
    }

    /// Voxel spacing of every axis.
    pub fn spacing(&self) -> &[f64] {
        &self.spacing
    }

    /// Voxel spacing of the three spatial axes.
    pub fn spatial_spacing(&self) -> [f64; 3] {
        [self.spacing[0], self.spacing[1], self.spacing[2]]
    }

    /// Extent of the three spatial axes.
    pub fn spatial_size(&self) -> [usize; 3] {
        let d = self.dim.as_ref();
        [d[0], d[1], d[2]]
    }

    /// Voxel-to-world transform.
    pub fn transform(&self) -> &Affine4 {
        &self.transform
    }

    /// Voxel data type of images laid on this grid.
    pub fn datatype(&self) -> DataType {
        self.datatype
    }

    /// Free text provenance lines.
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// Start a builder initialised with every property of this grid.
    pub fn to_builder(&self) -> GridBuilder {
        GridBuilder {
            dim: Some(self.dim.as_ref().to_vec()),
            spacing: Some(self.spacing.clone()),
            transform: Some(self.transform),
            datatype: Some(self.datatype),
            comments: self.comments.clone(),
        }
    }
}

/// Builder for a [`GridDescriptor`].
///
/// The shape and spacing are mandatory. When no transform is given, the
/// shape/zoom transform centred on the grid is used. When no data type is
/// given, `Float32` is assumed.
///
/// [`GridDescriptor`]: ./struct.GridDescriptor.html
#[derive(Debug, Clone, Default)]
pub struct GridBuilder {
    dim: Option<Vec<usize>>,
    spacing: Option<Vec<f64>>,
    transform: Option<Affine4>,
    datatype: Option<DataType>,
    comments: Vec<String>,
}

impl GridBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the length of every axis.
    pub fn dim(mut self, dim: &[usize]) -> Self {
        self.dim = Some(dim.to_vec());
        self
    }

    /// Set the length of a single axis, which must already exist.
    pub fn size(mut self, axis: usize, size: usize) -> Self {
        if let Some(d) = self.dim.as_mut().and_then(|d| d.get_mut(axis)) {
            *d = size;
        }
        self
    }

    /// Set the voxel spacing. Either one value per axis, or three values for
    /// the spatial axes only (the others then default to 1).
    pub fn spacing(mut self, spacing: &[f64]) -> Self {
        self.spacing = Some(spacing.to_vec());
        self
    }

    /// Set the voxel spacing of a single axis, which must already exist.
    pub fn axis_spacing(mut self, axis: usize, spacing: f64) -> Self {
        if let Some(s) = self.spacing.as_mut().and_then(|s| s.get_mut(axis)) {
            *s = spacing;
        }
        self
    }

    /// Set the voxel-to-world transform.
    pub fn transform(mut self, transform: Affine4) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Set the voxel data type.
    pub fn datatype(mut self, datatype: DataType) -> Self {
        self.datatype = Some(datatype);
        self
    }

    /// Append a provenance line.
    pub fn comment<T: Into<String>>(mut self, line: T) -> Self {
        self.comments.push(line.into());
        self
    }

    /// Validate and freeze the descriptor.
    ///
    /// # Errors
    ///
    /// - `GridError::InvalidGrid` if the shape or spacing are missing, the
    /// grid has fewer than 3 axes, a spacing is not positive, or the
    /// transform disagrees with the spacing.
    pub fn build(self) -> Result<GridDescriptor> {
        let dim = self
            .dim
            .ok_or_else(|| GridError::InvalidGrid("missing dimensions".to_string()))?;
        let dim = Dim::from_slice(&dim)?;
        if dim.rank() < SPATIAL_AXES {
            return Err(GridError::InvalidGrid(format!(
                "at least {} dimensions are required, got {}",
                SPATIAL_AXES,
                dim.rank()
            )));
        }

        let mut spacing = self
            .spacing
            .ok_or_else(|| GridError::InvalidGrid("missing voxel spacing".to_string()))?;
        if spacing.len() == SPATIAL_AXES && dim.rank() > SPATIAL_AXES {
            spacing.resize(dim.rank(), 1.);
        }
        if spacing.len() != dim.rank() {
            return Err(GridError::InvalidGrid(format!(
                "expected {} voxel spacings, got {}",
                dim.rank(),
                spacing.len()
            )));
        }
        if let Some(axis) = spacing
            .iter()
            .take(SPATIAL_AXES)
            .position(|s| !(s.is_finite() && *s > 0.))
        {
            return Err(GridError::InvalidGrid(format!(
                "voxel spacing of axis {} must be positive, got {}",
                axis, spacing[axis]
            )));
        }

        let transform = self
            .transform
            .unwrap_or_else(|| affine::shape_zoom_affine(dim.as_ref(), &spacing));
        let last_row = transform.row(3);
        if last_row[0] != 0. || last_row[1] != 0. || last_row[2] != 0. || last_row[3] != 1. {
            return Err(GridError::InvalidGrid(
                "transform is not affine (last row must be 0 0 0 1)".to_string(),
            ));
        }
        let column_norms = affine::spacing_of(&transform);
        for axis in 0..SPATIAL_AXES {
            if !relative_eq!(
                column_norms[axis],
                spacing[axis],
                max_relative = SPACING_TOLERANCE
            ) {
                return Err(GridError::InvalidGrid(format!(
                    "transform column {} has norm {} but axis spacing is {}",
                    axis, column_norms[axis], spacing[axis]
                )));
            }
        }

        Ok(GridDescriptor {
            dim,
            spacing,
            transform,
            datatype: self.datatype.unwrap_or(DataType::Float32),
            comments: self.comments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::GridBuilder;
    use crate::affine::{scaling, Affine4};
    use crate::{DataType, GridError};

    #[test]
    fn builder_defaults() {
        let grid = GridBuilder::new()
            .dim(&[4, 5, 6, 2])
            .spacing(&[1., 2., 3.])
            .build()
            .unwrap();
        assert_eq!(grid.ndim(), 4);
        assert_eq!(grid.spacing(), &[1., 2., 3., 1.]);
        assert_eq!(grid.datatype(), DataType::Float32);
        assert_eq!(grid.transform()[(0, 0)], -1.);
        assert_eq!(grid.transform()[(1, 1)], 2.);
    }

    #[test]
    fn builder_rejects_incomplete() {
        assert!(matches!(
            GridBuilder::new().spacing(&[1., 1., 1.]).build(),
            Err(GridError::InvalidGrid(_))
        ));
        assert!(GridBuilder::new().dim(&[4, 4, 4]).build().is_err());
        assert!(GridBuilder::new()
            .dim(&[4, 4])
            .spacing(&[1., 1.])
            .build()
            .is_err());
        assert!(GridBuilder::new()
            .dim(&[4, 4, 4])
            .spacing(&[1., 0., 1.])
            .build()
            .is_err());
    }

    #[test]
    fn builder_rejects_inconsistent_transform() {
        let res = GridBuilder::new()
            .dim(&[4, 4, 4])
            .spacing(&[1., 1., 1.])
            .transform(scaling([1., 2., 1.]))
            .build();
        assert!(matches!(res, Err(GridError::InvalidGrid(_))));

        let mut projective = Affine4::identity();
        projective[(3, 0)] = 0.5;
        assert!(GridBuilder::new()
            .dim(&[4, 4, 4])
            .spacing(&[1., 1., 1.])
            .transform(projective)
            .build()
            .is_err());
    }

    #[test]
    fn to_builder_keeps_everything() {
        let grid = GridBuilder::new()
            .dim(&[4, 4, 4])
            .spacing(&[2., 2., 2.])
            .transform(scaling([2., 2., 2.]))
            .datatype(DataType::Int16)
            .comment("first")
            .build()
            .unwrap();
        let copy = grid.to_builder().comment("second").build().unwrap();
        assert_eq!(copy.comments(), &["first".to_string(), "second".to_string()]);
        assert_eq!(copy.transform(), grid.transform());
        assert_eq!(copy.datatype(), DataType::Int16);

        let resized = grid.to_builder().size(1, 7).build().unwrap();
        assert_eq!(resized.size(1), 7);
    }
}
