//! Planning of regrid operations.
//!
//! A [`ResizePlanner`] works out the grid an image is resampled onto, from
//! exactly one of an explicit size, an explicit voxel spacing or a scale
//! factor, optionally on top of a template grid. Only the three spatial axes
//! are affected.
//!
//! Changing the voxel spacing keeps the outer edge of the field of view in
//! place: the first voxel's corner stays where it was, and the number of
//! voxels is rounded so that the physical extent is preserved as closely as
//! possible.
//!
//! [`ResizePlanner`]: ./struct.ResizePlanner.html

use crate::affine::{self, Affine4};
use crate::error::{GridError, Result};
use crate::event::{EventSink, GridEvent};
use crate::grid::{GridDescriptor, SPATIAL_AXES};
use crate::interp::{Interpolation, Oversample, DEFAULT_SINC_RADIUS, MAX_SINC_RADIUS};
use crate::typedef::DataType;
use nalgebra::Vector3;

/// Rounding bias, so that exact halves round down.
const SIZE_ROUNDING_BIAS: f64 = 1e-4;

/// Everything the transfer engine needs to regrid an image.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizePlan {
    /// output grid
    pub grid: GridDescriptor,
    /// interpolation method
    pub interpolation: Interpolation,
    /// sub-samples per output voxel along each spatial axis
    pub oversample: [usize; 3],
    /// sinc kernel radius in voxels, unused by the other methods
    pub sinc_radius: usize,
}

/// Builder-like planner for regrid operations.
///
/// # Example
///
/// ```
/// use nifti_grid::{GridBuilder, Interpolation, NullSink, ResizePlanner};
/// # use nifti_grid::Result;
///
/// # fn run() -> Result<()> {
/// let grid = GridBuilder::new().dim(&[64, 64, 32]).spacing(&[1., 1., 2.]).build()?;
/// let plan = ResizePlanner::new(&grid)
///     .voxel_size(&[2.])?
///     .interpolation(Interpolation::Linear)
///     .plan(&NullSink)?;
/// assert_eq!(plan.grid.spatial_size(), [32, 32, 32]);
/// assert_eq!(plan.oversample, [2, 2, 1]);
/// # Ok(())
/// # }
/// # run().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ResizePlanner<'a> {
    source: &'a GridDescriptor,
    template: Option<(&'a GridDescriptor, String)>,
    size: Option<[usize; 3]>,
    voxel_size: Option<[f64; 3]>,
    scale: Option<[f64; 3]>,
    interpolation: Interpolation,
    oversample: Oversample,
    sinc_radius: usize,
    datatype: Option<DataType>,
}

fn broadcast(values: &[f64], what: &str) -> Result<[f64; 3]> {
    let out = match *values {
        [v] => [v, v, v],
        [a, b, c] => [a, b, c],
        _ => {
            return Err(GridError::Configuration(format!(
                "{} requires 1 or 3 values, got {}",
                what,
                values.len()
            )))
        }
    };
    if let Some(v) = out.iter().find(|v| !(v.is_finite() && **v > 0.)) {
        return Err(GridError::Configuration(format!(
            "{} values must be positive, got {}",
            what, v
        )));
    }
    Ok(out)
}

impl<'a> ResizePlanner<'a> {
    /// Start planning the regrid of an image with the given grid.
    pub fn new(source: &'a GridDescriptor) -> Self {
        ResizePlanner {
            source,
            template: None,
            size: None,
            voxel_size: None,
            scale: None,
            interpolation: Interpolation::default(),
            oversample: Oversample::default(),
            sinc_radius: DEFAULT_SINC_RADIUS,
            datatype: None,
        }
    }

    /// Match the spatial size, spacing and transform of a template grid.
    /// `name` is recorded in the output grid's comments.
    pub fn template<T: Into<String>>(mut self, template: &'a GridDescriptor, name: T) -> Self {
        self.template = Some((template, name.into()));
        self
    }

    /// Set the number of voxels along each spatial axis.
    pub fn size(mut self, size: &[usize]) -> Result<Self> {
        let size = match *size {
            [a, b, c] => [a, b, c],
            _ => {
                return Err(GridError::Configuration(format!(
                    "the image size must be defined for 3 spatial dimensions, got {}",
                    size.len()
                )))
            }
        };
        if size.iter().any(|s| *s == 0) {
            return Err(GridError::Configuration(format!(
                "image size must be positive, got {:?}",
                size
            )));
        }
        self.size = Some(size);
        Ok(self)
    }

    /// Set the voxel spacing, one value for all spatial axes or one each.
    pub fn voxel_size(mut self, spacing: &[f64]) -> Result<Self> {
        self.voxel_size = Some(broadcast(spacing, "voxel size")?);
        Ok(self)
    }

    /// Scale the resolution by the given factor(s).
    pub fn scale(mut self, factor: &[f64]) -> Result<Self> {
        self.scale = Some(broadcast(factor, "scale factor")?);
        Ok(self)
    }

    /// Set the interpolation method (cubic by default).
    pub fn interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Set the oversampling factors (derived automatically by default).
    pub fn oversample(mut self, oversample: Oversample) -> Self {
        self.oversample = oversample;
        self
    }

    /// Set the radius of the sinc kernel, in voxels (3 by default).
    ///
    /// # Errors
    ///
    /// - `GridError::Configuration` if the radius is zero or larger than 8.
    pub fn sinc_radius(mut self, radius: usize) -> Result<Self> {
        if radius == 0 || radius > MAX_SINC_RADIUS {
            return Err(GridError::Configuration(format!(
                "sinc radius must be between 1 and {}, got {}",
                MAX_SINC_RADIUS, radius
            )));
        }
        self.sinc_radius = radius;
        Ok(self)
    }

    /// Override the output data type.
    pub fn datatype(mut self, datatype: DataType) -> Self {
        self.datatype = Some(datatype);
        self
    }

    /// Check the requested resize for conflicts.
    pub fn validate(&self) -> Result<()> {
        let resize_count = self.size.is_some() as usize
            + self.voxel_size.is_some() as usize
            + self.scale.is_some() as usize;
        if resize_count == 0 && self.template.is_none() {
            return Err(GridError::Configuration(
                "please use either the scale, voxel, size or template option to regrid the image"
                    .to_string(),
            ));
        }
        if resize_count > 1 {
            return Err(GridError::Configuration(
                "only a single method can be used to resize the image (image size, voxel size or scale factor)"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Produce the output grid and sampling parameters.
    pub fn plan(&self, sink: &dyn EventSink) -> Result<ResizePlan> {
        self.validate()?;

        let (mut size, mut spacing, mut transform) = match &self.template {
            Some((template, _)) => (
                template.spatial_size(),
                template.spatial_spacing(),
                *template.transform(),
            ),
            None => (
                self.source.spatial_size(),
                self.source.spatial_spacing(),
                *self.source.transform(),
            ),
        };

        let new_spacing = if let Some(voxel_size) = self.voxel_size {
            Some(voxel_size)
        } else if let Some(factor) = self.scale {
            Some([
                spacing[0] / factor[0],
                spacing[1] / factor[1],
                spacing[2] / factor[2],
            ])
        } else if let Some(new_size) = self.size {
            Some([
                size[0] as f64 * spacing[0] / new_size[0] as f64,
                size[1] as f64 * spacing[1] / new_size[1] as f64,
                size[2] as f64 * spacing[2] / new_size[2] as f64,
            ])
        } else {
            None
        };
        if let Some(new_spacing) = new_spacing {
            let (s, t) = set_voxel_size(size, spacing, &transform, new_spacing)?;
            size = s;
            spacing = new_spacing;
            transform = t;
        }

        let datatype = self.datatype.unwrap_or(match self.interpolation {
            Interpolation::Nearest => self.source.datatype(),
            _ => DataType::Float32,
        });

        let mut builder = self.source.to_builder().transform(transform).datatype(datatype);
        for axis in 0..SPATIAL_AXES {
            builder = builder
                .size(axis, size[axis])
                .axis_spacing(axis, spacing[axis]);
        }
        if let Some((_, name)) = &self.template {
            builder = builder.comment(format!("regridded to template image \"{}\"", name));
            sink.emit(&GridEvent::TemplateApplied { name: name.clone() });
        }
        let grid = builder.build()?;

        if self.interpolation == Interpolation::Nearest {
            if let Oversample::Factors(k) = self.oversample {
                if k != [1, 1, 1] {
                    sink.emit(&GridEvent::OversampleIgnoredForNearest);
                }
            }
        }
        let oversample = self.oversample.resolve(
            self.interpolation,
            self.source.spatial_spacing(),
            grid.spatial_spacing(),
        );
        sink.emit(&GridEvent::OversampleSelected {
            factors: oversample,
            auto: self.oversample == Oversample::Auto,
        });

        Ok(ResizePlan {
            grid,
            interpolation: self.interpolation,
            oversample,
            sinc_radius: self.sinc_radius,
        })
    }
}

/// Resize the voxels of a grid, keeping the corner of the field of view in
/// place. Returns the new number of voxels and transform.
fn set_voxel_size(
    size: [usize; 3],
    spacing: [f64; 3],
    transform: &Affine4,
    new_spacing: [f64; 3],
) -> Result<([usize; 3], Affine4)> {
    let (mut linear, mut translation) = affine::get_affine_and_translation(transform);
    let mut new_size = [0; 3];
    for axis in 0..SPATIAL_AXES {
        let n = (size[axis] as f64 * spacing[axis] / new_spacing[axis] - SIZE_ROUNDING_BIAS).round();
        if !(n >= 1.) {
            return Err(GridError::Configuration(format!(
                "voxel size {} is too large for axis {} ({} voxels of {})",
                new_spacing[axis], axis, size[axis], spacing[axis]
            )));
        }
        new_size[axis] = n as usize;

        let direction: Vector3<f64> = linear.column(axis) / spacing[axis];
        translation += direction * (0.5 * (new_spacing[axis] - spacing[axis]));
        linear.set_column(axis, &(direction * new_spacing[axis]));
    }
    Ok((
        new_size,
        affine::from_affine_and_translation(&linear, &translation),
    ))
}
