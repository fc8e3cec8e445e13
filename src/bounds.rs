//! Resolution of crop and pad bounds.
//!
//! A [`BoundsResolver`] combines the ways of describing a new field of view
//! (a mask, a reference image, a uniform margin and per-axis specifications)
//! into one inclusive `[lower, upper]` voxel range per axis of the input.
//! Negative lower bounds and upper bounds past the input extent describe
//! padding.
//!
//! The sources are applied in a fixed order, each one starting from the
//! bounds left by the previous one: mask, reference, uniform margin, and
//! finally the per-axis specifications, which override anything set before
//! them on their axis.
//!
//! [`BoundsResolver`]: ./struct.BoundsResolver.html

use crate::affine;
use crate::error::{GridError, Result};
use crate::event::{EventSink, GridEvent};
use crate::grid::{GridDescriptor, SPATIAL_AXES};
use crate::typedef::DataType;
use crate::volume::shape::{self, Dim};
use crate::volume::VoxelVolume;
use nalgebra::Vector3;
use rayon::prelude::*;
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

/// Whether the field of view shrinks or grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundsMode {
    /// Remove voxels at the edges.
    Crop,
    /// Add voxels at the edges.
    Pad,
}

impl fmt::Display for BoundsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BoundsMode::Crop => "crop",
            BoundsMode::Pad => "pad",
        })
    }
}

/// Inclusive voxel range along one axis, relative to the input grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AxisBounds {
    /// first input index kept
    pub lower: i64,
    /// last input index kept
    pub upper: i64,
}

impl AxisBounds {
    /// The full extent of an axis of `size` voxels.
    pub fn full(size: usize) -> Self {
        AxisBounds {
            lower: 0,
            upper: size as i64 - 1,
        }
    }

    /// Number of voxels in the range, zero or negative when empty.
    pub fn len(&self) -> i64 {
        self.upper.saturating_sub(self.lower).saturating_add(1)
    }

    /// Whether the range holds no voxel.
    pub fn is_empty(&self) -> bool {
        self.upper < self.lower
    }
}

/// Resolved bounds, one entry per input axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bounds(Vec<AxisBounds>);

impl Bounds {
    /// Bounds covering the whole grid.
    pub fn full(dim: &Dim) -> Self {
        Bounds(dim.as_ref().iter().map(|s| AxisBounds::full(*s)).collect())
    }

    /// Per-axis bounds.
    pub fn axes(&self) -> &[AxisBounds] {
        &self.0
    }

    /// First input index of every axis.
    pub fn lower(&self) -> Vec<i64> {
        self.0.iter().map(|b| b.lower).collect()
    }

    /// Output extent of every axis.
    ///
    /// # Errors
    ///
    /// - `GridError::Configuration` if an axis is empty.
    pub fn sizes(&self) -> Result<Vec<usize>> {
        self.0
            .iter()
            .enumerate()
            .map(|(axis, b)| {
                if b.is_empty() {
                    Err(empty_axis(axis, b))
                } else {
                    Ok(b.len() as usize)
                }
            })
            .collect()
    }

    /// Grid of the cropped or padded image.
    ///
    /// The spacing is unchanged and the transform is shifted so that every
    /// kept voxel stays at the same world position.
    pub fn target_grid(&self, source: &GridDescriptor, datatype: DataType) -> Result<GridDescriptor> {
        if self.0.len() != source.ndim() {
            return Err(GridError::DimensionMismatch(
                "bounds",
                source.dim().as_ref().to_vec(),
                self.sizes()?,
            ));
        }
        let (linear, translation) = affine::get_affine_and_translation(source.transform());
        let from = Vector3::new(
            self.0[0].lower as f64,
            self.0[1].lower as f64,
            self.0[2].lower as f64,
        );
        let transform = affine::from_affine_and_translation(&linear, &(translation + linear * from));
        source
            .to_builder()
            .dim(&self.sizes()?)
            .transform(transform)
            .datatype(datatype)
            .build()
    }
}

/// Last index of a `stop:` range specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RangeStop {
    /// The last input voxel.
    End,
    /// An explicit index.
    Index(i64),
}

/// Crop or pad specification for a single axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AxisSpec {
    /// `lower,upper`: number of voxels removed (crop) or added (pad) at each
    /// end of the axis.
    Delta {
        /// voxels at the lower end
        lower: i64,
        /// voxels at the upper end
        upper: i64,
    },
    /// `start:stop`: the input voxel range to keep, whatever the mode.
    Range {
        /// first input index
        start: i64,
        /// last input index
        stop: RangeStop,
    },
}

impl AxisSpec {
    fn bounds(self, mode: BoundsMode, axis: usize, size: usize) -> Result<AxisBounds> {
        let last = size as i64 - 1;
        let bounds = match self {
            AxisSpec::Delta { lower, upper } => match mode {
                BoundsMode::Crop => last.checked_sub(upper).map(|upper| AxisBounds { lower, upper }),
                BoundsMode::Pad => lower
                    .checked_neg()
                    .and_then(|lower| last.checked_add(upper).map(|upper| AxisBounds { lower, upper })),
            },
            AxisSpec::Range { start, stop } => Some(AxisBounds {
                lower: start,
                upper: match stop {
                    RangeStop::End => last,
                    RangeStop::Index(i) => i,
                },
            }),
        };
        bounds.ok_or_else(|| out_of_range(axis))
    }
}

impl FromStr for AxisSpec {
    type Err = GridError;

    fn from_str(spec: &str) -> Result<Self> {
        let int = |token: &str| token.trim().parse::<i64>().ok();
        if let Some(colon) = spec.find(':') {
            let (start, stop) = (&spec[..colon], &spec[colon + 1..]);
            let start = int(start).ok_or_else(|| {
                GridError::Configuration(format!(
                    "can't parse integer sequence specifier \"{}\"",
                    spec
                ))
            })?;
            let stop = if stop.trim().eq_ignore_ascii_case("end") {
                RangeStop::End
            } else {
                RangeStop::Index(int(stop).ok_or_else(|| {
                    GridError::Configuration(format!(
                        "can't parse integer sequence specifier \"{}\"",
                        spec
                    ))
                })?)
            };
            Ok(AxisSpec::Range { start, stop })
        } else {
            let parts: Vec<_> = spec.split(',').map(int).collect();
            match parts[..] {
                [Some(lower), Some(upper)] => Ok(AxisSpec::Delta { lower, upper }),
                _ => Err(GridError::Configuration(format!(
                    "can't parse delta specifier \"{}\"",
                    spec
                ))),
            }
        }
    }
}

/// Running bounding box of set mask voxels over the spatial axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AxisExtent {
    lower: [usize; 3],
    upper: [usize; 3],
}

impl AxisExtent {
    fn empty() -> Self {
        AxisExtent {
            lower: [usize::MAX; 3],
            upper: [0; 3],
        }
    }

    fn include(mut self, coords: &[usize]) -> Self {
        for axis in 0..SPATIAL_AXES {
            self.lower[axis] = self.lower[axis].min(coords[axis]);
            self.upper[axis] = self.upper[axis].max(coords[axis]);
        }
        self
    }

    fn merge(mut self, other: AxisExtent) -> Self {
        for axis in 0..SPATIAL_AXES {
            self.lower[axis] = self.lower[axis].min(other.lower[axis]);
            self.upper[axis] = self.upper[axis].max(other.upper[axis]);
        }
        self
    }

    fn is_empty(&self) -> bool {
        (0..SPATIAL_AXES).any(|axis| self.lower[axis] > self.upper[axis])
    }
}

/// Bounding box of the set voxels of `mask`, over all of its axes but
/// reported for the spatial ones.
fn mask_extent<M>(mask: &M) -> Result<AxisExtent>
where
    M: VoxelVolume + Sync + ?Sized,
{
    let dim = *mask.dim();
    (0..dim.element_count())
        .into_par_iter()
        .try_fold(AxisExtent::empty, |acc, i| -> Result<AxisExtent> {
            let coords = dim.coords_of(i);
            if mask.get_bool(coords.as_ref())? {
                Ok(acc.include(coords.as_ref()))
            } else {
                Ok(acc)
            }
        })
        .try_reduce(AxisExtent::empty, |a, b| Ok(a.merge(b)))
}

fn out_of_range(axis: usize) -> GridError {
    GridError::Configuration(format!("bounds of axis {} are out of range", axis))
}

fn empty_axis(axis: usize, b: &AxisBounds) -> GridError {
    GridError::Configuration(format!(
        "axis {} empty: ({}:{})",
        axis, b.lower, b.upper
    ))
}

/// Combines crop/pad specifications into [`Bounds`].
///
/// [`Bounds`]: ./struct.Bounds.html
///
/// # Example
///
/// ```
/// use nifti_grid::{AxisSpec, BoundsMode, BoundsResolver, GridBuilder, NullSink};
/// # use nifti_grid::Result;
///
/// # fn run() -> Result<()> {
/// let grid = GridBuilder::new().dim(&[10, 10, 10]).spacing(&[1., 1., 1.]).build()?;
/// let bounds = BoundsResolver::new(&grid, BoundsMode::Crop)
///     .uniform(1)
///     .axis(2, "2,3".parse::<AxisSpec>()?)
///     .resolve(&NullSink)?;
/// assert_eq!(bounds.sizes()?, vec![8, 8, 5]);
/// # Ok(())
/// # }
/// # run().unwrap();
/// ```
pub struct BoundsResolver<'a> {
    source: &'a GridDescriptor,
    mode: BoundsMode,
    mask: Option<&'a (dyn VoxelVolume + Sync)>,
    reference: Option<&'a GridDescriptor>,
    uniform: Option<i64>,
    axes: Vec<(usize, AxisSpec)>,
    all_axes: bool,
}

impl<'a> fmt::Debug for BoundsResolver<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundsResolver")
            .field("source", &self.source.dim())
            .field("mode", &self.mode)
            .field("mask", &self.mask.map(|m| *m.dim()))
            .field("reference", &self.reference.map(|r| *r.dim()))
            .field("uniform", &self.uniform)
            .field("axes", &self.axes)
            .field("all_axes", &self.all_axes)
            .finish()
    }
}

impl<'a> BoundsResolver<'a> {
    /// Start resolving bounds over the grid of the input image.
    pub fn new(source: &'a GridDescriptor, mode: BoundsMode) -> Self {
        BoundsResolver {
            source,
            mode,
            mask: None,
            reference: None,
            uniform: None,
            axes: Vec::new(),
            all_axes: false,
        }
    }

    /// Crop to the bounding box of a mask sharing the input's spatial grid,
    /// leaving one voxel of margin where possible.
    pub fn mask(mut self, mask: &'a (dyn VoxelVolume + Sync)) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Crop or pad the upper end of each axis to match the extent of a
    /// reference grid.
    pub fn reference(mut self, reference: &'a GridDescriptor) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Crop or pad every considered axis by the same number of voxels at
    /// both ends.
    pub fn uniform(mut self, voxels: i64) -> Self {
        self.uniform = Some(voxels);
        self
    }

    /// Set the bounds of one axis explicitly. A later specification of the
    /// same axis replaces an earlier one.
    pub fn axis(mut self, axis: usize, spec: AxisSpec) -> Self {
        self.axes.push((axis, spec));
        self
    }

    /// Apply the reference and uniform sources to every axis, not only the
    /// three spatial ones.
    pub fn all_axes(mut self, all_axes: bool) -> Self {
        self.all_axes = all_axes;
        self
    }

    fn considered_axes(&self) -> usize {
        if self.all_axes {
            self.source.ndim()
        } else {
            SPATIAL_AXES
        }
    }

    /// Check the specification for conflicts. Does not read any voxel.
    pub fn validate(&self) -> Result<()> {
        let count = self.mask.is_some() as usize
            + self.reference.is_some() as usize
            + self.uniform.is_some() as usize
            + self.axes.len();
        if count == 0 {
            return Err(GridError::Configuration(
                "no crop or pad specification supplied".to_string(),
            ));
        }
        if let Some(mask) = self.mask {
            if self.mode == BoundsMode::Pad {
                return Err(GridError::UnsupportedOperation(
                    "padding with a mask is not supported".to_string(),
                ));
            }
            if self.reference.is_some() {
                return Err(GridError::Configuration(format!(
                    "{} can be performed using either a mask or a reference image",
                    self.mode
                )));
            }
            let md = mask.dim().as_ref();
            let sd = self.source.dim().as_ref();
            if md.len() < SPATIAL_AXES || md[..SPATIAL_AXES] != sd[..SPATIAL_AXES] {
                return Err(GridError::DimensionMismatch(
                    "mask",
                    sd[..SPATIAL_AXES].to_vec(),
                    md.to_vec(),
                ));
            }
        }
        for (axis, _) in &self.axes {
            if *axis >= self.source.ndim() {
                return Err(GridError::Configuration(format!(
                    "axis {} larger than image dimensions ({})",
                    axis,
                    self.source.ndim()
                )));
            }
        }
        Ok(())
    }

    /// Resolve the bounds, reporting changed axes to `sink`.
    ///
    /// # Errors
    ///
    /// - `GridError::Configuration` on missing or conflicting sources, an
    /// axis index past the input rank, or an empty resulting axis;
    /// - `GridError::UnsupportedOperation` if a mask is used for padding;
    /// - `GridError::DimensionMismatch` if the mask's spatial extent differs
    /// from the input's;
    /// - `GridError::EmptyMask` if the mask has no set voxel.
    pub fn resolve(&self, sink: &dyn EventSink) -> Result<Bounds> {
        self.validate()?;
        let source = self.source;
        let nd = self.considered_axes();
        let mut bounds = Bounds::full(source.dim()).0;

        if let Some(mask) = self.mask {
            let extent = mask_extent(mask)?;
            if extent.is_empty() {
                sink.emit(&GridEvent::EmptyMask);
                return Err(GridError::EmptyMask);
            }
            for axis in 0..SPATIAL_AXES {
                let b = &mut bounds[axis];
                b.lower = extent.lower[axis] as i64;
                b.upper = extent.upper[axis] as i64;
                if b.lower > 0 {
                    b.lower -= 1;
                }
                if b.upper < source.size(axis) as i64 - 1 {
                    b.upper += 1;
                }
            }
        }

        if let Some(reference) = self.reference {
            for (axis, b) in bounds.iter_mut().enumerate().take(nd) {
                if axis >= reference.ndim() {
                    if self.mode == BoundsMode::Crop {
                        b.upper = 0;
                    }
                } else {
                    let last = reference.size(axis) as i64 - 1;
                    b.upper = match self.mode {
                        BoundsMode::Crop => b.upper.min(last),
                        BoundsMode::Pad => b.upper.max(last),
                    };
                }
            }
        }

        if let Some(voxels) = self.uniform {
            let signed = match self.mode {
                BoundsMode::Crop => Some(voxels),
                BoundsMode::Pad => voxels.checked_neg(),
            };
            for (axis, b) in bounds.iter_mut().enumerate().take(nd) {
                let shifted = signed.and_then(|d| {
                    Some(AxisBounds {
                        lower: b.lower.checked_add(d)?,
                        upper: b.upper.checked_sub(d)?,
                    })
                });
                *b = shifted.ok_or_else(|| out_of_range(axis))?;
            }
        }

        for (axis, spec) in &self.axes {
            bounds[*axis] = spec.bounds(self.mode, *axis, source.size(*axis))?;
        }

        let mut sizes = Vec::with_capacity(bounds.len());
        for (axis, b) in bounds.iter().enumerate() {
            if b.is_empty() {
                return Err(empty_axis(axis, b));
            }
            let size = b
                .upper
                .checked_sub(b.lower)
                .and_then(|d| d.checked_add(1))
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| out_of_range(axis))?;
            sizes.push(size);
        }
        if shape::checked_element_count(&sizes).is_none() {
            return Err(GridError::Configuration(format!(
                "output extent {:?} holds more than {} voxels",
                sizes,
                shape::MAX_ELEMENTS
            )));
        }

        let mut changed = 0;
        for (axis, b) in bounds.iter().enumerate() {
            let reported = axis < nd || self.axes.iter().any(|(a, _)| *a == axis);
            if reported && *b != AxisBounds::full(source.size(axis)) {
                changed += 1;
                sink.emit(&GridEvent::AxisChanged {
                    axis,
                    old_size: source.size(axis),
                    lower: b.lower,
                    upper: b.upper,
                    new_size: b.len() as usize,
                });
            }
        }
        if changed == 0 {
            sink.emit(&GridEvent::NoAxesChanged);
        }

        Ok(Bounds(bounds))
    }
}
