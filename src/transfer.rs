//! The grid transfer engine: fills every voxel of an output grid from a
//! source volume.
//!
//! Output voxels are independent of each other and are computed in
//! parallel. Each one is mapped back into the source grid either by a plain
//! index offset (crop and pad, no interpolation) or through the world
//! coordinates of both grids (regrid, interpolated). Voxels mapping outside
//! the source take the out-of-bounds fill value.

use crate::affine::Affine4;
use crate::bounds::Bounds;
use crate::error::{GridError, Result};
use crate::grid::{GridDescriptor, SPATIAL_AXES};
use crate::interp::{Interpolation, Sampler};
use crate::resize::ResizePlan;
use crate::volume::shape::Idx;
use crate::volume::{InMemVolume, VoxelVolume};
use rayon::prelude::*;

/// How output voxels find their source.
#[derive(Debug, Clone, PartialEq)]
pub enum Mapping {
    /// Output voxel `i` along axis `a` reads input voxel `i + offset[a]`.
    Offset(Vec<i64>),
    /// Output voxel centres go through the output transform into world
    /// space, then through the inverse source transform into source voxel
    /// coordinates, where they are interpolated.
    Resample {
        /// voxel-to-world transform of the source grid
        source_transform: Affine4,
        /// interpolation method
        interpolation: Interpolation,
        /// sub-samples per output voxel along each spatial axis
        oversample: [usize; 3],
        /// sinc kernel radius in voxels
        sinc_radius: usize,
    },
}

impl Mapping {
    /// Mapping for a crop or pad with the given bounds.
    pub fn from_bounds(bounds: &Bounds) -> Self {
        Mapping::Offset(bounds.lower())
    }

    /// Mapping for a planned regrid of an image on `source`.
    pub fn from_plan(source: &GridDescriptor, plan: &ResizePlan) -> Self {
        Mapping::Resample {
            source_transform: *source.transform(),
            interpolation: plan.interpolation,
            oversample: plan.oversample,
            sinc_radius: plan.sinc_radius,
        }
    }
}

/// Fill a new volume on `target` from `source`.
///
/// The output voxels are quantized to the target grid's data type.
///
/// # Errors
///
/// - `GridError::DimensionMismatch` if the mapping does not fit the source
/// and target ranks, or if a regrid would change a non-spatial axis;
/// - `GridError::InvalidGrid` if the source transform cannot be inverted;
/// - `GridError::Configuration` if the sinc radius is out of range;
/// - any error raised while reading the source.
pub fn transfer<V>(
    source: &V,
    target: &GridDescriptor,
    mapping: &Mapping,
    fill: f64,
) -> Result<InMemVolume>
where
    V: VoxelVolume + Sync + ?Sized,
{
    let src_dim = *source.dim();
    let dim = *target.dim();
    if src_dim.rank() != dim.rank() {
        return Err(GridError::DimensionMismatch(
            "output grid",
            src_dim.as_ref().to_vec(),
            dim.as_ref().to_vec(),
        ));
    }

    let data = match mapping {
        Mapping::Offset(offset) => {
            if offset.len() != dim.rank() {
                return Err(GridError::DimensionMismatch(
                    "bounds rank",
                    vec![dim.rank()],
                    vec![offset.len()],
                ));
            }
            (0..dim.element_count())
                .into_par_iter()
                .map(|i| {
                    let out = dim.coords_of(i);
                    match offset_coords(&out, offset, src_dim.as_ref()) {
                        Some(c) => source.get_f64(c.as_ref()),
                        None => Ok(fill),
                    }
                })
                .collect::<Result<Vec<f64>>>()?
        }
        Mapping::Resample {
            source_transform,
            interpolation,
            oversample,
            sinc_radius,
        } => {
            if src_dim.as_ref()[SPATIAL_AXES..] != dim.as_ref()[SPATIAL_AXES..] {
                return Err(GridError::DimensionMismatch(
                    "output grid (non-spatial axes)",
                    src_dim.as_ref().to_vec(),
                    dim.as_ref().to_vec(),
                ));
            }
            let to_source = source_transform.try_inverse().ok_or_else(|| {
                GridError::InvalidGrid("source transform is not invertible".to_string())
            })?;
            let map = to_source * target.transform();
            let sampler = Sampler::new(source, *interpolation)?.with_sinc_radius(*sinc_radius)?;
            let oversample = *oversample;
            (0..dim.element_count())
                .into_par_iter()
                .map(|i| {
                    let out = dim.coords_of(i);
                    let c = out.as_ref();
                    let centre = [c[0] as f64, c[1] as f64, c[2] as f64];
                    let v = sampler.oversampled(centre, &map, oversample, &c[SPATIAL_AXES..])?;
                    Ok(v.unwrap_or(fill))
                })
                .collect::<Result<Vec<f64>>>()?
        }
    };

    InMemVolume::from_raw_data(dim, target.datatype(), data)
}

fn offset_coords(out: &Idx, offset: &[i64], src: &[usize]) -> Option<Idx> {
    let mut c = *out;
    for ((v, o), s) in c.as_mut().iter_mut().zip(offset).zip(src) {
        let p = *v as i64 + *o;
        if p < 0 || p >= *s as i64 {
            return None;
        }
        *v = p as usize;
    }
    Some(c)
}

/// Crop or pad `source` to `bounds`. `target` is the grid produced by
/// [`Bounds::target_grid`].
///
/// [`Bounds::target_grid`]: ../bounds/struct.Bounds.html#method.target_grid
pub fn crop_pad<V>(source: &V, bounds: &Bounds, target: &GridDescriptor, fill: f64) -> Result<InMemVolume>
where
    V: VoxelVolume + Sync + ?Sized,
{
    transfer(source, target, &Mapping::from_bounds(bounds), fill)
}

/// Regrid `source`, laid on `source_grid`, following `plan`.
pub fn regrid<V>(
    source_grid: &GridDescriptor,
    source: &V,
    plan: &ResizePlan,
    fill: f64,
) -> Result<InMemVolume>
where
    V: VoxelVolume + Sync + ?Sized,
{
    transfer(source, &plan.grid, &Mapping::from_plan(source_grid, plan), fill)
}
