use super::kernel::{self, Taps};
use super::{Interpolation, DEFAULT_SINC_RADIUS, MAX_SINC_RADIUS};
use crate::affine::Affine4;
use crate::error::{GridError, Result};
use crate::grid::SPATIAL_AXES;
use crate::volume::shape::Idx;
use crate::volume::VoxelVolume;
use nalgebra::Point3;

/// Interpolating reader over the spatial axes of a volume.
///
/// Axes beyond the third are not interpolated: their indices are passed
/// through unchanged with every sample.
#[derive(Debug)]
pub struct Sampler<'a, V: ?Sized> {
    volume: &'a V,
    method: Interpolation,
    sinc_radius: usize,
    size: [usize; 3],
}

impl<'a, V> Sampler<'a, V>
where
    V: VoxelVolume + ?Sized,
{
    /// Create a sampler of `volume` with the given interpolation method.
    ///
    /// # Errors
    ///
    /// - `GridError::InvalidGrid` if the volume has fewer than 3 axes.
    pub fn new(volume: &'a V, method: Interpolation) -> Result<Self> {
        let dim = volume.dim().as_ref();
        if dim.len() < SPATIAL_AXES {
            return Err(GridError::InvalidGrid(format!(
                "interpolation requires {} spatial axes, got {}",
                SPATIAL_AXES,
                dim.len()
            )));
        }
        Ok(Sampler {
            volume,
            method,
            sinc_radius: DEFAULT_SINC_RADIUS,
            size: [dim[0], dim[1], dim[2]],
        })
    }

    /// Change the radius of the sinc kernel, in voxels.
    ///
    /// # Errors
    ///
    /// - `GridError::Configuration` if the radius is zero or larger than 8.
    pub fn with_sinc_radius(mut self, radius: usize) -> Result<Self> {
        if radius == 0 || radius > MAX_SINC_RADIUS {
            return Err(GridError::Configuration(format!(
                "sinc radius must be between 1 and {}, got {}",
                MAX_SINC_RADIUS, radius
            )));
        }
        self.sinc_radius = radius;
        Ok(self)
    }

    /// The interpolation method in use.
    pub fn method(&self) -> Interpolation {
        self.method
    }

    /// Sample the volume at real-valued voxel position `pos`, with `extra`
    /// holding the indices of the non-spatial axes.
    ///
    /// Returns `Ok(None)` when the position lies outside the source grid.
    pub fn value(&self, pos: [f64; 3], extra: &[usize]) -> Result<Option<f64>> {
        let tx = self.axis_taps(0, pos[0]);
        let ty = self.axis_taps(1, pos[1]);
        let tz = self.axis_taps(2, pos[2]);
        let (tx, ty, tz) = match (tx, ty, tz) {
            (Some(x), Some(y), Some(z)) => (x, y, z),
            _ => return Ok(None),
        };

        let mut coords = Idx::from_slice(&[0; 7][..SPATIAL_AXES + extra.len()])?;
        coords.as_mut()[SPATIAL_AXES..].copy_from_slice(extra);

        let mut acc = 0.;
        for (iz, wz) in tz.iter() {
            for (iy, wy) in ty.iter() {
                let wyz = wy * wz;
                for (ix, wx) in tx.iter() {
                    let c = coords.as_mut();
                    c[0] = ix;
                    c[1] = iy;
                    c[2] = iz;
                    acc += wx * wyz * self.volume.get_f64(coords.as_ref())?;
                }
            }
        }
        Ok(Some(acc))
    }

    /// Sample around output voxel `centre` (in output voxel coordinates),
    /// averaging a regular `factors[0] x factors[1] x factors[2]` grid of
    /// sub-samples. `map` takes output voxel coordinates to source voxel
    /// coordinates.
    ///
    /// Only sub-samples inside the source grid contribute to the mean;
    /// `Ok(None)` is returned if none of them do.
    pub fn oversampled(
        &self,
        centre: [f64; 3],
        map: &Affine4,
        factors: [usize; 3],
        extra: &[usize],
    ) -> Result<Option<f64>> {
        if factors == [1, 1, 1] {
            let p = map.transform_point(&Point3::new(centre[0], centre[1], centre[2]));
            return self.value([p.x, p.y, p.z], extra);
        }

        let offset = |j: usize, k: usize| (j as f64 + 0.5) / k as f64 - 0.5;
        let mut sum = 0.;
        let mut count = 0usize;
        for jz in 0..factors[2] {
            for jy in 0..factors[1] {
                for jx in 0..factors[0] {
                    let p = map.transform_point(&Point3::new(
                        centre[0] + offset(jx, factors[0]),
                        centre[1] + offset(jy, factors[1]),
                        centre[2] + offset(jz, factors[2]),
                    ));
                    if let Some(v) = self.value([p.x, p.y, p.z], extra)? {
                        sum += v;
                        count += 1;
                    }
                }
            }
        }
        if count == 0 {
            Ok(None)
        } else {
            Ok(Some(sum / count as f64))
        }
    }

    fn axis_taps(&self, axis: usize, x: f64) -> Option<Taps> {
        kernel::taps(self.method, x, self.size[axis], self.sinc_radius)
    }
}

#[cfg(test)]
mod tests {
    use super::Sampler;
    use crate::affine::Affine4;
    use crate::interp::Interpolation;
    use crate::volume::shape::Dim;
    use crate::{DataType, InMemVolume};
    use approx::assert_relative_eq;

    fn ramp() -> InMemVolume {
        let dim = Dim::from_slice(&[8, 6, 5, 2]).unwrap();
        InMemVolume::from_fn(dim, DataType::Float64, |c| {
            c[0] as f64 + 2. * c[1] as f64 + 3. * c[2] as f64 + 100. * c[3] as f64
        })
    }

    #[test]
    fn linear_reproduces_a_ramp() {
        let vol = ramp();
        let s = Sampler::new(&vol, Interpolation::Linear).unwrap();
        let v = s.value([2.25, 1.5, 3.75], &[1]).unwrap().unwrap();
        assert_relative_eq!(v, 2.25 + 3. + 11.25 + 100., epsilon = 1e-12);
        assert_eq!(s.value([8.0, 0., 0.], &[0]).unwrap(), None);
    }

    #[test]
    fn cubic_reproduces_a_ramp_in_the_interior() {
        let vol = ramp();
        let s = Sampler::new(&vol, Interpolation::Cubic).unwrap();
        let v = s.value([3.4, 2.6, 2.2], &[0]).unwrap().unwrap();
        assert_relative_eq!(v, 3.4 + 5.2 + 6.6, epsilon = 1e-9);
    }

    #[test]
    fn nearest_picks_a_voxel() {
        let vol = ramp();
        let s = Sampler::new(&vol, Interpolation::Nearest).unwrap();
        assert_eq!(s.value([6.6, 0.2, 4.4], &[0]).unwrap(), Some(7. + 12.));
    }

    #[test]
    fn oversampling_averages_sub_samples() {
        let dim = Dim::from_slice(&[4, 1, 1]).unwrap();
        let vol = InMemVolume::from_raw_data(dim, DataType::Float64, vec![0., 1., 0., 1.]).unwrap();
        let s = Sampler::new(&vol, Interpolation::Nearest).unwrap();
        // one output voxel covering two input voxels along x
        let mut map = Affine4::identity();
        map[(0, 0)] = 2.;
        map[(0, 3)] = 0.5;
        assert_eq!(s.oversampled([0., 0., 0.], &map, [1, 1, 1], &[]).unwrap(), Some(1.));
        assert_eq!(s.oversampled([0., 0., 0.], &map, [2, 1, 1], &[]).unwrap(), Some(0.5));
        assert_eq!(s.oversampled([5., 0., 0.], &map, [2, 1, 1], &[]).unwrap(), None);
    }

    #[test]
    fn sinc_radius_is_bounded() {
        let vol = ramp();
        assert!(Sampler::new(&vol, Interpolation::Sinc)
            .unwrap()
            .with_sinc_radius(9)
            .is_err());
        assert!(Sampler::new(&vol, Interpolation::Sinc)
            .unwrap()
            .with_sinc_radius(4)
            .is_ok());
    }
}
