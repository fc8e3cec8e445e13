//! Interpolation of voxel values at real-valued voxel coordinates.
//!
//! Four kernels are available, see [`Interpolation`]. A [`Sampler`] applies
//! one of them to a source volume, optionally averaging several sub-samples
//! per output voxel ([`Oversample`]) so that downsampling does not alias.
//!
//! All kernels share the same validity rule: a sample is valid when the
//! coordinate lies within half a voxel of the source grid on every spatial
//! axis, i.e. when the nearest lattice point exists. Beyond that, linear
//! interpolation drops support points outside the grid and renormalises the
//! remaining weights, while cubic and sinc interpolation replicate the edge
//! voxels.
//!
//! [`Interpolation`]: ./enum.Interpolation.html
//! [`Sampler`]: ./struct.Sampler.html
//! [`Oversample`]: ./enum.Oversample.html

mod kernel;
mod sampler;

pub use self::kernel::{DEFAULT_SINC_RADIUS, MAX_SINC_RADIUS};
pub use self::sampler::Sampler;

use crate::error::{GridError, Result};
use std::fmt;
use std::str::FromStr;

/// Interpolation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Interpolation {
    /// Nearest neighbour.
    Nearest,
    /// Trilinear.
    Linear,
    /// Cubic convolution (Catmull-Rom).
    Cubic,
    /// Hann-windowed sinc.
    Sinc,
}

impl Default for Interpolation {
    fn default() -> Self {
        Interpolation::Cubic
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Interpolation::Nearest => "nearest",
            Interpolation::Linear => "linear",
            Interpolation::Cubic => "cubic",
            Interpolation::Sinc => "sinc",
        })
    }
}

impl FromStr for Interpolation {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "nearest" => Ok(Interpolation::Nearest),
            "linear" => Ok(Interpolation::Linear),
            "cubic" => Ok(Interpolation::Cubic),
            "sinc" => Ok(Interpolation::Sinc),
            other => Err(GridError::Configuration(format!(
                "unknown interpolation method \"{}\" (choices: nearest, linear, cubic, sinc)",
                other
            ))),
        }
    }
}

/// Number of sub-samples averaged per output voxel, along each spatial axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Oversample {
    /// Derived from the ratio of output to input voxel spacing.
    Auto,
    /// Fixed factors.
    Factors([usize; 3]),
}

impl Default for Oversample {
    fn default() -> Self {
        Oversample::Auto
    }
}

impl Oversample {
    /// Build from one (broadcast) or three factors.
    pub fn from_factors(factors: &[usize]) -> Result<Self> {
        let factors = match *factors {
            [k] => [k, k, k],
            [a, b, c] => [a, b, c],
            _ => {
                return Err(GridError::Configuration(format!(
                    "oversample requires 1 or 3 factors, got {}",
                    factors.len()
                )))
            }
        };
        if factors.iter().any(|k| *k == 0) {
            return Err(GridError::Configuration(format!(
                "oversample factors must be positive, got {:?}",
                factors
            )));
        }
        Ok(Oversample::Factors(factors))
    }

    /// Settle the factors for a given interpolation method and pair of
    /// voxel spacings. Nearest neighbour interpolation never oversamples.
    pub fn resolve(
        self,
        interpolation: Interpolation,
        input_spacing: [f64; 3],
        output_spacing: [f64; 3],
    ) -> [usize; 3] {
        if interpolation == Interpolation::Nearest {
            return [1, 1, 1];
        }
        match self {
            Oversample::Factors(k) => k,
            Oversample::Auto => {
                let mut k = [1; 3];
                for axis in 0..3 {
                    let ratio = (output_spacing[axis] / input_spacing[axis]).round();
                    k[axis] = if ratio > 1. { ratio as usize } else { 1 };
                }
                k
            }
        }
    }
}

impl FromStr for Oversample {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(Oversample::Auto);
        }
        let factors = s
            .split(',')
            .map(|t| t.trim().parse::<usize>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| {
                GridError::Configuration(format!("can't parse oversample factors \"{}\"", s))
            })?;
        Oversample::from_factors(&factors)
    }
}

#[cfg(test)]
mod tests {
    use super::{Interpolation, Oversample};

    #[test]
    fn auto_oversample_follows_spacing_ratio() {
        let k = Oversample::Auto.resolve(Interpolation::Linear, [1., 1., 2.], [4., 0.5, 3.]);
        assert_eq!(k, [4, 1, 2]);
    }

    #[test]
    fn nearest_never_oversamples() {
        let k = Oversample::Factors([3, 3, 3]).resolve(
            Interpolation::Nearest,
            [1., 1., 1.],
            [4., 4., 4.],
        );
        assert_eq!(k, [1, 1, 1]);
        let k = Oversample::Auto.resolve(Interpolation::Nearest, [1., 1., 1.], [4., 4., 4.]);
        assert_eq!(k, [1, 1, 1]);
    }

    #[test]
    fn parse_oversample() {
        assert_eq!("auto".parse::<Oversample>().unwrap(), Oversample::Auto);
        assert_eq!(
            "2".parse::<Oversample>().unwrap(),
            Oversample::Factors([2, 2, 2])
        );
        assert_eq!(
            "1, 2,3".parse::<Oversample>().unwrap(),
            Oversample::Factors([1, 2, 3])
        );
        assert!("1,2".parse::<Oversample>().is_err());
        assert!("0".parse::<Oversample>().is_err());
        assert!("x".parse::<Oversample>().is_err());
    }

    #[test]
    fn parse_interpolation() {
        assert_eq!("Sinc".parse::<Interpolation>().unwrap(), Interpolation::Sinc);
        assert!("bspline".parse::<Interpolation>().is_err());
        assert_eq!(Interpolation::default(), Interpolation::Cubic);
    }
}
