//! One-dimensional interpolation kernels.
//!
//! Each kernel turns a real-valued coordinate along one axis into a short
//! list of (voxel index, weight) taps. Multi-dimensional interpolation is the
//! tensor product of the per-axis taps.
use super::Interpolation;
use std::f64::consts::PI;

/// Sinc kernel radius used unless configured otherwise.
pub const DEFAULT_SINC_RADIUS: usize = 3;

/// Largest supported sinc kernel radius.
pub const MAX_SINC_RADIUS: usize = 8;

const MAX_TAPS: usize = 2 * MAX_SINC_RADIUS;

/// Weighted support points along one axis.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Taps {
    index: [usize; MAX_TAPS],
    weight: [f64; MAX_TAPS],
    len: usize,
}

impl Taps {
    fn empty() -> Self {
        Taps {
            index: [0; MAX_TAPS],
            weight: [0.; MAX_TAPS],
            len: 0,
        }
    }

    fn push(&mut self, index: usize, weight: f64) {
        debug_assert!(self.len < MAX_TAPS);
        self.index[self.len] = index;
        self.weight[self.len] = weight;
        self.len += 1;
    }

    fn normalize(&mut self) {
        let total: f64 = self.weight[..self.len].iter().sum();
        if total != 0. {
            for w in &mut self.weight[..self.len] {
                *w /= total;
            }
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.index[..self.len]
            .iter()
            .cloned()
            .zip(self.weight[..self.len].iter().cloned())
    }
}

/// Compute the taps of `method` at coordinate `x` along an axis of `size`
/// voxels. Returns `None` if the nearest voxel lies outside the axis.
pub(crate) fn taps(method: Interpolation, x: f64, size: usize, sinc_radius: usize) -> Option<Taps> {
    if !(x >= -0.5 && x <= size as f64 - 0.5) {
        return None;
    }
    let last = size as isize - 1;
    let clamp = |i: isize| i.max(0).min(last) as usize;
    let mut taps = Taps::empty();
    match method {
        Interpolation::Nearest => {
            taps.push(clamp(x.round() as isize), 1.);
        }
        Interpolation::Linear => {
            let f = x.floor();
            let t = x - f;
            let f = f as isize;
            for (i, w) in [(f, 1. - t), (f + 1, t)].iter().cloned() {
                if i >= 0 && i <= last && w != 0. {
                    taps.push(i as usize, w);
                }
            }
            taps.normalize();
        }
        Interpolation::Cubic => {
            let f = x.floor();
            let t = x - f;
            let f = f as isize;
            let t2 = t * t;
            let t3 = t2 * t;
            let w = [
                0.5 * (-t3 + 2. * t2 - t),
                0.5 * (3. * t3 - 5. * t2 + 2.),
                0.5 * (-3. * t3 + 4. * t2 + t),
                0.5 * (t3 - t2),
            ];
            for (o, w) in w.iter().enumerate() {
                taps.push(clamp(f - 1 + o as isize), *w);
            }
        }
        Interpolation::Sinc => {
            let radius = sinc_radius.max(1).min(MAX_SINC_RADIUS) as isize;
            let f = x.floor() as isize;
            for i in (f - radius + 1)..=(f + radius) {
                let d = x - i as f64;
                let w = windowed_sinc(d, radius as f64);
                if w != 0. {
                    taps.push(clamp(i), w);
                }
            }
            taps.normalize();
        }
    }
    Some(taps)
}

fn windowed_sinc(d: f64, radius: f64) -> f64 {
    if d.abs() >= radius || (d != 0. && d == d.round()) {
        return 0.;
    }
    let sinc = if d == 0. { 1. } else { (PI * d).sin() / (PI * d) };
    let window = 0.5 * (1. + (PI * d / radius).cos());
    sinc * window
}

#[cfg(test)]
mod tests {
    use super::{taps, DEFAULT_SINC_RADIUS};
    use crate::interp::Interpolation;
    use approx::assert_relative_eq;

    fn collect(method: Interpolation, x: f64, size: usize) -> Option<Vec<(usize, f64)>> {
        taps(method, x, size, DEFAULT_SINC_RADIUS).map(|t| t.iter().collect())
    }

    #[test]
    fn validity_is_half_a_voxel_around_the_grid() {
        for method in &[
            Interpolation::Nearest,
            Interpolation::Linear,
            Interpolation::Cubic,
            Interpolation::Sinc,
        ] {
            assert!(collect(*method, -0.5, 4).is_some());
            assert!(collect(*method, 3.5, 4).is_some());
            assert!(collect(*method, -0.51, 4).is_none());
            assert!(collect(*method, 3.51, 4).is_none());
            assert!(collect(*method, f64::NAN, 4).is_none());
        }
    }

    #[test]
    fn nearest_rounds() {
        assert_eq!(collect(Interpolation::Nearest, 1.4, 4).unwrap(), vec![(1, 1.)]);
        assert_eq!(collect(Interpolation::Nearest, -0.25, 4).unwrap(), vec![(0, 1.)]);
    }

    #[test]
    fn linear_renormalises_at_edges() {
        assert_eq!(
            collect(Interpolation::Linear, 1.25, 4).unwrap(),
            vec![(1, 0.75), (2, 0.25)]
        );
        assert_eq!(collect(Interpolation::Linear, -0.25, 4).unwrap(), vec![(0, 1.)]);
        assert_eq!(collect(Interpolation::Linear, 3.25, 4).unwrap(), vec![(3, 1.)]);
        assert_eq!(collect(Interpolation::Linear, 0., 1).unwrap(), vec![(0, 1.)]);
    }

    #[test]
    fn cubic_replicates_edges() {
        let t = collect(Interpolation::Cubic, 0.5, 4).unwrap();
        let idx: Vec<_> = t.iter().map(|(i, _)| *i).collect();
        assert_eq!(idx, vec![0, 0, 1, 2]);
        let sum: f64 = t.iter().map(|(_, w)| *w).sum();
        assert_relative_eq!(sum, 1., epsilon = 1e-12);

        let on_lattice = collect(Interpolation::Cubic, 2., 4).unwrap();
        assert_eq!(on_lattice[1], (2, 1.));
        assert_eq!(on_lattice[0].1, 0.);
    }

    #[test]
    fn sinc_is_normalised_and_interpolating() {
        let t = collect(Interpolation::Sinc, 4.3, 10).unwrap();
        assert_eq!(t.len(), 2 * DEFAULT_SINC_RADIUS);
        let sum: f64 = t.iter().map(|(_, w)| *w).sum();
        assert_relative_eq!(sum, 1., epsilon = 1e-12);

        let on_lattice = collect(Interpolation::Sinc, 4., 10).unwrap();
        assert_eq!(on_lattice, vec![(4, 1.)]);
    }
}
