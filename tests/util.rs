use nifti_grid::volume::shape::Dim;
use nifti_grid::{DataType, GridBuilder, GridDescriptor, GridImage, InMemVolume};

/// Grid with the default (centred) transform.
pub fn grid(dim: &[usize], spacing: &[f64], datatype: DataType) -> GridDescriptor {
    GridBuilder::new()
        .dim(dim)
        .spacing(spacing)
        .datatype(datatype)
        .build()
        .unwrap()
}

/// Image on `grid` with voxels given by `f`.
pub fn image_from_fn<F>(grid: GridDescriptor, f: F) -> GridImage
where
    F: FnMut(&[usize]) -> f64,
{
    let volume = InMemVolume::from_fn(*grid.dim(), grid.datatype(), f);
    GridImage::new(grid, volume).unwrap()
}

/// Mask volume with voxels in the inclusive box `[lower, upper]` set.
#[allow(dead_code)]
pub fn box_mask(dim: &[usize], lower: [usize; 3], upper: [usize; 3]) -> InMemVolume {
    let dim = Dim::from_slice(dim).unwrap();
    InMemVolume::from_fn(dim, DataType::Uint8, |c| {
        let inside = (0..3).all(|a| c[a] >= lower[a] && c[a] <= upper[a]);
        if inside {
            1.
        } else {
            0.
        }
    })
}

/// A cube of `n` voxels along each axis alternating between 0 and 1, the
/// highest frequency the grid can hold.
#[allow(dead_code)]
pub fn checkerboard(n: usize) -> GridImage {
    image_from_fn(grid(&[n, n, n], &[1., 1., 1.], DataType::Float32), |c| {
        ((c[0] + c[1] + c[2]) % 2) as f64
    })
}
