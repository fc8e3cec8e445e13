//! Image storage collaborators.
//!
//! Operations read their inputs through an [`ImageSource`] and results are
//! stored through an [`ImageSink`]. [`MemoryStore`] keeps images in a map
//! and implements both. With the `nifti_io` feature, `NiftiStore` reads
//! and writes NIfTI-1 files through the `nifti` crate.
//!
//! [`ImageSource`]: ./trait.ImageSource.html
//! [`ImageSink`]: ./trait.ImageSink.html
//! [`MemoryStore`]: ./struct.MemoryStore.html

use crate::error::{GridError, Result};
use crate::grid::GridDescriptor;
use crate::object::GridImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[cfg(feature = "nifti_io")]
pub use self::nifti_store::NiftiStore;

/// Provider of input images.
pub trait ImageSource {
    /// Read only the grid of an image.
    fn open_header(&self, path: &Path) -> Result<GridDescriptor>;

    /// Read a complete image.
    fn open_image(&self, path: &Path) -> Result<GridImage>;
}

/// Receiver of output images.
pub trait ImageSink {
    /// Store `image` under `path`, replacing any previous image there.
    fn create(&mut self, path: &Path, image: &GridImage) -> Result<()>;
}

/// Images kept in memory, keyed by path.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MemoryStore {
    images: HashMap<PathBuf, GridImage>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an image, returning the one previously stored under `path`.
    pub fn insert<P: Into<PathBuf>>(&mut self, path: P, image: GridImage) -> Option<GridImage> {
        self.images.insert(path.into(), image)
    }

    /// Look up an image.
    pub fn get<P: AsRef<Path>>(&self, path: P) -> Option<&GridImage> {
        self.images.get(path.as_ref())
    }

    /// Number of stored images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the store holds no image.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    fn lookup(&self, path: &Path) -> Result<&GridImage> {
        self.images
            .get(path)
            .ok_or_else(|| GridError::MissingImage(path.to_path_buf()))
    }
}

impl ImageSource for MemoryStore {
    fn open_header(&self, path: &Path) -> Result<GridDescriptor> {
        self.lookup(path).map(|image| image.header().clone())
    }

    fn open_image(&self, path: &Path) -> Result<GridImage> {
        self.lookup(path).map(Clone::clone)
    }
}

impl ImageSink for MemoryStore {
    fn create(&mut self, path: &Path, image: &GridImage) -> Result<()> {
        let _ = self.images.insert(path.to_path_buf(), image.clone());
        Ok(())
    }
}

#[cfg(feature = "nifti_io")]
mod nifti_store {
    use super::{ImageSink, ImageSource};
    use crate::affine::{self, Affine4};
    use crate::error::{GridError, Result};
    use crate::grid::{GridBuilder, GridDescriptor, SPATIAL_AXES};
    use crate::object::GridImage;
    use crate::typedef::DataType;
    use crate::volume::{InMemVolume, IntoNdArray as _};
    use nalgebra::Vector3;
    use ndarray::{Array, IxDyn};
    use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
    use nifti::writer::WriterOptions;
    use num_traits::FromPrimitive;
    use std::path::Path;

    /// Longest description stored in a NIfTI-1 header, without the
    /// terminating NUL.
    const DESCRIP_LEN: usize = 79;

    fn format_error<E: ToString>(e: E) -> GridError {
        GridError::Format(e.to_string())
    }

    /// Reads and writes `.nii` and `.nii.gz` files.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct NiftiStore;

    impl NiftiStore {
        /// Create a store.
        pub fn new() -> Self {
            NiftiStore
        }
    }

    fn header_transform(header: &NiftiHeader) -> Affine4 {
        let pixdim = |i: usize| f64::from(header.pixdim[i]);
        if header.sform_code > 0 {
            let rows = [header.srow_x, header.srow_y, header.srow_z];
            let mut t = Affine4::identity();
            for (r, row) in rows.iter().enumerate() {
                for c in 0..4 {
                    t[(r, c)] = f64::from(row[c]);
                }
            }
            return t;
        }
        let spacing = [pixdim(1).abs(), pixdim(2).abs(), pixdim(3).abs()];
        if header.qform_code > 0 {
            let bcd = Vector3::new(
                f64::from(header.quatern_b),
                f64::from(header.quatern_c),
                f64::from(header.quatern_d),
            );
            if let Some(q) = affine::fill_positive(bcd) {
                let qfac = if pixdim(0) < 0. { -1. } else { 1. };
                let rotation = affine::quaternion_to_affine(q);
                let zooms = nalgebra::Matrix3::from_diagonal(&Vector3::new(
                    spacing[0],
                    spacing[1],
                    spacing[2] * qfac,
                ));
                let offset = Vector3::new(
                    f64::from(header.quatern_x),
                    f64::from(header.quatern_y),
                    f64::from(header.quatern_z),
                );
                return affine::from_affine_and_translation(&(rotation * zooms), &offset);
            }
        }
        affine::scaling(spacing)
    }

    fn header_to_grid(header: &NiftiHeader, datatype: DataType) -> Result<GridDescriptor> {
        let rank = usize::from(header.dim[0]);
        if rank == 0 || rank > 7 {
            return Err(GridError::InconsistentDim(rank));
        }
        let dim: Vec<usize> = header.dim[1..=rank].iter().map(|d| usize::from(*d)).collect();
        let transform = header_transform(header);
        let spatial = affine::spacing_of(&transform);
        let spacing: Vec<f64> = (0..rank)
            .map(|axis| {
                if axis < SPATIAL_AXES {
                    spatial[axis]
                } else {
                    let p = f64::from(header.pixdim[axis + 1]);
                    if p > 0. {
                        p
                    } else {
                        1.
                    }
                }
            })
            .collect();

        let mut builder = GridBuilder::new()
            .dim(&dim)
            .spacing(&spacing)
            .transform(transform)
            .datatype(datatype);
        let descrip: Vec<u8> = header.descrip.iter().cloned().take_while(|b| *b != 0).collect();
        let descrip = String::from_utf8_lossy(&descrip);
        if !descrip.trim().is_empty() {
            builder = builder.comment(descrip.trim());
        }
        builder.build()
    }

    fn header_datatype(header: &NiftiHeader) -> Result<DataType> {
        let datatype = DataType::from_i16(header.datatype).ok_or_else(|| {
            GridError::Format(format!("unsupported NIfTI datatype code {}", header.datatype))
        })?;
        let scaled = header.scl_slope != 0. && (header.scl_slope != 1. || header.scl_inter != 0.);
        if scaled && !datatype.is_float() {
            Ok(DataType::Float32)
        } else {
            Ok(datatype)
        }
    }

    fn grid_to_header(grid: &GridDescriptor) -> Result<NiftiHeader> {
        let mut header = NiftiHeader::default();
        let t = grid.transform();
        header.dim[0] = grid.ndim() as u16;
        header.pixdim[0] = 1.;
        for (axis, (size, spacing)) in grid.dim().as_ref().iter().zip(grid.spacing()).enumerate() {
            header.dim[axis + 1] = *size as u16;
            header.pixdim[axis + 1] = *spacing as f32;
        }
        header.sform_code = 2;
        header.qform_code = 0;
        let row = |r: usize| {
            [
                t[(r, 0)] as f32,
                t[(r, 1)] as f32,
                t[(r, 2)] as f32,
                t[(r, 3)] as f32,
            ]
        };
        header.srow_x = row(0);
        header.srow_y = row(1);
        header.srow_z = row(2);
        header.scl_slope = 1.;
        header.scl_inter = 0.;
        let mut descrip = grid.comments().join("; ").into_bytes();
        descrip.truncate(DESCRIP_LEN);
        header.set_description(descrip).map_err(format_error)?;
        Ok(header)
    }

    impl ImageSource for NiftiStore {
        fn open_header(&self, path: &Path) -> Result<GridDescriptor> {
            let header = NiftiHeader::from_file(path).map_err(format_error)?;
            header_to_grid(&header, header_datatype(&header)?)
        }

        fn open_image(&self, path: &Path) -> Result<GridImage> {
            let object = ReaderOptions::new().read_file(path).map_err(format_error)?;
            let datatype = header_datatype(object.header())?;
            let grid = header_to_grid(object.header(), datatype)?;
            let array = object
                .into_volume()
                .into_ndarray::<f64>()
                .map_err(format_error)?;
            let volume = InMemVolume::from_ndarray(&array, datatype)?;
            GridImage::new(grid, volume)
        }
    }

    impl ImageSink for NiftiStore {
        fn create(&mut self, path: &Path, image: &GridImage) -> Result<()> {
            let header = grid_to_header(image.header())?;
            let array: Array<f64, IxDyn> = image.volume().clone().into_ndarray()?;
            let writer = WriterOptions::new(path).reference_header(&header);
            let written = match image.header().datatype() {
                DataType::Uint8 => writer.write_nifti(&array.mapv(|v| v as u8)),
                DataType::Int8 => writer.write_nifti(&array.mapv(|v| v as i8)),
                DataType::Uint16 => writer.write_nifti(&array.mapv(|v| v as u16)),
                DataType::Int16 => writer.write_nifti(&array.mapv(|v| v as i16)),
                DataType::Uint32 => writer.write_nifti(&array.mapv(|v| v as u32)),
                DataType::Int32 => writer.write_nifti(&array.mapv(|v| v as i32)),
                DataType::Uint64 => writer.write_nifti(&array.mapv(|v| v as u64)),
                DataType::Int64 => writer.write_nifti(&array.mapv(|v| v as i64)),
                DataType::Float32 => writer.write_nifti(&array.mapv(|v| v as f32)),
                DataType::Float64 => writer.write_nifti(&array),
            };
            written.map_err(format_error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ImageSink, ImageSource, MemoryStore};
    use crate::volume::shape::Dim;
    use crate::{DataType, GridBuilder, GridError, GridImage, InMemVolume};
    use std::path::Path;

    #[test]
    fn memory_store_round_trip() {
        let grid = GridBuilder::new()
            .dim(&[2, 2, 2])
            .spacing(&[1., 1., 1.])
            .datatype(DataType::Uint8)
            .build()
            .unwrap();
        let volume = InMemVolume::filled(Dim::from_slice(&[2, 2, 2]).unwrap(), DataType::Uint8, 3.);
        let image = GridImage::new(grid.clone(), volume).unwrap();

        let mut store = MemoryStore::new();
        store.create(Path::new("a.nii"), &image).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.open_header(Path::new("a.nii")).unwrap(), grid);
        assert_eq!(store.open_image(Path::new("a.nii")).unwrap(), image);
        match store.open_image(Path::new("b.nii")) {
            Err(GridError::MissingImage(p)) => assert_eq!(p, Path::new("b.nii")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
