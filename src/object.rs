//! Module for handling images as a whole: a grid descriptor (the header)
//! together with the voxel volume laid on it.

use crate::error::{GridError, Result};
use crate::grid::GridDescriptor;
use crate::volume::{InMemVolume, VoxelVolume};

/// An image held in memory, made of a grid descriptor and its voxel data.
#[derive(Debug, PartialEq, Clone)]
pub struct GridImage {
    header: GridDescriptor,
    volume: InMemVolume,
}

impl GridImage {
    /// Pair a header with a volume.
    ///
    /// # Errors
    ///
    /// - `GridError::DimensionMismatch` if the volume's shape differs from
    /// the header's.
    pub fn new(header: GridDescriptor, volume: InMemVolume) -> Result<Self> {
        if header.dim() != volume.dim() {
            return Err(GridError::DimensionMismatch(
                "volume",
                header.dim().as_ref().to_vec(),
                volume.dim().as_ref().to_vec(),
            ));
        }
        Ok(GridImage { header, volume })
    }

    /// Retrieve the grid descriptor.
    pub fn header(&self) -> &GridDescriptor {
        &self.header
    }

    /// Retrieve the voxel volume.
    pub fn volume(&self) -> &InMemVolume {
        &self.volume
    }

    /// Retrieve the voxel volume, consuming the image.
    pub fn into_volume(self) -> InMemVolume {
        self.volume
    }

    /// Split the image into its header and volume.
    pub fn into_parts(self) -> (GridDescriptor, InMemVolume) {
        (self.header, self.volume)
    }
}
