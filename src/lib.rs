//! Voxel grid transformations for NIfTI-style images.
//!
//! This crate changes the sampling lattice of multi-dimensional images laid
//! on a voxel grid with an affine voxel-to-world transform:
//!
//! - **regrid**: resample onto a new grid, given by a size, a voxel spacing,
//! a scale factor or a template image, with nearest, linear, cubic or sinc
//! interpolation and optional oversampling for anti-aliasing;
//! - **crop** and **pad**: shrink or grow the field of view without
//! interpolating, from a mask, a reference image, a uniform margin or
//! per-axis specifications.
//!
//! The building blocks can be used on their own ([`BoundsResolver`],
//! [`ResizePlanner`], [`Sampler`] and the [`transfer`] engine), or driven
//! from a [`GridConfig`] with [`run`].
//!
//! # Example
//!
//! ```
//! use nifti_grid::{transfer, DataType, GridBuilder, InMemVolume, Interpolation, NullSink, ResizePlanner};
//! use nifti_grid::volume::shape::Dim;
//! # use nifti_grid::Result;
//!
//! # fn run() -> Result<()> {
//! let grid = GridBuilder::new().dim(&[16, 16, 16]).spacing(&[1., 1., 1.]).build()?;
//! let volume = InMemVolume::from_fn(*grid.dim(), DataType::Float32, |c| c[0] as f64);
//!
//! let plan = ResizePlanner::new(&grid)
//!     .scale(&[0.5])?
//!     .interpolation(Interpolation::Linear)
//!     .plan(&NullSink)?;
//! let out = transfer::regrid(&grid, &volume, &plan, 0.)?;
//! assert_eq!(out.raw_data().len(), 8 * 8 * 8);
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```
//!
//! [`BoundsResolver`]: ./bounds/struct.BoundsResolver.html
//! [`ResizePlanner`]: ./resize/struct.ResizePlanner.html
//! [`Sampler`]: ./interp/struct.Sampler.html
//! [`transfer`]: ./transfer/index.html
//! [`GridConfig`]: ./config/struct.GridConfig.html
//! [`run`]: ./command/fn.run.html
#![deny(missing_debug_implementations)]
#![warn(missing_docs, unused_extern_crates, trivial_casts, unused_results)]

#[macro_use]
extern crate quick_error;
#[macro_use]
extern crate num_derive;

pub mod affine;
pub mod bounds;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod grid;
pub mod interp;
pub mod io;
pub mod object;
pub mod resize;
pub mod transfer;
pub mod typedef;
pub mod volume;

pub use bounds::{AxisBounds, AxisSpec, Bounds, BoundsMode, BoundsResolver, RangeStop};
pub use command::run;
pub use config::{CropPadOptions, GridConfig, Operation, RegridOptions};
pub use error::{GridError, Result};
pub use event::{EventSink, GridEvent, NullSink, RecordingSink, TracingSink};
pub use grid::{GridBuilder, GridDescriptor};
pub use interp::{Interpolation, Oversample, Sampler};
#[cfg(feature = "nifti_io")]
pub use io::NiftiStore;
pub use io::{ImageSink, ImageSource, MemoryStore};
pub use object::GridImage;
pub use resize::{ResizePlan, ResizePlanner};
pub use typedef::DataType;
pub use volume::{InMemVolume, IntoNdArray, VoxelVolume};
