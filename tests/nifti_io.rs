#![cfg(feature = "nifti_io")]

#[macro_use]
extern crate pretty_assertions;

mod util;

use approx::assert_relative_eq;
use nifti_grid::{run, DataType, GridConfig, ImageSink, ImageSource, NiftiStore, NullSink, Operation};
use tempfile::tempdir;
use util::{grid, image_from_fn};

#[test]
fn write_and_read_back() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ramp.nii.gz");
    let g = grid(&[6, 5, 4, 2], &[1.5, 1.5, 3., 1.], DataType::Int16);
    let image = image_from_fn(g, |c| (c[0] as i64 - 3 * c[1] as i64 + 7 * c[3] as i64) as f64);

    let mut store = NiftiStore::new();
    store.create(&path, &image).unwrap();

    let header = store.open_header(&path).unwrap();
    assert_eq!(header.dim(), image.header().dim());
    assert_eq!(header.datatype(), DataType::Int16);
    assert_relative_eq!(*header.transform(), *image.header().transform(), epsilon = 1e-5);

    let back = store.open_image(&path).unwrap();
    assert_eq!(back.volume().raw_data(), image.volume().raw_data());
}

#[test]
fn regridded_image_is_written() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.nii");
    let output = dir.path().join("out.nii");
    let g = grid(&[8, 8, 8], &[1., 1., 1.], DataType::Float32);
    let mut store = NiftiStore::new();
    store.create(&input, &image_from_fn(g, |c| c[2] as f64)).unwrap();

    let mut config = GridConfig::new(Operation::Regrid);
    config.set_option("voxel", Some("2")).unwrap();
    let out = run(&config, &store, &input, &NullSink).unwrap();
    store.create(&output, &out).unwrap();

    let back = store.open_header(&output).unwrap();
    assert_eq!(back.dim().as_ref(), &[4, 4, 4]);
    assert_eq!(back.spatial_spacing(), [2., 2., 2.]);
}
