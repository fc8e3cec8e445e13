#[macro_use]
extern crate pretty_assertions;

mod util;

use approx::assert_relative_eq;
use nalgebra::Vector3;
use nifti_grid::affine::voxel_to_world;
use nifti_grid::transfer::crop_pad;
use nifti_grid::{
    BoundsMode, BoundsResolver, DataType, GridEvent, NullSink, RecordingSink, VoxelVolume,
};
use util::{grid, image_from_fn};

#[test]
fn padding_fills_outside_voxels() {
    let g = grid(&[4, 5, 3], &[1., 1., 1.], DataType::Float32);
    let image = image_from_fn(g, |c| 0.25 + (c[0] + 4 * c[1] + 20 * c[2]) as f64);
    let bounds = BoundsResolver::new(image.header(), BoundsMode::Pad)
        .uniform(3)
        .resolve(&NullSink)
        .unwrap();
    let target = bounds.target_grid(image.header(), DataType::Float32).unwrap();
    assert_eq!(target.dim().as_ref(), &[10, 11, 9]);

    let out = crop_pad(image.volume(), &bounds, &target, -1.).unwrap();
    for idx in target.dim().index_iter() {
        let c = idx.as_ref();
        let src: Vec<i64> = c.iter().map(|v| *v as i64 - 3).collect();
        let inside = src
            .iter()
            .zip(image.header().dim().as_ref())
            .all(|(s, n)| *s >= 0 && *s < *n as i64);
        let value = out.get_f64(c).unwrap();
        if inside {
            let s: Vec<usize> = src.iter().map(|v| *v as usize).collect();
            assert_eq!(value, image.volume().get_f64(&s).unwrap());
        } else {
            assert_eq!(value, -1.);
        }
    }
}

#[test]
fn cropping_keeps_world_positions() {
    let g = grid(&[10, 10, 10], &[1., 2., 3.], DataType::Int16);
    let image = image_from_fn(g, |c| (c[0] + 10 * c[1] + 100 * c[2]) as f64);
    let bounds = BoundsResolver::new(image.header(), BoundsMode::Crop)
        .axis(0, "2,1".parse().unwrap())
        .axis(1, "1:4".parse().unwrap())
        .resolve(&NullSink)
        .unwrap();
    let target = bounds.target_grid(image.header(), DataType::Int16).unwrap();
    assert_eq!(target.dim().as_ref(), &[7, 4, 10]);
    assert_eq!(target.spacing(), image.header().spacing());

    let first = voxel_to_world(target.transform(), &Vector3::new(0., 0., 0.));
    let expected = voxel_to_world(image.header().transform(), &Vector3::new(2., 1., 0.));
    assert_relative_eq!(first, expected, epsilon = 1e-9);

    let out = crop_pad(image.volume(), &bounds, &target, 0.).unwrap();
    assert_eq!(out.data_type(), DataType::Int16);
    assert_eq!(out.get_f64(&[0, 0, 0]).unwrap(), 12.);
    assert_eq!(out.get_f64(&[6, 3, 9]).unwrap(), 8. + 40. + 900.);
}

#[test]
fn identity_bounds_copy_the_image() {
    let g = grid(&[5, 4, 3, 2], &[1., 1., 1., 1.], DataType::Uint16);
    let image = image_from_fn(g, |c| (c[0] * c[1] + c[2] + 7 * c[3]) as f64);
    for mode in &[BoundsMode::Crop, BoundsMode::Pad] {
        let sink = RecordingSink::new();
        let bounds = BoundsResolver::new(image.header(), *mode)
            .axis(0, "0,0".parse().unwrap())
            .all_axes(true)
            .resolve(&sink)
            .unwrap();
        assert_eq!(sink.events(), vec![GridEvent::NoAxesChanged]);

        let target = bounds.target_grid(image.header(), DataType::Uint16).unwrap();
        assert_eq!(&target, image.header());
        let out = crop_pad(image.volume(), &bounds, &target, 0.).unwrap();
        assert_eq!(&out, image.volume());
    }
}

#[test]
fn crop_along_a_higher_axis() {
    let g = grid(&[2, 2, 2, 5], &[1., 1., 1., 1.], DataType::Float32);
    let image = image_from_fn(g, |c| c[3] as f64);
    let bounds = BoundsResolver::new(image.header(), BoundsMode::Crop)
        .axis(3, "1:3".parse().unwrap())
        .resolve(&NullSink)
        .unwrap();
    let target = bounds.target_grid(image.header(), DataType::Float32).unwrap();
    let out = crop_pad(image.volume(), &bounds, &target, 0.).unwrap();
    assert_eq!(out.dim().as_ref(), &[2, 2, 2, 3]);
    assert_eq!(out.get_f64(&[1, 1, 1, 0]).unwrap(), 1.);
    assert_eq!(out.get_f64(&[1, 1, 1, 2]).unwrap(), 3.);
    assert_eq!(target.transform(), image.header().transform());
}
