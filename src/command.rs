//! End-to-end execution of a configured operation.
//!
//! [`run`] validates the whole configuration and plans the output grid
//! before the input voxels are read. Reading a crop mask is the one
//! exception, since its bounding box can only be known from its voxels.
//!
//! [`run`]: ./fn.run.html

use crate::bounds::BoundsResolver;
use crate::config::{GridConfig, Operation};
use crate::error::Result;
use crate::event::{EventSink, GridEvent};
use crate::interp::Interpolation;
use crate::io::ImageSource;
use crate::object::GridImage;
use crate::resize::ResizePlanner;
use crate::transfer;
use crate::typedef::DataType;
use std::path::Path;

/// Datatype able to hold the out-of-bounds value, when the default one
/// cannot: integer images filled with NaN, a fraction or a value out of
/// their range are stored as floating point.
fn fill_datatype(datatype: DataType, fill: f64) -> DataType {
    let holds = |dt: DataType| fill.is_nan() || dt.quantize(fill) == fill;
    if datatype.is_float() || (holds(datatype) && !fill.is_nan()) {
        datatype
    } else if holds(DataType::Float32) {
        DataType::Float32
    } else {
        DataType::Float64
    }
}

/// Run the operation described by `config` on the image at `input`.
///
/// Auxiliary images (template, reference and mask) are read from `source`
/// as well. Events are reported to `sink` as the operation progresses.
///
/// # Errors
///
/// Any error of the configuration, planning or transfer steps, as well as
/// errors reading the images.
///
/// # Example
///
/// ```
/// use nifti_grid::{run, GridBuilder, GridConfig, GridImage, InMemVolume, MemoryStore, NullSink, Operation};
/// use nifti_grid::volume::shape::Dim;
/// use nifti_grid::DataType;
/// # use nifti_grid::Result;
/// use std::path::Path;
///
/// # fn main() -> Result<()> {
/// let grid = GridBuilder::new().dim(&[8, 8, 8]).spacing(&[1., 1., 1.]).build()?;
/// let volume = InMemVolume::filled(Dim::from_slice(&[8, 8, 8])?, DataType::Float32, 1.);
/// let mut store = MemoryStore::new();
/// store.insert("in.nii", GridImage::new(grid, volume)?);
///
/// let mut config = GridConfig::new(Operation::Crop);
/// config.set_option("uniform", Some("2"))?;
/// let out = run(&config, &store, Path::new("in.nii"), &NullSink)?;
/// assert_eq!(out.header().dim().as_ref(), &[4, 4, 4]);
/// # Ok(())
/// # }
/// ```
pub fn run<S>(config: &GridConfig, source: &S, input: &Path, sink: &dyn EventSink) -> Result<GridImage>
where
    S: ImageSource + ?Sized,
{
    let fill = config.out_of_bounds_value()?;
    sink.emit(&GridEvent::Operation(config.operation));
    let header = source.open_header(input)?;

    match config.operation.bounds_mode() {
        None => {
            let options = &config.regrid;
            let template = match &options.template {
                Some(path) => Some((source.open_header(path)?, path.display().to_string())),
                None => None,
            };

            let mut planner = ResizePlanner::new(&header)
                .interpolation(options.interp)
                .oversample(options.oversample);
            if let Some((grid, name)) = &template {
                planner = planner.template(grid, name.as_str());
            }
            if let Some(size) = &options.size {
                planner = planner.size(size)?;
            }
            if let Some(voxel) = &options.voxel {
                planner = planner.voxel_size(voxel)?;
            }
            if let Some(scale) = &options.scale {
                planner = planner.scale(scale)?;
            }
            if let Some(radius) = options.sinc_radius {
                planner = planner.sinc_radius(radius)?;
            }
            match config.datatype {
                Some(datatype) => planner = planner.datatype(datatype),
                None if options.interp == Interpolation::Nearest => {
                    planner = planner.datatype(fill_datatype(header.datatype(), fill))
                }
                None => {}
            }
            let plan = planner.plan(sink)?;

            let image = source.open_image(input)?;
            let volume = transfer::regrid(image.header(), image.volume(), &plan, fill)?;
            GridImage::new(plan.grid, volume)
        }
        Some(mode) => {
            let options = &config.crop_pad;
            let reference = match &options.reference {
                Some(path) => Some(source.open_header(path)?),
                None => None,
            };
            let mask = match &options.mask {
                Some(path) => Some(source.open_image(path)?),
                None => None,
            };

            let mut resolver = BoundsResolver::new(&header, mode).all_axes(options.all_axes);
            if let Some(mask) = &mask {
                resolver = resolver.mask(mask.volume());
            }
            if let Some(reference) = &reference {
                resolver = resolver.reference(reference);
            }
            if let Some(uniform) = options.uniform {
                resolver = resolver.uniform(uniform);
            }
            for (axis, spec) in &options.axes {
                resolver = resolver.axis(*axis, *spec);
            }
            let bounds = resolver.resolve(sink)?;

            let datatype = config
                .datatype
                .unwrap_or_else(|| fill_datatype(header.datatype(), fill));
            let target = bounds.target_grid(&header, datatype)?;

            let image = source.open_image(input)?;
            let volume = transfer::crop_pad(image.volume(), &bounds, &target, fill)?;
            GridImage::new(target, volume)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{fill_datatype, run};
    use crate::config::{GridConfig, Operation};
    use crate::event::{GridEvent, RecordingSink};
    use crate::io::MemoryStore;
    use crate::volume::shape::Dim;
    use crate::{DataType, GridBuilder, GridError, GridImage, InMemVolume, VoxelVolume};
    use std::path::Path;

    fn store() -> MemoryStore {
        let grid = GridBuilder::new()
            .dim(&[4, 4, 4])
            .spacing(&[1., 1., 1.])
            .datatype(DataType::Int16)
            .build()
            .unwrap();
        let dim = Dim::from_slice(&[4, 4, 4]).unwrap();
        let volume = InMemVolume::from_fn(dim, DataType::Int16, |c| c[0] as f64);
        let mut store = MemoryStore::new();
        let _ = store.insert("in", GridImage::new(grid, volume).unwrap());
        store
    }

    #[test]
    fn nan_padding_promotes_integer_images() {
        let mut config = GridConfig::new(Operation::Pad);
        config.set_option("uniform", Some("1")).unwrap();
        config.set_option("nan", None).unwrap();
        let sink = RecordingSink::new();
        let out = run(&config, &store(), Path::new("in"), &sink).unwrap();
        assert_eq!(out.header().datatype(), DataType::Float32);
        assert!(out.volume().get_f64(&[0, 0, 0]).unwrap().is_nan());
        assert_eq!(out.volume().get_f64(&[4, 1, 1]).unwrap(), 3.);
        assert_eq!(sink.events()[0], GridEvent::Operation(Operation::Pad));
    }

    #[test]
    fn unrepresentable_fill_promotes_integer_images() {
        let int16 = DataType::Int16;
        assert_eq!(fill_datatype(int16, 0.), int16);
        assert_eq!(fill_datatype(int16, -7.), int16);
        assert_eq!(fill_datatype(int16, 0.5), DataType::Float32);
        assert_eq!(fill_datatype(int16, 1e6), DataType::Float32);
        assert_eq!(fill_datatype(int16, f64::NAN), DataType::Float32);
        assert_eq!(fill_datatype(DataType::Uint8, -1.), DataType::Float32);
        assert_eq!(fill_datatype(DataType::Uint8, 255.), DataType::Uint8);
        assert_eq!(fill_datatype(int16, 1e300), DataType::Float64);
        assert_eq!(fill_datatype(DataType::Float64, f64::NAN), DataType::Float64);

        let mut config = GridConfig::new(Operation::Pad);
        config.set_option("uniform", Some("1")).unwrap();
        config.set_option("fill", Some("0.5")).unwrap();
        let out = run(&config, &store(), Path::new("in"), &RecordingSink::new()).unwrap();
        assert_eq!(out.header().datatype(), DataType::Float32);
        assert_eq!(out.volume().get_f64(&[0, 0, 0]).unwrap(), 0.5);

        config.datatype = Some(DataType::Int16);
        let out = run(&config, &store(), Path::new("in"), &RecordingSink::new()).unwrap();
        assert_eq!(out.header().datatype(), DataType::Int16);
    }

    #[test]
    fn configuration_errors_come_before_reading_images() {
        let mut config = GridConfig::new(Operation::Regrid);
        config.set_option("scale", Some("2")).unwrap();
        config.set_option("voxel", Some("0.5")).unwrap();
        let empty = MemoryStore::new();
        // the input is missing, but the configuration is checked first
        config.fill = Some(1.);
        config.nan = true;
        match run(&config, &empty, Path::new("in"), &RecordingSink::new()) {
            Err(GridError::Configuration(_)) => {}
            other => panic!("unexpected {:?}", other),
        }

        config.nan = false;
        match run(&config, &store(), Path::new("in"), &RecordingSink::new()) {
            Err(GridError::Configuration(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn regrid_with_nearest_keeps_the_datatype() {
        let mut config = GridConfig::new(Operation::Regrid);
        config.set_option("scale", Some("2")).unwrap();
        config.set_option("interp", Some("nearest")).unwrap();
        let out = run(&config, &store(), Path::new("in"), &RecordingSink::new()).unwrap();
        assert_eq!(out.header().dim().as_ref(), &[8, 8, 8]);
        assert_eq!(out.header().datatype(), DataType::Int16);
        assert_eq!(out.volume().get_f64(&[7, 0, 0]).unwrap(), 3.);
    }
}
