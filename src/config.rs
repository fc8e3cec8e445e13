//! Configuration surface of the grid operations.
//!
//! A [`GridConfig`] gathers every option of a regrid, crop or pad operation.
//! It can be filled field by field, or from generic `key=value` pairs with
//! [`GridConfig::set_option`], which is how command line front ends are
//! expected to map their arguments onto it.
//!
//! [`GridConfig`]: ./struct.GridConfig.html
//! [`GridConfig::set_option`]: ./struct.GridConfig.html#method.set_option

use crate::bounds::{AxisSpec, BoundsMode};
use crate::error::{GridError, Result};
use crate::interp::{Interpolation, Oversample};
use crate::typedef::DataType;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// The operation to perform on the input image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Operation {
    /// Resample onto a new voxel grid.
    Regrid,
    /// Remove voxels at the edges.
    Crop,
    /// Add voxels at the edges.
    Pad,
}

impl Operation {
    /// The bounds mode of a crop or pad operation.
    pub fn bounds_mode(self) -> Option<BoundsMode> {
        match self {
            Operation::Regrid => None,
            Operation::Crop => Some(BoundsMode::Crop),
            Operation::Pad => Some(BoundsMode::Pad),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Regrid => "regrid",
            Operation::Crop => "crop",
            Operation::Pad => "pad",
        })
    }
}

impl FromStr for Operation {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regrid" => Ok(Operation::Regrid),
            "crop" => Ok(Operation::Crop),
            "pad" => Ok(Operation::Pad),
            other => Err(GridError::Configuration(format!(
                "unknown operation \"{}\" (expected regrid, crop or pad)",
                other
            ))),
        }
    }
}

/// Options of the regrid operation.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RegridOptions {
    /// image whose voxel grid is matched
    pub template: Option<PathBuf>,
    /// new number of voxels along each spatial axis
    pub size: Option<Vec<usize>>,
    /// new voxel spacing, one value or one per spatial axis
    pub voxel: Option<Vec<f64>>,
    /// resolution scale factor, one value or one per spatial axis
    pub scale: Option<Vec<f64>>,
    /// interpolation method
    pub interp: Interpolation,
    /// oversampling factors
    pub oversample: Oversample,
    /// sinc kernel radius in voxels, 3 if unset
    pub sinc_radius: Option<usize>,
}

/// Options of the crop and pad operations.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CropPadOptions {
    /// image whose extent is matched
    pub reference: Option<PathBuf>,
    /// voxels removed or added at both ends of every considered axis
    pub uniform: Option<i64>,
    /// crop to the bounding box of this mask image
    pub mask: Option<PathBuf>,
    /// explicit per-axis specifications, applied in order
    pub axes: Vec<(usize, AxisSpec)>,
    /// consider every axis instead of the first three
    pub all_axes: bool,
}

/// Complete configuration of a grid operation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridConfig {
    /// operation to perform
    pub operation: Operation,
    /// regrid options, ignored by crop and pad
    #[cfg_attr(feature = "serde", serde(default))]
    pub regrid: RegridOptions,
    /// crop and pad options, ignored by regrid
    #[cfg_attr(feature = "serde", serde(default))]
    pub crop_pad: CropPadOptions,
    /// value of voxels mapping outside of the input
    #[cfg_attr(feature = "serde", serde(default))]
    pub fill: Option<f64>,
    /// use NaN as the out-of-bounds value
    #[cfg_attr(feature = "serde", serde(default))]
    pub nan: bool,
    /// output data type, overriding the default for the operation
    #[cfg_attr(feature = "serde", serde(default))]
    pub datatype: Option<DataType>,
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        GridError::Configuration(format!("invalid value \"{}\" for option {}", value, key))
    })
}

fn parse_list<T: FromStr>(key: &str, value: &str) -> Result<Vec<T>> {
    value.split(',').map(|v| parse_value(key, v)).collect()
}

fn parse_bool(key: &str, value: Option<&str>) -> Result<bool> {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(true),
        Some(v) => match v.as_str() {
            "" | "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(GridError::Configuration(format!(
                "invalid value \"{}\" for option {}",
                v, key
            ))),
        },
    }
}

impl GridConfig {
    /// A configuration for `operation`, with every option at its default.
    pub fn new(operation: Operation) -> Self {
        GridConfig {
            operation,
            regrid: RegridOptions::default(),
            crop_pad: CropPadOptions::default(),
            fill: None,
            nan: false,
            datatype: None,
        }
    }

    /// Set one option from its textual form.
    ///
    /// Lists (`size`, `voxel`, `scale`, `oversample`) are comma separated.
    /// `axis` takes an axis index and a specification separated by
    /// whitespace, as in `"2 0:end"`, and may be given several times. Flags
    /// (`nan`, `all_axes`) accept a missing value as `true`.
    ///
    /// # Errors
    ///
    /// - `GridError::Configuration` for an unknown key, a missing value or a
    /// value that cannot be parsed.
    pub fn set_option(&mut self, key: &str, value: Option<&str>) -> Result<()> {
        let key = key.trim().trim_start_matches('-').replace('-', "_");
        let key = key.as_str();
        match key {
            "nan" => {
                self.nan = parse_bool(key, value)?;
                return Ok(());
            }
            "all_axes" => {
                self.crop_pad.all_axes = parse_bool(key, value)?;
                return Ok(());
            }
            _ => {}
        }

        let value = value.ok_or_else(|| {
            GridError::Configuration(format!("option {} requires a value", key))
        })?;
        match key {
            "operation" => self.operation = parse_value(key, value)?,
            "template" => self.regrid.template = Some(PathBuf::from(value)),
            "size" => self.regrid.size = Some(parse_list(key, value)?),
            "voxel" => self.regrid.voxel = Some(parse_list(key, value)?),
            "scale" => self.regrid.scale = Some(parse_list(key, value)?),
            "interp" => self.regrid.interp = value.parse()?,
            "oversample" => self.regrid.oversample = value.parse()?,
            "sinc_radius" => self.regrid.sinc_radius = Some(parse_value(key, value)?),
            "as" | "reference" => self.crop_pad.reference = Some(PathBuf::from(value)),
            "uniform" => self.crop_pad.uniform = Some(parse_value(key, value)?),
            "mask" => self.crop_pad.mask = Some(PathBuf::from(value)),
            "axis" => {
                let mut parts = value.trim().splitn(2, char::is_whitespace);
                let (index, spec) = match (parts.next(), parts.next()) {
                    (Some(index), Some(spec)) => (index, spec),
                    _ => {
                        return Err(GridError::Configuration(format!(
                            "option axis expects \"<index> <spec>\", got \"{}\"",
                            value
                        )))
                    }
                };
                let index = parse_value(key, index)?;
                self.crop_pad.axes.push((index, spec.parse()?));
            }
            "fill" => self.fill = Some(parse_value(key, value)?),
            "datatype" => self.datatype = Some(value.parse()?),
            other => {
                return Err(GridError::Configuration(format!(
                    "unknown option {}",
                    other
                )))
            }
        }
        Ok(())
    }

    /// The value of output voxels which map outside of the input.
    ///
    /// # Errors
    ///
    /// - `GridError::Configuration` if both `fill` and `nan` are set.
    pub fn out_of_bounds_value(&self) -> Result<f64> {
        match (self.fill, self.nan) {
            (Some(_), true) => Err(GridError::Configuration(
                "options fill and nan are mutually exclusive".to_string(),
            )),
            (Some(fill), false) => Ok(fill),
            (None, true) => Ok(std::f64::NAN),
            (None, false) => Ok(0.),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GridConfig, Operation};
    use crate::bounds::{AxisSpec, RangeStop};
    use crate::interp::{Interpolation, Oversample};
    use crate::{DataType, GridError};
    use std::path::PathBuf;

    #[test]
    fn options_from_key_value_pairs() {
        let mut config = GridConfig::new(Operation::Crop);
        config.set_option("operation", Some("regrid")).unwrap();
        config.set_option("voxel", Some("1.5, 2,3")).unwrap();
        config.set_option("-interp", Some("linear")).unwrap();
        config.set_option("oversample", Some("2")).unwrap();
        config.set_option("template", Some("t.nii")).unwrap();
        config.set_option("datatype", Some("int16")).unwrap();
        config.set_option("nan", None).unwrap();
        config.set_option("sinc-radius", Some("5")).unwrap();

        assert_eq!(config.operation, Operation::Regrid);
        assert_eq!(config.regrid.sinc_radius, Some(5));
        assert_eq!(config.regrid.voxel, Some(vec![1.5, 2., 3.]));
        assert_eq!(config.regrid.interp, Interpolation::Linear);
        assert_eq!(config.regrid.oversample, Oversample::Factors([2, 2, 2]));
        assert_eq!(config.regrid.template, Some(PathBuf::from("t.nii")));
        assert_eq!(config.datatype, Some(DataType::Int16));
        assert!(config.nan);
    }

    #[test]
    fn axis_options_accumulate() {
        let mut config = GridConfig::new(Operation::Crop);
        config.set_option("axis", Some("0 2,3")).unwrap();
        config.set_option("axis", Some("3  1:end")).unwrap();
        config.set_option("all-axes", Some("true")).unwrap();
        assert_eq!(
            config.crop_pad.axes,
            vec![
                (0, AxisSpec::Delta { lower: 2, upper: 3 }),
                (
                    3,
                    AxisSpec::Range {
                        start: 1,
                        stop: RangeStop::End
                    }
                ),
            ]
        );
        assert!(config.crop_pad.all_axes);
        assert!(config.set_option("axis", Some("2")).is_err());
    }

    #[test]
    fn bad_options_are_configuration_errors() {
        let mut config = GridConfig::new(Operation::Pad);
        for (key, value) in &[
            ("colour", Some("red")),
            ("uniform", Some("two")),
            ("size", Some("1,x,3")),
            ("fill", None),
            ("nan", Some("maybe")),
        ] {
            match config.set_option(key, *value) {
                Err(GridError::Configuration(_)) => {}
                other => panic!("{}: unexpected {:?}", key, other),
            }
        }
    }

    #[test]
    fn out_of_bounds_value() {
        let mut config = GridConfig::new(Operation::Pad);
        assert_eq!(config.out_of_bounds_value().unwrap(), 0.);
        config.fill = Some(-1.);
        assert_eq!(config.out_of_bounds_value().unwrap(), -1.);
        config.nan = true;
        assert!(config.out_of_bounds_value().is_err());
        config.fill = None;
        assert!(config.out_of_bounds_value().unwrap().is_nan());
    }
}
