//! Voxel data types.
//!
//! Volumes in this crate hold their voxels as `f64` regardless of how they
//! were stored on disk. `DataType` keeps track of the intended storage type,
//! so that values written into an integer volume can be rounded and saturated
//! the way a file writer would.

use crate::error::{GridError, Result};
use std::fmt;
use std::str::FromStr;

/// Data type for representing a voxel value type in a volume.
///
/// Discriminants follow the NIfTI-1 `datatype` codes.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DataType {
    /// unsigned char.
    // NIFTI_TYPE_UINT8           2
    Uint8 = 2,
    /// signed short.
    // NIFTI_TYPE_INT16           4
    Int16 = 4,
    /// signed int.
    // NIFTI_TYPE_INT32           8
    Int32 = 8,
    /// 32 bit float.
    // NIFTI_TYPE_FLOAT32        16
    Float32 = 16,
    /// 64 bit float = double.
    // NIFTI_TYPE_FLOAT64        64
    Float64 = 64,
    /// signed char.
    // NIFTI_TYPE_INT8          256
    Int8 = 256,
    /// unsigned short.
    // NIFTI_TYPE_UINT16        512
    Uint16 = 512,
    /// unsigned int.
    // NIFTI_TYPE_UINT32        768
    Uint32 = 768,
    /// signed long long.
    // NIFTI_TYPE_INT64        1024
    Int64 = 1024,
    /// unsigned long long.
    // NIFTI_TYPE_UINT64       1280
    Uint64 = 1280,
}

impl DataType {
    /// Retrieve the size of an element of this data type, in bytes.
    pub fn size_of(self) -> usize {
        use DataType::*;
        match self {
            Int8 | Uint8 => 1,
            Int16 | Uint16 => 2,
            Int32 | Uint32 | Float32 => 4,
            Int64 | Uint64 | Float64 => 8,
        }
    }

    /// Whether this is a floating point type.
    pub fn is_float(self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    /// Representable range of an integer type.
    fn integer_range(self) -> Option<(f64, f64)> {
        use DataType::*;
        match self {
            Uint8 => Some((0., f64::from(u8::MAX))),
            Int8 => Some((f64::from(i8::MIN), f64::from(i8::MAX))),
            Uint16 => Some((0., f64::from(u16::MAX))),
            Int16 => Some((f64::from(i16::MIN), f64::from(i16::MAX))),
            Uint32 => Some((0., f64::from(u32::MAX))),
            Int32 => Some((f64::from(i32::MIN), f64::from(i32::MAX))),
            Uint64 => Some((0., u64::MAX as f64)),
            Int64 => Some((i64::MIN as f64, i64::MAX as f64)),
            Float32 | Float64 => None,
        }
    }

    /// Convert a value to what this type would store.
    ///
    /// Integer types round to the nearest integer and saturate at the type's
    /// limits, with NaN stored as zero. `Float32` loses precision.
    pub fn quantize(self, value: f64) -> f64 {
        match self {
            DataType::Float64 => value,
            DataType::Float32 => f64::from(value as f32),
            _ => {
                if value.is_nan() {
                    return 0.;
                }
                match self.integer_range() {
                    Some((lo, hi)) => value.round().max(lo).min(hi),
                    None => value,
                }
            }
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Uint8 => "uint8",
            DataType::Int8 => "int8",
            DataType::Uint16 => "uint16",
            DataType::Int16 => "int16",
            DataType::Uint32 => "uint32",
            DataType::Int32 => "int32",
            DataType::Uint64 => "uint64",
            DataType::Int64 => "int64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
        };
        f.write_str(name)
    }
}

impl FromStr for DataType {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "uint8" => Ok(DataType::Uint8),
            "int8" => Ok(DataType::Int8),
            "uint16" => Ok(DataType::Uint16),
            "int16" => Ok(DataType::Int16),
            "uint32" => Ok(DataType::Uint32),
            "int32" => Ok(DataType::Int32),
            "uint64" => Ok(DataType::Uint64),
            "int64" => Ok(DataType::Int64),
            "float32" => Ok(DataType::Float32),
            "float64" => Ok(DataType::Float64),
            other => Err(GridError::Configuration(format!(
                "unknown data type \"{}\"",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DataType;
    use num_traits::FromPrimitive;

    #[test]
    fn codes() {
        assert_eq!(DataType::from_i16(2), Some(DataType::Uint8));
        assert_eq!(DataType::from_i16(16), Some(DataType::Float32));
        assert_eq!(DataType::from_i16(32), None);
        assert_eq!(DataType::Int16.size_of(), 2);
    }

    #[test]
    fn quantize_integers() {
        assert_eq!(DataType::Uint8.quantize(-1.), 0.);
        assert_eq!(DataType::Uint8.quantize(300.), 255.);
        assert_eq!(DataType::Int16.quantize(2.6), 3.);
        assert_eq!(DataType::Int16.quantize(-2.5), -3.);
        assert_eq!(DataType::Int32.quantize(f64::NAN), 0.);
        assert!(DataType::Float64.quantize(f64::NAN).is_nan());
    }

    #[test]
    fn parse_names() {
        for dt in &[DataType::Uint8, DataType::Int64, DataType::Float32] {
            assert_eq!(dt.to_string().parse::<DataType>().unwrap(), *dt);
        }
        assert!("complex64".parse::<DataType>().is_err());
    }
}
