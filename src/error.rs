//! Types for error handling go here.
use std::io::Error as IOError;
use std::path::PathBuf;

quick_error! {
    /// Error type for all error variants originated by this crate.
    #[derive(Debug)]
    pub enum GridError {
        /// Conflicting, missing or malformed operation parameters.
        Configuration(msg: String) {
            display("{}", msg)
        }
        /// The crop mask does not contain a single set voxel.
        EmptyMask {
            display("mask image is empty; can't use it to crop image")
        }
        /// The requested combination of operation and parameters is not supported.
        UnsupportedOperation(msg: String) {
            display("{}", msg)
        }
        /// An auxiliary image does not share the required axis extents.
        DimensionMismatch(what: &'static str, expected: Vec<usize>, got: Vec<usize>) {
            display("{} dimensions {:?} do not match the input image {:?}", what, got, expected)
        }
        /// A grid descriptor is incomplete or internally inconsistent.
        InvalidGrid(msg: String) {
            display("Invalid grid: {}", msg)
        }
        /// Inconsistent or invalid shape.
        InconsistentDim(rank: usize) {
            display("Invalid rank {} (expected 1 to 7 dimensions)", rank)
        }
        /// Attempted to read volume outside boundaries.
        OutOfBounds(coords: Vec<usize>) {
            display("Out of bounds access to volume: {:?}", &coords[..])
        }
        /// No image is registered under the given path.
        MissingImage(path: PathBuf) {
            display("No such image: {}", path.display())
        }
        /// Error reported by an image format adapter.
        Format(msg: String) {
            display("Image format error: {}", msg)
        }
        /// I/O Error
        Io(err: IOError) {
            from()
            source(err)
        }
    }
}

impl GridError {
    /// The process exit status a front end should report for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            GridError::Configuration(_) => 2,
            GridError::EmptyMask => 3,
            GridError::UnsupportedOperation(_) => 4,
            GridError::DimensionMismatch(..) => 5,
            _ => 1,
        }
    }
}

/// Alias type for results originated from this crate.
pub type Result<T> = ::std::result::Result<T, GridError>;
