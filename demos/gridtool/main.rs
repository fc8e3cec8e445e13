//! An application for regridding, cropping and padding NIfTI-1 images.
//!
//! ```text
//! gridtool <input> <operation> <output> [key=value]...
//! ```
//!
//! Options are the keys understood by `GridConfig::set_option`, such as
//! `voxel=1.25`, `interp=linear`, `uniform=3`, `axis=2 0:end` or `nan`.
//! Set `RUST_LOG=info` to see the operation's progress.

#[cfg(feature = "nifti_io")]
fn run() -> nifti_grid::Result<()> {
    use nifti_grid::{GridConfig, GridError, ImageSink, NiftiStore, TracingSink};
    use std::env;
    use std::path::PathBuf;

    let mut args = env::args().skip(1);
    let usage = || GridError::Configuration(
        "usage: gridtool <input> <regrid|crop|pad> <output> [key=value]...".to_string(),
    );
    let input = PathBuf::from(args.next().ok_or_else(usage)?);
    let operation = args.next().ok_or_else(usage)?.parse()?;
    let output = PathBuf::from(args.next().ok_or_else(usage)?);

    let mut config = GridConfig::new(operation);
    for arg in args {
        let mut parts = arg.splitn(2, '=');
        let key = parts.next().unwrap_or_default();
        config.set_option(key, parts.next())?;
    }

    let mut store = NiftiStore::new();
    let image = nifti_grid::run(&config, &store, &input, &TracingSink)?;
    store.create(&output, &image)
}

#[cfg(not(feature = "nifti_io"))]
fn run() -> nifti_grid::Result<()> {
    Err(nifti_grid::GridError::UnsupportedOperation(
        "gridtool was built without the nifti_io feature".to_string(),
    ))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = run() {
        eprintln!("gridtool: {}", e);
        std::process::exit(e.exit_code());
    }
}
