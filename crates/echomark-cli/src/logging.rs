//! Shared logger setup for the command-line binaries.

use log::LevelFilter;

/// Map the --verbose flag to a log level. Both binaries log at Info
/// when verbose and stay silent otherwise.
pub fn verbosity_filter(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Off
    }
}

/// Initialize the process-wide logger from the --verbose flag.
pub fn init(verbose: bool) {
    env_logger::Builder::from_default_env()
        .filter_level(verbosity_filter(verbose))
        .init();
}
