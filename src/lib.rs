//! pipguard: trust checks for the packages pip is about to install
//!
//! This crate resolves what `pip install` would install, runs a fixed set of checks
//! against every directly requested package, and reports the results. Error types and
//! paths come from `pipguard-core`.

pub use pipguard_core::{format_error_with_help, ErrorHelp, PipguardError, PipguardResult};

/// Core module re-exported from pipguard-core.
pub mod core {
    pub use pipguard_core::core::*;
    pub use pipguard_core::*;

    /// Path module re-exported from pipguard-core.
    pub mod path {
        pub use pipguard_core::core::path::*;
    }
}

/// Configuration management.
pub mod config;

/// pip invocation and installation reports.
pub mod pip;

/// PyPI client, models and release verification.
pub mod pypi;

/// Download statistics, repository hosts and vulnerability details.
pub mod services;

/// The checks and their executor.
pub mod checks;

/// Progress reporting while checks run.
pub mod progress;

/// Markup rendering and the check report.
pub mod report;
