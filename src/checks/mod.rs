//! Per-package trust checks and the executor that runs them.

pub mod checker;
pub mod executor;
pub mod license;
pub mod package_age;
pub mod package_downloads;
pub mod registry;
pub mod release_metadata;
pub mod repo_popularity;
pub mod types;
pub mod vulnerabilities;

#[cfg(test)]
pub(crate) mod test_support;

pub use checker::Checker;
pub use executor::{CheckExecutor, CheckOutcome};
pub use registry::default_checkers;
pub use types::{CheckResult, CheckResultType, PackageCheckResults};
