//! pip integration: resolving what would be installed, and handing over to pip.

pub mod command;
pub mod report;

pub use command::PipCommand;
pub use report::{PackageOrigin, PipInstallReport, ResolvedPackage};
