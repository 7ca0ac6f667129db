//! Clients for the external services the checks consult.

pub mod http;
pub mod osv;
pub mod pypistats;
pub mod repo;

pub use osv::{OsvClient, VulnerabilityDetails, VulnerabilityDetailsApi, VulnerabilitySeverity};
pub use pypistats::{DownloadStats, DownloadStatsApi, PypiStatsClient};
pub use repo::{RepoApi, RepoClient, RepoInfo};

use crate::config::Config;
use crate::core::PipguardResult;
use crate::pypi::{PypiClient, RegistryApi};
use std::sync::Arc;

/// The service clients of one run.
///
/// Each wraps a pooled HTTP client; dropping the last clone closes the connections.
#[derive(Clone)]
pub struct ServiceClients {
    pub registry: Arc<dyn RegistryApi>,
    pub stats: Arc<dyn DownloadStatsApi>,
    pub repos: Arc<dyn RepoApi>,
    pub vulnerabilities: Arc<dyn VulnerabilityDetailsApi>,
}

impl ServiceClients {
    pub fn from_config(config: &Config) -> PipguardResult<Self> {
        Ok(Self {
            registry: Arc::new(PypiClient::new(config)?),
            stats: Arc::new(PypiStatsClient::new(config)?),
            repos: Arc::new(RepoClient::new(config)?),
            vulnerabilities: Arc::new(OsvClient::new(config)?),
        })
    }
}
