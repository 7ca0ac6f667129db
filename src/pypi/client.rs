use crate::config::Config;
use crate::core::PipguardResult;
use crate::pypi::models::{DistributionsResponse, ProvenanceResponse, PublisherAttestation, ReleaseResponse};
use crate::services::http::{build_client, get_json};
use async_trait::async_trait;
use reqwest::Client;

/// Package index lookups. Every method returns `None` when the data is unavailable.
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// Metadata of one release of a project
    async fn get_release(&self, name: &str, version: &str) -> Option<ReleaseResponse>;

    /// All distribution files of all releases of a project
    async fn get_distribution_files(&self, name: &str) -> Option<DistributionsResponse>;

    /// Trusted-publisher attestation of one distribution file
    async fn get_attestations(
        &self,
        name: &str,
        version: &str,
        filename: &str,
    ) -> Option<PublisherAttestation>;
}

/// Client for the PyPI JSON, Simple and integrity APIs
pub struct PypiClient {
    client: Client,
    base_url: String,
}

impl PypiClient {
    /// Create a new PyPI client from the configured base URL and timeouts
    pub fn new(config: &Config) -> PipguardResult<Self> {
        Ok(Self {
            client: build_client(config)?,
            base_url: config.pypi_url.trim_end_matches('/').to_string(),
        })
    }

    fn release_url(&self, name: &str, version: &str) -> String {
        format!(
            "{}/pypi/{}/{}/json",
            self.base_url,
            urlencoding::encode(name),
            urlencoding::encode(version)
        )
    }

    fn simple_url(&self, name: &str) -> String {
        format!("{}/simple/{}/", self.base_url, urlencoding::encode(name))
    }

    fn provenance_url(&self, name: &str, version: &str, filename: &str) -> String {
        format!(
            "{}/integrity/{}/{}/{}/provenance",
            self.base_url,
            urlencoding::encode(name),
            urlencoding::encode(version),
            urlencoding::encode(filename)
        )
    }
}

#[async_trait]
impl RegistryApi for PypiClient {
    async fn get_release(&self, name: &str, version: &str) -> Option<ReleaseResponse> {
        get_json(&self.client, &self.release_url(name, version), &[]).await
    }

    async fn get_distribution_files(&self, name: &str) -> Option<DistributionsResponse> {
        get_json(
            &self.client,
            &self.simple_url(name),
            &[("Accept", "application/vnd.pypi.simple.v1+json")],
        )
        .await
    }

    async fn get_attestations(
        &self,
        name: &str,
        version: &str,
        filename: &str,
    ) -> Option<PublisherAttestation> {
        let provenance: ProvenanceResponse = get_json(
            &self.client,
            &self.provenance_url(name, version, filename),
            &[("Accept", "application/vnd.pypi.integrity.v1+json")],
        )
        .await?;

        provenance
            .attestation_bundles
            .into_iter()
            .map(|bundle| bundle.publisher)
            .next()
    }
}
