//! Fakes and fixtures shared by the checker and executor unit tests

use crate::pip::ResolvedPackage;
use crate::pypi::client::RegistryApi;
use crate::pypi::models::{
    Distribution, DistributionsResponse, ProjectInfo, PublisherAttestation, PypiVulnerability,
    ReleaseFile, ReleaseResponse,
};
use crate::pypi::verify::{ready_verification, PendingVerification, ReleaseVerification, VerifiedRelease};
use crate::services::{DownloadStats, DownloadStatsApi, RepoApi, RepoInfo, VulnerabilityDetails, VulnerabilityDetailsApi};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const PACKAGE_NAME: &str = "package";
pub const PACKAGE_VERSION: &str = "1.0.0";
pub const PACKAGE_HASH: &str = "0f0e0d0c0b0a09080706050403020100f0e0d0c0b0a09080706050403020100";

pub fn package() -> ResolvedPackage {
    ResolvedPackage::new(PACKAGE_NAME, PACKAGE_VERSION).with_hash("sha256", PACKAGE_HASH)
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(days)
}

pub fn release_file(filename: &str, upload_time: Option<DateTime<Utc>>) -> ReleaseFile {
    ReleaseFile {
        filename: filename.to_string(),
        digests: BTreeMap::from([("sha256".to_string(), PACKAGE_HASH.to_string())]),
        upload_time,
        yanked: false,
    }
}

pub fn distribution(filename: &str, upload_time: DateTime<Utc>) -> Distribution {
    Distribution {
        filename: filename.to_string(),
        hashes: BTreeMap::new(),
        upload_time: Some(upload_time),
        yanked: false,
    }
}

pub fn release(mut info: ProjectInfo, urls: Vec<ReleaseFile>, vulnerabilities: Vec<PypiVulnerability>) -> ReleaseResponse {
    if info.name.is_empty() {
        info.name = PACKAGE_NAME.to_string();
    }
    if info.version.is_empty() {
        info.version = PACKAGE_VERSION.to_string();
    }
    ReleaseResponse {
        info,
        urls,
        vulnerabilities,
    }
}

/// A verification that already matched the first of `urls` (or a placeholder sdist)
pub fn verified(info: ProjectInfo, urls: Vec<ReleaseFile>, vulnerabilities: Vec<PypiVulnerability>) -> PendingVerification {
    let matched_file = urls
        .first()
        .cloned()
        .unwrap_or_else(|| release_file("package-1.0.0.tar.gz", None));
    ready_verification(ReleaseVerification::Verified(VerifiedRelease {
        release: release(info, urls, vulnerabilities),
        matched_file,
    }))
}

pub fn unverifiable() -> PendingVerification {
    ready_verification(ReleaseVerification::Unverifiable)
}

#[derive(Default)]
pub struct FakeRegistry {
    pub release: Option<ReleaseResponse>,
    pub distributions: Option<DistributionsResponse>,
    pub attestation: Option<PublisherAttestation>,
    pub release_calls: AtomicUsize,
}

impl FakeRegistry {
    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistryApi for FakeRegistry {
    async fn get_release(&self, _name: &str, _version: &str) -> Option<ReleaseResponse> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        self.release.clone()
    }

    async fn get_distribution_files(&self, _name: &str) -> Option<DistributionsResponse> {
        self.distributions.clone()
    }

    async fn get_attestations(&self, _: &str, _: &str, _: &str) -> Option<PublisherAttestation> {
        self.attestation.clone()
    }
}

pub struct FakeStats(pub Option<DownloadStats>);

#[async_trait]
impl DownloadStatsApi for FakeStats {
    async fn get_download_stats(&self, _name: &str) -> Option<DownloadStats> {
        self.0
    }
}

/// Star counts by repository URL; unknown URLs do not exist
#[derive(Default)]
pub struct FakeRepos {
    pub stars: HashMap<String, u64>,
}

impl FakeRepos {
    pub fn with_stars(url: &str, stars: u64) -> Self {
        Self {
            stars: HashMap::from([(url.to_string(), stars)]),
        }
    }
}

#[async_trait]
impl RepoApi for FakeRepos {
    async fn get_repo_info(&self, url: &str) -> Option<RepoInfo> {
        self.stars.get(url).map(|&star_count| RepoInfo { star_count })
    }
}

/// Vulnerability details by id; unknown ids have no details
#[derive(Default)]
pub struct FakeVulnerabilityDetails(pub HashMap<String, VulnerabilityDetails>);

impl FakeVulnerabilityDetails {
    pub fn with(details: Vec<VulnerabilityDetails>) -> Self {
        Self(details.into_iter().map(|d| (d.id.clone(), d)).collect())
    }
}

#[async_trait]
impl VulnerabilityDetailsApi for FakeVulnerabilityDetails {
    async fn get_details(&self, vulnerability_id: &str) -> Option<VulnerabilityDetails> {
        self.0.get(vulnerability_id).cloned()
    }
}
