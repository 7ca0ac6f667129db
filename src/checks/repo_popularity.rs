use crate::checks::checker::Checker;
use crate::checks::types::{CheckResult, CheckResultType};
use crate::config::CheckThresholds;
use crate::core::PipguardResult;
use crate::pip::ResolvedPackage;
use crate::pypi::client::RegistryApi;
use crate::pypi::verify::{PendingVerification, VerifiedRelease};
use crate::services::RepoApi;
use async_trait::async_trait;
use std::sync::Arc;

const UNVERIFIED_SUFFIX: &str = " (unverified repository link)";

/// Source repository a release claims to come from
struct RepoLink {
    url: String,
    /// Backed by a publisher attestation rather than a free-form project URL
    verified: bool,
}

/// Looks up the source repository and judges it by star count
pub struct RepoPopularityChecker {
    registry: Arc<dyn RegistryApi>,
    repos: Arc<dyn RepoApi>,
    bold_warning_threshold: u64,
    warning_threshold: u64,
}

impl RepoPopularityChecker {
    /// Create a new popularity checker using the configured star thresholds
    pub fn new(registry: Arc<dyn RegistryApi>, repos: Arc<dyn RepoApi>, thresholds: &CheckThresholds) -> Self {
        Self {
            registry,
            repos,
            bold_warning_threshold: thresholds.stars_bold_warning,
            warning_threshold: thresholds.stars_warning,
        }
    }

    async fn repo_link(&self, verified: &VerifiedRelease) -> Option<RepoLink> {
        let attested = self
            .registry
            .get_attestations(verified.name(), verified.version(), verified.matched_filename())
            .await
            .and_then(|attestation| attestation.repository_url());
        if let Some(url) = attested {
            return Some(RepoLink { url, verified: true });
        }

        verified
            .release
            .info
            .recognized_repo_url()
            .map(|url| RepoLink { url, verified: false })
    }
}

#[async_trait]
impl Checker for RepoPopularityChecker {
    fn description(&self) -> &'static str {
        "Checking repository popularity"
    }

    fn priority(&self) -> u32 {
        10
    }

    async fn check(
        &self,
        _package: &ResolvedPackage,
        verification: PendingVerification,
    ) -> PipguardResult<CheckResult> {
        let verification = verification.await;
        let Some(verified) = verification.verified() else {
            return Ok(self.no_release_info());
        };

        let Some(link) = self.repo_link(verified).await else {
            return Ok(self.result(CheckResultType::Warning, "No repository URL found"));
        };
        let suffix = if link.verified { "" } else { UNVERIFIED_SUFFIX };

        let Some(repo) = self.repos.get_repo_info(&link.url).await else {
            return Ok(self.result(
                CheckResultType::Failure,
                format!("Declared repository not found: {}{}", link.url, suffix),
            ));
        };

        let stars = repo.star_count;
        Ok(if stars < self.bold_warning_threshold {
            self.result(
                CheckResultType::Warning,
                format!(
                    "[bold][link={}]Repository[/link] has less than {} stars: {}{}",
                    link.url, self.bold_warning_threshold, stars, suffix
                ),
            )
        } else if stars < self.warning_threshold {
            self.result(
                CheckResultType::Warning,
                format!(
                    "[link={}]Repository[/link] has less than {} stars: {}{}",
                    link.url, self.warning_threshold, stars, suffix
                ),
            )
        } else {
            self.result(
                CheckResultType::Success,
                format!("[link={}]Repository[/link] has {} stars{}", link.url, stars, suffix),
            )
        })
    }
}
