use crate::checks::checker::Checker;
use crate::checks::types::{CheckResult, CheckResultType};
use crate::config::CheckThresholds;
use crate::core::PipguardResult;
use crate::pip::ResolvedPackage;
use crate::pypi::client::RegistryApi;
use crate::pypi::verify::{PendingVerification, VerifiedRelease};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Warns about brand-new projects and stale releases
pub struct PackageAgeChecker {
    registry: Arc<dyn RegistryApi>,
    new_package_days: i64,
    old_release_days: i64,
}

impl PackageAgeChecker {
    /// Create a new age checker using the configured day thresholds
    pub fn new(registry: Arc<dyn RegistryApi>, thresholds: &CheckThresholds) -> Self {
        Self {
            registry,
            new_package_days: thresholds.new_package_days,
            old_release_days: thresholds.old_release_days,
        }
    }
}

/// Upload time of the installed artifact, else of the oldest file of the release
fn release_upload_time(verified: &VerifiedRelease) -> Option<DateTime<Utc>> {
    verified
        .matched_file
        .upload_time
        .or_else(|| verified.release.urls.iter().filter_map(|f| f.upload_time).min())
}

fn days_old(days: i64) -> String {
    if days == 1 {
        "1 day old".to_string()
    } else {
        format!("{} days old", days)
    }
}

#[async_trait]
impl Checker for PackageAgeChecker {
    fn description(&self) -> &'static str {
        "Checking package age"
    }

    fn priority(&self) -> u32 {
        30
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

        let first_upload = self
            .registry
            .get_distribution_files(verified.name())
            .await
            .and_then(|distributions| distributions.earliest_upload());
        let Some(first_upload) = first_upload else {
            return Ok(self.result(CheckResultType::Failure, "No distributions information available"));
        };

        let now = Utc::now();
        let package_age = (now - first_upload).num_days();
        if package_age < self.new_package_days {
            return Ok(self.result(
                CheckResultType::Warning,
                format!("A newly published package: created only {} days ago", package_age),
            ));
        }

        let Some(released) = release_upload_time(verified) else {
            return Ok(self.result(CheckResultType::Failure, "No release upload time available"));
        };
        let release_age = (now - released).num_days();
        Ok(if release_age > self.old_release_days {
            self.result(
                CheckResultType::Warning,
                format!("The release is older than a year: {} days old", release_age),
            )
        } else {
            self.result(
                CheckResultType::Success,
                format!("The release is {}", days_old(release_age)),
            )
        })
    }
}
