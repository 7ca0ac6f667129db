use crate::checks::checker::Checker;
use crate::checks::types::{CheckResult, CheckResultType};
use crate::config::CheckThresholds;
use crate::core::PipguardResult;
use crate::pip::ResolvedPackage;
use crate::pypi::verify::PendingVerification;
use crate::services::DownloadStatsApi;
use async_trait::async_trait;
use std::sync::Arc;

/// Judges popularity by last month's download count from pypistats.org
pub struct PackageDownloadsChecker {
    stats: Arc<dyn DownloadStatsApi>,
    failure_threshold: u64,
    warning_threshold: u64,
}

impl PackageDownloadsChecker {
    /// Create a new downloads checker using the configured thresholds
    pub fn new(stats: Arc<dyn DownloadStatsApi>, thresholds: &CheckThresholds) -> Self {
        Self {
            stats,
            failure_threshold: thresholds.downloads_failure,
            warning_threshold: thresholds.downloads_warning,
        }
    }
}

#[async_trait]
impl Checker for PackageDownloadsChecker {
    fn description(&self) -> &'static str {
        "Checking package download stats"
    }

    fn priority(&self) -> u32 {
        20
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

        let Some(stats) = self.stats.get_download_stats(verified.name()).await else {
            return Ok(self.result(CheckResultType::Failure, "No download statistics available"));
        };

        let count = format_count(stats.last_month);
        Ok(if stats.last_month < self.failure_threshold {
            self.result(
                CheckResultType::Failure,
                format!("Only {} downloads from PyPI in the last month", count),
            )
        } else if stats.last_month < self.warning_threshold {
            self.result(
                CheckResultType::Warning,
                format!("Only {} downloads from PyPI in the last month", count),
            )
        } else {
            self.result(
                CheckResultType::Success,
                format!("{} downloads from PyPI in the last month", count),
            )
        })
    }
}

/// Format a count with `,` thousands separators
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
