use crate::checks::checker::Checker;
use crate::checks::types::{CheckResult, CheckResultType};
use crate::core::PipguardResult;
use crate::pip::ResolvedPackage;
use crate::pypi::verify::PendingVerification;
use crate::report::escape_markup;
use async_trait::async_trait;

// See https://pypi.org/classifiers/

/// Reports the declared license, preferring a license classifier over the free-form field
pub struct LicenseChecker;

#[async_trait]
impl Checker for LicenseChecker {
    fn description(&self) -> &'static str {
        "Checking package license"
    }

    fn priority(&self) -> u32 {
        60
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

        Ok(match verified.release.info.license_name() {
            Some(license) => self.result(
                CheckResultType::Neutral,
                format!("Package is licensed under {}", escape_markup(&license)),
            ),
            None => self.result(
                CheckResultType::Warning,
                "No license found in PyPI metadata - you may need to check manually",
            ),
        })
    }
}
