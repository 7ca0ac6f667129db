use crate::checks::checker::Checker;
use crate::checks::types::{CheckResult, CheckResultType};
use crate::core::PipguardResult;
use crate::pip::ResolvedPackage;
use crate::pypi::models::ProjectInfo;
use crate::pypi::verify::PendingVerification;
use crate::report::escape_markup;
use async_trait::async_trait;

// See https://pypi.org/classifiers/
const WARNING_CLASSIFIERS: &[&str] = &[
    "Development Status :: 1 - Planning",
    "Development Status :: 2 - Pre-Alpha",
    "Development Status :: 3 - Alpha",
    "Development Status :: 4 - Beta",
    "Development Status :: 7 - Inactive",
];
const SUCCESS_CLASSIFIERS: &[&str] = &[
    "Development Status :: 5 - Production/Stable",
    "Development Status :: 6 - Mature",
];

/// Flags yanked releases and reports the declared development status
pub struct ReleaseMetadataChecker;

fn first_matching_classifier(info: &ProjectInfo, candidates: &[&'static str]) -> Option<&'static str> {
    candidates
        .iter()
        .copied()
        .find(|candidate| info.classifiers.iter().any(|c| c == candidate))
}

#[async_trait]
impl Checker for ReleaseMetadataChecker {
    fn description(&self) -> &'static str {
        "Checking release metadata"
    }

    fn priority(&self) -> u32 {
        50
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
        let info = &verified.release.info;

        if info.yanked {
            let reason = info
                .yanked_reason
                .as_deref()
                .filter(|r| !r.is_empty())
                .map(|r| format!(" (reason: {})", escape_markup(r)))
                .unwrap_or_default();
            return Ok(self.result(
                CheckResultType::Failure,
                format!("The release is yanked{}", reason),
            ));
        }
        if let Some(classifier) = first_matching_classifier(info, WARNING_CLASSIFIERS) {
            return Ok(self.result(
                CheckResultType::Warning,
                format!("Package is classified as {}", classifier),
            ));
        }
        if let Some(classifier) = first_matching_classifier(info, SUCCESS_CLASSIFIERS) {
            return Ok(self.result(
                CheckResultType::Success,
                format!("Package is classified as {}", classifier),
            ));
        }
        Ok(self.result(CheckResultType::Neutral, "No development status classifiers"))
    }
}
