use crate::checks::types::{CheckResult, CheckResultType};
use crate::core::PipguardResult;
use crate::pip::ResolvedPackage;
use crate::pypi::verify::PendingVerification;
use async_trait::async_trait;

/// One independent trust rule evaluated per package.
///
/// Missing data is a result, not an error: implementations report it as a failure with an
/// explanatory message. `Err` is reserved for the check itself breaking; the executor turns
/// it into an [`CheckResultType::Error`] result.
#[async_trait]
pub trait Checker: Send + Sync {
    /// Progress label
    fn description(&self) -> &'static str;

    /// Display order among a package's results, lower first
    fn priority(&self) -> u32;

    async fn check(
        &self,
        package: &ResolvedPackage,
        verification: PendingVerification,
    ) -> PipguardResult<CheckResult>;

    fn result(&self, result_type: CheckResultType, message: impl Into<String>) -> CheckResult
    where
        Self: Sized,
    {
        CheckResult::new(result_type, message, self.priority())
    }

    /// Result for a package whose registry metadata could not be verified
    fn no_release_info(&self) -> CheckResult
    where
        Self: Sized,
    {
        self.result(CheckResultType::Failure, "No release information available")
    }
}
