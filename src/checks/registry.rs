use crate::checks::checker::Checker;
use crate::checks::license::LicenseChecker;
use crate::checks::package_age::PackageAgeChecker;
use crate::checks::package_downloads::PackageDownloadsChecker;
use crate::checks::release_metadata::ReleaseMetadataChecker;
use crate::checks::repo_popularity::RepoPopularityChecker;
use crate::checks::vulnerabilities::VulnerabilitiesChecker;
use crate::config::CheckThresholds;
use crate::services::ServiceClients;
use std::sync::Arc;

/// The checkers run for every package, in reporting order
pub fn default_checkers(clients: &ServiceClients, thresholds: &CheckThresholds) -> Vec<Arc<dyn Checker>> {
    vec![
        Arc::new(RepoPopularityChecker::new(
            Arc::clone(&clients.registry),
            Arc::clone(&clients.repos),
            thresholds,
        )),
        Arc::new(PackageDownloadsChecker::new(Arc::clone(&clients.stats), thresholds)),
        Arc::new(PackageAgeChecker::new(Arc::clone(&clients.registry), thresholds)),
        Arc::new(VulnerabilitiesChecker::new(Arc::clone(&clients.vulnerabilities), thresholds)),
        Arc::new(ReleaseMetadataChecker),
        Arc::new(LicenseChecker),
    ]
}
