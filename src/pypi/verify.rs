use crate::pip::ResolvedPackage;
use crate::pypi::client::RegistryApi;
use crate::pypi::models::{ReleaseFile, ReleaseResponse};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::Arc;

/// Registry metadata confirmed to describe the artifact pip will install
#[derive(Debug, Clone)]
pub struct VerifiedRelease {
    pub release: ReleaseResponse,
    /// The published file whose digest matched the artifact's declared hash
    pub matched_file: ReleaseFile,
}

impl VerifiedRelease {
    /// Canonical project name as reported by the registry
    pub fn name(&self) -> &str {
        &self.release.info.name
    }

    pub fn version(&self) -> &str {
        &self.release.info.version
    }

    pub fn matched_filename(&self) -> &str {
        &self.matched_file.filename
    }
}

/// Outcome of matching a resolved package against the registry
#[derive(Debug, Clone)]
pub enum ReleaseVerification {
    Verified(VerifiedRelease),
    /// No published file matched, or the registry data could not be retrieved
    Unverifiable,
}

impl ReleaseVerification {
    pub fn verified(&self) -> Option<&VerifiedRelease> {
        match self {
            ReleaseVerification::Verified(release) => Some(release),
            ReleaseVerification::Unverifiable => None,
        }
    }
}

/// Verification result that may still be in flight.
///
/// Computed once per package and awaited by every checker of that package; cloning
/// does not restart the lookup.
pub type PendingVerification = Shared<BoxFuture<'static, Arc<ReleaseVerification>>>;

/// An already-known verification result in pending form
pub fn ready_verification(verification: ReleaseVerification) -> PendingVerification {
    futures::future::ready(Arc::new(verification)).boxed().shared()
}

/// Confirm that the registry's release record describes the artifact pip will install.
///
/// The release metadata is trusted only if one of the release's published files has a
/// digest equal to one of the declared hashes under the same algorithm. A VCS checkout,
/// a local path or a tampered archive therefore stays unverifiable even when a release
/// with the same name and version exists.
pub async fn verify_release(registry: &dyn RegistryApi, package: &ResolvedPackage) -> ReleaseVerification {
    if package.hashes.is_empty() {
        tracing::debug!("{} declares no hashes; cannot verify", package.pinned_requirement());
        return ReleaseVerification::Unverifiable;
    }

    let Some(release) = registry.get_release(&package.name, &package.version).await else {
        tracing::debug!("No release record for {}", package.pinned_requirement());
        return ReleaseVerification::Unverifiable;
    };

    let matched = release
        .urls
        .iter()
        .find(|file| file_matches(file, package))
        .cloned();

    match matched {
        Some(matched_file) => {
            tracing::debug!(
                "{} verified against {}",
                package.pinned_requirement(),
                matched_file.filename
            );
            ReleaseVerification::Verified(VerifiedRelease {
                release,
                matched_file,
            })
        }
        None => {
            tracing::debug!(
                "No published file of {} matches the declared hashes",
                package.pinned_requirement()
            );
            ReleaseVerification::Unverifiable
        }
    }
}

fn file_matches(file: &ReleaseFile, package: &ResolvedPackage) -> bool {
    package.hashes.iter().any(|(algorithm, declared)| {
        file.digests
            .iter()
            .any(|(alg, digest)| alg.eq_ignore_ascii_case(algorithm) && digest.eq_ignore_ascii_case(declared))
    })
}
