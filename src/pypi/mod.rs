//! PyPI: metadata models, the registry client, and release verification.

pub mod client;
pub mod models;
pub mod verify;

pub use client::{PypiClient, RegistryApi};
pub use models::{
    Distribution, DistributionsResponse, ProjectInfo, PublisherAttestation, ReleaseFile,
    ReleaseResponse, PypiVulnerability,
};
pub use verify::{verify_release, ReleaseVerification, VerifiedRelease};
