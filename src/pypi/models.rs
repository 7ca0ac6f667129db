use crate::services::repo::recognized_repo_url;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

// See https://docs.pypi.org/api/json/#get-a-release

/// Release record returned by `/pypi/<name>/<version>/json`
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseResponse {
    pub info: ProjectInfo,
    #[serde(default, deserialize_with = "null_as_default")]
    pub urls: Vec<ReleaseFile>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vulnerabilities: Vec<PypiVulnerability>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    pub version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub classifiers: Vec<String>,
    pub license: Option<String>,
    pub home_page: Option<String>,
    pub package_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub project_urls: BTreeMap<String, String>,
    #[serde(default)]
    pub yanked: bool,
    pub yanked_reason: Option<String>,
}

/// Project URL labels that may point at the source repository, most specific first
const REPO_URL_LABELS: &[&str] = &[
    "repository",
    "source",
    "homepage",
    "documentation",
    "issues",
    "bug reports",
];

impl ProjectInfo {
    /// Look up a project URL by label, ignoring case
    pub fn project_url(&self, label: &str) -> Option<&str> {
        self.project_urls
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(label))
            .map(|(_, url)| url.as_str())
    }

    /// First GitHub/GitLab repository URL among the declared project URLs
    pub fn recognized_repo_url(&self) -> Option<String> {
        REPO_URL_LABELS
            .iter()
            .filter_map(|label| self.project_url(label))
            .find_map(recognized_repo_url)
    }

    /// License name from the first `License :: ` classifier, else the license field
    pub fn license_name(&self) -> Option<String> {
        self.classifiers
            .iter()
            .find(|c| c.starts_with("License :: "))
            .and_then(|c| c.rsplit(" :: ").next())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.license
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
    }
}

/// One distribution file of a release
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseFile {
    pub filename: String,
    #[serde(default)]
    pub digests: BTreeMap<String, String>,
    #[serde(rename = "upload_time_iso_8601")]
    pub upload_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub yanked: bool,
}

/// Vulnerability as embedded in the PyPI release record
#[derive(Debug, Clone, Deserialize)]
pub struct PypiVulnerability {
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub aliases: Vec<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
    pub withdrawn: Option<DateTime<Utc>>,
    pub fixed_in: Option<Vec<String>>,
}

impl PypiVulnerability {
    pub fn new(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            aliases: Vec::new(),
            link: None,
            summary: None,
            withdrawn: None,
            fixed_in: None,
        }
    }

    /// Identifier to display and look up: the id, else the first alias
    pub fn identifier(&self) -> Option<&str> {
        self.id.as_deref().or_else(|| self.aliases.first().map(String::as_str))
    }
}

// See https://docs.pypi.org/api/index-api/#get-distributions-for-project

/// All files of all releases of a project, from the Simple JSON API
#[derive(Debug, Clone, Deserialize)]
pub struct DistributionsResponse {
    #[serde(default)]
    pub files: Vec<Distribution>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Distribution {
    pub filename: String,
    #[serde(default)]
    pub hashes: BTreeMap<String, String>,
    #[serde(rename = "upload-time")]
    pub upload_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "yanked_flag")]
    pub yanked: bool,
}

impl DistributionsResponse {
    /// Upload time of the oldest file of the project
    pub fn earliest_upload(&self) -> Option<DateTime<Utc>> {
        self.files.iter().filter_map(|f| f.upload_time).min()
    }
}

// See https://docs.pypi.org/api/integrity/

/// Trusted publisher recorded in the provenance of a distribution file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublisherAttestation {
    pub kind: String,
    pub repository: String,
}

impl PublisherAttestation {
    /// Web URL of the repository the file was built from, for publishers we recognise
    pub fn repository_url(&self) -> Option<String> {
        let host = match self.kind.to_lowercase().as_str() {
            "github" => "github.com",
            "gitlab" => "gitlab.com",
            _ => return None,
        };
        recognized_repo_url(&format!("https://{}/{}", host, self.repository.trim_matches('/')))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProvenanceResponse {
    #[serde(default)]
    pub attestation_bundles: Vec<AttestationBundle>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttestationBundle {
    pub publisher: PublisherAttestation,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `yanked` in the Simple API is either a boolean or the yank reason
fn yanked_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Yanked {
        Flag(bool),
        Reason(String),
    }

    Ok(match Option::<Yanked>::deserialize(deserializer)? {
        Some(Yanked::Flag(flag)) => flag,
        Some(Yanked::Reason(_)) => true,
        None => false,
    })
}
