use crate::core::{PipguardError, PipguardResult};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Where the artifact pip would install comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOrigin {
    /// An archive downloaded from a package index
    Registry { url: String },
    /// An archive or local directory given by URL
    DirectUrl { url: String, editable: bool },
    /// A version-control checkout
    Vcs {
        url: String,
        vcs: String,
        commit_id: Option<String>,
    },
}

/// One package pip would install, as resolved by pip itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub name: String,
    pub version: String,
    /// Declared digests of the artifact, keyed by algorithm (e.g. "sha256")
    pub hashes: BTreeMap<String, String>,
    /// Directly requested by the user rather than pulled in as a dependency
    pub requested: bool,
    pub origin: PackageOrigin,
}

impl ResolvedPackage {
    /// Create a new directly requested package from the index with no known digests
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            hashes: BTreeMap::new(),
            requested: true,
            origin: PackageOrigin::Registry { url: String::new() },
        }
    }

    pub fn with_hash(mut self, algorithm: &str, digest: &str) -> Self {
        self.hashes
            .insert(algorithm.to_lowercase(), digest.to_lowercase());
        self
    }

    pub fn transitive(mut self) -> Self {
        self.requested = false;
        self
    }

    /// `name==version`, the identifier shown to the user
    pub fn pinned_requirement(&self) -> String {
        format!("{}=={}", self.name, self.version)
    }
}

// See https://pip.pypa.io/en/stable/reference/installation-report/

#[derive(Debug, Deserialize)]
pub struct PipInstallReport {
    pub version: String,
    #[serde(default)]
    pub install: Vec<InstallationReportItem>,
}

#[derive(Debug, Deserialize)]
pub struct InstallationReportItem {
    pub metadata: ItemMetadata,
    pub download_info: DownloadInfo,
    #[serde(default)]
    pub requested: bool,
}

#[derive(Debug, Deserialize)]
pub struct ItemMetadata {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadInfo {
    pub url: String,
    pub archive_info: Option<ArchiveInfo>,
    pub vcs_info: Option<VcsInfo>,
    pub dir_info: Option<DirInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ArchiveInfo {
    /// Legacy single hash, `<algorithm>=<digest>`
    pub hash: Option<String>,
    pub hashes: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
pub struct VcsInfo {
    pub vcs: String,
    pub commit_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DirInfo {
    #[serde(default)]
    pub editable: bool,
}

impl PipInstallReport {
    /// Parse the JSON written by `pip install --report`
    pub fn parse(json: &str) -> PipguardResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            PipguardError::Resolution(format!("Failed to parse pip installation report: {}", e))
        })
    }

    pub fn into_resolved_packages(self) -> Vec<ResolvedPackage> {
        self.install.into_iter().map(ResolvedPackage::from).collect()
    }
}

impl From<InstallationReportItem> for ResolvedPackage {
    fn from(item: InstallationReportItem) -> Self {
        let DownloadInfo {
            url,
            archive_info,
            vcs_info,
            dir_info,
        } = item.download_info;

        let mut hashes = BTreeMap::new();
        if let Some(archive) = &archive_info {
            if let Some((algorithm, digest)) = archive.hash.as_deref().and_then(|h| h.split_once('=')) {
                hashes.insert(algorithm.to_lowercase(), digest.to_lowercase());
            }
            for (algorithm, digest) in archive.hashes.iter().flatten() {
                hashes.insert(algorithm.to_lowercase(), digest.to_lowercase());
            }
        }

        let origin = if let Some(vcs) = vcs_info {
            PackageOrigin::Vcs {
                url,
                vcs: vcs.vcs,
                commit_id: vcs.commit_id,
            }
        } else if let Some(dir) = dir_info {
            PackageOrigin::DirectUrl {
                url,
                editable: dir.editable,
            }
        } else if archive_info.is_some() && !url.starts_with("file:") {
            PackageOrigin::Registry { url }
        } else {
            PackageOrigin::DirectUrl {
                url,
                editable: false,
            }
        };

        ResolvedPackage {
            name: item.metadata.name,
            version: item.metadata.version,
            hashes,
            requested: item.requested,
            origin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"{
        "version": "1",
        "pip_version": "24.0",
        "install": [
            {
                "download_info": {
                    "url": "https://files.pythonhosted.org/packages/requests-2.31.0-py3-none-any.whl",
                    "archive_info": {
                        "hash": "sha256=58CD2187C01E70E6E26505BCA751777AA9F2EE0B7F4300988B709F44E013003F",
                        "hashes": {"sha256": "58cd2187c01e70e6e26505bca751777aa9f2ee0b7f4300988b709f44e013003f"}
                    }
                },
                "is_direct": false,
                "is_yanked": false,
                "requested": true,
                "metadata": {"name": "requests", "version": "2.31.0", "license": "Apache 2.0"}
            },
            {
                "download_info": {
                    "url": "https://files.pythonhosted.org/packages/idna-3.6-py3-none-any.whl",
                    "archive_info": {"hash": "sha256=c05567e9c24a6b9faaa835c4821bad0590fbb9d5779e7caa6e1cc4978e7eb24f"}
                },
                "requested": false,
                "metadata": {"name": "idna", "version": "3.6"}
            },
            {
                "download_info": {
                    "url": "https://github.com/user/project.git",
                    "vcs_info": {"vcs": "git", "commit_id": "0123abcd", "requested_revision": "main"}
                },
                "requested": true,
                "metadata": {"name": "project", "version": "0.1.0"}
            },
            {
                "download_info": {"url": "file:///home/user/src/local", "dir_info": {"editable": true}},
                "requested": true,
                "metadata": {"name": "local", "version": "1.0"}
            }
        ]
    }"#;

    #[test]
    fn test_parse_report() {
        let packages = PipInstallReport::parse(REPORT).unwrap().into_resolved_packages();
        assert_eq!(packages.len(), 4);

        let requests = &packages[0];
        assert_eq!(requests.pinned_requirement(), "requests==2.31.0");
        assert!(requests.requested);
        assert_eq!(requests.hashes.len(), 1);
        assert_eq!(
            requests.hashes["sha256"],
            "58cd2187c01e70e6e26505bca751777aa9f2ee0b7f4300988b709f44e013003f"
        );
        assert!(matches!(requests.origin, PackageOrigin::Registry { .. }));

        assert!(!packages[1].requested);
        assert!(packages[1].hashes.contains_key("sha256"));
    }

    #[test]
    fn test_parse_vcs_and_dir_origins() {
        let packages = PipInstallReport::parse(REPORT).unwrap().into_resolved_packages();

        match &packages[2].origin {
            PackageOrigin::Vcs { vcs, commit_id, .. } => {
                assert_eq!(vcs, "git");
                assert_eq!(commit_id.as_deref(), Some("0123abcd"));
            }
            other => panic!("unexpected origin {:?}", other),
        }
        assert!(packages[2].hashes.is_empty());

        assert_eq!(
            packages[3].origin,
            PackageOrigin::DirectUrl {
                url: "file:///home/user/src/local".to_string(),
                editable: true
            }
        );
    }

    #[test]
    fn test_parse_invalid_report() {
        let err = PipInstallReport::parse("not json").unwrap_err();
        assert!(matches!(err, PipguardError::Resolution(_)));
    }
}
