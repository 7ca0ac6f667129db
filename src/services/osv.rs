use crate::config::Config;
use crate::core::PipguardResult;
use crate::services::http::{build_client, get_json};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;

/// Severity tier of a known vulnerability
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VulnerabilitySeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl VulnerabilitySeverity {
    /// Parse a severity word as used by advisory databases
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "CRITICAL" => Some(Self::Critical),
            "HIGH" => Some(Self::High),
            "MEDIUM" | "MODERATE" => Some(Self::Medium),
            "LOW" => Some(Self::Low),
            _ => None,
        }
    }

    /// Map a numeric CVSS base score to a tier
    pub fn from_cvss_score(score: f64) -> Self {
        if score >= 9.0 {
            Self::Critical
        } else if score >= 7.0 {
            Self::High
        } else if score >= 4.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    /// Markup colour used when listing vulnerabilities of this tier
    pub fn color(&self) -> &'static str {
        match self {
            Self::Critical | Self::High => "red",
            Self::Medium => "yellow",
            Self::Low => "default",
        }
    }
}

impl fmt::Display for VulnerabilitySeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What we know about one vulnerability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VulnerabilityDetails {
    pub id: String,
    pub severity: Option<VulnerabilitySeverity>,
    pub link: Option<String>,
}

#[async_trait]
pub trait VulnerabilityDetailsApi: Send + Sync {
    /// Severity and reference link for a vulnerability id, or `None` if unavailable
    async fn get_details(&self, vulnerability_id: &str) -> Option<VulnerabilityDetails>;
}

#[derive(Deserialize)]
struct OsvVulnerability {
    id: String,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    severity: Vec<OsvSeverity>,
    database_specific: Option<OsvDatabaseSpecific>,
}

#[derive(Deserialize)]
struct OsvSeverity {
    #[serde(rename = "type")]
    severity_type: String,
    score: String,
}

#[derive(Deserialize)]
struct OsvDatabaseSpecific {
    severity: Option<String>,
}

impl OsvVulnerability {
    fn severity(&self) -> Option<VulnerabilitySeverity> {
        let from_database = self
            .database_specific
            .as_ref()
            .and_then(|db| db.severity.as_deref())
            .and_then(VulnerabilitySeverity::parse);

        // CVSS v3 entries first, in record order otherwise
        let mut entries: Vec<&OsvSeverity> = self.severity.iter().collect();
        entries.sort_by_key(|s| !s.severity_type.starts_with("CVSS_V3"));

        from_database.or_else(|| {
            entries
                .into_iter()
                .find_map(|s| base_score(&s.score))
                .map(VulnerabilitySeverity::from_cvss_score)
        })
    }
}

/// Base score of a bare number or a CVSS v3 vector such as `CVSS:3.1/AV:N/AC:L/...`
fn base_score(score: &str) -> Option<f64> {
    let score = score.trim();
    score.parse::<f64>().ok().or_else(|| {
        score
            .parse::<cvss::v3::Base>()
            .ok()
            .map(|base| base.score().value())
    })
}

/// Client for the OSV (Open Source Vulnerabilities) API
pub struct OsvClient {
    client: Client,
    base_url: String,
}

impl OsvClient {
    /// Create a new OSV client from the configured base URL and timeouts
    pub fn new(config: &Config) -> PipguardResult<Self> {
        Ok(Self {
            client: build_client(config)?,
            base_url: config.osv_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch(&self, id: &str) -> Option<OsvVulnerability> {
        let url = format!("{}/v1/vulns/{}", self.base_url, urlencoding::encode(id));
        get_json(&self.client, &url, &[]).await
    }

    fn web_link(id: &str) -> String {
        format!("https://osv.dev/vulnerability/{}", id)
    }
}

#[async_trait]
impl VulnerabilityDetailsApi for OsvClient {
    async fn get_details(&self, vulnerability_id: &str) -> Option<VulnerabilityDetails> {
        let vuln = self.fetch(vulnerability_id).await?;
        let mut severity = vuln.severity();

        // PYSEC records usually carry no severity; their GHSA aliases do
        if severity.is_none() {
            for alias in vuln.aliases.iter().filter(|a| a.starts_with("GHSA-")) {
                if let Some(found) = self.fetch(alias).await.and_then(|v| v.severity()) {
                    severity = Some(found);
                    break;
                }
            }
        }

        Some(VulnerabilityDetails {
            link: Some(Self::web_link(&vuln.id)),
            id: vuln.id,
            severity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(VulnerabilitySeverity::Critical > VulnerabilitySeverity::High);
        assert!(VulnerabilitySeverity::High > VulnerabilitySeverity::Medium);
        assert!(VulnerabilitySeverity::Medium > VulnerabilitySeverity::Low);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!(VulnerabilitySeverity::parse("MODERATE"), Some(VulnerabilitySeverity::Medium));
        assert_eq!(VulnerabilitySeverity::parse("critical"), Some(VulnerabilitySeverity::Critical));
        assert_eq!(VulnerabilitySeverity::parse("whatever"), None);
    }

    #[test]
    fn test_parse_ghsa_record() {
        let json = r#"{
            "id": "GHSA-j8r2-6x86-q33q",
            "aliases": ["CVE-2023-32681"],
            "severity": [{"type": "CVSS_V3", "score": "CVSS:3.1/AV:N/AC:H/PR:N/UI:R/S:C/C:H/I:N/A:N"}],
            "database_specific": {"severity": "MODERATE", "github_reviewed": true}
        }"#;
        let vuln: OsvVulnerability = serde_json::from_str(json).unwrap();
        assert_eq!(vuln.severity(), Some(VulnerabilitySeverity::Medium));
    }

    #[test]
    fn test_parse_numeric_score() {
        let json = r#"{"id": "X-1", "severity": [{"type": "CVSS_V3", "score": "9.8"}]}"#;
        let vuln: OsvVulnerability = serde_json::from_str(json).unwrap();
        assert_eq!(vuln.severity(), Some(VulnerabilitySeverity::Critical));
    }

    #[test]
    fn test_parse_cvss_vector() {
        let json = r#"{"id":"CVE-2024-0001","severity":[{"type":"CVSS_V3","score":"CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H"}]}"#;
        let vuln: OsvVulnerability = serde_json::from_str(json).unwrap();
        assert_eq!(vuln.severity(), Some(VulnerabilitySeverity::Critical));

        let json = r#"{"id":"CVE-2023-32681","severity":[{"type":"CVSS_V3","score":"CVSS:3.1/AV:N/AC:H/PR:N/UI:R/S:C/C:H/I:N/A:N"}]}"#;
        let vuln: OsvVulnerability = serde_json::from_str(json).unwrap();
        assert_eq!(vuln.severity(), Some(VulnerabilitySeverity::Medium));
    }

    #[test]
    fn test_cvss_v3_preferred_over_unparseable_entries() {
        let json = r#"{"id": "X-2", "severity": [
            {"type": "CVSS_V4", "score": "CVSS:4.0/AV:N/AC:L/AT:N/PR:N/UI:N/VC:L/VI:N/VA:N/SC:N/SI:N/SA:N"},
            {"type": "CVSS_V3", "score": "CVSS:3.0/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:N/A:N"}
        ]}"#;
        let vuln: OsvVulnerability = serde_json::from_str(json).unwrap();
        assert_eq!(vuln.severity(), Some(VulnerabilitySeverity::High));
    }

    #[test]
    fn test_parse_record_without_severity() {
        let json = r#"{"id": "PYSEC-2023-74", "aliases": ["GHSA-j8r2-6x86-q33q"]}"#;
        let vuln: OsvVulnerability = serde_json::from_str(json).unwrap();
        assert_eq!(vuln.severity(), None);
        assert_eq!(vuln.aliases, vec!["GHSA-j8r2-6x86-q33q"]);
    }

    #[test]
    fn test_osv_client_new() {
        let client = OsvClient::new(&Config::default()).unwrap();
        assert_eq!(client.base_url, "https://api.osv.dev");
    }
}
