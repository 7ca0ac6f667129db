use crate::checks::checker::Checker;
use crate::checks::types::{CheckResult, CheckResultType};
use crate::config::CheckThresholds;
use crate::core::PipguardResult;
use crate::pip::ResolvedPackage;
use crate::pypi::models::PypiVulnerability;
use crate::pypi::verify::PendingVerification;
use crate::report::escape_markup;
use crate::services::{VulnerabilityDetails, VulnerabilityDetailsApi, VulnerabilitySeverity};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;

/// Lists known, non-withdrawn vulnerabilities of the release
pub struct VulnerabilitiesChecker {
    details: Arc<dyn VulnerabilityDetailsApi>,
    max_displayed: usize,
}

impl VulnerabilitiesChecker {
    /// Create a new vulnerabilities checker listing at most the configured number of ids
    pub fn new(details: Arc<dyn VulnerabilityDetailsApi>, thresholds: &CheckThresholds) -> Self {
        Self {
            details,
            max_displayed: thresholds.max_displayed_vulnerabilities,
        }
    }

    async fn lookup(&self, vulnerability: &PypiVulnerability, id: &str) -> VulnerabilityDetails {
        match self.details.get_details(id).await {
            Some(mut details) => {
                if details.link.is_none() {
                    details.link = vulnerability.link.clone();
                }
                details
            }
            None => VulnerabilityDetails {
                id: id.to_string(),
                severity: None,
                link: vulnerability.link.clone(),
            },
        }
    }
}

#[async_trait]
impl Checker for VulnerabilitiesChecker {
    fn description(&self) -> &'static str {
        "Checking known vulnerabilities"
    }

    fn priority(&self) -> u32 {
        40
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

        let mut ids: Vec<&str> = Vec::new();
        let lookups = verified
            .release
            .vulnerabilities
            .iter()
            .filter(|v| v.withdrawn.is_none())
            .filter_map(|v| v.identifier().map(|id| (v, id)))
            .filter(|(_, id)| {
                let first_seen = !ids.contains(id);
                if first_seen {
                    ids.push(*id);
                }
                first_seen
            })
            .map(|(v, id)| self.lookup(v, id))
            .collect::<Vec<_>>();

        if lookups.is_empty() {
            return Ok(self.result(CheckResultType::Success, "No known vulnerabilities found"));
        }

        let details = join_all(lookups).await;
        let result_type = if details
            .iter()
            .any(|d| matches!(d.severity, Some(VulnerabilitySeverity::High | VulnerabilitySeverity::Critical)))
        {
            CheckResultType::Failure
        } else {
            CheckResultType::Warning
        };

        Ok(self.result(
            result_type,
            format!(
                "Found the following vulnerabilities: {}",
                format_vulnerabilities(&details, self.max_displayed)
            ),
        ))
    }
}

/// Render vulnerabilities most severe first, grouping runs of equal severity.
///
/// Only the first `max_displayed` entries are listed; the rest are summarised as
/// ` and N more`.
pub fn format_vulnerabilities(vulnerabilities: &[VulnerabilityDetails], max_displayed: usize) -> String {
    let mut sorted: Vec<&VulnerabilityDetails> = vulnerabilities.iter().collect();
    // Stable; unknown severity sorts last
    sorted.sort_by(|a, b| b.severity.cmp(&a.severity));

    let shown = &sorted[..sorted.len().min(max_displayed)];
    let mut groups: Vec<String> = Vec::new();
    for run in shown.chunk_by(|a, b| a.severity == b.severity) {
        let severity = run[0].severity;
        let (color, label) = match severity {
            Some(severity) => (severity.color(), severity.label()),
            None => ("default", "unknown severity"),
        };
        let ids = run.iter().map(|v| linked_id(v)).collect::<Vec<_>>().join(", ");
        groups.push(format!("[{color}]{ids} ({label})[/{color}]"));
    }

    let mut formatted = groups.join(", ");
    if sorted.len() > shown.len() {
        formatted.push_str(&format!(" and {} more", sorted.len() - shown.len()));
    }
    formatted
}

fn linked_id(vulnerability: &VulnerabilityDetails) -> String {
    let id = escape_markup(&vulnerability.id);
    match vulnerability.link.as_deref().filter(|link| is_safe_link(link)) {
        Some(link) => format!("[link={}]{}[/link]", link, id),
        None => id,
    }
}

fn is_safe_link(link: &str) -> bool {
    !link.is_empty()
        && !link
            .chars()
            .any(|c| c.is_control() || c.is_whitespace() || c == '[' || c == ']')
}
