use crate::config::Config;
use crate::core::PipguardResult;
use crate::services::http::{build_client, get_json};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::sync::OnceLock;

/// Popularity information about a source repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepoInfo {
    pub star_count: u64,
}

#[async_trait]
pub trait RepoApi: Send + Sync {
    /// Look up a repository by its web URL; `None` if it does not exist or the host is unreachable
    async fn get_repo_info(&self, url: &str) -> Option<RepoInfo>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoHost {
    GitHub,
    GitLab,
}

/// A repository on a recognised host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoUrl {
    pub host: RepoHost,
    pub owner: String,
    pub name: String,
}

impl RepoUrl {
    pub fn parse(url: &str) -> Option<Self> {
        static REPO_URL: OnceLock<Regex> = OnceLock::new();
        let re = REPO_URL.get_or_init(|| {
            Regex::new(r"^https?://(?:www\.)?(github\.com|gitlab\.com)/([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)")
                .expect("repository URL pattern is valid")
        });

        let caps = re.captures(url.trim())?;
        let host = match caps[1].to_lowercase().as_str() {
            "github.com" => RepoHost::GitHub,
            _ => RepoHost::GitLab,
        };
        let name = caps[3].trim_end_matches(".git");
        if name.is_empty() {
            return None;
        }

        Some(Self {
            host,
            owner: caps[2].to_string(),
            name: name.to_string(),
        })
    }

    /// Canonical web URL, e.g. `https://github.com/owner/name`
    pub fn web_url(&self) -> String {
        let host = match self.host {
            RepoHost::GitHub => "github.com",
            RepoHost::GitLab => "gitlab.com",
        };
        format!("https://{}/{}/{}", host, self.owner, self.name)
    }
}

/// The canonical repository URL if `url` points into a GitHub or GitLab repository
pub fn recognized_repo_url(url: &str) -> Option<String> {
    RepoUrl::parse(url).map(|repo| repo.web_url())
}

#[derive(Deserialize)]
struct GitHubRepo {
    stargazers_count: u64,
}

#[derive(Deserialize)]
struct GitLabProject {
    star_count: u64,
}

/// Client for the GitHub and GitLab REST APIs
pub struct RepoClient {
    client: Client,
    github_api_url: String,
    gitlab_api_url: String,
    github_token: Option<String>,
}

impl RepoClient {
    /// Create a new repository client; the GitHub token is sent when configured
    pub fn new(config: &Config) -> PipguardResult<Self> {
        Ok(Self {
            // reqwest follows redirects by default, which covers renamed/moved repositories
            client: build_client(config)?,
            github_api_url: config.github_api_url.trim_end_matches('/').to_string(),
            gitlab_api_url: config.gitlab_api_url.trim_end_matches('/').to_string(),
            github_token: config.github_token.clone(),
        })
    }

    fn api_url(&self, repo: &RepoUrl) -> String {
        match repo.host {
            RepoHost::GitHub => format!("{}/repos/{}/{}", self.github_api_url, repo.owner, repo.name),
            RepoHost::GitLab => format!(
                "{}/projects/{}",
                self.gitlab_api_url,
                urlencoding::encode(&format!("{}/{}", repo.owner, repo.name))
            ),
        }
    }
}

#[async_trait]
impl RepoApi for RepoClient {
    async fn get_repo_info(&self, url: &str) -> Option<RepoInfo> {
        let repo = RepoUrl::parse(url)?;
        let api_url = self.api_url(&repo);

        match repo.host {
            RepoHost::GitHub => {
                let auth = self.github_token.as_ref().map(|t| format!("Bearer {}", t));
                let mut headers = vec![("Accept", "application/vnd.github+json")];
                if let Some(auth) = auth.as_deref() {
                    headers.push(("Authorization", auth));
                }
                let repo: GitHubRepo = get_json(&self.client, &api_url, &headers).await?;
                Some(RepoInfo {
                    star_count: repo.stargazers_count,
                })
            }
            RepoHost::GitLab => {
                let project: GitLabProject = get_json(&self.client, &api_url, &[]).await?;
                Some(RepoInfo {
                    star_count: project.star_count,
                })
            }
        }
    }
}
