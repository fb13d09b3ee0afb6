//! Best-effort repository metadata: creation date, language percentages and
//! modules inferred from the file tree.
//!
//! Nothing here fails. Every lookup error is logged at `warn` and leaves the
//! corresponding field empty.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use chrono::DateTime;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::knowledge::Project;

pub const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API returned {0}")]
    Status(u16),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoMetadata {
    pub created_at: Option<String>,
    /// Language name → share of bytes, one decimal.
    pub languages: BTreeMap<String, f64>,
    pub modules: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RepoRecord {
    created_at: Option<String>,
    default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Clone)]
pub struct GithubClient {
    client: Client,
    api_base: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(
        api_base: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GithubError> {
        Ok(Self {
            client: Client::builder()
                .timeout(timeout)
                .user_agent(USER_AGENT)
                .build()?,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Metadata for `project`, filling in only what the record lacks.
    ///
    /// Projects that already carry languages and modules, or have no usable
    /// repository URL, never touch the network.
    pub async fn fetch_metadata(&self, project: &Project) -> RepoMetadata {
        let mut meta = RepoMetadata {
            created_at: project.created_at.clone(),
            languages: project.languages.clone(),
            modules: project.modules.clone(),
        };

        if !meta.languages.is_empty() && !meta.modules.is_empty() {
            return meta;
        }
        let Some(api_url) = project
            .repository
            .as_deref()
            .and_then(|url| to_api_repo_url(url, &self.api_base))
        else {
            return meta;
        };

        debug!("Fetching repository metadata for {} from {api_url}", project.id);
        let repo = self.repo_record(&api_url, &project.id).await;
        if meta.created_at.is_none() {
            meta.created_at = repo
                .as_ref()
                .and_then(|r| r.created_at.as_deref())
                .map(creation_date);
        }
        if meta.languages.is_empty() {
            meta.languages = self.languages(&api_url, &project.id).await;
        }
        if meta.modules.is_empty() {
            let branch = repo
                .and_then(|r| r.default_branch)
                .unwrap_or_else(|| "master".to_string());
            meta.modules = infer_modules_from_tree(&self.tree(&api_url, &branch, &project.id).await);
        }
        meta
    }

    async fn repo_record(&self, api_url: &str, project_id: &str) -> Option<RepoRecord> {
        match self.get_json::<RepoRecord>(api_url).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Repository lookup failed for {project_id}: {e}");
                None
            }
        }
    }

    async fn languages(&self, api_url: &str, project_id: &str) -> BTreeMap<String, f64> {
        match self
            .get_json::<BTreeMap<String, u64>>(&format!("{api_url}/languages"))
            .await
        {
            Ok(bytes) => language_percentages(&bytes.unwrap_or_default()),
            Err(e) => {
                warn!("Language lookup failed for {project_id}: {e}");
                BTreeMap::new()
            }
        }
    }

    /// Recursive tree of `branch`, retrying once with master/main swapped on 404.
    async fn tree(&self, api_url: &str, branch: &str, project_id: &str) -> Vec<TreeEntry> {
        let url = |b: &str| format!("{api_url}/git/trees/{b}?recursive=1");

        let mut result = self.get_json::<TreeResponse>(&url(branch)).await;
        if matches!(result, Ok(None)) {
            if let Some(alt) = swapped_branch(branch) {
                debug!("Tree for {branch} not found, trying {alt}");
                result = self.get_json::<TreeResponse>(&url(alt)).await;
            }
        }

        match result {
            Ok(tree) => tree.map(|t| t.tree).unwrap_or_default(),
            Err(e) => {
                warn!("Tree lookup failed for {project_id}: {e}");
                Vec::new()
            }
        }
    }

    /// `Ok(None)` on 404.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, GithubError> {
        let mut builder = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, GITHUB_ACCEPT);
        if let Some(token) = &self.token {
            builder = builder.header(reqwest::header::AUTHORIZATION, format!("token {token}"));
        }

        let response = builder.send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => Ok(Some(response.json::<T>().await?)),
            s => Err(GithubError::Status(s.as_u16())),
        }
    }
}

/// `YYYY-MM-DD` from an RFC 3339 timestamp; anything else is kept verbatim.
fn creation_date(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}

fn swapped_branch(branch: &str) -> Option<&'static str> {
    match branch {
        "master" => Some("main"),
        "main" => Some("master"),
        _ => None,
    }
}

/// Maps a repository URL to its metadata API URL under `api_base`.
///
/// `https://github.com/<owner>/<repo>[.git]` becomes
/// `<api_base>/repos/<owner>/<repo>`; URLs already under `<api_base>/repos/`
/// pass through without trailing slashes. Anything else yields `None`.
pub fn to_api_repo_url(url: &str, api_base: &str) -> Option<String> {
    let url = url.trim().trim_end_matches('/');
    let api_base = api_base.trim_end_matches('/');

    if url.starts_with(&format!("{api_base}/repos/")) {
        return Some(url.to_string());
    }

    let path = url
        .strip_prefix("https://github.com/")
        .or_else(|| url.strip_prefix("http://github.com/"))
        .or_else(|| url.strip_prefix("https://www.github.com/"))?;
    let mut parts = path.split('/').filter(|p| !p.is_empty());
    let owner = parts.next()?;
    let repo = parts.next()?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if repo.is_empty() {
        return None;
    }
    Some(format!("{api_base}/repos/{owner}/{repo}"))
}

/// Byte counts to percentages with one decimal. Empty when there are no bytes.
pub fn language_percentages(bytes: &BTreeMap<String, u64>) -> BTreeMap<String, f64> {
    let total: u64 = bytes.values().sum();
    if total == 0 {
        return BTreeMap::new();
    }
    bytes
        .iter()
        .map(|(lang, &n)| {
            let pct = (n as f64 * 1000.0 / total as f64).round() / 10.0;
            (lang.clone(), pct)
        })
        .collect()
}

fn module_for_extension(ext: &str) -> Option<&'static str> {
    let module = match ext {
        "py" => "Python",
        "ipynb" => "Jupyter",
        "js" | "mjs" | "cjs" | "jsx" => "JavaScript",
        "ts" | "tsx" => "TypeScript",
        "html" | "htm" => "HTML",
        "css" | "scss" => "CSS",
        "java" | "gradle" => "Java",
        "c" => "C",
        "cpp" | "cc" => "C++",
        "cs" => "C#",
        "go" => "Go",
        "rs" => "Rust",
        "php" => "PHP",
        "rb" => "Ruby",
        "md" => "Markdown",
        "json" => "JSON",
        "yml" | "yaml" => "YAML",
        "r" => "R",
        "sh" => "Shell",
        "ps1" => "PowerShell",
        "swift" => "Swift",
        "kt" => "Kotlin",
        "sikuli" => "sikuliX",
        "docx" => "docx",
        "png" | "jpg" | "jpeg" | "svg" => "Assets",
        _ => return None,
    };
    Some(module)
}

/// Sorted, de-duplicated modules inferred from the blobs of a git tree.
pub fn infer_modules_from_tree(tree: &[TreeEntry]) -> Vec<String> {
    let mut modules = BTreeSet::new();

    for entry in tree.iter().filter(|e| e.kind == "blob") {
        let path = entry.path.to_lowercase();
        let file_name = path.rsplit('/').next().unwrap_or(&path);

        match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => {
                if let Some(module) = module_for_extension(ext) {
                    modules.insert(module);
                } else if ext == "lock" && (stem == "package-lock" || stem == "yarn") {
                    modules.insert("JavaScript");
                }
            }
            _ => {
                if path.contains("three") {
                    modules.insert("Three.js");
                }
            }
        }
    }

    modules.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn blob(path: &str) -> TreeEntry {
        TreeEntry {
            path: path.to_string(),
            kind: "blob".to_string(),
        }
    }

    fn project(repository: Option<&str>) -> Project {
        serde_json::from_value(json!({ "id": "proj-6", "name": "Decod", "repository": repository }))
            .unwrap()
    }

    fn client(server: &MockServer) -> GithubClient {
        GithubClient::new(server.uri(), Some("gh-token".into()), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_to_api_repo_url() {
        let base = GITHUB_API_BASE;
        assert_eq!(
            to_api_repo_url("https://github.com/giusepperubino/decod.git", base).as_deref(),
            Some("https://api.github.com/repos/giusepperubino/decod")
        );
        assert_eq!(
            to_api_repo_url("https://github.com/giusepperubino/decod/tree/main/", base).as_deref(),
            Some("https://api.github.com/repos/giusepperubino/decod")
        );
        assert_eq!(
            to_api_repo_url("https://api.github.com/repos/giusepperubino/decod/", base).as_deref(),
            Some("https://api.github.com/repos/giusepperubino/decod")
        );
        assert_eq!(to_api_repo_url("https://github.com/giusepperubino", base), None);
        assert_eq!(to_api_repo_url("https://gitlab.com/a/b", base), None);
    }

    #[test]
    fn test_creation_date() {
        assert_eq!(creation_date("2023-11-05T08:12:44Z"), "2023-11-05");
        assert_eq!(creation_date("novembre 2023"), "novembre 2023");
    }

    #[test]
    fn test_language_percentages_one_decimal() {
        let bytes = BTreeMap::from([("Python".to_string(), 2u64), ("Shell".to_string(), 1u64)]);
        let pcts = language_percentages(&bytes);
        assert_eq!(pcts["Python"], 66.7);
        assert_eq!(pcts["Shell"], 33.3);
        assert!(language_percentages(&BTreeMap::new()).is_empty());
    }

    #[test]
    fn test_infer_modules_sorted_unique() {
        let tree = vec![
            blob("src/main.py"),
            blob("src/util.py"),
            blob("web/App.JSX"),
            blob("yarn.lock"),
            blob("assets/logo.svg"),
            blob("Makefile"),
            blob(".gitignore"),
            TreeEntry {
                path: "src".to_string(),
                kind: "tree".to_string(),
            },
        ];
        assert_eq!(
            infer_modules_from_tree(&tree),
            vec!["Assets", "JavaScript", "Python"]
        );
    }

    #[tokio::test]
    async fn test_fetch_metadata_from_api() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/giusepperubino/decod"))
            .and(header("authorization", "token gh-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "created_at": "2024-03-01T10:00:00Z",
                "default_branch": "master"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/giusepperubino/decod/languages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Python": 3, "Shell": 1 })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/giusepperubino/decod/git/trees/master"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/giusepperubino/decod/git/trees/main"))
            .and(query_param("recursive", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tree": [
                    { "path": "decod/main.rs", "type": "blob" },
                    { "path": "README.md", "type": "blob" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let meta = client(&server)
            .fetch_metadata(&project(Some("https://github.com/giusepperubino/decod")))
            .await;

        assert_eq!(meta.created_at.as_deref(), Some("2024-03-01"));
        assert_eq!(meta.languages["Python"], 75.0);
        assert_eq!(meta.modules, vec!["Markdown", "Rust"]);
    }

    #[tokio::test]
    async fn test_failures_degrade_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let meta = client(&server)
            .fetch_metadata(&project(Some("https://github.com/giusepperubino/decod")))
            .await;
        assert_eq!(meta, RepoMetadata::default());
    }

    #[tokio::test]
    async fn test_complete_project_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut project = project(Some("https://github.com/giusepperubino/decod"));
        project.modules = vec!["Python".to_string()];
        project.languages = BTreeMap::from([("Python".to_string(), 100.0)]);

        let meta = client(&server).fetch_metadata(&project).await;
        assert_eq!(meta.modules, vec!["Python"]);
    }

    #[tokio::test]
    async fn test_project_without_repository() {
        let server = MockServer::start().await;
        let meta = client(&server).fetch_metadata(&project(None)).await;
        assert_eq!(meta, RepoMetadata::default());
    }
}
