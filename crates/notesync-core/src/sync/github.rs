//! GitHub contents API implementation of [`RemoteFileStore`].

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::models::{RemoteFileState, RepositoryRef, RepositorySyncConfig};
use crate::util::{compact_text, is_http_url, normalize_text_option};

use super::remote::{RemoteConnector, RemoteError, RemoteFileStore, RemoteResult};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const API_URL_ENV: &str = "NOTESYNC_GITHUB_API_URL";

const API_VERSION: &str = "2022-11-28";
const ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("notesync/", env!("CARGO_PKG_VERSION"));

/// Creates [`GitHubContentsClient`]s sharing one HTTP client.
#[derive(Clone)]
pub struct GitHubConnector {
    api_base: String,
    client: reqwest::Client,
}

impl GitHubConnector {
    pub fn new(api_base: impl Into<String>) -> RemoteResult<Self> {
        Ok(Self {
            api_base: normalize_api_base(api_base.into())?,
            client: reqwest::Client::builder().user_agent(USER_AGENT).build()?,
        })
    }

    /// Use `NOTESYNC_GITHUB_API_URL` when set, public GitHub otherwise.
    pub fn from_env() -> RemoteResult<Self> {
        let api_base = std::env::var(API_URL_ENV)
            .ok()
            .and_then(|value| normalize_text_option(Some(value)))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self::new(api_base)
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

impl RemoteConnector for GitHubConnector {
    type Store = GitHubContentsClient;

    fn connect(&self, config: &RepositorySyncConfig) -> RemoteResult<GitHubContentsClient> {
        let config = config
            .clone()
            .normalized()
            .map_err(|e| RemoteError::InvalidConfiguration(e.to_string()))?;
        Ok(GitHubContentsClient {
            api_base: self.api_base.clone(),
            client: self.client.clone(),
            config,
        })
    }
}

/// Reads and writes note files in one repository branch.
#[derive(Clone)]
pub struct GitHubContentsClient {
    api_base: String,
    client: reqwest::Client,
    config: RepositorySyncConfig,
}

impl GitHubContentsClient {
    fn repo_url(&self, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}/{suffix}",
            self.api_base,
            urlencoding::encode(&self.config.owner),
            urlencoding::encode(&self.config.repo),
        )
    }

    fn contents_url(&self, path: &str) -> String {
        self.repo_url(&format!("contents/{}", encode_path(path)))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.config.token)
            .header("Accept", ACCEPT)
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn last_modified(&self, path: &str) -> RemoteResult<i64> {
        let response = self
            .authorized(self.client.get(self.repo_url("commits")))
            .query(&[
                ("path", path),
                ("sha", self.config.branch.as_str()),
                ("per_page", "1"),
            ])
            .send()
            .await?;
        let commits = check(response).await?.json::<Vec<CommitEntry>>().await?;

        let date = commits
            .first()
            .map(|entry| entry.commit.committer.date.as_str())
            .ok_or_else(|| RemoteError::Malformed(format!("no commit history for '{path}'")))?;
        parse_commit_date(date)
    }
}

impl RemoteFileStore for GitHubContentsClient {
    async fn read_file(&self, path: &str) -> RemoteResult<Option<RemoteFileState>> {
        let response = self
            .authorized(self.client.get(self.contents_url(path)))
            .query(&[("ref", self.config.branch.as_str())])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Remote file {} does not exist", path);
            return Ok(None);
        }

        let body = check(response).await?.text().await?;
        let file: ContentsFile = serde_json::from_str(&body).map_err(|_| {
            RemoteError::Malformed(format!("'{path}' is not a file in the repository"))
        })?;
        let content = decode_content(&file)?;
        let modified_at = self.last_modified(path).await?;

        Ok(Some(RemoteFileState {
            content,
            modified_at,
            hash: file.sha,
        }))
    }

    async fn write_file(
        &self,
        path: &str,
        content: &str,
        known_hash: Option<&str>,
    ) -> RemoteResult<String> {
        let verb = if known_hash.is_some() { "Update" } else { "Create" };
        let body = PutContentsRequest {
            message: format!("{verb} {path}"),
            content: BASE64.encode(content),
            branch: &self.config.branch,
            sha: known_hash,
        };

        let response = self
            .authorized(self.client.put(self.contents_url(path)))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::CONFLICT || status == StatusCode::UNPROCESSABLE_ENTITY {
            let body = response.text().await.unwrap_or_default();
            return Err(write_rejection(status, &body));
        }

        let written = check(response).await?.json::<PutContentsResponse>().await?;
        tracing::debug!("Wrote {} ({})", path, written.content.sha);
        Ok(written.content.sha)
    }

    async fn list_repositories(&self) -> RemoteResult<Vec<RepositoryRef>> {
        let response = self
            .authorized(self.client.get(format!("{}/user/repos", self.api_base)))
            .query(&[("per_page", "100"), ("sort", "updated")])
            .send()
            .await?;
        let repos = check(response).await?.json::<Vec<RepoEntry>>().await?;
        Ok(repos.into_iter().map(RepositoryRef::from).collect())
    }
}

#[derive(Debug, Deserialize)]
struct ContentsFile {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitEntry {
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    committer: CommitSignature,
}

#[derive(Debug, Deserialize)]
struct CommitSignature {
    date: String,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: String,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    content: WrittenFile,
}

#[derive(Debug, Deserialize)]
struct WrittenFile {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RepoEntry {
    name: String,
    full_name: String,
    owner: RepoOwner,
    default_branch: Option<String>,
    #[serde(default)]
    private: bool,
}

#[derive(Debug, Deserialize)]
struct RepoOwner {
    login: String,
}

impl From<RepoEntry> for RepositoryRef {
    fn from(entry: RepoEntry) -> Self {
        Self {
            owner: entry.owner.login,
            name: entry.name,
            full_name: entry.full_name,
            default_branch: entry.default_branch,
            private: entry.private,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

async fn check(response: Response) -> RemoteResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Api {
        status: status.as_u16(),
        message: parse_api_error(status, &body),
    })
}

/// 409 always means the file moved on; 422 only when GitHub blames the sha.
fn write_rejection(status: StatusCode, body: &str) -> RemoteError {
    let message = parse_api_error(status, body);
    if status == StatusCode::CONFLICT || message.to_ascii_lowercase().contains("sha") {
        RemoteError::Conflict(message)
    } else {
        RemoteError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message {
            return message.trim().to_string();
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        trimmed
    }
}

fn decode_content(file: &ContentsFile) -> RemoteResult<String> {
    match file.encoding.as_deref() {
        Some("base64") | None => {}
        Some(other) => {
            return Err(RemoteError::Malformed(format!(
                "unsupported content encoding '{other}'"
            )))
        }
    }

    // The API wraps base64 at 60 columns
    let packed: String = file
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = BASE64
        .decode(packed)
        .map_err(|e| RemoteError::Malformed(format!("invalid base64 content: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|_| RemoteError::Malformed("file content is not UTF-8 text".to_string()))
}

fn parse_commit_date(date: &str) -> RemoteResult<i64> {
    chrono::DateTime::parse_from_rfc3339(date)
        .map(|parsed| parsed.timestamp_millis())
        .map_err(|e| RemoteError::Malformed(format!("invalid commit date '{date}': {e}")))
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn normalize_api_base(raw: String) -> RemoteResult<String> {
    let api_base = normalize_text_option(Some(raw)).ok_or_else(|| {
        RemoteError::InvalidConfiguration("API URL must not be empty".to_string())
    })?;
    if is_http_url(&api_base) {
        Ok(api_base.trim_end_matches('/').to_string())
    } else {
        Err(RemoteError::InvalidConfiguration(
            "API URL must include http:// or https://".to_string(),
        ))
    }
}
