// file: src/github/client.rs
// description: GitHub REST v3 client implementing the remote tree contract
// reference: https://docs.rs/reqwest

use crate::config::GithubConfig;
use crate::error::{Result, SyncError};
use crate::github::remote::{FileEntry, RemoteTree};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One entry of a contents API response.
#[derive(Debug, Deserialize)]
struct ContentEntry {
    path: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
    content: Option<String>,
    encoding: Option<String>,
}

/// The contents endpoint returns an array for directories and a single
/// object when the path names a file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Directory(Vec<ContentEntry>),
    File(Box<ContentEntry>),
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    default_branch: String,
}

pub struct GithubClient {
    http: Client,
    api_url: String,
    fetch_timeout: Duration,
}

impl GithubClient {
    pub fn new(config: &GithubConfig, fetch_timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        match &config.token {
            Some(token) => {
                let value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| SyncError::Config(format!("Invalid GitHub token: {}", e)))?;
                headers.insert(AUTHORIZATION, value);
            }
            None => {
                warn!("No GitHub token configured; API requests will be rate-limited");
            }
        }

        let http = Client::builder()
            .user_agent(concat!("docsync/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| SyncError::Config(format!("Failed to build HTTP client: {}", e)))?;

        info!("GitHub client initialized for {}", config.api_url);

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            fetch_timeout,
        })
    }

    async fn get_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        branch: &str,
        timeout: Option<Duration>,
    ) -> Result<ContentsResponse> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url, owner, repo, path
        );

        let mut request = self.http.get(&url).query(&[("ref", branch)]);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| request_error(e, &url))?;

        let subject = format!("{}/{} path '{}'", owner, repo, path);
        let response = check_status(response, &subject).await?;

        response
            .json::<ContentsResponse>()
            .await
            .map_err(|e| SyncError::Host(format!("Unexpected contents response for {}: {}", subject, e)))
    }
}

#[async_trait]
impl RemoteTree for GithubClient {
    async fn resolve_default_branch(&self, owner: &str, repo: &str) -> Result<String> {
        let url = format!("{}/repos/{}/{}", self.api_url, owner, repo);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| request_error(e, &url))?;

        let subject = format!("repository {}/{}", owner, repo);
        let response = check_status(response, &subject).await?;

        let info: RepoInfo = response
            .json()
            .await
            .map_err(|e| SyncError::Host(format!("Unexpected repository response for {}: {}", subject, e)))?;

        debug!("Resolved default branch for {}/{}: {}", owner, repo, info.default_branch);
        Ok(info.default_branch)
    }

    async fn list_subtree(
        &self,
        owner: &str,
        repo: &str,
        root_path: &str,
        branch: &str,
    ) -> Result<Vec<FileEntry>> {
        let mut files = Vec::new();
        let mut queue = VecDeque::from([root_path.to_string()]);

        while let Some(current) = queue.pop_front() {
            let listing = self.get_contents(owner, repo, &current, branch, None).await;
            apply_listing(listing, &current, &mut queue, &mut files)?;
        }

        debug!(
            "Listed {} files under '{}' in {}/{} (branch: {})",
            files.len(),
            root_path,
            owner,
            repo,
            branch
        );
        Ok(files)
    }

    async fn fetch_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<String> {
        let response = self
            .get_contents(owner, repo, path, branch, Some(self.fetch_timeout))
            .await?;

        match response {
            ContentsResponse::Directory(_) => Err(SyncError::NotAFile(path.to_string())),
            ContentsResponse::File(entry) => {
                if entry.kind != "file" {
                    return Err(SyncError::NotAFile(path.to_string()));
                }
                decode_entry_content(&entry)
            }
        }
    }
}

/// Fold one listing result into the traversal. A missing sub-path is
/// skipped with a warning; upstream may have moved or deleted it since the
/// parent listing, and siblings are still reachable. Any other error aborts
/// the whole traversal.
fn apply_listing(
    listing: Result<ContentsResponse>,
    current: &str,
    queue: &mut VecDeque<String>,
    files: &mut Vec<FileEntry>,
) -> Result<()> {
    match listing {
        Ok(response) => {
            collect_entries(response, queue, files);
            Ok(())
        }
        Err(err) if err.is_not_found() => {
            warn!("Path '{}' not found, skipping subtree", current);
            Ok(())
        }
        Err(err) => Err(err),
    }
}

/// Sort directory listings into further traversal work and collected files.
fn collect_entries(
    response: ContentsResponse,
    queue: &mut VecDeque<String>,
    files: &mut Vec<FileEntry>,
) {
    match response {
        ContentsResponse::Directory(entries) => {
            for entry in entries {
                match entry.kind.as_str() {
                    "dir" => queue.push_back(entry.path),
                    "file" => files.push(FileEntry {
                        path: entry.path,
                        sha: entry.sha,
                    }),
                    // symlinks and submodules are not mirrored
                    other => debug!("Ignoring {} entry: {}", other, entry.path),
                }
            }
        }
        ContentsResponse::File(entry) => {
            if entry.kind == "file" {
                files.push(FileEntry {
                    path: entry.path,
                    sha: entry.sha,
                });
            } else {
                debug!("Ignoring {} entry: {}", entry.kind, entry.path);
            }
        }
    }
}

/// Decode the base64 payload of a contents API file object to text.
fn decode_entry_content(entry: &ContentEntry) -> Result<String> {
    let encoded = entry.content.as_deref().ok_or_else(|| SyncError::Decode {
        path: entry.path.clone(),
        message: "response carried no content field".to_string(),
    })?;

    match entry.encoding.as_deref() {
        Some("base64") | None => {}
        Some(other) => {
            return Err(SyncError::Decode {
                path: entry.path.clone(),
                message: format!("unsupported content encoding '{}'", other),
            });
        }
    }

    // GitHub wraps base64 payloads with embedded newlines.
    let compact: String = encoded.split_whitespace().collect();
    let bytes = BASE64.decode(compact.as_bytes()).map_err(|e| SyncError::Decode {
        path: entry.path.clone(),
        message: e.to_string(),
    })?;

    String::from_utf8(bytes).map_err(|e| SyncError::Decode {
        path: entry.path.clone(),
        message: e.to_string(),
    })
}

async fn check_status(response: Response, subject: &str) -> Result<Response> {
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Err(SyncError::NotFound(format!("{} not found or not accessible", subject)));
    }

    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(SyncError::Host(format!(
            "GitHub API returned {} for {}: {}",
            status, subject, body
        )));
    }

    Ok(response)
}

fn request_error(err: reqwest::Error, url: &str) -> SyncError {
    if err.is_timeout() {
        SyncError::Host(format!("Request to {} timed out", url))
    } else {
        SyncError::Host(format!("Request to {} failed: {}", url, err))
    }
}

/// Extract owner and repository name from a github.com URL.
///
/// Accepts `https://github.com/owner/repo` with an optional `.git` suffix.
pub fn parse_repo_url(url: &str) -> Result<(String, String)> {
    let trimmed = url
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.");

    let path = trimmed
        .strip_prefix("github.com/")
        .ok_or_else(|| SyncError::Config(format!("Not a github.com URL: {}", url)))?;

    let mut parts = path.trim_matches('/').split('/');
    let owner = parts.next().unwrap_or_default();
    let repo = parts
        .next()
        .unwrap_or_default()
        .trim_end_matches(".git");

    if owner.is_empty() || repo.is_empty() {
        return Err(SyncError::Config(format!(
            "URL path does not contain owner and repository: {}",
            url
        )));
    }

    Ok((owner.to_string(), repo.to_string()))
}
