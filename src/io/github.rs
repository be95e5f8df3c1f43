use crate::io::{ContentFile, ContentSource};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;

const CLIENT_USER_AGENT: &str = concat!("posthook/", env!("CARGO_PKG_VERSION"));
const GITHUB_API_VERSION: &str = "2022-11-28";

#[derive(Deserialize, Debug)]
struct ContentEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Reads posts through the GitHub repository contents API.
pub struct GitHubContentSource {
    client: Client,
    api_url: String,
    owner: String,
    repo: String,
    branch: String,
    token: Option<String>,
}

impl GitHubContentSource {
    pub fn new(
        api_url: String,
        owner: String,
        repo: String,
        branch: String,
        token: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_url,
            owner,
            repo,
            branch,
            token,
        }
    }

    // every segment is percent-encoded, so '#' or '?' in a file name stays part of the path
    pub fn contents_url(&self, path: &str) -> Result<Url> {
        let mut url = Url::parse(&self.api_url)
            .with_context(|| format!("Invalid GitHub API url {}", self.api_url))?;

        url.path_segments_mut()
            .map_err(|_| anyhow!("GitHub API url {} cannot take a path", self.api_url))?
            .pop_if_empty()
            .extend(["repos", self.owner.as_str(), self.repo.as_str(), "contents"])
            .extend(path.split('/').filter(|segment| !segment.is_empty()));

        url.query_pairs_mut().append_pair("ref", &self.branch);

        Ok(url)
    }

    fn contents_request(&self, path: &str, accept: &str) -> Result<RequestBuilder> {
        let url = self.contents_url(path)?;

        let request = self
            .client
            .get(url)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .header(ACCEPT, accept);

        Ok(match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }
}

#[async_trait]
impl ContentSource for GitHubContentSource {
    async fn list_markdown_files(&self, folder: &str) -> Result<Vec<ContentFile>> {
        let mut files = Vec::new();
        let mut pending = vec![folder.to_string()];

        // the contents API lists one directory per call
        while let Some(dir) = pending.pop() {
            let entries: Vec<ContentEntry> = self
                .contents_request(&dir, "application/vnd.github+json")?
                .send()
                .await
                .with_context(|| format!("Failed to reach GitHub while listing {}", dir))?
                .error_for_status()
                .with_context(|| format!("GitHub rejected listing of {}", dir))?
                .json()
                .await
                .with_context(|| format!("Unexpected GitHub listing for {}", dir))?;

            for entry in entries {
                match entry.kind.as_str() {
                    "dir" => pending.push(entry.path),
                    "file" if entry.name.ends_with(".md") => {
                        files.push(ContentFile { path: entry.path })
                    }
                    _ => {}
                }
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    async fn read_to_string(&self, path: &str) -> Result<String> {
        self.contents_request(path, "application/vnd.github.raw+json")?
            .send()
            .await
            .with_context(|| format!("Failed to reach GitHub while reading {}", path))?
            .error_for_status()
            .with_context(|| format!("GitHub rejected read of {}", path))?
            .text()
            .await
            .with_context(|| format!("Failed to read body of {}", path))
    }
}
