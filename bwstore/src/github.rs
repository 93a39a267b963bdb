//! Blob store sur l'API Contents de GitHub.
//!
//! Chaque document est un fichier du dépôt ; le `sha` retourné par l'API est
//! le jeton de version opaque. Une écriture avec un `sha` périmé est rejetée
//! par GitHub (409/422), ce que l'on remonte en [`Error::Conflict`].

use crate::{BlobStore, Error, Result, Version};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

const GITHUB_API: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("beatwave/", env!("CARGO_PKG_VERSION"));

/// Client du magasin GitHub Contents.
pub struct GithubStore {
    client: reqwest::Client,
    owner: String,
    repo: String,
    branch: String,
    token: String,
}

#[derive(Deserialize)]
struct ContentsResponse {
    content: Option<String>,
    sha: String,
}

#[derive(Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Deserialize)]
struct PutContent {
    sha: String,
}

#[derive(Deserialize)]
struct DirEntry {
    path: String,
    name: String,
}

impl GithubStore {
    pub fn new(owner: &str, repo: &str, branch: &str, token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: branch.to_string(),
            token: token.to_string(),
        }
    }

    /// Construit un client à partir de la configuration globale.
    pub fn from_config() -> Option<Self> {
        let config = bwconfig::get_config();
        let token = config.get_github_token()?;
        Some(Self::new(
            &config.get_github_owner(),
            &config.get_github_repo(),
            &config.get_github_branch(),
            &token,
        ))
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            GITHUB_API, self.owner, self.repo, path
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", USER_AGENT)
    }
}

#[async_trait]
impl BlobStore for GithubStore {
    async fn read(&self, path: &str) -> Result<Option<(Vec<u8>, Version)>> {
        let url = format!("{}?ref={}", self.url(path), self.branch);
        let response = self.request(reqwest::Method::GET, &url).send().await?;

        match response.status().as_u16() {
            404 => Ok(None),
            200 => {
                let body: ContentsResponse = response.json().await?;
                let encoded = body.content.ok_or_else(|| Error::Malformed {
                    path: path.to_string(),
                    detail: "no content field".to_string(),
                })?;
                // GitHub insère des sauts de ligne dans le base64.
                let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
                let bytes = BASE64.decode(compact).map_err(|e| Error::Malformed {
                    path: path.to_string(),
                    detail: e.to_string(),
                })?;
                Ok(Some((bytes, Version(body.sha))))
            }
            status => Err(Error::Status {
                status,
                path: path.to_string(),
            }),
        }
    }

    async fn write(
        &self,
        path: &str,
        content: &[u8],
        expected: Option<&Version>,
    ) -> Result<Version> {
        let mut body = json!({
            "message": format!("Update {}", path),
            "content": BASE64.encode(content),
            "branch": self.branch,
        });
        if let Some(version) = expected {
            body["sha"] = json!(version.as_str());
        }

        debug!(path = %path, conditional = expected.is_some(), "Writing document to GitHub");
        let response = self
            .request(reqwest::Method::PUT, &self.url(path))
            .json(&body)
            .send()
            .await?;

        match response.status().as_u16() {
            200 | 201 => {
                let body: PutResponse = response.json().await?;
                Ok(Version(body.content.sha))
            }
            // 409 : la branche a bougé ; 422 : sha périmé ou manquant.
            409 | 422 => {
                warn!(path = %path, "Conditional write rejected by GitHub");
                Err(Error::Conflict(path.to_string()))
            }
            status => Err(Error::Status {
                status,
                path: path.to_string(),
            }),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let trimmed = prefix.trim_end_matches('/');
        let url = format!("{}?ref={}", self.url(trimmed), self.branch);
        let response = self.request(reqwest::Method::GET, &url).send().await?;

        match response.status().as_u16() {
            // Dossier absent : catalogue vide, pas une erreur.
            404 => Ok(Vec::new()),
            200 => {
                let entries: Vec<DirEntry> = response.json().await?;
                Ok(entries
                    .into_iter()
                    .filter(|e| e.name.ends_with(".json"))
                    .map(|e| e.path)
                    .collect())
            }
            status => Err(Error::Status {
                status,
                path: trimmed.to_string(),
            }),
        }
    }
}
