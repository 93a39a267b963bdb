//! Client de l'API REST BeatWave.
//!
//! Le contrat [`ApiClient`] isole la session du transport : la production
//! passe par [`HttpApi`] (reqwest), les tests par un stub en mémoire.

use crate::error::{Error, Result};
use async_trait::async_trait;
use bwmetadata::{Profile, Track};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

/// Opérations distantes dont la session a besoin.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Récupère la collection complète de pistes.
    async fn fetch_tracks(&self) -> Result<Vec<Track>>;

    /// Enregistre une lecture ; renvoie le total de lectures de la piste.
    async fn record_play(&self, track_id: &str, username: &str) -> Result<u64>;

    /// Applique un like (ou son retrait) ; renvoie le total de likes.
    async fn toggle_like(&self, track_id: &str, username: &str, liked: bool) -> Result<u64>;

    /// Profil public et son jeton de version opaque.
    async fn fetch_profile(&self, username: &str) -> Result<(Profile, Option<String>)>;

    /// Sauvegarde un profil ; `sha` absent = écrasement aveugle.
    async fn save_profile(
        &self,
        username: &str,
        profile: &Profile,
        sha: Option<&str>,
    ) -> Result<()>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracksEnvelope {
    success: bool,
    #[serde(default)]
    tracks: Vec<Track>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayEnvelope {
    success: bool,
    #[serde(default)]
    plays: u64,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LikeEnvelope {
    success: bool,
    #[serde(default)]
    likes: u64,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileEnvelope {
    success: bool,
    profile: Option<Profile>,
    sha: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveProfileBody<'a> {
    action: &'a str,
    username: &'a str,
    profile: &'a Profile,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

fn api_error(error: Option<String>) -> Error {
    Error::Api(error.unwrap_or_else(|| "unspecified server error".to_string()))
}

/// Client HTTP de production.
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Construit le client depuis la configuration BeatWave.
    pub fn from_config() -> Result<Self> {
        let config = bwconfig::get_config();
        Self::new(&config.get_api_base_url(), config.get_api_timeout())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ApiClient for HttpApi {
    async fn fetch_tracks(&self) -> Result<Vec<Track>> {
        let envelope: TracksEnvelope = self
            .client
            .get(self.url("/tracks"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if !envelope.success {
            return Err(api_error(envelope.error));
        }
        Ok(envelope.tracks)
    }

    async fn record_play(&self, track_id: &str, username: &str) -> Result<u64> {
        let envelope: PlayEnvelope = self
            .client
            .post(self.url(&format!("/tracks/{track_id}/play")))
            .json(&json!({ "username": username }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if !envelope.success {
            return Err(api_error(envelope.error));
        }
        Ok(envelope.plays)
    }

    async fn toggle_like(&self, track_id: &str, username: &str, liked: bool) -> Result<u64> {
        let envelope: LikeEnvelope = self
            .client
            .post(self.url(&format!("/tracks/{track_id}/like")))
            .json(&json!({ "username": username, "liked": liked }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if !envelope.success {
            return Err(api_error(envelope.error));
        }
        Ok(envelope.likes)
    }

    async fn fetch_profile(&self, username: &str) -> Result<(Profile, Option<String>)> {
        let envelope: ProfileEnvelope = self
            .client
            .get(self.url("/profile"))
            .query(&[("username", username)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if !envelope.success {
            return Err(api_error(envelope.error));
        }
        let profile = envelope
            .profile
            .unwrap_or_else(|| Profile::default_for(username));
        Ok((profile, envelope.sha))
    }

    async fn save_profile(
        &self,
        username: &str,
        profile: &Profile,
        sha: Option<&str>,
    ) -> Result<()> {
        let body = SaveProfileBody {
            action: "save",
            username,
            profile,
            sha,
        };
        let envelope: ProfileEnvelope = self
            .client
            .post(self.url("/profile"))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if !envelope.success {
            return Err(api_error(envelope.error));
        }
        Ok(())
    }
}
