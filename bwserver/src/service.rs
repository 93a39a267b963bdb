//! Couche service au-dessus du magasin de documents.
//!
//! [`Library`] regroupe les opérations que la surface REST expose :
//! collection de pistes, profils, commentaires, comptes. Les compteurs
//! passent par le service de réconciliation de [`bwstats`].

use crate::error::{Error, Result};
use bwmetadata::{Comment, Profile, Track, UserAccount};
use bwstats::{CounterService, Origin, PlayOutcome};
use bwstore::{read_json, write_json, BlobStore, Version};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{info, warn};

fn track_path(id: &str) -> String {
    format!("tracks/{id}.json")
}

fn profile_path(username: &str) -> String {
    format!("profiles/{username}.json")
}

fn comments_path(track_id: &str) -> String {
    format!("comments/{track_id}.json")
}

fn user_path(username: &str) -> String {
    format!("users/{username}.json")
}

fn credential_hash(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Bibliothèque BeatWave servie par l'API REST.
pub struct Library {
    store: Arc<dyn BlobStore>,
    counters: CounterService,
    max_attempts: u32,
}

impl Library {
    pub fn new(store: Arc<dyn BlobStore>, retention_days: i64, max_attempts: u32) -> Self {
        Self {
            counters: CounterService::new(store.clone(), retention_days, max_attempts),
            store,
            max_attempts,
        }
    }

    /// Collection complète. Un dossier absent vaut collection vide ; un
    /// document illisible est ignoré avec un avertissement, jamais fatal
    /// pour le reste de la liste.
    pub async fn list_tracks(&self) -> Result<Vec<Track>> {
        let mut tracks = Vec::new();
        for path in self.store.list("tracks/").await? {
            match read_json::<Track>(self.store.as_ref(), &path).await {
                Ok(Some((track, _))) => tracks.push(track),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable track document {path}: {e}"),
            }
        }
        Ok(tracks)
    }

    /// Sauvegarde legacy de la collection entière, dernier écrivain
    /// gagnant. Renvoie le nombre de pistes écrites.
    pub async fn save_tracks(&self, tracks: &[Track]) -> Result<usize> {
        for track in tracks {
            write_json(self.store.as_ref(), &track_path(&track.id), track, None).await?;
        }
        info!("Saved {} tracks", tracks.len());
        Ok(tracks.len())
    }

    /// Recherche plein-texte, insensible à la casse, plafonnée.
    pub async fn search(&self, query: &str) -> Result<Vec<Track>> {
        let tracks = self.list_tracks().await?;
        Ok(bwcatalog::search(&tracks, query))
    }

    pub async fn record_play(&self, track_id: &str, origin: &Origin) -> Result<PlayOutcome> {
        Ok(self.counters.record_play(track_id, origin).await?)
    }

    pub async fn toggle_like(
        &self,
        track_id: &str,
        account: Option<&str>,
        liked: bool,
    ) -> Result<u64> {
        Ok(self.counters.toggle_like(track_id, account, liked).await?)
    }

    pub async fn play_stats(&self, track_id: &str) -> Result<bwmetadata::PlayStats> {
        Ok(self.counters.play_stats(track_id).await?)
    }

    /// Profil public et son jeton de version. Un profil absent est
    /// synthétisé par défaut plutôt que de renvoyer une erreur.
    pub async fn get_profile(&self, username: &str) -> Result<(Profile, Option<Version>)> {
        match read_json::<Profile>(self.store.as_ref(), &profile_path(username)).await? {
            Some((profile, version)) => Ok((profile, Some(version))),
            None => Ok((Profile::default_for(username), None)),
        }
    }

    /// Sauvegarde un profil.
    ///
    /// `expected` est le jeton de version rendu par [`Self::get_profile`] ;
    /// son omission est un écrasement aveugle. Un jeton périmé remonte en
    /// [`bwstore::Error::Conflict`].
    pub async fn save_profile(
        &self,
        username: &str,
        profile: &Profile,
        expected: Option<&Version>,
    ) -> Result<Version> {
        let version =
            write_json(self.store.as_ref(), &profile_path(username), profile, expected).await?;
        Ok(version)
    }

    /// Commentaires d'une piste, du plus ancien au plus récent.
    pub async fn comments(&self, track_id: &str) -> Result<Vec<Comment>> {
        match read_json::<Vec<Comment>>(self.store.as_ref(), &comments_path(track_id)).await? {
            Some((comments, _)) => Ok(comments),
            None => Ok(Vec::new()),
        }
    }

    /// Ajoute un commentaire et avance le compteur de la piste.
    pub async fn add_comment(
        &self,
        track_id: &str,
        username: &str,
        text: &str,
    ) -> Result<Comment> {
        let path = comments_path(track_id);
        let comment = Comment::new(username, text);

        let mut attempt = 0;
        loop {
            let (mut comments, version) =
                match read_json::<Vec<Comment>>(self.store.as_ref(), &path).await? {
                    Some((comments, version)) => (comments, Some(version)),
                    None => (Vec::new(), None),
                };
            comments.push(comment.clone());

            match write_json(self.store.as_ref(), &path, &comments, version.as_ref()).await {
                Ok(_) => break,
                Err(bwstore::Error::Conflict(_)) if attempt + 1 < self.max_attempts => {
                    attempt += 1;
                    warn!("Write conflict on {path} (attempt {attempt})");
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.counters.bump_comment_count(track_id).await?;
        Ok(comment)
    }

    /// Crée un compte et délivre sa clé secrète, une seule fois.
    ///
    /// La clé est renvoyée en clair à l'appelant et seul son hash est
    /// persisté : elle n'est jamais récupérable ensuite.
    pub async fn signup(&self, username: &str, password: &str) -> Result<String> {
        let path = user_path(username);
        if self.store.read(&path).await?.is_some() {
            return Err(Error::UsernameTaken(username.to_string()));
        }

        let secret_key = uuid::Uuid::new_v4().to_string();
        let account = UserAccount {
            username: username.to_string(),
            password_hash: credential_hash(password),
            secret_key_hash: credential_hash(&secret_key),
            created_at: Some(Utc::now()),
            followers: Vec::new(),
            following: Vec::new(),
            verified: false,
        };
        write_json(self.store.as_ref(), &path, &account, None).await?;
        info!("Account created: {username}");
        Ok(secret_key)
    }

    /// Vérifie mot de passe et clé secrète. Tout échec est la même
    /// erreur [`Error::BadCredentials`].
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        secret_key: &str,
    ) -> Result<UserAccount> {
        let account = read_json::<UserAccount>(self.store.as_ref(), &user_path(username))
            .await?
            .map(|(account, _)| account)
            .ok_or(Error::BadCredentials)?;

        if account.password_hash != credential_hash(password)
            || account.secret_key_hash != credential_hash(secret_key)
        {
            return Err(Error::BadCredentials);
        }
        Ok(account)
    }
}
