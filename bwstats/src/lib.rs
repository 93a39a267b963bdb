//! # bwstats - Réconciliation des compteurs BeatWave
//!
//! Service qui applique lectures, likes et commentaires sur les documents
//! du magasin ([`bwstore`]) : `tracks/{id}.json` porte les compteurs
//! agrégés, `stats/{id}.json` le journal de suppression des lectures.
//!
//! Toutes les écritures passent par une boucle de concurrence optimiste :
//! lecture avec version, écriture conditionnelle, relecture en cas de
//! conflit. Au-delà du nombre de tentatives configuré, l'appelant reçoit
//! [`Error::ConflictRetriesExhausted`] et décide quoi faire.

mod error;

pub use error::{Error, Result};

use bwmetadata::{PlayEvent, PlayStats, Track};
use bwstore::{read_json, write_json, BlobStore};
use chrono::{Duration, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Origine d'une lecture : compte connecté ou appareil anonyme.
///
/// La clé de suppression journalière est dérivée de cette origine. Un
/// client peut forger une origine inédite pour être compté plusieurs
/// fois ; c'est une limite assumée du modèle, pas un garde-fou.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Compte connecté, identifié par son nom d'utilisateur.
    Account(String),
    /// Appareil anonyme, identifié par son UUID persisté.
    Device(String),
}

impl Origin {
    /// Identifiant brut servant de préfixe à la clé de suppression.
    pub fn id(&self) -> &str {
        match self {
            Origin::Account(name) => name,
            Origin::Device(id) => id,
        }
    }

    /// Clé de suppression `"{origine}-{AAAA-MM-JJ}"` pour un jour donné.
    fn suppression_key(&self, day: NaiveDate) -> String {
        format!("{}-{}", self.id(), day.format("%Y-%m-%d"))
    }
}

/// Résultat d'un enregistrement de lecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    /// La lecture a été comptée : nouveaux totaux.
    Counted { plays: u64, unique_players: usize },
    /// Même origine, même jour : le compteur n'a pas bougé.
    AlreadyCounted { plays: u64 },
}

/// Service de réconciliation des compteurs sur le magasin de documents.
pub struct CounterService {
    store: Arc<dyn BlobStore>,
    /// Rétention du journal de lectures, en jours.
    retention_days: i64,
    /// Tentatives maximales d'une écriture conditionnelle.
    max_attempts: u32,
}

fn track_path(track_id: &str) -> String {
    format!("tracks/{track_id}.json")
}

fn stats_path(track_id: &str) -> String {
    format!("stats/{track_id}.json")
}

impl CounterService {
    pub fn new(store: Arc<dyn BlobStore>, retention_days: i64, max_attempts: u32) -> Self {
        Self {
            store,
            retention_days,
            max_attempts,
        }
    }

    /// Enregistre une lecture pour une origine donnée.
    ///
    /// Une origine n'est comptée qu'une fois par jour calendaire (UTC) et
    /// par piste. Le journal de suppression est émondé au passage : les
    /// évènements plus vieux que la rétention disparaissent. Le journal
    /// est écrit avant le compteur, de sorte qu'une relance après échec
    /// partiel ne compte jamais deux fois la même lecture.
    pub async fn record_play(&self, track_id: &str, origin: &Origin) -> Result<PlayOutcome> {
        let today = Utc::now().date_naive();
        let key = origin.suppression_key(today);

        if !self.mark_played(track_id, origin, &key).await? {
            let plays = self.read_track(track_id).await?.0.plays;
            debug!("Play already counted today for {track_id} ({key})");
            return Ok(PlayOutcome::AlreadyCounted { plays });
        }

        let track = self
            .update_track(track_id, |track| track.plays += 1)
            .await?;
        let unique_players = self.read_stats(track_id).await?.0.unique_players.len();
        debug!("Play counted for {track_id}: {} total", track.plays);
        Ok(PlayOutcome::Counted {
            plays: track.plays,
            unique_players,
        })
    }

    /// Applique un like (ou son retrait) au compteur d'une piste.
    ///
    /// Exige un compte connecté. Le retrait d'un like plafonne à zéro :
    /// le compteur ne devient jamais négatif même si les états client et
    /// serveur ont divergé. Renvoie le nouveau total.
    pub async fn toggle_like(
        &self,
        track_id: &str,
        account: Option<&str>,
        liked: bool,
    ) -> Result<u64> {
        if account.is_none() {
            return Err(Error::Unauthenticated);
        }

        let track = self
            .update_track(track_id, |track| {
                if liked {
                    track.likes += 1;
                } else {
                    track.likes = track.likes.saturating_sub(1);
                }
            })
            .await?;
        Ok(track.likes)
    }

    /// Incrémente le compteur de commentaires d'une piste.
    pub async fn bump_comment_count(&self, track_id: &str) -> Result<u64> {
        let track = self
            .update_track(track_id, |track| track.comments += 1)
            .await?;
        Ok(track.comments)
    }

    /// Statistiques de lecture d'une piste (document vide si inédite).
    pub async fn play_stats(&self, track_id: &str) -> Result<PlayStats> {
        Ok(self.read_stats(track_id).await?.0)
    }

    /// Ajoute l'évènement au journal de suppression si l'origine n'a pas
    /// déjà été comptée aujourd'hui. Renvoie `true` si la lecture doit
    /// être comptée.
    async fn mark_played(&self, track_id: &str, origin: &Origin, key: &str) -> Result<bool> {
        let path = stats_path(track_id);
        let cutoff = Utc::now() - Duration::days(self.retention_days);

        for attempt in 0..self.max_attempts {
            let (mut stats, version) = self.read_stats(track_id).await?;

            if stats.plays.iter().any(|event| event.key == key) {
                return Ok(false);
            }

            stats.track_id = track_id.to_string();
            stats.plays.retain(|event| event.timestamp >= cutoff);
            stats.plays.push(PlayEvent {
                key: key.to_string(),
                username: origin.id().to_string(),
                timestamp: Utc::now(),
            });
            if let Origin::Account(name) = origin {
                if !stats.unique_players.iter().any(|p| p == name) {
                    stats.unique_players.push(name.clone());
                }
            }

            match write_json(self.store.as_ref(), &path, &stats, version.as_ref()).await {
                Ok(_) => return Ok(true),
                Err(bwstore::Error::Conflict(_)) => {
                    warn!("Write conflict on {path} (attempt {})", attempt + 1);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::ConflictRetriesExhausted(path))
    }

    /// Boucle lecture/modification/écriture conditionnelle sur une piste.
    async fn update_track<F>(&self, track_id: &str, mut mutate: F) -> Result<Track>
    where
        F: FnMut(&mut Track),
    {
        let path = track_path(track_id);

        for attempt in 0..self.max_attempts {
            let (mut track, version) = self.read_track(track_id).await?;
            mutate(&mut track);

            match write_json(self.store.as_ref(), &path, &track, Some(&version)).await {
                Ok(_) => return Ok(track),
                Err(bwstore::Error::Conflict(_)) => {
                    warn!("Write conflict on {path} (attempt {})", attempt + 1);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::ConflictRetriesExhausted(path))
    }

    async fn read_track(&self, track_id: &str) -> Result<(Track, bwstore::Version)> {
        read_json(self.store.as_ref(), &track_path(track_id))
            .await?
            .ok_or_else(|| Error::TrackNotFound(track_id.to_string()))
    }

    async fn read_stats(&self, track_id: &str) -> Result<(PlayStats, Option<bwstore::Version>)> {
        match read_json(self.store.as_ref(), &stats_path(track_id)).await? {
            Some((stats, version)) => Ok((stats, Some(version))),
            None => Ok((PlayStats::default(), None)),
        }
    }
}
