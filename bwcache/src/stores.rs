//! Stores typés persistés sur l'appareil (équivalent du localStorage) :
//! session courante, likes, follows, historique de lecture, garde-fou de
//! lecture journalier et identifiant d'appareil.
//!
//! Aucun de ces stores n'expire par TTL : ils sont écrasés explicitement.
//! Une entrée illisible est traitée comme absente et réinitialisée aux
//! valeurs par défaut, jamais remontée comme erreur fatale.

use crate::db::DB;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

/// Préfixe historique des clés du stockage local.
pub const STORE_PREFIX: &str = "soundwave_";

/// Taille maximale de l'historique de lecture.
pub const HISTORY_LIMIT: usize = 100;

fn load_or_default<T: Default + serde::de::DeserializeOwned>(db: &DB, key: &str) -> T {
    match db.get(key) {
        Ok(Some(entry)) => serde_json::from_str(&entry.payload).unwrap_or_else(|e| {
            warn!(key = %key, error = %e, "Corrupt persisted state, resetting to defaults");
            T::default()
        }),
        Ok(None) => T::default(),
        Err(e) => {
            warn!(key = %key, error = %e, "Local store unavailable, using defaults");
            T::default()
        }
    }
}

fn save<T: Serialize>(db: &DB, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(payload) => {
            if let Err(e) = db.put(key, &payload) {
                warn!(key = %key, error = %e, "Failed to persist local state");
            }
        }
        Err(e) => warn!(key = %key, error = %e, "Failed to serialize local state"),
    }
}

/// Compte actuellement connecté sur l'appareil.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionAccount {
    pub username: String,
    pub signed_in_at: DateTime<Utc>,
}

/// Session persistée de l'appareil.
#[derive(Clone)]
pub struct SessionStore {
    db: Arc<DB>,
}

impl SessionStore {
    pub fn new(db: Arc<DB>) -> Self {
        Self { db }
    }

    fn key() -> String {
        format!("{}user", STORE_PREFIX)
    }

    pub fn current(&self) -> Option<SessionAccount> {
        load_or_default::<Option<SessionAccount>>(&self.db, &Self::key())
    }

    pub fn sign_in(&self, username: &str) {
        let account = SessionAccount {
            username: username.to_string(),
            signed_in_at: Utc::now(),
        };
        save(&self.db, &Self::key(), &Some(account));
    }

    pub fn sign_out(&self) {
        if let Err(e) = self.db.delete(&Self::key()) {
            warn!(error = %e, "Failed to clear session");
        }
    }
}

/// Set de likes d'un compte, miroir local du compteur distant.
#[derive(Clone)]
pub struct LikeSet {
    db: Arc<DB>,
    username: String,
}

impl LikeSet {
    pub fn new(db: Arc<DB>, username: &str) -> Self {
        Self {
            db,
            username: username.to_string(),
        }
    }

    fn key(&self) -> String {
        format!("{}likes_{}", STORE_PREFIX, self.username)
    }

    pub fn all(&self) -> HashSet<String> {
        load_or_default(&self.db, &self.key())
    }

    pub fn contains(&self, track_id: &str) -> bool {
        self.all().contains(track_id)
    }

    /// Bascule l'appartenance et retourne `true` si la piste est désormais
    /// likée.
    pub fn toggle(&self, track_id: &str) -> bool {
        let mut likes = self.all();
        let now_liked = if likes.remove(track_id) {
            false
        } else {
            likes.insert(track_id.to_string());
            true
        };
        save(&self.db, &self.key(), &likes);
        now_liked
    }
}

/// Artistes suivis par un compte.
#[derive(Clone)]
pub struct FollowSet {
    db: Arc<DB>,
    username: String,
}

impl FollowSet {
    pub fn new(db: Arc<DB>, username: &str) -> Self {
        Self {
            db,
            username: username.to_string(),
        }
    }

    fn key(&self) -> String {
        format!("{}follows_{}", STORE_PREFIX, self.username)
    }

    pub fn all(&self) -> HashSet<String> {
        load_or_default(&self.db, &self.key())
    }

    pub fn is_following(&self, artist: &str) -> bool {
        self.all().contains(artist)
    }

    /// Retourne `false` si l'artiste était déjà suivi.
    pub fn follow(&self, artist: &str) -> bool {
        let mut follows = self.all();
        let added = follows.insert(artist.to_string());
        if added {
            save(&self.db, &self.key(), &follows);
        }
        added
    }

    /// Retourne `false` si l'artiste n'était pas suivi.
    pub fn unfollow(&self, artist: &str) -> bool {
        let mut follows = self.all();
        let removed = follows.remove(artist);
        if removed {
            save(&self.db, &self.key(), &follows);
        }
        removed
    }
}

/// Entrée d'historique de lecture.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub timestamp: DateTime<Utc>,
}

/// Historique de lecture, du plus récent au plus ancien, plafonné à
/// [`HISTORY_LIMIT`] entrées.
#[derive(Clone)]
pub struct PlayHistory {
    db: Arc<DB>,
}

impl PlayHistory {
    pub fn new(db: Arc<DB>) -> Self {
        Self { db }
    }

    fn key() -> String {
        format!("{}history", STORE_PREFIX)
    }

    pub fn record(&self, id: &str, title: &str, artist: &str) {
        let mut history: Vec<HistoryEntry> = load_or_default(&self.db, &Self::key());
        history.insert(
            0,
            HistoryEntry {
                id: id.to_string(),
                title: title.to_string(),
                artist: artist.to_string(),
                timestamp: Utc::now(),
            },
        );
        history.truncate(HISTORY_LIMIT);
        save(&self.db, &Self::key(), &history);
    }

    pub fn list(&self, limit: usize) -> Vec<HistoryEntry> {
        let mut history: Vec<HistoryEntry> = load_or_default(&self.db, &Self::key());
        history.truncate(limit);
        history
    }

    pub fn clear(&self) {
        save(&self.db, &Self::key(), &Vec::<HistoryEntry>::new());
    }
}

/// Garde-fou de lecture côté appareil : une (piste, origine) ne compte
/// qu'une fois par jour calendaire. Les jours précédents sont purgés au fil
/// de l'eau quand un nouveau jour commence.
#[derive(Clone)]
pub struct PlayGate {
    db: Arc<DB>,
}

impl PlayGate {
    pub fn new(db: Arc<DB>) -> Self {
        Self { db }
    }

    fn key_for_today() -> String {
        format!("{}plays_{}", STORE_PREFIX, Utc::now().date_naive())
    }

    pub fn already_counted(&self, track_id: &str, origin: &str) -> bool {
        let seen: HashSet<String> = load_or_default(&self.db, &Self::key_for_today());
        seen.contains(&format!("{}_{}", track_id, origin))
    }

    /// Marque la lecture et retourne `true` si elle doit être comptée
    /// (première de la journée pour ce couple piste/origine).
    pub fn mark(&self, track_id: &str, origin: &str) -> bool {
        let today_key = Self::key_for_today();
        let mut seen: HashSet<String> = load_or_default(&self.db, &today_key);
        let inserted = seen.insert(format!("{}_{}", track_id, origin));
        if inserted {
            save(&self.db, &today_key, &seen);
            self.prune(&today_key);
        }
        inserted
    }

    fn prune(&self, today_key: &str) {
        let prefix = format!("{}plays_", STORE_PREFIX);
        if let Ok(keys) = self.db.keys_with_prefix(&prefix) {
            for key in keys.iter().filter(|k| k.as_str() != today_key) {
                let _ = self.db.delete(key);
            }
        }
    }
}

/// Identifiant d'appareil best-effort, généré une fois et persisté.
///
/// Sert de clé d'origine pour la suppression de doublons quand aucun compte
/// n'est connecté. Falsifiable par construction : c'est un limiteur, pas une
/// frontière de sécurité.
pub fn device_id(db: &DB) -> String {
    let key = format!("{}device_id", STORE_PREFIX);
    if let Ok(Some(entry)) = db.get(&key) {
        if let Ok(id) = serde_json::from_str::<String>(&entry.payload) {
            return id;
        }
    }
    let id = uuid::Uuid::new_v4().to_string();
    save(db, &key, &id);
    id
}
