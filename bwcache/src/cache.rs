//! Cache local à durée de vie (TTL).
//!
//! Équivalent du cache de catalogue côté appareil : une entrée est un couple
//! (payload, horodatage de capture). Une lecture est un hit frais si
//! `maintenant - capture <= TTL` ; une entrée périmée n'est servie que sur
//! demande explicite, en mode dégradé quand l'origine ne répond pas.
//!
//! Toute donnée persistée corrompue est traitée comme un miss (la ligne est
//! supprimée) ; `get` ne remonte jamais d'erreur à l'appelant.

use crate::db::DB;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// TTL de fraîcheur par défaut : 5 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Valeur servie par le cache, avec son état de fraîcheur.
#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub value: T,
    /// `true` si l'entrée est dans sa fenêtre de TTL.
    pub fresh: bool,
    pub captured_at: DateTime<Utc>,
}

/// Cache clé/valeur TTL au-dessus du stockage local.
#[derive(Clone)]
pub struct LocalCache {
    db: Arc<DB>,
    ttl: Duration,
}

impl LocalCache {
    pub fn new(db: Arc<DB>, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Enregistre un payload avec l'horodatage courant.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), crate::Error> {
        let payload = serde_json::to_string(value)?;
        self.db.put(key, &payload)?;
        Ok(())
    }

    /// Hit uniquement si l'entrée est fraîche.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.fetch(key, false).map(|cached| cached.value)
    }

    /// Hit même périmé : réservé au repli quand l'origine est injoignable.
    pub fn get_even_stale<T: DeserializeOwned>(&self, key: &str) -> Option<Cached<T>> {
        self.fetch(key, true)
    }

    fn fetch<T: DeserializeOwned>(&self, key: &str, ignore_expiry: bool) -> Option<Cached<T>> {
        let entry = match self.db.get(key) {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "Local store read failed, treating as miss");
                return None;
            }
        };

        let captured_at = match DateTime::parse_from_rfc3339(&entry.captured_at) {
            Ok(ts) => ts.with_timezone(&Utc),
            Err(_) => {
                warn!(key = %key, "Corrupt capture timestamp, dropping entry");
                let _ = self.db.delete(key);
                return None;
            }
        };

        let age = Utc::now().signed_duration_since(captured_at);
        let fresh = age.to_std().map(|a| a <= self.ttl).unwrap_or(true);

        if !fresh && !ignore_expiry {
            debug!(key = %key, "Cache entry expired");
            return None;
        }

        match serde_json::from_str(&entry.payload) {
            Ok(value) => Some(Cached {
                value,
                fresh,
                captured_at,
            }),
            Err(e) => {
                warn!(key = %key, error = %e, "Corrupt cached payload, dropping entry");
                let _ = self.db.delete(key);
                None
            }
        }
    }

    /// Invalide une entrée.
    pub fn invalidate(&self, key: &str) {
        if let Err(e) = self.db.delete(key) {
            warn!(key = %key, error = %e, "Failed to invalidate cache entry");
        }
    }
}
