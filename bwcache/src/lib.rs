//! # bwcache - Stockage local de l'appareil pour BeatWave
//!
//! Cette crate fournit l'état persistant côté appareil :
//! - un cache clé/valeur à TTL pour le catalogue de pistes ([`LocalCache`]),
//!   servi périmé uniquement en mode dégradé ;
//! - les stores typés équivalents du localStorage historique ([`stores`]) :
//!   session, likes, follows, historique plafonné, garde-fou de lecture
//!   journalier, identifiant d'appareil.
//!
//! Le tout partage une unique base SQLite ([`db::DB`]). Politique d'erreur :
//! une donnée persistée corrompue vaut absence, jamais un crash de
//! l'appelant.

pub mod cache;
pub mod db;
pub mod stores;

pub use cache::{Cached, LocalCache, DEFAULT_TTL};
pub use db::DB;
pub use stores::{
    device_id, FollowSet, HistoryEntry, LikeSet, PlayGate, PlayHistory, SessionAccount,
    SessionStore, HISTORY_LIMIT, STORE_PREFIX,
};

/// Erreurs d'écriture du stockage local
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type Result spécialisé pour bwcache
pub type Result<T> = std::result::Result<T, Error>;
