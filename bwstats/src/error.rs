//! Types d'erreurs pour bwstats

/// Erreurs du service de réconciliation des compteurs
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Track not found: {0}")]
    TrackNotFound(String),

    /// L'opération exige un compte connecté.
    #[error("Authentication required")]
    Unauthenticated,

    /// Écriture conditionnelle rejetée à chaque tentative.
    #[error("Too many write conflicts on: {0}")]
    ConflictRetriesExhausted(String),

    #[error(transparent)]
    Store(#[from] bwstore::Error),
}

/// Type Result spécialisé pour bwstats
pub type Result<T> = std::result::Result<T, Error>;
