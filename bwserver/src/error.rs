//! Types d'erreurs pour bwserver

/// Erreurs de la couche service REST
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    /// Compte inconnu, mot de passe ou clé secrète invalide. Le détail
    /// n'est pas distingué pour ne rien apprendre à l'appelant.
    #[error("Invalid credentials")]
    BadCredentials,

    #[error(transparent)]
    Stats(#[from] bwstats::Error),

    #[error(transparent)]
    Store(#[from] bwstore::Error),
}

/// Type Result spécialisé pour bwserver
pub type Result<T> = std::result::Result<T, Error>;
