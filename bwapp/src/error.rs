//! Types d'erreurs pour bwapp

/// Erreurs du contexte de session applicatif
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// L'opération exige un compte connecté sur cet appareil.
    #[error("No account signed in")]
    NotSignedIn,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// Le serveur a répondu `success: false`.
    #[error("API error: {0}")]
    Api(String),

    #[error(transparent)]
    Cache(#[from] bwcache::Error),

    #[error(transparent)]
    Playback(#[from] bwplayback::Error),
}

/// Type Result spécialisé pour bwapp
pub type Result<T> = std::result::Result<T, Error>;
