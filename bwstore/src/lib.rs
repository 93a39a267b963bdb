//! # bwstore - Client de blob store versionné pour BeatWave
//!
//! Cette crate fournit l'accès au magasin de documents nommés qui sert de
//! "base de données" à BeatWave : chaque objet (piste, profil, statistiques,
//! commentaires) est un document JSON individuel, lu avec un jeton de version
//! opaque et réécrit conditionnellement avec ce jeton pour détecter les
//! écritures concurrentes.
//!
//! ## Vue d'ensemble
//!
//! - [`BlobStore`] : le contrat lecture/écriture-conditionnelle/listage.
//! - [`GithubStore`] : implémentation sur l'API Contents de GitHub
//!   (le `sha` du fichier est le jeton de version).
//! - [`MemoryStore`] : implémentation en mémoire pour les tests et le mode
//!   local, avec jetons de version monotones.
//!
//! Une écriture sans jeton (`expected = None`) est inconditionnelle :
//! dernier écrivain gagnant. Les appelants qui veulent éviter les pertes de
//! mise à jour doivent fournir le jeton obtenu lors d'une lecture préalable
//! (voir la boucle de réconciliation dans `bwstats`).

pub mod error;
pub mod github;
pub mod memory;

pub use error::{Error, Result};
pub use github::GithubStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Jeton de version opaque retourné à chaque lecture et exigé (s'il est
/// fourni) à l'écriture pour éviter d'écraser silencieusement un écrivain
/// concurrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version(pub String);

impl Version {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Contrat du magasin de documents versionnés.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Lit un document ; `None` si le chemin n'existe pas.
    async fn read(&self, path: &str) -> Result<Option<(Vec<u8>, Version)>>;

    /// Écrit un document.
    ///
    /// Avec `expected = Some(v)`, l'écriture échoue en [`Error::Conflict`]
    /// si le document a changé depuis la lecture de `v`. Avec `None`,
    /// l'écriture est inconditionnelle (dernier écrivain gagnant).
    async fn write(
        &self,
        path: &str,
        content: &[u8],
        expected: Option<&Version>,
    ) -> Result<Version>;

    /// Liste les chemins des documents sous un préfixe (dossier).
    ///
    /// Un préfixe inexistant retourne une liste vide, pas une erreur.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Lit et désérialise un document JSON.
pub async fn read_json<T: DeserializeOwned>(
    store: &dyn BlobStore,
    path: &str,
) -> Result<Option<(T, Version)>> {
    match store.read(path).await? {
        None => Ok(None),
        Some((bytes, version)) => {
            let value = serde_json::from_slice(&bytes).map_err(|e| Error::Malformed {
                path: path.to_string(),
                detail: e.to_string(),
            })?;
            Ok(Some((value, version)))
        }
    }
}

/// Sérialise et écrit un document JSON.
pub async fn write_json<T: Serialize>(
    store: &dyn BlobStore,
    path: &str,
    value: &T,
    expected: Option<&Version>,
) -> Result<Version> {
    let bytes = serde_json::to_vec_pretty(value)?;
    store.write(path, &bytes, expected).await
}
