//! Blob store en mémoire pour les tests et le mode local.

use crate::{BlobStore, Error, Result, Version};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Implémentation en mémoire de [`BlobStore`].
///
/// Les jetons de version sont un compteur monotone global : chaque écriture
/// réussie produit un jeton frais, ce qui reproduit la sémantique du `sha`
/// GitHub sans dépendre du contenu.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, (Vec<u8>, Version)>>,
    counter: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_version(&self) -> Version {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        Version(format!("v{}", n))
    }

    /// Nombre de documents stockés (utilitaire de test).
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn read(&self, path: &str) -> Result<Option<(Vec<u8>, Version)>> {
        let documents = self.documents.read().await;
        Ok(documents.get(path).cloned())
    }

    async fn write(
        &self,
        path: &str,
        content: &[u8],
        expected: Option<&Version>,
    ) -> Result<Version> {
        let mut documents = self.documents.write().await;

        if let Some(expected) = expected {
            match documents.get(path) {
                Some((_, current)) if current != expected => {
                    return Err(Error::Conflict(path.to_string()));
                }
                // Jeton fourni pour un document disparu : écrivain concurrent.
                None => return Err(Error::Conflict(path.to_string())),
                _ => {}
            }
        }

        let version = self.next_version();
        documents.insert(path.to_string(), (content.to_vec(), version.clone()));
        Ok(version)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let normalized = if prefix.ends_with('/') {
            prefix.to_string()
        } else {
            format!("{}/", prefix)
        };
        let documents = self.documents.read().await;
        let mut paths: Vec<String> = documents
            .keys()
            .filter(|k| k.starts_with(&normalized))
            .cloned()
            .collect();
        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_missing_is_none() {
        let store = MemoryStore::new();
        assert!(store.read("tracks/nope.json").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let store = MemoryStore::new();
        let v1 = store.write("tracks/t1.json", b"{}", None).await.unwrap();
        let (bytes, version) = store.read("tracks/t1.json").await.unwrap().unwrap();
        assert_eq!(bytes, b"{}");
        assert_eq!(version, v1);
    }

    #[tokio::test]
    async fn test_conditional_write_conflict() {
        let store = MemoryStore::new();
        let v1 = store.write("doc.json", b"a", None).await.unwrap();
        // Un écrivain concurrent passe derrière nous.
        store.write("doc.json", b"b", None).await.unwrap();

        let err = store.write("doc.json", b"c", Some(&v1)).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        // Le contenu de l'écrivain gagnant est intact.
        let (bytes, _) = store.read("doc.json").await.unwrap().unwrap();
        assert_eq!(bytes, b"b");
    }

    #[tokio::test]
    async fn test_conditional_write_with_fresh_token() {
        let store = MemoryStore::new();
        let v1 = store.write("doc.json", b"a", None).await.unwrap();
        let v2 = store.write("doc.json", b"b", Some(&v1)).await.unwrap();
        assert_ne!(v1, v2);
    }

    #[tokio::test]
    async fn test_list_prefix() {
        let store = MemoryStore::new();
        store.write("tracks/t1.json", b"{}", None).await.unwrap();
        store.write("tracks/t2.json", b"{}", None).await.unwrap();
        store.write("stats/t1.json", b"{}", None).await.unwrap();

        let listed = store.list("tracks").await.unwrap();
        assert_eq!(listed, vec!["tracks/t1.json", "tracks/t2.json"]);
        assert!(store.list("profiles").await.unwrap().is_empty());
    }
}
