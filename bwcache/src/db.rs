//! Base de données SQLite du stockage local de l'appareil.
//!
//! Une seule table clé/valeur : la valeur est un payload JSON et chaque ligne
//! porte son horodatage de capture (RFC3339), ce qui permet au cache TTL et
//! aux stores typés de partager le même fichier.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// Ligne brute du stockage local.
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub payload: String,
    /// Horodatage de capture (RFC3339).
    pub captured_at: String,
}

/// Base de données du stockage local
#[derive(Debug)]
pub struct DB {
    conn: Mutex<Connection>,
}

impl DB {
    /// Ouvre (ou crée) la base au chemin donné.
    pub fn init(path: &Path) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS local_store (
                key TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                captured_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Base en mémoire (tests).
    pub fn init_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS local_store (
                key TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                captured_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insère ou remplace une entrée, horodatée à maintenant.
    pub fn put(&self, key: &str, payload: &str) -> rusqlite::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO local_store (key, payload, captured_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                 payload = excluded.payload,
                 captured_at = excluded.captured_at",
            params![key, payload, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Récupère une entrée par sa clé.
    pub fn get(&self, key: &str) -> rusqlite::Result<Option<RawEntry>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT payload, captured_at FROM local_store WHERE key = ?1",
            [key],
            |row| {
                Ok(RawEntry {
                    payload: row.get(0)?,
                    captured_at: row.get(1)?,
                })
            },
        )
        .optional()
    }

    /// Supprime une entrée.
    pub fn delete(&self, key: &str) -> rusqlite::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM local_store WHERE key = ?1", [key])?;
        Ok(())
    }

    /// Liste les clés commençant par un préfixe.
    pub fn keys_with_prefix(&self, prefix: &str) -> rusqlite::Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let pattern = format!("{}%", prefix.replace('%', "\\%").replace('_', "\\_"));
        let mut stmt = conn.prepare(
            "SELECT key FROM local_store WHERE key LIKE ?1 ESCAPE '\\' ORDER BY key",
        )?;
        let keys = stmt
            .query_map([pattern], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }

    /// Vide tout le stockage local.
    pub fn purge(&self) -> rusqlite::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM local_store", [])?;
        Ok(())
    }
}
