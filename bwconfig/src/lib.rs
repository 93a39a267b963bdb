//! # BeatWave Configuration Module
//!
//! Configuration management for BeatWave:
//! - Loading configuration from a YAML file
//! - Merging with the embedded default configuration
//! - Environment variable overrides (`BEATWAVE_CONFIG__SECTION__KEY`)
//! - Type-safe getters for configuration values
//! - Thread-safe singleton access pattern
//!
//! ```no_run
//! use bwconfig::get_config;
//!
//! let config = get_config();
//! let port = config.get_http_port();
//! let ttl = config.get_cache_ttl();
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};
use tracing::info;

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("beatwave.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load BeatWave configuration"));
}

const ENV_CONFIG_DIR: &str = "BEATWAVE_CONFIG";
const ENV_PREFIX: &str = "BEATWAVE_CONFIG__";
const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";

const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_API_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_RETENTION_DAYS: i64 = 30;
const DEFAULT_MAX_WRITE_ATTEMPTS: usize = 3;

/// Gestionnaire de configuration BeatWave.
///
/// Charge le YAML utilisateur, le fusionne avec les valeurs par défaut
/// intégrées puis applique les surcharges d'environnement.
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
}

impl Config {
    /// Cherche le répertoire de configuration (argument, variable
    /// d'environnement, puis `~/.beatwave`).
    fn find_config_dir(directory: &str) -> String {
        if !directory.is_empty() {
            return directory.to_string();
        }

        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return env_path;
        }

        if let Some(home) = home_dir() {
            return home.join(".beatwave").to_string_lossy().to_string();
        }

        ".".to_string()
    }

    /// Charge la configuration depuis un répertoire (créé au besoin).
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::find_config_dir(directory);
        let path = Path::new(&config_dir).join("beatwave.yaml");

        let mut data: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        if path.exists() {
            let user_raw = fs::read_to_string(&path)?;
            match serde_yaml::from_str::<Value>(&user_raw) {
                Ok(user_data) => merge_values(&mut data, &user_data),
                Err(e) => {
                    // Fichier corrompu : on repart des défauts plutôt que d'échouer.
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed config file");
                }
            }
        }

        apply_env_overrides(&mut data);

        Ok(Self {
            config_dir,
            path: path.to_string_lossy().to_string(),
            data: Mutex::new(data),
        })
    }

    /// Répertoire de configuration effectif.
    pub fn config_dir(&self) -> &str {
        &self.config_dir
    }

    /// Lit une valeur par chemin pointé (ex: `"cache.ttl_secs"`).
    pub fn get_value(&self, path: &str) -> Result<Value> {
        let data = self.data.lock().unwrap();
        let mut current = &*data;
        for part in path.split('.') {
            current = current
                .get(part)
                .ok_or_else(|| anyhow!("Missing config key: {}", path))?;
        }
        Ok(current.clone())
    }

    /// Écrit une valeur par chemin pointé et persiste le fichier.
    pub fn set_value(&self, path: &str, value: Value) -> Result<()> {
        {
            let mut data = self.data.lock().unwrap();
            let mut current = &mut *data;
            let parts: Vec<&str> = path.split('.').collect();
            for part in parts[..parts.len() - 1].iter().copied() {
                if current.get(part).is_none() {
                    if let Value::Mapping(map) = current {
                        map.insert(
                            Value::String(part.to_string()),
                            Value::Mapping(Mapping::new()),
                        );
                    }
                }
                current = current
                    .get_mut(part)
                    .ok_or_else(|| anyhow!("Cannot descend into config key: {}", path))?;
            }
            if let Value::Mapping(map) = current {
                map.insert(Value::String(parts[parts.len() - 1].to_string()), value);
            } else {
                return Err(anyhow!("Config key {} is not a mapping", path));
            }
        }
        self.save()
    }

    fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.config_dir)?;
        let data = self.data.lock().unwrap();
        fs::write(&self.path, serde_yaml::to_string(&*data)?)?;
        Ok(())
    }

    fn get_string_or(&self, path: &str, default: &str) -> String {
        match self.get_value(path) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => default.to_string(),
        }
    }

    fn get_u64_or(&self, path: &str, default: u64) -> u64 {
        match self.get_value(path) {
            Ok(Value::Number(n)) => n.as_u64().unwrap_or(default),
            _ => default,
        }
    }

    pub fn get_http_port(&self) -> u16 {
        self.get_u64_or("http.port", DEFAULT_HTTP_PORT as u64) as u16
    }

    pub fn get_api_base_url(&self) -> String {
        self.get_string_or("api.base_url", "http://localhost:8080")
    }

    /// Timeout du chargement de catalogue (10 s par défaut).
    pub fn get_api_timeout(&self) -> Duration {
        Duration::from_secs(self.get_u64_or("api.timeout_secs", DEFAULT_API_TIMEOUT_SECS))
    }

    /// Répertoire du cache local (créé au besoin).
    pub fn get_cache_dir(&self) -> Result<PathBuf> {
        let configured = self.get_string_or("cache.dir", "");
        let dir = if configured.is_empty() {
            Path::new(&self.config_dir).join("cache")
        } else {
            PathBuf::from(configured)
        };
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// TTL de fraîcheur du cache local (5 minutes par défaut).
    pub fn get_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.get_u64_or("cache.ttl_secs", DEFAULT_CACHE_TTL_SECS))
    }

    /// Backend du blob store : `"memory"` ou `"github"`.
    pub fn get_store_backend(&self) -> String {
        self.get_string_or("store.backend", "memory")
    }

    pub fn get_github_owner(&self) -> String {
        self.get_string_or("store.github.owner", "")
    }

    pub fn get_github_repo(&self) -> String {
        self.get_string_or("store.github.repo", "")
    }

    pub fn get_github_branch(&self) -> String {
        self.get_string_or("store.github.branch", "main")
    }

    /// Le token GitHub ne vit que dans l'environnement, jamais dans le YAML.
    pub fn get_github_token(&self) -> Option<String> {
        env::var(ENV_GITHUB_TOKEN).ok().filter(|t| !t.is_empty())
    }

    /// Fenêtre de rétention des évènements de lecture (30 jours).
    pub fn get_stats_retention_days(&self) -> i64 {
        self.get_value("stats.retention_days")
            .ok()
            .and_then(|v| v.as_i64())
            .unwrap_or(DEFAULT_RETENTION_DAYS)
    }

    /// Nombre maximum de tentatives d'écriture conditionnelle.
    pub fn get_max_write_attempts(&self) -> usize {
        self.get_u64_or("stats.max_write_attempts", DEFAULT_MAX_WRITE_ATTEMPTS as u64) as usize
    }
}

/// Fusion récursive : les mappings de `overlay` écrasent ceux de `base`.
fn merge_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => merge_values(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base_slot, _) => *base_slot = overlay.clone(),
    }
}

/// Applique `BEATWAVE_CONFIG__SECTION__KEY=value` sur l'arbre.
fn apply_env_overrides(data: &mut Value) {
    for (key, raw) in env::vars() {
        let Some(suffix) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let path: Vec<String> = suffix.split("__").map(|s| s.to_lowercase()).collect();
        if path.iter().any(|p| p.is_empty()) {
            continue;
        }

        let value = parse_env_value(&raw);
        let mut current = &mut *data;
        for part in &path[..path.len() - 1] {
            if current.get(part.as_str()).is_none() {
                if let Value::Mapping(map) = current {
                    map.insert(Value::String(part.clone()), Value::Mapping(Mapping::new()));
                }
            }
            match current.get_mut(part.as_str()) {
                Some(next) => current = next,
                None => return,
            }
        }
        if let Value::Mapping(map) = current {
            info!(key = %key, "Applying config override from environment");
            map.insert(Value::String(path[path.len() - 1].clone()), value);
        }
    }
}

fn parse_env_value(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<u64>() {
        return Value::Number(n.into());
    }
    if let Ok(b) = raw.parse::<bool>() {
        return Value::Bool(b);
    }
    Value::String(raw.to_string())
}

/// Retourne le singleton de configuration.
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(config.get_http_port(), 8080);
        assert_eq!(config.get_cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.get_api_timeout(), Duration::from_secs(10));
        assert_eq!(config.get_stats_retention_days(), 30);
        assert_eq!(config.get_max_write_attempts(), 3);
        assert_eq!(config.get_store_backend(), "memory");
    }

    #[test]
    fn test_user_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("beatwave.yaml"),
            "http:\n  port: 9000\ncache:\n  ttl_secs: 60\n",
        )
        .unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(config.get_http_port(), 9000);
        assert_eq!(config.get_cache_ttl(), Duration::from_secs(60));
        // Les clés non surchargées gardent leur défaut.
        assert_eq!(config.get_github_branch(), "main");
    }

    #[test]
    fn test_malformed_user_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("beatwave.yaml"), ":::not yaml:::[").unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(config.get_http_port(), 8080);
    }

    #[test]
    fn test_set_value_persists() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        config
            .set_value("http.port", Value::Number(8123.into()))
            .unwrap();
        assert_eq!(config.get_http_port(), 8123);

        let reloaded = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(reloaded.get_http_port(), 8123);
    }
}
