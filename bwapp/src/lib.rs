//! # bwapp - Session applicative BeatWave
//!
//! Couche cliente qui coordonne le cache local ([`bwcache`]), le catalogue
//! ([`bwcatalog`]), la session de lecture ([`bwplayback`]) et l'API REST
//! distante. L'état de session vit dans [`AppSession`], construit par le
//! binaire ou par les tests avec le backend audio et le client API de
//! leur choix.

pub mod api;
pub mod error;
pub mod session;

pub use api::{ApiClient, HttpApi};
pub use error::{Error, Result};
pub use session::{AppSession, TRACKS_CACHE_KEY};
