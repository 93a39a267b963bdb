//! # bwserver - API REST BeatWave
//!
//! Surface HTTP de la bibliothèque : collection de pistes, compteurs de
//! lectures et de likes, profils, commentaires, recherche et comptes.
//! La logique vit dans [`service::Library`] au-dessus d'un
//! [`bwstore::BlobStore`] ; [`api`] n'est que la traduction HTTP.

pub mod api;
pub mod error;
pub mod service;

pub use api::routes;
pub use error::{Error, Result};
pub use service::Library;
