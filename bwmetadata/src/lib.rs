//! # bwmetadata - Types de domaine partagés pour BeatWave
//!
//! Cette crate définit les objets échangés entre le client, les handlers REST
//! et le blob store versionné : pistes, profils, commentaires, comptes et
//! évènements de lecture. Tous les types sérialisent en camelCase pour rester
//! compatibles avec les documents JSON historiques du store.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Une piste musicale telle que persistée dans `tracks/{id}.json`.
///
/// La copie en mémoire est une réplique "read-mostly" rafraîchie par TTL ;
/// le document distant fait autorité, les compteurs locaux peuvent être en
/// avance de façon optimiste (voir `bwstats`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Compteur de lectures, non négatif.
    #[serde(default)]
    pub plays: u64,
    /// Compteur de likes, non négatif (plancher à zéro).
    #[serde(default)]
    pub likes: u64,
    /// Nombre de commentaires.
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub verified: bool,
}

impl Track {
    /// Construit une piste minimale pour un nouvel upload.
    pub fn new(title: &str, artist: &str, genre: &str, audio_url: &str) -> Self {
        Self {
            id: new_track_id(),
            title: title.to_string(),
            artist: artist.to_string(),
            genre: genre.to_string(),
            description: None,
            audio_url: Some(audio_url.to_string()),
            cover_url: None,
            created_at: Some(Utc::now()),
            plays: 0,
            likes: 0,
            comments: 0,
            verified: false,
        }
    }
}

/// Projection dénormalisée d'un compte, stockée dans `profiles/{username}.json`.
///
/// Éditable indépendamment du compte ; la dérive entre les deux documents est
/// acceptée (reconciliation au prochain rechargement complet).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_letter: Option<String>,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub verified: bool,
}

impl Profile {
    /// Profil par défaut synthétisé quand le document distant n'existe pas.
    pub fn default_for(username: &str) -> Self {
        Self {
            name: username.to_string(),
            bio: String::new(),
            location: String::new(),
            avatar_letter: username
                .chars()
                .next()
                .map(|c| c.to_uppercase().to_string()),
            followers: 0,
            verified: false,
        }
    }
}

/// Commentaire attaché à une piste (`comments/{track_id}.json`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub username: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub likes: u64,
}

impl Comment {
    pub fn new(username: &str, text: &str) -> Self {
        Self {
            id: new_track_id().replace("track_", "comment_"),
            username: username.to_string(),
            text: text.to_string(),
            timestamp: Utc::now(),
            likes: 0,
        }
    }
}

/// Compte utilisateur persisté dans `users/{username}.json`.
///
/// `secret_key_hash` correspond à la clé-capacité remise une seule fois à la
/// création du compte : elle est exigée en plus du mot de passe et n'est
/// jamais récupérable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub username: String,
    pub password_hash: String,
    pub secret_key_hash: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub followers: Vec<String>,
    #[serde(default)]
    pub following: Vec<String>,
    #[serde(default)]
    pub verified: bool,
}

/// Évènement de lecture : un triplet (piste, origine, jour) dans le set de
/// suppression journalier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayEvent {
    /// Clé de suppression `"{origine}-{AAAA-MM-JJ}"`.
    pub key: String,
    pub username: String,
    pub timestamp: DateTime<Utc>,
}

/// Statistiques de lecture d'une piste (`stats/{id}.json`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlayStats {
    #[serde(default)]
    pub track_id: String,
    #[serde(default)]
    pub plays: Vec<PlayEvent>,
    #[serde(default)]
    pub unique_players: Vec<String>,
}

/// Génère un identifiant de piste sans coordination : timestamp milliseconde
/// plus suffixe aléatoire base36, comme le faisait l'uploader historique.
pub fn new_track_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| {
            let n = rng.random_range(0..36u32);
            char::from_digit(n, 36).unwrap_or('0')
        })
        .collect();
    format!("track_{}_{}", millis, suffix)
}

/// Jeu de données de démonstration, utilisé en dernier recours quand ni le
/// réseau ni le cache local ne répondent.
pub fn demo_tracks() -> Vec<Track> {
    vec![
        Track {
            id: "demo_1".to_string(),
            title: "Sample Track 1".to_string(),
            artist: "Demo Artist".to_string(),
            genre: "Electronic".to_string(),
            description: None,
            audio_url: Some(
                "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-1.mp3".to_string(),
            ),
            cover_url: None,
            created_at: None,
            plays: 100,
            likes: 20,
            comments: 5,
            verified: true,
        },
        Track {
            id: "demo_2".to_string(),
            title: "Sample Track 2".to_string(),
            artist: "Demo Artist 2".to_string(),
            genre: "Hip Hop".to_string(),
            description: None,
            audio_url: Some(
                "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-2.mp3".to_string(),
            ),
            cover_url: None,
            created_at: None,
            plays: 80,
            likes: 15,
            comments: 3,
            verified: false,
        },
    ]
}
