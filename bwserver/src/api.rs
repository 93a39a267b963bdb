//! Surface REST de BeatWave.
//!
//! Handlers axum au-dessus de [`Library`](crate::service::Library). Toutes
//! les réponses portent un champ `success` ; les échecs y joignent un
//! message `error`. Un like sans compte vaut 401, un corps invalide 400,
//! une panne du magasin 500 journalisée, jamais un panic.

use crate::error::Error;
use crate::service::Library;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bwmetadata::{Comment, Profile, Track};
use bwstats::{Origin, PlayOutcome};
use bwstore::Version;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

/// Réponse d'erreur générique
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

fn fail(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: message.into(),
        }),
    )
        .into_response()
}

fn error_response(e: Error) -> Response {
    match &e {
        Error::BadCredentials | Error::Stats(bwstats::Error::Unauthenticated) => {
            fail(StatusCode::UNAUTHORIZED, e.to_string())
        }
        Error::UsernameTaken(_) | Error::Store(bwstore::Error::Conflict(_)) => {
            fail(StatusCode::CONFLICT, e.to_string())
        }
        Error::Stats(bwstats::Error::TrackNotFound(_)) => {
            fail(StatusCode::NOT_FOUND, e.to_string())
        }
        _ => {
            error!("Request failed: {e}");
            fail(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TracksResponse {
    success: bool,
    tracks: Vec<Track>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTracksRequest {
    pub action: String,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveTracksResponse {
    success: bool,
    count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayRequest {
    pub username: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayResponse {
    success: bool,
    plays: u64,
    unique_players: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    #[serde(default)]
    pub username: Option<String>,
    pub liked: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LikeResponse {
    success: bool,
    likes: u64,
}

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub username: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    success: bool,
    profile: Profile,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProfileRequest {
    pub action: String,
    pub username: String,
    pub profile: Profile,
    #[serde(default)]
    pub sha: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsQuery {
    pub track_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentsResponse {
    success: bool,
    comments: Vec<Comment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentRequest {
    pub track_id: String,
    pub username: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddCommentResponse {
    success: bool,
    comment: Comment,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    success: bool,
    tracks: Vec<Track>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    pub action: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub secret_key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    success: bool,
    username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_key: Option<String>,
}

/// Liste la collection complète de pistes.
pub async fn list_tracks(State(library): State<Arc<Library>>) -> Response {
    match library.list_tracks().await {
        Ok(tracks) => Json(TracksResponse {
            success: true,
            tracks,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// Sauvegarde legacy de la collection entière (dernier écrivain gagnant).
pub async fn save_tracks(
    State(library): State<Arc<Library>>,
    Json(body): Json<SaveTracksRequest>,
) -> Response {
    if body.action != "save" {
        return fail(
            StatusCode::BAD_REQUEST,
            format!("Unknown action: {}", body.action),
        );
    }
    match library.save_tracks(&body.tracks).await {
        Ok(count) => Json(SaveTracksResponse {
            success: true,
            count,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// Enregistre une lecture (au plus une par origine et par jour).
pub async fn record_play(
    State(library): State<Arc<Library>>,
    Path(id): Path<String>,
    Json(body): Json<PlayRequest>,
) -> Response {
    if body.username.trim().is_empty() {
        return fail(StatusCode::BAD_REQUEST, "username is required");
    }
    let origin = Origin::Account(body.username);
    let outcome = match library.record_play(&id, &origin).await {
        Ok(outcome) => outcome,
        Err(e) => return error_response(e),
    };
    match outcome {
        PlayOutcome::Counted {
            plays,
            unique_players,
        } => Json(PlayResponse {
            success: true,
            plays,
            unique_players,
        })
        .into_response(),
        PlayOutcome::AlreadyCounted { plays } => {
            let unique_players = match library.play_stats(&id).await {
                Ok(stats) => stats.unique_players.len(),
                Err(e) => return error_response(e),
            };
            Json(PlayResponse {
                success: true,
                plays,
                unique_players,
            })
            .into_response()
        }
    }
}

/// Applique un like ou son retrait ; exige un compte.
pub async fn toggle_like(
    State(library): State<Arc<Library>>,
    Path(id): Path<String>,
    Json(body): Json<LikeRequest>,
) -> Response {
    let account = body.username.as_deref().filter(|u| !u.trim().is_empty());
    match library.toggle_like(&id, account, body.liked).await {
        Ok(likes) => Json(LikeResponse {
            success: true,
            likes,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// Profil public ; un profil absent est synthétisé par défaut.
pub async fn get_profile(
    State(library): State<Arc<Library>>,
    Query(query): Query<ProfileQuery>,
) -> Response {
    match library.get_profile(&query.username).await {
        Ok((profile, sha)) => Json(ProfileResponse {
            success: true,
            profile,
            sha: sha.map(|v| v.0),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// Sauvegarde un profil ; `sha` est le jeton de version optimiste, son
/// omission vaut écrasement aveugle.
pub async fn save_profile(
    State(library): State<Arc<Library>>,
    Json(body): Json<SaveProfileRequest>,
) -> Response {
    if body.action != "save" {
        return fail(
            StatusCode::BAD_REQUEST,
            format!("Unknown action: {}", body.action),
        );
    }
    let expected = body.sha.map(Version);
    match library
        .save_profile(&body.username, &body.profile, expected.as_ref())
        .await
    {
        Ok(version) => Json(ProfileResponse {
            success: true,
            profile: body.profile,
            sha: Some(version.0),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// Commentaires d'une piste.
pub async fn list_comments(
    State(library): State<Arc<Library>>,
    Query(query): Query<CommentsQuery>,
) -> Response {
    match library.comments(&query.track_id).await {
        Ok(comments) => Json(CommentsResponse {
            success: true,
            comments,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// Ajoute un commentaire et avance le compteur de la piste.
pub async fn add_comment(
    State(library): State<Arc<Library>>,
    Json(body): Json<AddCommentRequest>,
) -> Response {
    if body.text.trim().is_empty() {
        return fail(StatusCode::BAD_REQUEST, "text is required");
    }
    match library
        .add_comment(&body.track_id, &body.username, &body.text)
        .await
    {
        Ok(comment) => Json(AddCommentResponse {
            success: true,
            comment,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// Recherche plein-texte dans la collection.
pub async fn search(
    State(library): State<Arc<Library>>,
    Query(query): Query<SearchQuery>,
) -> Response {
    match library.search(&query.q).await {
        Ok(tracks) => Json(SearchResponse {
            success: true,
            tracks,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// Création de compte et connexion.
pub async fn auth(
    State(library): State<Arc<Library>>,
    Json(body): Json<AuthRequest>,
) -> Response {
    match body.action.as_str() {
        "signup" => match library.signup(&body.username, &body.password).await {
            Ok(secret_key) => Json(AuthResponse {
                success: true,
                username: body.username,
                secret_key: Some(secret_key),
            })
            .into_response(),
            Err(e) => error_response(e),
        },
        "login" => {
            let Some(secret_key) = body.secret_key.as_deref() else {
                return fail(StatusCode::BAD_REQUEST, "secretKey is required");
            };
            match library.login(&body.username, &body.password, secret_key).await {
                Ok(account) => Json(AuthResponse {
                    success: true,
                    username: account.username,
                    secret_key: None,
                })
                .into_response(),
                Err(e) => error_response(e),
            }
        }
        other => fail(StatusCode::BAD_REQUEST, format!("Unknown action: {other}")),
    }
}

/// Router REST complet, à monter par le binaire.
pub fn routes(library: Arc<Library>) -> Router {
    Router::new()
        .route("/tracks", get(list_tracks).post(save_tracks))
        .route("/tracks/{id}/play", post(record_play))
        .route("/tracks/{id}/like", post(toggle_like))
        .route("/profile", get(get_profile).post(save_profile))
        .route("/comments", get(list_comments).post(add_comment))
        .route("/search", get(search))
        .route("/auth", post(auth))
        .with_state(library)
}
