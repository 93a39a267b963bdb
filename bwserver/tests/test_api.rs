//! Tests des handlers HTTP : codes de statut et enveloppes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bwmetadata::Track;
use bwserver::api::{
    self, AddCommentRequest, AuthRequest, LikeRequest, PlayRequest, ProfileQuery,
    SaveTracksRequest, SearchQuery,
};
use bwserver::Library;
use bwstore::MemoryStore;
use std::sync::Arc;

fn library() -> Arc<Library> {
    Arc::new(Library::new(Arc::new(MemoryStore::new()), 30, 3))
}

async fn seed(library: &Library, id: &str) {
    let mut track = Track::new("One", "alice", "House", "https://x/a.mp3");
    track.id = id.to_string();
    library.save_tracks(&[track]).await.unwrap();
}

#[tokio::test]
async fn test_like_without_account_is_401() {
    let library = library();
    seed(&library, "a").await;

    let response = api::toggle_like(
        State(library),
        Path("a".to_string()),
        Json(LikeRequest {
            username: None,
            liked: true,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_play_on_unknown_track_is_404() {
    let library = library();
    let response = api::record_play(
        State(library),
        Path("ghost".to_string()),
        Json(PlayRequest {
            username: "bob".to_string(),
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_play_without_username_is_400() {
    let library = library();
    seed(&library, "a").await;

    let response = api::record_play(
        State(library),
        Path("a".to_string()),
        Json(PlayRequest {
            username: "  ".to_string(),
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_save_action_is_400() {
    let library = library();
    let response = api::save_tracks(
        State(library),
        Json(SaveTracksRequest {
            action: "drop".to_string(),
            tracks: Vec::new(),
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_signup_is_409() {
    let library = library();
    let signup = |library: Arc<Library>| {
        api::auth(
            State(library),
            Json(AuthRequest {
                action: "signup".to_string(),
                username: "bob".to_string(),
                password: "hunter2".to_string(),
                secret_key: None,
            }),
        )
    };

    let first = signup(library.clone()).await;
    assert_eq!(first.status(), StatusCode::OK);
    let second = signup(library).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_without_secret_key_is_400() {
    let library = library();
    let response = api::auth(
        State(library),
        Json(AuthRequest {
            action: "login".to_string(),
            username: "bob".to_string(),
            password: "hunter2".to_string(),
            secret_key: None,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_comment_is_400() {
    let library = library();
    seed(&library, "a").await;

    let response = api::add_comment(
        State(library),
        Json(AddCommentRequest {
            track_id: "a".to_string(),
            username: "bob".to_string(),
            text: "   ".to_string(),
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profile_and_search_are_200() {
    let library = library();
    seed(&library, "a").await;

    let profile = api::get_profile(
        State(library.clone()),
        Query(ProfileQuery {
            username: "carol".to_string(),
        }),
    )
    .await;
    assert_eq!(profile.status(), StatusCode::OK);

    let search = api::search(
        State(library),
        Query(SearchQuery {
            q: "one".to_string(),
        }),
    )
    .await;
    assert_eq!(search.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_search_envelope_lists_tracks() {
    let library = library();
    seed(&library, "a").await;

    let response = api::search(
        State(library),
        Query(SearchQuery {
            q: "one".to_string(),
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Les clients lisent le champ `tracks`, comme pour GET /tracks.
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["success"], true);
    let tracks = json["tracks"].as_array().expect("tracks field");
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0]["id"], "a");
}
