//! Tests de la couche service sur le magasin mémoire.

use bwmetadata::{Profile, Track};
use bwserver::{Error, Library};
use bwstats::{Origin, PlayOutcome};
use bwstore::{BlobStore, MemoryStore, Version};
use std::sync::Arc;

fn library() -> (Arc<MemoryStore>, Library) {
    let store = Arc::new(MemoryStore::new());
    let library = Library::new(store.clone(), 30, 3);
    (store, library)
}

fn track(id: &str, title: &str, artist: &str) -> Track {
    let mut t = Track::new(title, artist, "House", "https://x/a.mp3");
    t.id = id.to_string();
    t
}

#[tokio::test]
async fn test_empty_store_lists_no_tracks() {
    let (_, library) = library();
    assert!(library.list_tracks().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_save_then_list_roundtrip() {
    let (_, library) = library();
    let tracks = vec![track("a", "One", "alice"), track("b", "Two", "bob")];
    assert_eq!(library.save_tracks(&tracks).await.unwrap(), 2);

    let mut listed = library.list_tracks().await.unwrap();
    listed.sort_by(|x, y| x.id.cmp(&y.id));
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, "a");
}

#[tokio::test]
async fn test_search_matches_title_case_insensitive() {
    let (_, library) = library();
    library
        .save_tracks(&[
            track("a", "Midnight Drive", "alice"),
            track("b", "Daylight", "bob"),
        ])
        .await
        .unwrap();

    let results = library.search("midnight").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "a");
}

#[tokio::test]
async fn test_play_counted_then_suppressed() {
    let (_, library) = library();
    library.save_tracks(&[track("a", "One", "alice")]).await.unwrap();

    let origin = Origin::Account("bob".to_string());
    let first = library.record_play("a", &origin).await.unwrap();
    assert!(matches!(first, PlayOutcome::Counted { plays: 1, .. }));
    let second = library.record_play("a", &origin).await.unwrap();
    assert!(matches!(second, PlayOutcome::AlreadyCounted { plays: 1 }));
}

#[tokio::test]
async fn test_like_requires_account() {
    let (_, library) = library();
    library.save_tracks(&[track("a", "One", "alice")]).await.unwrap();

    let err = library.toggle_like("a", None, true).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Stats(bwstats::Error::Unauthenticated)
    ));
}

#[tokio::test]
async fn test_missing_profile_synthesized() {
    let (_, library) = library();
    let (profile, sha) = library.get_profile("carol").await.unwrap();
    assert_eq!(profile.name, "carol");
    assert_eq!(profile.avatar_letter.as_deref(), Some("C"));
    assert!(sha.is_none());
}

#[tokio::test]
async fn test_profile_save_rejects_stale_token() {
    let (_, library) = library();
    let mut profile = Profile::default_for("carol");
    profile.bio = "first".to_string();
    let v1 = library.save_profile("carol", &profile, None).await.unwrap();

    profile.bio = "second".to_string();
    library
        .save_profile("carol", &profile, Some(&v1))
        .await
        .unwrap();

    // v1 est périmé : l'écriture concurrente doit être refusée.
    profile.bio = "third".to_string();
    let err = library
        .save_profile("carol", &profile, Some(&v1))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Store(bwstore::Error::Conflict(_))));
}

#[tokio::test]
async fn test_profile_blind_overwrite_without_token() {
    let (_, library) = library();
    let profile = Profile::default_for("carol");
    library.save_profile("carol", &profile, None).await.unwrap();
    library.save_profile("carol", &profile, None).await.unwrap();
}

#[tokio::test]
async fn test_comment_appended_and_counter_bumped() {
    let (_, library) = library();
    library.save_tracks(&[track("a", "One", "alice")]).await.unwrap();

    library.add_comment("a", "bob", "great track").await.unwrap();
    library.add_comment("a", "carol", "agreed").await.unwrap();

    let comments = library.comments("a").await.unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].username, "bob");

    let tracks = library.list_tracks().await.unwrap();
    assert_eq!(tracks[0].comments, 2);
}

#[tokio::test]
async fn test_comments_of_uncommented_track_empty() {
    let (_, library) = library();
    assert!(library.comments("ghost").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_signup_issues_secret_key_once() {
    let (_, library) = library();
    let key = library.signup("bob", "hunter2").await.unwrap();
    assert!(!key.is_empty());

    let err = library.signup("bob", "other").await.unwrap_err();
    assert!(matches!(err, Error::UsernameTaken(_)));
}

#[tokio::test]
async fn test_login_requires_password_and_secret_key() {
    let (_, library) = library();
    let key = library.signup("bob", "hunter2").await.unwrap();

    let account = library.login("bob", "hunter2", &key).await.unwrap();
    assert_eq!(account.username, "bob");

    assert!(matches!(
        library.login("bob", "wrong", &key).await.unwrap_err(),
        Error::BadCredentials
    ));
    assert!(matches!(
        library.login("bob", "hunter2", "not-the-key").await.unwrap_err(),
        Error::BadCredentials
    ));
    assert!(matches!(
        library.login("nobody", "x", "y").await.unwrap_err(),
        Error::BadCredentials
    ));
}

#[tokio::test]
async fn test_secret_key_not_stored_in_clear() {
    let (store, library) = library();
    let key = library.signup("bob", "hunter2").await.unwrap();

    let (raw, _) = store.read("users/bob.json").await.unwrap().unwrap();
    let text = String::from_utf8(raw).unwrap();
    assert!(!text.contains(&key));
    assert!(!text.contains("hunter2"));
}

#[tokio::test]
async fn test_unreadable_track_document_skipped() {
    let (store, library) = library();
    library.save_tracks(&[track("a", "One", "alice")]).await.unwrap();
    store
        .write("tracks/broken.json", b"not json", None)
        .await
        .unwrap();

    let tracks = library.list_tracks().await.unwrap();
    assert_eq!(tracks.len(), 1);
}

#[tokio::test]
async fn test_stale_version_type_roundtrips() {
    // Le jeton rendu par get_profile se réutilise tel quel en écriture.
    let (_, library) = library();
    let profile = Profile::default_for("carol");
    let v = library.save_profile("carol", &profile, None).await.unwrap();
    let (_, sha) = library.get_profile("carol").await.unwrap();
    assert_eq!(sha, Some(Version(v.0.clone())));
}
