//! End-to-end catalog loading: source directory on disk, mocked HTTP.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bytes::Bytes;
use core_metadata::sources::load_source_dir;
use core_metadata::{NoembedClient, Track, TrackCatalog, UNKNOWN_ARTIST};
use core_runtime::config::{CatalogConfig, CatalogSource};
use mockall::mock;
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

mock! {
    HttpClient {}

    #[async_trait]
    impl HttpClient for HttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

fn ok_json(body: &str) -> HttpResponse {
    HttpResponse {
        status: 200,
        headers: HashMap::new(),
        body: Bytes::from(body.to_string()),
    }
}

fn write_song_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("b-favourites.json"), r#"{"urls": ["v2", "v3"]}"#).unwrap();
    fs::write(dir.path().join("a-single.json"), r#"{"url": "v1"}"#).unwrap();
    fs::write(dir.path().join("c-broken.json"), "{ not json").unwrap();
    fs::write(dir.path().join("d-dupes.json"), r#"["v3", "v1", "v4"]"#).unwrap();
    fs::write(dir.path().join("notes.txt"), r#"["ignored"]"#).unwrap();
    dir
}

#[tokio::test]
async fn test_directory_is_read_in_file_name_order() {
    let dir = write_song_dir();
    let refs = load_source_dir(dir.path()).await.unwrap();
    assert_eq!(refs, vec!["v1", "v2", "v3", "v3", "v1", "v4"]);
}

#[tokio::test]
async fn test_missing_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    assert!(load_source_dir(&missing).await.is_err());
}

#[tokio::test]
async fn test_catalog_from_directory_with_partial_failures() {
    let dir = write_song_dir();

    let mut http = MockHttpClient::new();
    http.expect_execute()
        .withf(|request| request.url.ends_with("url=v2"))
        .returning(|_| Err(BridgeError::OperationFailed("Connection failed".to_string())));
    http.expect_execute()
        .withf(|request| request.url.ends_with("url=v4"))
        .returning(|_| {
            Ok(HttpResponse {
                status: 503,
                headers: HashMap::new(),
                body: Bytes::new(),
            })
        });
    http.expect_execute()
        .withf(|request| request.url.ends_with("url=v3"))
        .returning(|_| Ok(ok_json(r#"{"title": "Only a title"}"#)));
    http.expect_execute()
        .withf(|request| request.url.ends_with("url=v1"))
        .times(1)
        .returning(|_| {
            Ok(ok_json(
                r#"{"title": "Song", "author_name": "Band", "thumbnail_url": "https://img/1.jpg"}"#,
            ))
        });

    let config = CatalogConfig::new().with_metadata_endpoint("https://oembed.test/embed");
    let client = NoembedClient::from_config(Arc::new(http), &config);
    let catalog = TrackCatalog::new(Some(Arc::new(client)));

    let load = catalog
        .load(&[CatalogSource::directory(dir.path())])
        .await;

    assert_eq!(load.fallbacks, 2);
    assert_eq!(
        load.tracks,
        vec![
            Track {
                id: 1,
                title: "Song".to_string(),
                artist: "Band".to_string(),
                artwork_ref: "https://img/1.jpg".to_string(),
                source_ref: "v1".to_string(),
            },
            Track::fallback(2, "v2"),
            Track {
                id: 3,
                title: "Only a title".to_string(),
                artist: UNKNOWN_ARTIST.to_string(),
                artwork_ref: String::new(),
                source_ref: "v3".to_string(),
            },
            Track::fallback(4, "v4"),
        ]
    );
}
