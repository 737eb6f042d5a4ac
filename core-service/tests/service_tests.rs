//! Service wiring: catalog sources to player state, with desktop bridges.

use async_trait::async_trait;
use bridge_desktop::{SimulatedBackendConfig, SimulatedMediaBackend};
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bytes::Bytes;
use core_metadata::{Track, UNKNOWN_ARTIST};
use core_playback::SessionPhase;
use core_runtime::config::{CatalogConfig, CatalogSource, CoreConfig};
use core_runtime::events::{CatalogEvent, CoreEvent};
use core_service::{CoreError, PlayerService, ServiceDependencies};
use mockall::mock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

mock! {
    HttpClient {}

    #[async_trait]
    impl HttpClient for HttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

fn offline_config(backend: SimulatedMediaBackend, sources: Vec<CatalogSource>) -> CoreConfig {
    ServiceDependencies::new(Arc::new(backend))
        .configure()
        .sources(sources)
        .catalog_config(CatalogConfig::new().with_metadata_lookup(false))
        .build()
        .unwrap()
}

async fn wait_for_tracks(service: &PlayerService, count: usize) {
    let mut rx = service.subscribe();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.tracks.len() == count))
        .await
        .expect("tracks not loaded")
        .unwrap();
}

#[tokio::test]
async fn test_catalog_sources_reach_the_player() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("playlist.json"), r#"{"urls": ["b", "c"]}"#).unwrap();

    let config = offline_config(
        SimulatedMediaBackend::new(),
        vec![
            CatalogSource::inline(["a", "b"]),
            CatalogSource::directory(dir.path()),
        ],
    );
    let service = PlayerService::start(config).unwrap();
    let mut events = service
        .events()
        .filter(|event| matches!(event, CoreEvent::Catalog(_)));

    wait_for_tracks(&service, 3).await;
    let snapshot = service.snapshot();

    assert_eq!(
        *snapshot.tracks,
        vec![
            Track::fallback(1, "a"),
            Track::fallback(2, "b"),
            Track::fallback(3, "c"),
        ]
    );
    assert_eq!(snapshot.current_index, 0);
    assert_eq!(snapshot.current_track.unwrap().artist, UNKNOWN_ARTIST);
    assert!(!snapshot.is_playing);

    assert_eq!(
        events.recv().await.unwrap(),
        CoreEvent::Catalog(CatalogEvent::Loading { sources: 3 })
    );
    assert_eq!(
        events.recv().await.unwrap(),
        CoreEvent::Catalog(CatalogEvent::Loaded {
            tracks: 3,
            fallbacks: 3
        })
    );

    service.shutdown().await;
}

#[tokio::test]
async fn test_metadata_lookup_enriches_tracks() {
    let mut http = MockHttpClient::new();
    http.expect_execute()
        .withf(|request| request.url.ends_with("url=song-1"))
        .times(1)
        .returning(|_| {
            Ok(HttpResponse {
                status: 200,
                headers: HashMap::new(),
                body: Bytes::from_static(
                    br#"{"title": "Harbour Lights", "author_name": "The Tides"}"#,
                ),
            })
        });
    http.expect_execute()
        .withf(|request| request.url.ends_with("url=song-2"))
        .times(1)
        .returning(|_| {
            Ok(HttpResponse {
                status: 404,
                headers: HashMap::new(),
                body: Bytes::new(),
            })
        });

    let config = ServiceDependencies::new(Arc::new(SimulatedMediaBackend::new()))
        .with_http_client(Arc::new(http))
        .configure()
        .source(CatalogSource::document(r#"["song-1", "song-2"]"#))
        .catalog_config(CatalogConfig::new().with_metadata_endpoint("https://oembed.test/embed"))
        .build()
        .unwrap();
    let service = PlayerService::start(config).unwrap();

    wait_for_tracks(&service, 2).await;
    let tracks = service.snapshot().tracks;

    assert_eq!(tracks[0].title, "Harbour Lights");
    assert_eq!(tracks[0].artist, "The Tides");
    assert_eq!(tracks[0].artwork_ref, "");
    assert_eq!(tracks[1], Track::fallback(2, "song-2"));

    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_play_and_shutdown_through_the_facade() {
    let backend = SimulatedMediaBackend::with_config(
        SimulatedBackendConfig::default().with_item_duration(Duration::from_secs(30)),
    );
    let config = offline_config(backend.clone(), vec![CatalogSource::inline(["x", "y"])]);
    let service = PlayerService::start(config).unwrap();
    wait_for_tracks(&service, 2).await;

    service.play();
    let mut rx = service.subscribe();
    rx.wait_for(|s| s.phase == SessionPhase::Ready && s.is_playing)
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(3)).await;
    let snapshot = service.snapshot();
    assert!(snapshot.current_time > 1.0);
    assert_eq!(snapshot.duration, 30.0);

    service.next();
    rx.wait_for(|s| s.current_index == 1).await.unwrap();
    service.seek_to(10.0);
    rx.wait_for(|s| s.current_time >= 10.0).await.unwrap();

    service.shutdown().await;
    assert_eq!(service.snapshot().phase, SessionPhase::Disposed);
    assert_eq!(backend.session_count(), 1);
    assert_eq!(backend.disposed_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_services_on_one_backend_initialize_it_once() {
    let backend = SimulatedMediaBackend::new();
    let first = PlayerService::start(offline_config(
        backend.clone(),
        vec![CatalogSource::inline(["a"])],
    ))
    .unwrap();
    let second = PlayerService::start(offline_config(
        backend.clone(),
        vec![CatalogSource::inline(["b"])],
    ))
    .unwrap();
    wait_for_tracks(&first, 1).await;
    wait_for_tracks(&second, 1).await;

    first.play();
    second.play();
    for service in [&first, &second] {
        service
            .subscribe()
            .wait_for(|s| s.phase == SessionPhase::Ready && s.is_playing)
            .await
            .unwrap();
    }

    assert_eq!(backend.initialize_count(), 1);
    assert_eq!(backend.session_count(), 2);

    first.shutdown().await;
    second.shutdown().await;
}

#[tokio::test]
async fn test_reload_catalog_replaces_tracks() {
    let config = offline_config(
        SimulatedMediaBackend::new(),
        vec![CatalogSource::inline(["one"])],
    );
    let service = PlayerService::start(config).unwrap();
    wait_for_tracks(&service, 1).await;

    service.select_track(4);
    service.reload_catalog();
    let load = service.load_catalog().await;

    assert_eq!(load.tracks, vec![Track::fallback(1, "one")]);
    assert_eq!(load.fallbacks, 1);
    assert_eq!(service.snapshot().current_index, 0);

    service.shutdown().await;
}

#[tokio::test]
async fn test_start_rejects_invalid_config() {
    let mut config = offline_config(SimulatedMediaBackend::new(), Vec::new());
    config.poll_interval = Duration::ZERO;

    let err = PlayerService::start(config).err().unwrap();
    assert!(matches!(err, CoreError::Runtime(_)));
}

#[test]
fn test_missing_backend_is_reported() {
    let err = CoreConfig::builder().build().unwrap_err();
    let err = CoreError::from(err);
    assert!(err.to_string().contains("MediaBackend"));
}
