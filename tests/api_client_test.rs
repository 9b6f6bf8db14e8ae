// tests/api_client_test.rs

use gb_show_dl::catalog::Catalog;
use gb_show_dl::client::{ApiClient, ExistenceProbe};
use gb_show_dl::config::AppConfig;
use gb_show_dl::error::AppError;
use gb_show_dl::models::{ItemId, Show, Video};
use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;

const API_KEY: &str = "test-key";

fn client_with(server_url: &str, page_limit: u32) -> Arc<ApiClient> {
    let mut config = AppConfig::default().with_base_url(server_url);
    config.page_limit = page_limit;
    Arc::new(ApiClient::new(Arc::new(config), API_KEY).unwrap())
}

fn page_query(offset: u32) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("offset".into(), offset.to_string()),
        Matcher::UrlEncoded("api_key".into(), API_KEY.into()),
        Matcher::UrlEncoded("format".into(), "json".into()),
    ])
}

fn video_json(id: u64) -> serde_json::Value {
    json!({
        "id": id,
        "name": format!("Episode {}", id),
        "publish_date": "2014-01-01 00:00:00",
        "hd_url": format!("https://cdn.example.com/ep{}_4000.mp4", id),
    })
}

#[tokio::test]
async fn test_show_videos_pages_until_empty() {
    let mut server = mockito::Server::new_async().await;
    let mut mocks = Vec::new();
    for (offset, results) in [
        (0, json!([video_json(1), video_json(2)])),
        (2, json!([video_json(3), video_json(4)])),
        (4, json!([])),
    ] {
        let mock = server
            .mock("GET", "/videos/")
            .match_query(Matcher::AllOf(vec![
                page_query(offset),
                Matcher::UrlEncoded("filter".into(), "video_show:12".into()),
                Matcher::UrlEncoded("sort".into(), "publish_date:asc".into()),
            ]))
            .with_status(200)
            .with_body(json!({ "error": "OK", "results": results }).to_string())
            .expect(1)
            .create_async()
            .await;
        mocks.push(mock);
    }

    let catalog = Catalog::new(client_with(&server.url(), 2));
    let show: Show = serde_json::from_value(json!({ "id": 12, "title": "Quick Look" })).unwrap();
    let videos = catalog.show_videos(&show).await.unwrap();

    for mock in mocks {
        mock.assert_async().await;
    }
    let ids: Vec<ItemId> = videos.into_iter().map(|v: Video| v.id).collect();
    assert_eq!(ids, (1..=4).map(ItemId::from).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_find_show_ignores_case_and_stops_at_match() {
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("GET", "/video_shows/")
        .match_query(page_query(0))
        .with_status(200)
        .with_body(
            json!({ "results": [
                { "id": 1, "title": "Endurance Run" },
                { "id": 2, "title": "Unprofessional Fridays" },
            ]})
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/video_shows/")
        .match_query(page_query(2))
        .with_status(200)
        .with_body(
            json!({ "results": [
                { "id": 3, "title": "Quick Look", "image": { "original_url": "https://cdn.example.com/ql.png" } },
                { "id": 4, "title": "Quick Look" },
            ]})
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let third = server
        .mock("GET", "/video_shows/")
        .match_query(page_query(4))
        .expect(0)
        .create_async()
        .await;

    let catalog = Catalog::new(client_with(&server.url(), 2));
    let show = catalog.find_show("quick LOOK").await.unwrap().unwrap();

    assert_eq!(show.id, ItemId::from(3));
    assert_eq!(
        show.image.as_ref().and_then(|i| i.url()),
        Some("https://cdn.example.com/ql.png")
    );
    first.assert_async().await;
    second.assert_async().await;
    third.assert_async().await;
}

#[tokio::test]
async fn test_find_show_not_found_is_none() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/video_shows/")
        .match_query(page_query(0))
        .with_status(200)
        .with_body(json!({ "results": [{ "id": 1, "title": "Bombcast" }] }).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/video_shows/")
        .match_query(page_query(2))
        .with_status(200)
        .with_body(json!({ "error": "OK" }).to_string())
        .create_async()
        .await;

    let catalog = Catalog::new(client_with(&server.url(), 2));
    assert!(catalog.find_show("Quick Look").await.unwrap().is_none());
}

#[tokio::test]
async fn test_video_by_id() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/video/2300-1/")
        .match_query(Matcher::UrlEncoded("api_key".into(), API_KEY.into()))
        .with_status(200)
        .with_body(json!({ "results": video_json(1) }).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/video/2300-404/")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(json!({ "error": "Object Not Found", "results": [] }).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/video/2300-5/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({ "error": "Object Not Found", "results": [] }).to_string())
        .create_async()
        .await;

    let catalog = Catalog::new(client_with(&server.url(), 100));
    let video = catalog.video_by_id("2300-1").await.unwrap().unwrap();
    assert_eq!(video.name, "Episode 1");
    assert!(catalog.video_by_id("2300-404").await.unwrap().is_none());
    assert!(catalog.video_by_id("2300-5").await.unwrap().is_none());
}

#[tokio::test]
async fn test_error_status_is_typed() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/video_shows/")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body("Invalid API Key")
        .create_async()
        .await;

    let catalog = Catalog::new(client_with(&server.url(), 100));
    match catalog.find_show("Quick Look").await {
        Err(AppError::Request { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid API Key");
        }
        other => panic!("expected a request error, got {:?}", other.map(|s| s.map(|s| s.title))),
    }
}

#[tokio::test]
async fn test_error_status_uses_envelope_error_text() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/videos/")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(json!({ "error": "Invalid API Key", "results": [] }).to_string())
        .create_async()
        .await;

    let client = client_with(&server.url(), 100);
    match client.fetch_page::<Vec<Video>>("videos", &[]).await {
        Err(AppError::Request { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid API Key");
        }
        other => panic!("expected a request error, got {:?}", other.map(|e| e.results.is_some())),
    }
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/videos/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let client = client_with(&server.url(), 100);
    let result = client.fetch_page::<Vec<Video>>("videos", &[]).await;
    assert!(matches!(
        result,
        Err(AppError::ApiParseFailed { ref endpoint, .. }) if endpoint == "videos"
    ));
}

#[tokio::test]
async fn test_probe_reports_existence() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("HEAD", "/videos/ep1_8000.mp4")
        .match_query(Matcher::UrlEncoded("api_key".into(), API_KEY.into()))
        .with_status(200)
        .create_async()
        .await;
    server
        .mock("HEAD", "/videos/ep2_8000.mp4")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;

    let client = client_with(&server.url(), 100);
    assert!(client.probe_exists(&format!("{}/videos/ep1_8000.mp4", server.url())).await);
    assert!(!client.probe_exists(&format!("{}/videos/ep2_8000.mp4", server.url())).await);
    assert!(!client.probe_exists("not a url").await);
}

#[tokio::test]
async fn test_probe_is_false_when_host_is_down() {
    // Nothing listens on port 1 of the test config's default host.
    let client = Arc::new(ApiClient::new(Arc::new(AppConfig::default()), API_KEY).unwrap());
    assert!(!client.probe_exists("http://127.0.0.1:1/videos/ep1_8000.mp4").await);
}
