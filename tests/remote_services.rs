use std::sync::Arc;

use httptest::matchers::{all_of, contains, request, url_decoded};
use httptest::responders::{json_encoded, status_code};
use httptest::{Expectation, Server};
use parking_lot::Mutex;
use secrecy::SecretString;
use serde_json::json;

use bank_browser::{
    AlertSink, AppConfig, AppError, BrowserSession, GeocodeStatus, HeadlessMap, LatLng,
    MarkerHandle, NearbySearch, PlaceId, PopupView, RemoteServices, StalePopupPolicy,
};

#[derive(Default)]
struct RecordingView {
    content: Mutex<Option<String>>,
}

impl PopupView for RecordingView {
    fn open(&self, _anchor: Option<MarkerHandle>, html: &str) {
        *self.content.lock() = Some(html.to_string());
    }

    fn set_content(&self, html: &str) {
        *self.content.lock() = Some(html.to_string());
    }

    fn close(&self) {
        *self.content.lock() = None;
    }
}

#[derive(Default)]
struct RecordingAlerts {
    messages: Mutex<Vec<String>>,
}

impl AlertSink for RecordingAlerts {
    fn alert(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

fn config_for(server: &Server) -> AppConfig {
    AppConfig {
        google_maps_api_key: Some(SecretString::from("test-key".to_string())),
        places_nearby_endpoint: server.url("/place/nearbysearch/json").to_string(),
        geocode_endpoint: server.url("/geocode/json").to_string(),
        wiki_api_endpoint: server.url("/w/api.php").to_string(),
        wiki_article_base: "https://en.wikipedia.org/wiki/".into(),
        stale_popup_policy: StalePopupPolicy::Discard,
        ..AppConfig::default()
    }
}

fn nearby_body() -> serde_json::Value {
    json!({
        "status": "OK",
        "results": [
            {
                "place_id": "chase",
                "name": "Chase Bank",
                "geometry": { "location": { "lat": 40.03, "lng": -74.22 } }
            },
            {
                "place_id": "wells",
                "name": "Wells Fargo",
                "geometry": { "location": { "lat": 40.05, "lng": -74.25 } }
            }
        ]
    })
}

#[tokio::test]
async fn nearby_search_sends_location_radius_and_type() {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/place/nearbysearch/json"),
            request::query(url_decoded(contains(("location", "40.0374771,-74.2339456")))),
            request::query(url_decoded(contains(("radius", "5000")))),
            request::query(url_decoded(contains(("type", "bank")))),
            request::query(url_decoded(contains(("key", "test-key")))),
        ])
        .respond_with(json_encoded(nearby_body())),
    );

    let config = config_for(&server);
    let remote = RemoteServices::from_config(&config).expect("remote services");
    let places = remote
        .places
        .nearby_search(&NearbySearch::from_config(&config))
        .await
        .expect("nearby search");

    assert_eq!(places.len(), 2);
    assert_eq!(places[0].id, PlaceId::from("chase"));
    assert_eq!(places[1].location, LatLng::new(40.05, -74.25));
    assert!(places.iter().all(|p| p.marker.is_none()));
}

#[tokio::test]
async fn nearby_search_rejects_error_status() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::path("/place/nearbysearch/json"))
            .respond_with(json_encoded(json!({ "status": "REQUEST_DENIED", "results": [] }))),
    );

    let config = config_for(&server);
    let remote = RemoteServices::from_config(&config).expect("remote services");
    let err = remote
        .places
        .nearby_search(&NearbySearch::from_config(&config))
        .await
        .expect_err("denied");
    match err {
        AppError::Provider { service, status } => {
            assert_eq!(service, "places");
            assert_eq!(status, "REQUEST_DENIED");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn geocoder_maps_statuses() {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::path("/geocode/json"),
            request::query(url_decoded(contains(("latlng", "1,2")))),
        ])
        .respond_with(json_encoded(json!({
            "status": "OK",
            "results": [
                { "formatted_address": "123 Main St" },
                { "formatted_address": "Somewhere else" }
            ]
        }))),
    );
    server.expect(
        Expectation::matching(all_of![
            request::path("/geocode/json"),
            request::query(url_decoded(contains(("latlng", "3,4")))),
        ])
        .respond_with(json_encoded(json!({ "status": "OVER_QUERY_LIMIT" }))),
    );
    server.expect(
        Expectation::matching(all_of![
            request::path("/geocode/json"),
            request::query(url_decoded(contains(("latlng", "5,6")))),
        ])
        .respond_with(status_code(500)),
    );

    let remote = RemoteServices::from_config(&config_for(&server)).expect("remote services");

    let found = remote
        .geocoder
        .reverse_geocode(LatLng::new(1.0, 2.0))
        .await
        .expect("geocode");
    assert_eq!(found[0].formatted_address, "123 Main St");

    let limited = remote.geocoder.reverse_geocode(LatLng::new(3.0, 4.0)).await;
    assert_eq!(limited, Err(GeocodeStatus::OverQueryLimit));

    let broken = remote.geocoder.reverse_geocode(LatLng::new(5.0, 6.0)).await;
    assert_eq!(broken, Err(GeocodeStatus::Error));
}

#[tokio::test]
async fn wiki_search_returns_titles_in_order() {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/w/api.php"),
            request::query(url_decoded(contains(("action", "query")))),
            request::query(url_decoded(contains(("list", "search")))),
            request::query(url_decoded(contains(("srsearch", "Chase Bank")))),
        ])
        .respond_with(json_encoded(json!({
            "query": {
                "search": [
                    { "title": "JPMorgan Chase", "pageid": 1 },
                    { "pageid": 3 },
                    { "title": "Chase Bank (disambiguation)", "pageid": 2 }
                ]
            }
        }))),
    );

    let remote = RemoteServices::from_config(&config_for(&server)).expect("remote services");
    let hits = remote.articles.search("Chase Bank").await.expect("search");
    let titles: Vec<_> = hits.iter().map(|hit| hit.title.as_deref()).collect();
    assert_eq!(
        titles,
        [Some("JPMorgan Chase"), None, Some("Chase Bank (disambiguation)")]
    );
}

#[tokio::test]
async fn session_filters_and_enriches_popup() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::path("/place/nearbysearch/json"))
            .respond_with(json_encoded(nearby_body())),
    );
    server.expect(
        Expectation::matching(all_of![
            request::path("/geocode/json"),
            request::query(url_decoded(contains(("latlng", "40.03,-74.22")))),
        ])
        .respond_with(json_encoded(json!({
            "status": "OK",
            "results": [{ "formatted_address": "123 Main St" }]
        }))),
    );
    server.expect(
        Expectation::matching(all_of![
            request::path("/w/api.php"),
            request::query(url_decoded(contains(("srsearch", "Chase Bank")))),
        ])
        .respond_with(json_encoded(json!({ "query": { "search": [] } }))),
    );

    let config = config_for(&server);
    let remote = RemoteServices::from_config(&config).expect("remote services");
    let map = Arc::new(HeadlessMap::new());
    let view = Arc::new(RecordingView::default());
    let alerts = Arc::new(RecordingAlerts::default());
    let mut session =
        BrowserSession::bootstrap(config, remote, map.clone(), view.clone(), alerts.clone())
            .await
            .expect("bootstrap");
    assert_eq!(map.visible_marker_count(), 2);

    let visible = session.browser_mut().set_filter("chase");
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].name, "Chase Bank");
    assert_eq!(map.visible_marker_count(), 1);

    session
        .browser()
        .select_place(&visible[0].id)
        .expect("known place")
        .settled()
        .await;

    let content = view.content.lock().clone().expect("popup open");
    assert!(content.starts_with("<h1>Chase Bank</h1>"));
    assert!(content.contains("123 Main St"));
    assert!(content.contains("No articles found"));
    assert!(alerts.messages.lock().is_empty());

    session.browser_mut().set_filter("");
    assert_eq!(map.visible_marker_count(), 2);
}

#[tokio::test]
async fn failed_roster_load_alerts_once() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::path("/place/nearbysearch/json"))
            .respond_with(status_code(503)),
    );

    let config = config_for(&server);
    let remote = RemoteServices::from_config(&config).expect("remote services");
    let alerts = Arc::new(RecordingAlerts::default());
    let result = BrowserSession::bootstrap(
        config,
        remote,
        Arc::new(HeadlessMap::new()),
        Arc::new(RecordingView::default()),
        alerts.clone(),
    )
    .await;

    assert!(matches!(result, Err(AppError::Http(_))));
    assert_eq!(
        alerts.messages.lock().as_slice(),
        ["Failed to retrieve map locations".to_string()]
    );
}

#[tokio::test]
async fn empty_roster_fails_bootstrap_with_alert() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::path("/place/nearbysearch/json"))
            .respond_with(json_encoded(json!({ "status": "ZERO_RESULTS", "results": [] }))),
    );

    let config = config_for(&server);
    let remote = RemoteServices::from_config(&config).expect("remote services");
    let alerts = Arc::new(RecordingAlerts::default());
    let result = BrowserSession::bootstrap(
        config,
        remote,
        Arc::new(HeadlessMap::new()),
        Arc::new(RecordingView::default()),
        alerts.clone(),
    )
    .await;

    match result {
        Err(AppError::Provider { service, status }) => {
            assert_eq!(service, "places");
            assert_eq!(status, "ZERO_RESULTS");
        }
        Err(other) => panic!("unexpected error {other:?}"),
        Ok(_) => panic!("bootstrap succeeded without places"),
    }
    assert_eq!(
        alerts.messages.lock().as_slice(),
        ["Failed to retrieve map locations".to_string()]
    );
}
