//! OAuth token refresh and pre-dispatch validation through the mock transport.

use dinlr_client::fixtures::responses;
use dinlr_client::mocks::{MockHttpTransport, MockResponse};
use dinlr_client::{DinlrClient, DinlrConfig, ErrorKind, Params};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

fn oauth_setup(expires_in: i64) -> (Arc<MockHttpTransport>, DinlrClient) {
    let mock = Arc::new(MockHttpTransport::new());
    let config = DinlrConfig::builder()
        .client_id("app-id")
        .client_secret("app-secret")
        .redirect_uri("https://app.example.com/callback")
        .access_token("old")
        .refresh_token("refresh-1")
        .expires_at(chrono::Utc::now().timestamp() + expires_in)
        .restaurant_id("r1")
        .build()
        .unwrap();
    let client = DinlrClient::with_transport(config, mock.clone());
    (mock, client)
}

fn authorization(request: &dinlr_client::transport::HttpRequest) -> Option<String> {
    request
        .headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[tokio::test]
async fn test_concurrent_requests_share_one_refresh() {
    let (mock, client) = oauth_setup(100);
    mock.add_response(
        MockResponse::json(&responses::token("new", "refresh-2"))
            .with_delay(Duration::from_millis(50)),
    );
    mock.add_response(MockResponse::json(&responses::restaurant()));
    mock.add_response(MockResponse::json(&responses::locations_list()));

    let restaurant_api = client.restaurant();
    let locations_api = client.locations();
    let (restaurant, locations) = tokio::join!(
        restaurant_api.get(),
        locations_api.list(None)
    );
    assert_ok!(restaurant);
    assert_ok!(locations);

    let requests = mock.get_requests();
    assert_eq!(requests.len(), 3);

    let refreshes: Vec<_> = requests
        .iter()
        .filter(|r| r.url.path() == "/v1/r1/oauth/token")
        .collect();
    assert_eq!(refreshes.len(), 1);

    for request in requests.iter().filter(|r| r.url.path() != "/v1/r1/oauth/token") {
        assert_eq!(authorization(request).as_deref(), Some("Bearer new"));
    }

    let state = client.token_state().await.unwrap();
    assert_eq!(state.access_token(), Some("new"));
    assert_eq!(state.refresh_token(), Some("refresh-2"));
}

#[tokio::test]
async fn test_failed_refresh_leaves_tokens_untouched() {
    let (mock, client) = oauth_setup(100);
    mock.add_response(MockResponse::error(400, "invalid_grant"));

    let err = assert_err!(client.restaurant().get().await);

    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_eq!(mock.request_count(), 1);

    let state = client.token_state().await.unwrap();
    assert_eq!(state.access_token(), Some("old"));
    assert_eq!(state.refresh_token(), Some("refresh-1"));
}

#[tokio::test]
async fn test_timed_out_refresh_is_auth_error() {
    let (mock, client) = oauth_setup(100);
    mock.add_response(MockResponse::timeout());
    mock.add_response(MockResponse::json(&responses::restaurant()));

    let err = assert_err!(client.restaurant().get().await);

    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_eq!(err.http_status(), None);
    assert_eq!(mock.request_count(), 1);
    assert_eq!(mock.last_request().unwrap().url.path(), "/v1/r1/oauth/token");

    let state = client.token_state().await.unwrap();
    assert_eq!(state.access_token(), Some("old"));
    assert_eq!(state.refresh_token(), Some("refresh-1"));
}

#[tokio::test]
async fn test_fresh_token_skips_refresh() {
    let (mock, client) = oauth_setup(3600);
    mock.add_response(MockResponse::json(&responses::restaurant()));

    assert_ok!(client.restaurant().get().await);

    assert_eq!(mock.request_count(), 1);
    let request = mock.last_request().unwrap();
    assert_eq!(request.url.path(), "/v1/r1/onlineorder/restaurant");
    assert_eq!(authorization(&request).as_deref(), Some("Bearer old"));
}

#[tokio::test]
async fn test_set_access_token_is_used_next() {
    let (mock, client) = oauth_setup(3600);
    mock.add_response(MockResponse::json(&responses::restaurant()));

    client.set_access_token("manual").await.unwrap();
    assert_ok!(client.restaurant().get().await);

    assert_eq!(
        authorization(&mock.last_request().unwrap()).as_deref(),
        Some("Bearer manual")
    );
}

#[tokio::test]
async fn test_invalid_input_sends_nothing() {
    let (mock, client) = oauth_setup(100);

    let mut data = Params::new();
    data.insert("member".into(), json!(123));
    data.insert("points".into(), json!(10));

    let err = assert_err!(client.loyalty().create_transaction("prog_1", &data).await);

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.as_validation().unwrap().field(), Some("member"));
    assert_eq!(mock.request_count(), 0);
}
