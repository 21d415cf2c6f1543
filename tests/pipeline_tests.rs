//! Round trips against a local HTTP server.

use dinlr_client::fixtures::{self, responses};
use dinlr_client::{DinlrClient, DinlrConfig, DinlrError, ErrorKind, Params, WebhookVerifier};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RID: &str = fixtures::RESTAURANT_ID;

fn params(value: serde_json::Value) -> Params {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Params::new(),
    }
}

fn api_key_client(server: &MockServer) -> DinlrClient {
    let config = DinlrConfig::builder()
        .api_key("test-api-key")
        .api_url(&server.uri())
        .unwrap()
        .restaurant_id(RID)
        .build()
        .unwrap();
    DinlrClient::new(config).unwrap()
}

fn oauth_client(server: &MockServer, expires_in: i64) -> DinlrClient {
    let now = chrono::Utc::now().timestamp();
    let config = DinlrConfig::builder()
        .client_id("app-id")
        .client_secret("app-secret")
        .redirect_uri("https://app.example.com/callback")
        .access_token("old-token")
        .refresh_token("refresh-1")
        .expires_at(now + expires_in)
        .api_url(&server.uri())
        .unwrap()
        .restaurant_id(RID)
        .build()
        .unwrap();
    DinlrClient::new(config).unwrap()
}

#[tokio::test]
async fn test_get_sends_auth_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/{}/onlineorder/locations", RID)))
        .and(header("authorization", "Bearer test-api-key"))
        .and(header("accept", "application/json"))
        .and(header("user-agent", dinlr_client::USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(responses::locations_list()))
        .expect(1)
        .mount(&server)
        .await;

    let locations = api_key_client(&server).locations().list(None).await.unwrap();

    assert_eq!(locations.len(), 2);
    assert_eq!(locations[0], fixtures::location());
}

#[tokio::test]
async fn test_location_filter_and_params_in_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/{}/onlineorder/orders", RID)))
        .and(query_param("location_id", fixtures::LOCATION_ID))
        .and(query_param("detail", "all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let orders = api_key_client(&server)
        .orders()
        .list_for_location(fixtures::LOCATION_ID, &params(json!({"detail": "all"})))
        .await
        .unwrap();

    assert!(orders.is_empty());
}

#[tokio::test]
async fn test_post_sends_sanitized_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{}/onlineorder/customers", RID)))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "first_name": "Mei",
            "last_name": "Tan",
            "email": "mei.tan@example.com"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(responses::customer()))
        .expect(1)
        .mount(&server)
        .await;

    let customer = api_key_client(&server)
        .customers()
        .create(&params(json!({
            "first_name": " Mei\u{0007}",
            "last_name": "Tan",
            "email": "mei.tan@example.com"
        })))
        .await
        .unwrap();

    assert_eq!(customer.full_name(), "Mei Tan");
}

#[tokio::test]
async fn test_error_status_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/{}/onlineorder/orders/ord_404", RID)))
        .respond_with(ResponseTemplate::new(404).set_body_json(responses::error("Order not found")))
        .mount(&server)
        .await;

    let err = api_key_client(&server).orders().get("ord_404").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Api);
    let api = err.as_api().unwrap();
    assert!(api.is_not_found());
    assert_eq!(api.message, "Order not found");
    let context = api.context.as_ref().unwrap();
    assert_eq!(context.method, "GET");
    assert_eq!(context.response, responses::error("Order not found"));
}

#[tokio::test]
async fn test_errors_object_in_success_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/{}/onlineorder/restaurant", RID)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(responses::errors_object(422, "Bad restaurant")),
        )
        .mount(&server)
        .await;

    let err = api_key_client(&server).restaurant().get().await.unwrap_err();

    assert_eq!(err.http_status(), Some(422));
    assert_eq!(err.as_api().unwrap().message, "Bad restaurant");
}

#[tokio::test]
async fn test_rate_limit_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).set_body_json(responses::error("Too many requests")))
        .mount(&server)
        .await;

    let err = api_key_client(&server).restaurant().get().await.unwrap_err();

    assert!(err.as_api().unwrap().is_rate_limited());
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_non_json_success_is_response_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = api_key_client(&server).restaurant().get().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Response);
}

#[tokio::test]
async fn test_expiring_token_is_refreshed_before_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{}/oauth/token", RID)))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(responses::token("new-token", "refresh-2")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/{}/onlineorder/restaurant", RID)))
        .and(header("authorization", "Bearer new-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(responses::restaurant()))
        .expect(1)
        .mount(&server)
        .await;

    let client = oauth_client(&server, 60);
    let restaurant = client.restaurant().get().await.unwrap();

    assert_eq!(restaurant.id, RID);
    let state = client.token_state().await.unwrap();
    assert_eq!(state.access_token(), Some("new-token"));
    assert_eq!(state.refresh_token(), Some("refresh-2"));
}

#[tokio::test]
async fn test_fresh_token_is_sent_without_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{}/oauth/token", RID)))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer old-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(responses::restaurant()))
        .expect(1)
        .mount(&server)
        .await;

    let client = oauth_client(&server, 3600);
    client.restaurant().get().await.unwrap();
}

#[tokio::test]
async fn test_exchange_code_stores_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/r9/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=abc123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(responses::token("issued", "refresh-x")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = DinlrConfig::builder()
        .client_id("app-id")
        .client_secret("app-secret")
        .redirect_uri("https://app.example.com/callback")
        .api_url(&server.uri())
        .unwrap()
        .build()
        .unwrap();
    let client = DinlrClient::new(config).unwrap();

    let tokens = client.exchange_code("abc123", "r9").await.unwrap();

    assert_eq!(tokens.access_token, "issued");
    assert_eq!(client.restaurant_id().as_deref(), Some("r9"));
    assert_eq!(
        client.token_state().await.unwrap().access_token(),
        Some("issued")
    );
}

#[tokio::test]
async fn test_exchange_failure_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"error": "invalid_grant", "error_description": "Code expired"})),
        )
        .mount(&server)
        .await;

    let config = DinlrConfig::builder()
        .client_id("app-id")
        .client_secret("app-secret")
        .redirect_uri("https://app.example.com/callback")
        .api_url(&server.uri())
        .unwrap()
        .build()
        .unwrap();
    let client = DinlrClient::new(config).unwrap();

    let err = client.exchange_code("stale", "r9").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_eq!(err.http_status(), Some(400));
    assert!(client.restaurant_id().is_none());
}

#[tokio::test]
async fn test_webhook_delivery_round_trip() {
    let verifier = WebhookVerifier::new("whsec_live");
    let body = responses::webhook_event("customer.created").to_string();
    let header = verifier
        .sign(&body, chrono::Utc::now().timestamp())
        .unwrap();

    let event = verifier.construct_event(&body, &header).unwrap();

    assert!(event.is_customer_event());
    assert!(event.is_create_event());
    assert_eq!(event.restaurant.as_deref(), Some(RID));

    let err = WebhookVerifier::new("whsec_other")
        .construct_event(&body, &header)
        .unwrap_err();
    assert_eq!(DinlrError::from(err).kind(), ErrorKind::Webhook);
}
