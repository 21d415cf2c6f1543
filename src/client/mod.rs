//! Dinlr client implementation.
//!
//! [`DinlrClient`] owns the request pipeline every resource service goes
//! through: URL and header construction, token refresh before dispatch,
//! parameter placement, response decoding and error mapping.

use crate::auth::{
    validate_callback, AuthorizationCallback, CallbackParams, OAuthFlow, TokenManager,
    TokenResponse, TokenState,
};
use crate::config::{AuthMode, DinlrConfig};
use crate::errors::{
    ApiError, ApiErrorContext, ConfigurationError, DinlrResult, ResponseError,
};
use crate::observability::{redact_json, redact_url, sanitize_for_log, Redacted};
use crate::services::*;
use crate::transport::{HttpRequest, HttpTransport, ReqwestTransport};
use crate::validation::Params;
use bytes::Bytes;
use http::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use http::Method;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use url::Url;
use uuid::Uuid;

struct OAuthSession {
    flow: OAuthFlow,
    tokens: TokenManager,
}

/// Dinlr API client.
///
/// Cheap to share behind an [`Arc`]; every method takes `&self`.
pub struct DinlrClient {
    config: Arc<DinlrConfig>,
    transport: Arc<dyn HttpTransport>,
    oauth: Option<OAuthSession>,
    restaurant_id: RwLock<Option<String>>,
}

impl std::fmt::Debug for DinlrClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DinlrClient")
            .field("config", &self.config)
            .field("restaurant_id", &*self.restaurant_id.read())
            .finish_non_exhaustive()
    }
}

impl DinlrClient {
    /// Create a client backed by reqwest
    pub fn new(config: DinlrConfig) -> DinlrResult<Self> {
        let transport = Arc::new(ReqwestTransport::new(config.timeout)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Create a client with a custom transport
    pub fn with_transport(config: DinlrConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let oauth = match &config.auth {
            AuthMode::OAuth(credentials) => {
                let flow = OAuthFlow::new(
                    credentials,
                    config.api_url.clone(),
                    config.auth_base_url.clone(),
                    transport.clone(),
                );
                let initial = TokenState::new(
                    credentials.access_token.as_ref().map(expose_owned),
                    credentials.refresh_token.as_ref().map(expose_owned),
                    credentials.expires_at,
                );
                Some(OAuthSession {
                    flow,
                    tokens: TokenManager::new(initial, config.token_refresh_buffer),
                })
            }
            AuthMode::ApiKey(_) => None,
        };

        Self {
            restaurant_id: RwLock::new(config.restaurant_id.clone()),
            config: Arc::new(config),
            transport,
            oauth,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &DinlrConfig {
        &self.config
    }

    /// Restaurant targeted when a call does not name one
    pub fn restaurant_id(&self) -> Option<String> {
        self.restaurant_id.read().clone()
    }

    /// Change the default restaurant
    pub fn set_restaurant_id(&self, restaurant_id: impl Into<String>) {
        *self.restaurant_id.write() = Some(restaurant_id.into());
    }

    // Service accessors

    /// Restaurant details
    pub fn restaurant(&self) -> RestaurantService<'_> {
        RestaurantService::new(self)
    }

    /// Locations
    pub fn locations(&self) -> LocationsService<'_> {
        CatalogService::new(self)
    }

    /// Dining options
    pub fn dining_options(&self) -> DiningOptionsService<'_> {
        CatalogService::new(self)
    }

    /// Payment methods
    pub fn payment_methods(&self) -> PaymentMethodsService<'_> {
        CatalogService::new(self)
    }

    /// Charges
    pub fn charges(&self) -> ChargesService<'_> {
        CatalogService::new(self)
    }

    /// Items
    pub fn items(&self) -> ItemsService<'_> {
        CatalogService::new(self)
    }

    /// Modifiers
    pub fn modifiers(&self) -> ModifiersService<'_> {
        CatalogService::new(self)
    }

    /// Categories
    pub fn categories(&self) -> CategoriesService<'_> {
        CatalogService::new(self)
    }

    /// Discounts
    pub fn discounts(&self) -> DiscountsService<'_> {
        DiscountsService::new(self)
    }

    /// Promotions
    pub fn promotions(&self) -> PromotionsService<'_> {
        PromotionsService::new(self)
    }

    /// Vouchers
    pub fn vouchers(&self) -> VouchersService<'_> {
        VouchersService::new(self)
    }

    /// Menus
    pub fn menu(&self) -> MenuService<'_> {
        MenuService::new(self)
    }

    /// Customers
    pub fn customers(&self) -> CustomersService<'_> {
        CustomersService::new(self)
    }

    /// Customer groups
    pub fn customer_groups(&self) -> CustomerGroupsService<'_> {
        CatalogService::new(self)
    }

    /// Loyalty programs, members and transactions
    pub fn loyalty(&self) -> LoyaltyService<'_> {
        LoyaltyService::new(self)
    }

    /// Store credit
    pub fn store_credit(&self) -> StoreCreditService<'_> {
        StoreCreditService::new(self)
    }

    /// Cart calculation and submission
    pub fn cart(&self) -> CartService<'_> {
        CartService::new(self)
    }

    /// Orders
    pub fn orders(&self) -> OrdersService<'_> {
        OrdersService::new(self)
    }

    /// Reservation experiences
    pub fn experiences(&self) -> ExperiencesService<'_> {
        CatalogService::new(self)
    }

    /// Table sections
    pub fn table_sections(&self) -> TableSectionsService<'_> {
        CatalogService::new(self)
    }

    /// Reservations
    pub fn reservations(&self) -> ReservationsService<'_> {
        ReservationsService::new(self)
    }

    /// Inventory materials
    pub fn materials(&self) -> MaterialsService<'_> {
        MaterialsService::new(self)
    }

    /// Floorplans
    pub fn floorplans(&self) -> FloorplansService<'_> {
        FloorplansService::new(self)
    }

    // OAuth

    fn oauth_session(&self) -> DinlrResult<&OAuthSession> {
        self.oauth
            .as_ref()
            .ok_or_else(|| ConfigurationError::OAuthNotConfigured.into())
    }

    /// URL of the consent page the user should be sent to
    pub fn authorization_url(&self, state: &str) -> DinlrResult<String> {
        self.oauth_session()?.flow.authorization_url(state)
    }

    /// Validate the parameters Dinlr redirected back with
    pub fn handle_callback(
        &self,
        params: &CallbackParams,
        expected_state: &str,
    ) -> DinlrResult<AuthorizationCallback> {
        self.oauth_session()?;
        Ok(validate_callback(params, expected_state)?)
    }

    /// Exchange an authorization code and keep the issued tokens.
    ///
    /// The restaurant becomes the client default if none is set.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str, restaurant_id: &str) -> DinlrResult<TokenResponse> {
        let session = self.oauth_session()?;
        let response = session.flow.exchange_code(code, restaurant_id).await?;
        session.tokens.store(&response).await;

        {
            let mut current = self.restaurant_id.write();
            if current.is_none() {
                *current = Some(restaurant_id.to_string());
            }
        }

        Ok(response)
    }

    /// Refresh the access token now
    #[instrument(skip(self))]
    pub async fn refresh_access_token(&self) -> DinlrResult<TokenResponse> {
        let session = self.oauth_session()?;
        let restaurant_id = self.restaurant_id();
        session
            .tokens
            .refresh(&session.flow, restaurant_id.as_deref())
            .await
    }

    /// Replace the access token
    pub async fn set_access_token(&self, token: impl Into<String>) -> DinlrResult<()> {
        self.oauth_session()?.tokens.set_access_token(token).await;
        Ok(())
    }

    /// Snapshot of the held OAuth tokens
    pub async fn token_state(&self) -> DinlrResult<TokenState> {
        Ok(self.oauth_session()?.tokens.snapshot().await)
    }

    // HTTP methods

    /// GET an endpoint and decode the `data` envelope
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str, params: Option<&Params>) -> DinlrResult<T> {
        let body = self.request(Method::GET, endpoint, params).await?;
        decode_data(body)
    }

    /// GET an endpoint whose `data` may be absent
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: Option<&Params>,
    ) -> DinlrResult<Option<T>> {
        let mut body = self.request(Method::GET, endpoint, params).await?;
        match body.get_mut("data").map(Value::take) {
            None | Some(Value::Null) => Ok(None),
            Some(data) => Ok(Some(serde_json::from_value(data).map_err(ResponseError::from)?)),
        }
    }

    /// GET a collection; a response without `data` is an empty list
    pub async fn get_list<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: Option<&Params>,
    ) -> DinlrResult<Vec<T>> {
        let mut body = self.request(Method::GET, endpoint, params).await?;
        match body.get_mut("data").map(Value::take) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(data) => Ok(serde_json::from_value(data).map_err(ResponseError::from)?),
        }
    }

    /// POST a JSON body and decode the `data` envelope
    pub async fn post<T: DeserializeOwned>(&self, endpoint: &str, body: &Params) -> DinlrResult<T> {
        let body = self.request(Method::POST, endpoint, Some(body)).await?;
        decode_data(body)
    }

    /// PUT a JSON body and decode the `data` envelope
    pub async fn put<T: DeserializeOwned>(&self, endpoint: &str, body: &Params) -> DinlrResult<T> {
        let body = self.request(Method::PUT, endpoint, Some(body)).await?;
        decode_data(body)
    }

    /// Send a request and return the decoded JSON body.
    ///
    /// GET parameters go in the query string; for other methods a non-empty
    /// map becomes the JSON body. An empty response body decodes as `null`.
    #[instrument(skip(self, params))]
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        params: Option<&Params>,
    ) -> DinlrResult<Value> {
        let mut url = Url::parse(&self.config.build_url(endpoint)).map_err(|e| {
            ConfigurationError::InvalidUrl {
                message: e.to_string(),
            }
        })?;

        let params = params.filter(|p| !p.is_empty());
        let mut body = None;

        if method == Method::GET {
            let pairs = params.map(query_pairs).unwrap_or_default();
            if !pairs.is_empty() {
                url.query_pairs_mut().extend_pairs(pairs);
            }
        } else if let Some(params) = params {
            let json = serde_json::to_vec(params).map_err(ResponseError::from)?;
            body = Some(Bytes::from(json));
        }

        let token = self.bearer_token().await?;
        let headers = self.build_headers(&method, token.as_deref())?;

        let request_id = Uuid::new_v4();
        if self.config.debug {
            let logged_params = params
                .map(|p| redact_json(&serde_json::Value::Object(p.clone())).to_string())
                .unwrap_or_default();
            debug!(
                request_id = %request_id,
                method = %method,
                url = %sanitize_for_log(&redact_url(url.as_str())),
                params = %sanitize_for_log(&logged_params),
                authorization = ?token.as_ref().map(Redacted::new),
                "Sending Dinlr API request"
            );
        }

        let request = HttpRequest {
            method: method.clone(),
            url,
            headers,
            body,
        };
        let response = self.transport.send(request).await?;

        let decoded = if response.body.iter().all(u8::is_ascii_whitespace) {
            Ok(Value::Null)
        } else {
            serde_json::from_slice::<Value>(&response.body)
        };

        if self.config.debug {
            let logged = match &decoded {
                Ok(value) => redact_json(value).to_string(),
                Err(_) => String::from_utf8_lossy(&response.body).into_owned(),
            };
            debug!(
                request_id = %request_id,
                status = response.status,
                body = %sanitize_for_log(&logged),
                "Received Dinlr API response"
            );
        }

        if response.status >= 400 {
            let body = decoded.unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&response.body).into_owned())
            });
            return Err(api_error(response.status, body, endpoint, &method).into());
        }

        let body = decoded.map_err(ResponseError::from)?;

        if let Some(errors) = body.get("errors").filter(|e| e.is_object()) {
            let status = errors
                .get("status")
                .and_then(|s| s.as_u64().or_else(|| s.as_str()?.parse().ok()))
                .and_then(|s| u16::try_from(s).ok())
                .unwrap_or(400);
            return Err(api_error(status, body, endpoint, &method).into());
        }

        Ok(body)
    }

    async fn bearer_token(&self) -> DinlrResult<Option<String>> {
        match (&self.config.auth, &self.oauth) {
            (AuthMode::ApiKey(key), _) => Ok(Some(key.expose().to_string())),
            (AuthMode::OAuth(_), Some(session)) => {
                let restaurant_id = self.restaurant_id();
                let token = session
                    .tokens
                    .ensure_fresh(&session.flow, restaurant_id.as_deref())
                    .await?;
                if token.is_none() {
                    warn!("No OAuth access token held, sending request without authorization");
                }
                Ok(token)
            }
            (AuthMode::OAuth(_), None) => Ok(None),
        }
    }

    fn build_headers(&self, method: &Method, token: Option<&str>) -> DinlrResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(crate::USER_AGENT));

        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                ConfigurationError::InvalidConfiguration {
                    message: "access token contains characters not allowed in a header".to_string(),
                }
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        if method != Method::GET {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        Ok(headers)
    }
}

fn expose_owned(secret: &secrecy::SecretString) -> String {
    use secrecy::ExposeSecret;
    secret.expose_secret().clone()
}

/// Flatten request parameters into query pairs.
///
/// Arrays repeat the key with a `[]` suffix; nested objects are sent as JSON.
pub(crate) fn query_pairs(params: &Params) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    for (key, value) in params {
        match value {
            Value::Array(items) => {
                let key = format!("{}[]", key);
                pairs.extend(
                    items
                        .iter()
                        .filter_map(query_value)
                        .map(|item| (key.clone(), item)),
                );
            }
            other => {
                if let Some(value) = query_value(other) {
                    pairs.push((key.clone(), value));
                }
            }
        }
    }

    pairs
}

fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn error_message(body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .or_else(|| body.get("errors")?.get("detail")?.as_str())
        .unwrap_or("API error")
        .to_string()
}

fn api_error(status: u16, body: Value, endpoint: &str, method: &Method) -> ApiError {
    ApiError::new(status, error_message(&body)).with_context(ApiErrorContext {
        endpoint: endpoint.to_string(),
        method: method.to_string(),
        response: body,
    })
}

fn decode_data<T: DeserializeOwned>(mut body: Value) -> DinlrResult<T> {
    match body.get_mut("data").map(Value::take) {
        None | Some(Value::Null) => Err(ResponseError::Deserialization {
            message: "response has no data".to_string(),
        }
        .into()),
        Some(data) => Ok(serde_json::from_value(data).map_err(ResponseError::from)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{DinlrError, ErrorKind};
    use crate::mocks::{MockHttpTransport, MockResponse};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn api_key_client(mock: Arc<MockHttpTransport>) -> DinlrClient {
        let config = DinlrConfig::builder()
            .api_key("test-key")
            .restaurant_id("r1")
            .build()
            .unwrap();
        DinlrClient::with_transport(config, mock)
    }

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_query_pairs_encoding() {
        let pairs = query_pairs(&params(json!({
            "location_id": "L1",
            "limit": 50,
            "detail": true,
            "ids": ["a", "b"],
            "filter": {"x": 1},
            "skip": null
        })));

        assert_eq!(
            pairs,
            vec![
                ("detail".to_string(), "true".to_string()),
                ("filter".to_string(), "{\"x\":1}".to_string()),
                ("ids[]".to_string(), "a".to_string()),
                ("ids[]".to_string(), "b".to_string()),
                ("limit".to_string(), "50".to_string()),
                ("location_id".to_string(), "L1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_get_sends_query_and_headers() {
        let mock = Arc::new(MockHttpTransport::new());
        mock.add_response(MockResponse::data(json!([])));
        let client = api_key_client(mock.clone());

        client
            .request(
                Method::GET,
                "/r1/onlineorder/items",
                Some(&params(json!({"limit": 10}))),
            )
            .await
            .unwrap();

        let request = mock.last_request().unwrap();
        assert_eq!(
            request.url.as_str(),
            "https://api.dinlr.com/v1/r1/onlineorder/items?limit=10"
        );
        assert_eq!(request.headers[AUTHORIZATION], "Bearer test-key");
        assert_eq!(request.headers[ACCEPT], "application/json");
        assert!(request.headers.get(CONTENT_TYPE).is_none());
        assert!(request.body.is_none());
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let mock = Arc::new(MockHttpTransport::new());
        mock.add_response(MockResponse::data(json!({"id": "c1"})));
        let client = api_key_client(mock.clone());

        client
            .request(
                Method::POST,
                "r1/onlineorder/customers",
                Some(&params(json!({"first_name": "Ann"}))),
            )
            .await
            .unwrap();

        let request = mock.last_request().unwrap();
        assert_eq!(request.headers[CONTENT_TYPE], "application/json");
        assert_eq!(request.body_text().as_deref(), Some("{\"first_name\":\"Ann\"}"));
        assert_eq!(request.url.query(), None);
    }

    #[tokio::test]
    async fn test_debug_logging_leaves_request_intact() {
        let mock = Arc::new(MockHttpTransport::new());
        mock.add_response(MockResponse::data(json!({"id": "c1", "access_token": "issued"})));
        let config = DinlrConfig::builder()
            .api_key("test-key")
            .restaurant_id("r1")
            .debug(true)
            .build()
            .unwrap();
        let client = DinlrClient::with_transport(config, mock.clone());

        let body = client
            .request(
                Method::POST,
                "r1/onlineorder/customers",
                Some(&params(json!({"first_name": "Ann", "access_token": "at-1"}))),
            )
            .await
            .unwrap();

        assert_eq!(body["data"]["access_token"], "issued");
        let request = mock.last_request().unwrap();
        assert_eq!(
            request.body_text().as_deref(),
            Some("{\"access_token\":\"at-1\",\"first_name\":\"Ann\"}")
        );
    }

    #[tokio::test]
    async fn test_error_status_maps_to_api_error() {
        let mock = Arc::new(MockHttpTransport::new());
        mock.add_response(MockResponse::error(404, "Order not found"));
        let client = api_key_client(mock);

        let err = client
            .request(Method::GET, "r1/onlineorder/orders/o1", None)
            .await
            .unwrap_err();

        let api = err.as_api().unwrap();
        assert_eq!(api.status, 404);
        assert_eq!(api.message, "Order not found");
        let context = api.context.as_ref().unwrap();
        assert_eq!(context.endpoint, "r1/onlineorder/orders/o1");
        assert_eq!(context.method, "GET");
    }

    #[tokio::test]
    async fn test_errors_object_in_success_body() {
        let mock = Arc::new(MockHttpTransport::new());
        mock.add_response(MockResponse::json(&json!({
            "errors": {"status": 422, "detail": "Invalid cart"}
        })));
        let client = api_key_client(mock);

        let err = client
            .request(Method::POST, "r1/onlineorder/cart/calculate", None)
            .await
            .unwrap_err();

        assert_eq!(err.http_status(), Some(422));
        assert!(err.to_string().contains("Invalid cart"));
    }

    #[tokio::test]
    async fn test_empty_and_invalid_bodies() {
        let mock = Arc::new(MockHttpTransport::new());
        mock.add_response(MockResponse::empty(204));
        mock.add_response(MockResponse::raw(200, "<html>"));
        mock.add_response(MockResponse::raw(502, "Bad Gateway"));
        let client = api_key_client(mock);

        let body = client.request(Method::POST, "x", None).await.unwrap();
        assert_eq!(body, Value::Null);

        let err = client.request(Method::GET, "x", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Response);

        let err = client.request(Method::GET, "x", None).await.unwrap_err();
        let api = err.as_api().unwrap();
        assert_eq!(api.message, "API error");
        assert_eq!(api.context.as_ref().unwrap().response, json!("Bad Gateway"));
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let mock = Arc::new(MockHttpTransport::new());
        mock.add_response(MockResponse::timeout());
        let client = api_key_client(mock);

        let err = client.request(Method::GET, "x", None).await.unwrap_err();
        assert!(matches!(err, DinlrError::Network(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_oauth_operations_need_oauth_config() {
        let client = api_key_client(Arc::new(MockHttpTransport::new()));

        let err = client.authorization_url("s").unwrap_err();
        assert!(matches!(
            err,
            DinlrError::Configuration(ConfigurationError::OAuthNotConfigured)
        ));
        assert!(client.token_state().await.is_err());
        assert!(client.set_access_token("t").await.is_err());
    }

    #[test]
    fn test_decode_data_requires_envelope() {
        let err = decode_data::<Value>(json!({"ok": true})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Response);
        let data: Value = decode_data(json!({"data": {"id": "1"}})).unwrap();
        assert_eq!(data, json!({"id": "1"}));
    }
}
