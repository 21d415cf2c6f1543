//! Orders and cart services.
//!
//! Nested payload entries are checked with their position in the field
//! name, e.g. `items[2].qty` or `payments[0].amount`.

use super::{path_id, Scope};
use crate::client::DinlrClient;
use crate::errors::{DinlrResult, ValidationError};
use crate::security::{sanitize_email, validate_api_date_range, validate_datetime};
use crate::types::{CartSummary, ItemStatus, Order, OrderStatus};
use crate::validation::{
    is_missing, string_value, validate_numeric, validate_pagination, validate_required, Params,
};
use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::instrument;

const RESOURCE: &str = "orders";

/// Longest created-at window the orders list accepts
pub const MAX_ORDER_RANGE_DAYS: i64 = 32;

const DETAIL_ALL_MAX_LIMIT: f64 = 100.0;

const LIST_STRING_FIELDS: &[&str] = &["app_id", "location_id", "ids", "order_no", "customer_id"];
const LIST_DATETIME_FIELDS: &[&str] = &["updated_at_min", "created_at_min", "created_at_max"];

const ORDER_INFO_STRINGS: &[(&str, Option<usize>)] = &[
    ("dining_option", None),
    ("order_no", Some(10)),
    ("order_ticket", Some(50)),
    ("notes", Some(200)),
    ("customer", None),
    ("first_name", Some(50)),
    ("last_name", Some(50)),
    ("email", Some(50)),
    ("phone", Some(50)),
    ("timeslot", None),
    ("delivery_zone", None),
    ("address1", Some(100)),
    ("address2", Some(100)),
    ("city", Some(100)),
    ("postal", Some(50)),
];

const ORDER_INFO_DATETIMES: &[&str] = &["timeslot_start", "timeslot_end", "order_at"];

static ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("alphanumeric pattern is a valid regex"));

/// Orders service
pub struct OrdersService<'a> {
    scope: Scope<'a>,
}

impl<'a> OrdersService<'a> {
    /// Creates a new orders service.
    pub fn new(client: &'a DinlrClient) -> Self {
        Self {
            scope: Scope::new(client),
        }
    }

    /// Target another restaurant
    pub fn for_restaurant(mut self, restaurant_id: impl Into<String>) -> Self {
        self.scope = self.scope.with_restaurant(restaurant_id);
        self
    }

    fn order_path(&self, order_id: &str, segments: &[&str]) -> DinlrResult<String> {
        let order_id = path_id(order_id, "Order ID")?;
        let mut all = vec![order_id.as_str()];
        all.extend_from_slice(segments);
        self.scope.path(RESOURCE, &all)
    }

    /// List orders
    pub async fn list(&self) -> DinlrResult<Vec<Order>> {
        self.list_with_params(&Params::new()).await
    }

    /// List orders with filters
    #[instrument(skip(self, params))]
    pub async fn list_with_params(&self, params: &Params) -> DinlrResult<Vec<Order>> {
        let params = validate_list_params(params)?;
        let path = self.scope.path(RESOURCE, &[])?;
        self.scope.client.get_list(&path, Some(&params)).await
    }

    /// Get an order
    pub async fn get(&self, order_id: &str) -> DinlrResult<Order> {
        let path = self.order_path(order_id, &[])?;
        self.scope.client.get(&path, None).await
    }

    /// Update an order
    #[instrument(skip(self, data))]
    pub async fn update(&self, order_id: &str, data: &Params) -> DinlrResult<Order> {
        let body = validate_update(data)?;
        let path = self.order_path(order_id, &[])?;
        self.scope.client.put(&path, &body).await
    }

    /// Add a payment
    #[instrument(skip(self, data))]
    pub async fn add_payment(&self, order_id: &str, data: &Params) -> DinlrResult<Order> {
        let body = validate_payment(data)?;
        let path = self.order_path(order_id, &["payments"])?;
        self.scope.client.post(&path, &body).await
    }

    /// Add a refund
    #[instrument(skip(self, data))]
    pub async fn add_refund(&self, order_id: &str, data: &Params) -> DinlrResult<Order> {
        let body = validate_refund(data)?;
        let path = self.order_path(order_id, &["refunds"])?;
        self.scope.client.post(&path, &body).await
    }

    /// Close an order
    pub async fn close(&self, order_id: &str) -> DinlrResult<Order> {
        self.transition(order_id, "close").await
    }

    /// Reopen a closed order
    pub async fn reopen(&self, order_id: &str) -> DinlrResult<Order> {
        self.transition(order_id, "open").await
    }

    /// Cancel an order
    pub async fn cancel(&self, order_id: &str) -> DinlrResult<Order> {
        self.transition(order_id, "cancel").await
    }

    /// Move an order to `pending`
    pub async fn set_pending(&self, order_id: &str) -> DinlrResult<Order> {
        self.transition(order_id, "pending").await
    }

    /// Move an order to `pending_payment`
    pub async fn set_pending_payment(&self, order_id: &str) -> DinlrResult<Order> {
        self.transition(order_id, "pending_payment").await
    }

    async fn transition(&self, order_id: &str, action: &str) -> DinlrResult<Order> {
        let path = self.order_path(order_id, &[action])?;
        self.scope.client.post(&path, &Params::new()).await
    }

    /// Set the kitchen status of an order item
    pub async fn set_item_kitchen_status(
        &self,
        order_id: &str,
        item_id: &str,
        status: ItemStatus,
    ) -> DinlrResult<()> {
        let action = match status {
            ItemStatus::Pending => "pending",
            ItemStatus::Done => "fulfill",
            ItemStatus::Default => "default",
        };
        self.item_action(order_id, item_id, "kitchen", action).await
    }

    /// Set the expedite status of an order item
    pub async fn set_item_expedite_status(
        &self,
        order_id: &str,
        item_id: &str,
        status: ItemStatus,
    ) -> DinlrResult<()> {
        let action = match status {
            ItemStatus::Pending => "pending",
            ItemStatus::Done => "expedite",
            ItemStatus::Default => "default",
        };
        self.item_action(order_id, item_id, "expedite", action).await
    }

    async fn item_action(
        &self,
        order_id: &str,
        item_id: &str,
        station: &str,
        action: &str,
    ) -> DinlrResult<()> {
        let item_id = path_id(item_id, "Order item ID")?;
        let path = self.order_path(order_id, &["order_items", &item_id, station, action])?;
        self.scope.client.request(Method::POST, &path, None).await?;
        Ok(())
    }

    /// Orders of one location
    pub async fn list_for_location(&self, location_id: &str, params: &Params) -> DinlrResult<Vec<Order>> {
        let mut params = params.clone();
        params.insert("location_id".into(), json!(location_id));
        self.list_with_params(&params).await
    }

    /// Orders of one customer
    pub async fn list_for_customer(&self, customer_id: &str, params: &Params) -> DinlrResult<Vec<Order>> {
        let mut params = params.clone();
        params.insert("customer_id".into(), json!(customer_id));
        self.list_with_params(&params).await
    }

    /// Orders created between `start` and `end`, at most 32 days apart
    pub async fn list_by_date_range(
        &self,
        start: &str,
        end: &str,
        params: &Params,
    ) -> DinlrResult<Vec<Order>> {
        validate_api_date_range(start, end, "Date range", MAX_ORDER_RANGE_DAYS)?;
        let mut params = params.clone();
        params.insert("created_at_min".into(), json!(start));
        params.insert("created_at_max".into(), json!(end));
        self.list_with_params(&params).await
    }

    /// Orders in one status
    pub async fn list_by_status(&self, status: OrderStatus, params: &Params) -> DinlrResult<Vec<Order>> {
        let mut params = params.clone();
        params.insert("status".into(), json!(status.as_str()));
        self.list_with_params(&params).await
    }
}

/// Cart service
pub struct CartService<'a> {
    scope: Scope<'a>,
}

impl<'a> CartService<'a> {
    /// Creates a new cart service.
    pub fn new(client: &'a DinlrClient) -> Self {
        Self {
            scope: Scope::new(client),
        }
    }

    /// Target another restaurant
    pub fn for_restaurant(mut self, restaurant_id: impl Into<String>) -> Self {
        self.scope = self.scope.with_restaurant(restaurant_id);
        self
    }

    /// Price a cart without placing it
    pub async fn calculate(&self, cart: &Params) -> DinlrResult<CartSummary> {
        let body = validate_cart(cart)?;
        let path = self.scope.path("cart", &["calculate"])?;
        self.scope.client.post(&path, &body).await
    }

    /// Place a cart as an order
    #[instrument(skip(self, cart))]
    pub async fn submit(&self, cart: &Params) -> DinlrResult<Order> {
        let body = validate_cart(cart)?;
        let path = self.scope.path("cart", &["submit"])?;
        self.scope.client.post(&path, &body).await
    }
}

fn validate_cart(cart: &Params) -> Result<Params, ValidationError> {
    validate_required(cart, &["location", "items"])?;
    if !matches!(cart.get("items"), Some(Value::Array(items)) if !items.is_empty()) {
        return Err(ValidationError::invalid_value(
            "items",
            "Items must be a non-empty array",
        ));
    }

    let mut out = cart.clone();
    check_string(&mut out, "location", "", None)?;
    for (index, item) in entries_mut(&mut out, "items") {
        let prefix = format!("items[{}]", index);
        check_item(entry_mut(item, &prefix)?, &prefix)?;
    }
    if let Some(info) = out.get_mut("order_info").filter(|v| !v.is_null()) {
        check_order_info(entry_mut(info, "order_info")?)?;
    }

    Ok(out)
}

fn validate_list_params(params: &Params) -> Result<Params, ValidationError> {
    validate_pagination(params)?;
    let mut out = params.clone();

    for field in LIST_STRING_FIELDS {
        if let Some(value) = params.get(*field).filter(|v| !is_missing(Some(v))) {
            let value = string_value(value, field, None, 1)?;
            out.insert(field.to_string(), Value::String(value));
        }
    }

    let detail_all = match params.get("detail").filter(|v| !v.is_null()) {
        None => false,
        Some(Value::String(d)) if d == "all" => true,
        Some(_) => {
            return Err(ValidationError::invalid_value(
                "detail",
                "Detail parameter must be \"all\" if provided",
            ))
        }
    };

    for field in LIST_DATETIME_FIELDS {
        if let Some(value) = params.get(*field).filter(|v| !v.is_null()) {
            let value = string_value(value, field, None, 1)?;
            validate_datetime(&value, field)?;
        }
    }

    if let (Some(Value::String(min)), Some(Value::String(max))) =
        (params.get("created_at_min"), params.get("created_at_max"))
    {
        validate_api_date_range(min, max, "created_at", MAX_ORDER_RANGE_DAYS)?;
    }

    if detail_all {
        if let Some(limit) = params.get("limit").filter(|v| !v.is_null()) {
            validate_numeric(limit, "limit", None, Some(DETAIL_ALL_MAX_LIMIT))?;
        }
    }

    Ok(out)
}

fn prefixed(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

fn entry_mut<'d>(value: &'d mut Value, field: &str) -> Result<&'d mut Map<String, Value>, ValidationError> {
    value.as_object_mut().ok_or_else(|| ValidationError::InvalidType {
        field: field.to_string(),
        expected: "object",
    })
}

fn entries_mut<'d>(data: &'d mut Params, field: &str) -> impl Iterator<Item = (usize, &'d mut Value)> {
    data.get_mut(field)
        .and_then(Value::as_array_mut)
        .into_iter()
        .flatten()
        .enumerate()
}

/// Sanitize a string field in place
fn check_string(data: &mut Params, field: &str, prefix: &str, max: Option<usize>) -> Result<(), ValidationError> {
    check_string_if(data, field, prefix, max, |v| !v.is_null())
}

fn check_string_if(
    data: &mut Params,
    field: &str,
    prefix: &str,
    max: Option<usize>,
    present: impl Fn(&Value) -> bool,
) -> Result<(), ValidationError> {
    if let Some(value) = data.get_mut(field).filter(|v| present(&**v)) {
        let sanitized = string_value(value, &prefixed(prefix, field), max, 1)?;
        *value = Value::String(sanitized);
    }
    Ok(())
}

fn check_numeric(
    data: &Params,
    field: &str,
    prefix: &str,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(value) = data.get(field).filter(|v| !v.is_null()) {
        validate_numeric(value, &prefixed(prefix, field), min, max)?;
    }
    Ok(())
}

fn check_alphanumeric(data: &Params, field: &str, prefix: &str, message: &str) -> Result<(), ValidationError> {
    if let Some(value) = data.get(field).and_then(Value::as_str) {
        if !ALPHANUMERIC.is_match(value) {
            return Err(ValidationError::invalid_value(prefixed(prefix, field), message));
        }
    }
    Ok(())
}

fn require(data: &Params, fields: &[&str], prefix: &str) -> Result<(), ValidationError> {
    validate_required(data, fields).map_err(|err| match err {
        ValidationError::MissingFields { fields } => ValidationError::MissingFields {
            fields: fields.iter().map(|f| prefixed(prefix, f)).collect(),
        },
        other => other,
    })
}

fn validate_payment(data: &Params) -> Result<Params, ValidationError> {
    let mut out = data.clone();
    check_payment(&mut out, "")?;
    Ok(out)
}

fn check_payment(data: &mut Params, prefix: &str) -> Result<(), ValidationError> {
    require(data, &["payment", "amount"], prefix)?;
    check_string(data, "payment", prefix, None)?;
    check_numeric(data, "amount", prefix, Some(0.01), None)?;

    check_string(data, "receipt_no", prefix, Some(10))?;
    check_alphanumeric(
        data,
        "receipt_no",
        prefix,
        &format!("{} must be alphanumeric with no spaces", prefixed(prefix, "receipt_no")),
    )?;

    for (index, input) in entries_mut(data, "payment_inputs") {
        let input_prefix = prefixed(prefix, &format!("payment_inputs[{}]", index));
        let input = entry_mut(input, &input_prefix)?;
        require(input, &["payment_input", "value"], &input_prefix)?;
        check_string(input, "payment_input", &input_prefix, None)?;
        check_string(input, "value", &input_prefix, None)?;
    }

    Ok(())
}

fn validate_refund(data: &Params) -> Result<Params, ValidationError> {
    require(data, &["refund_payments"], "")?;
    if !matches!(data.get("refund_payments"), Some(Value::Array(payments)) if !payments.is_empty()) {
        return Err(ValidationError::invalid_value(
            "refund_payments",
            "Refund payments must be a non-empty array",
        ));
    }

    let mut out = data.clone();
    check_string(&mut out, "refund_no", "", Some(10))?;
    check_alphanumeric(&out, "refund_no", "", "Refund number must be alphanumeric with no spaces")?;

    for (index, payment) in entries_mut(&mut out, "refund_payments") {
        let prefix = format!("refund_payments[{}]", index);
        let payment = entry_mut(payment, &prefix)?;
        require(payment, &["payment", "amount"], &prefix)?;
        check_string(payment, "payment", &prefix, None)?;
        check_numeric(payment, "amount", &prefix, Some(0.01), None)?;
    }

    Ok(out)
}

fn check_item(item: &mut Params, prefix: &str) -> Result<(), ValidationError> {
    check_string(item, "item", prefix, None)?;
    check_string(item, "name", prefix, None)?;
    check_numeric(item, "qty", prefix, Some(0.01), None)?;
    check_numeric(item, "qty_unit", prefix, Some(0.01), None)?;
    check_numeric(item, "price", prefix, Some(0.0), None)?;
    check_string(item, "notes", prefix, Some(200))?;
    check_string(item, "variant", prefix, None)?;

    for (index, option) in entries_mut(item, "modifier_options") {
        let option_prefix = format!("{}.modifier_options[{}]", prefix, index);
        let option = entry_mut(option, &option_prefix)?;
        require(option, &["modifier_option"], &option_prefix)?;
        check_string(option, "modifier_option", &option_prefix, None)?;
        check_numeric(option, "qty", &option_prefix, Some(1.0), None)?;
    }

    Ok(())
}

fn check_order_info(info: &mut Params) -> Result<(), ValidationError> {
    for (field, max) in ORDER_INFO_STRINGS {
        check_string_if(info, field, "", *max, |v| !is_missing(Some(v)))?;
    }

    if let Some(email) = info.get_mut("email").filter(|v| !is_missing(Some(&**v))) {
        if let Some(text) = email.as_str() {
            let sanitized = sanitize_email(text, "email")?;
            *email = Value::String(sanitized);
        }
    }

    check_numeric(info, "pax", "", Some(1.0), None)?;
    check_numeric(info, "address_lat", "", Some(-90.0), Some(90.0))?;
    check_numeric(info, "address_lng", "", Some(-180.0), Some(180.0))?;

    for field in ORDER_INFO_DATETIMES {
        check_string(info, field, "", None)?;
        if let Some(value) = info.get(*field).and_then(Value::as_str) {
            validate_datetime(value, field)?;
        }
    }

    if let Some(country) = info.get("country").filter(|v| !is_missing(Some(v))) {
        if country.as_str().map(|c| c.chars().count()) != Some(2) {
            return Err(ValidationError::invalid_value(
                "country",
                "Country must be a 2-character ISO Alpha-2 code",
            ));
        }
    }

    if let Some(status) = info.get("status").filter(|v| !v.is_null()) {
        if !matches!(status.as_str(), Some("pending") | Some("pending_payment")) {
            return Err(ValidationError::invalid_value(
                "status",
                "Order status must be one of: pending, pending_payment",
            ));
        }
    }

    check_alphanumeric(info, "order_no", "", "Order number must be alphanumeric with no spaces")
}

fn validate_update(data: &Params) -> Result<Params, ValidationError> {
    let mut out = data.clone();

    for (index, item) in entries_mut(&mut out, "items") {
        let prefix = format!("items[{}]", index);
        check_item(entry_mut(item, &prefix)?, &prefix)?;
    }

    for (index, charge) in entries_mut(&mut out, "charges") {
        let prefix = format!("charges[{}]", index);
        let charge = entry_mut(charge, &prefix)?;
        require(charge, &["charge", "amount"], &prefix)?;
        check_string(charge, "charge", &prefix, None)?;
        check_numeric(charge, "amount", &prefix, Some(0.0), None)?;
    }

    for (index, discount) in entries_mut(&mut out, "discounts") {
        let prefix = format!("discounts[{}]", index);
        let discount = entry_mut(discount, &prefix)?;
        require(discount, &["discount"], &prefix)?;
        check_string(discount, "discount", &prefix, None)?;
        check_numeric(discount, "value", &prefix, Some(0.0), None)?;
    }

    for (index, payment) in entries_mut(&mut out, "payments") {
        let prefix = format!("payments[{}]", index);
        check_payment(entry_mut(payment, &prefix)?, &prefix)?;
    }

    if let Some(info) = out.get_mut("order_info").filter(|v| !v.is_null()) {
        check_order_info(entry_mut(info, "order_info")?)?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DinlrConfig;
    use crate::mocks::{MockHttpTransport, MockResponse};
    use crate::services::object;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use test_case::test_case;

    fn setup() -> (Arc<MockHttpTransport>, DinlrClient) {
        let mock = Arc::new(MockHttpTransport::new());
        let config = DinlrConfig::builder()
            .api_key("k")
            .restaurant_id("r1")
            .build()
            .unwrap();
        let client = DinlrClient::with_transport(config, mock.clone());
        (mock, client)
    }

    #[test_case(json!({"detail": "summary"}), "detail" ; "detail other than all")]
    #[test_case(json!({"detail": "all", "limit": 150}), "limit" ; "large limit with detail")]
    #[test_case(json!({"created_at_min": "yesterday"}), "created_at_min" ; "bad datetime")]
    #[test_case(json!({"customer_id": 42}), "customer_id" ; "non string customer")]
    fn test_list_param_rules(params: Value, field: &str) {
        let err = validate_list_params(&object(params)).unwrap_err();
        assert_eq!(err.field(), Some(field));
    }

    #[test]
    fn test_list_created_range_limit() {
        let params = object(json!({
            "created_at_min": "2024-01-01T00:00:00+08:00",
            "created_at_max": "2024-03-01T00:00:00+08:00"
        }));
        assert!(matches!(
            validate_list_params(&params),
            Err(ValidationError::RangeTooLong { max_days: 32, .. })
        ));
        assert!(validate_list_params(&object(json!({"detail": "all", "limit": 100}))).is_ok());
    }

    #[test_case(json!({"items": [{"qty": 0}]}), "items[0].qty" ; "zero qty")]
    #[test_case(json!({"items": [{"item": "i1"}, {"modifier_options": [{"qty": 1}]}]}), "items[1].modifier_options[0].modifier_option" ; "modifier option without id")]
    #[test_case(json!({"charges": [{"charge": "c1", "amount": -1}]}), "charges[0].amount" ; "negative charge")]
    #[test_case(json!({"discounts": [{"value": 5}]}), "discounts[0].discount" ; "discount without id")]
    #[test_case(json!({"payments": [{"payment": "p1", "amount": 0}]}), "payments[0].amount" ; "zero payment")]
    #[test_case(json!({"order_info": {"status": "open"}}), "status" ; "bad order status")]
    #[test_case(json!({"order_info": {"address_lat": 91}}), "address_lat" ; "latitude out of range")]
    #[test_case(json!({"order_info": {"order_no": "A-1"}}), "order_no" ; "order number with dash")]
    #[test_case(json!({"order_info": {"email": "nope"}}), "email" ; "bad email")]
    fn test_update_rules(data: Value, field: &str) {
        let err = validate_update(&object(data)).unwrap_err();
        assert_eq!(err.field(), Some(field));
    }

    #[test_case(json!({"payment": "p1", "amount": 10, "receipt_no": "R 1"}), "receipt_no" ; "receipt with space")]
    #[test_case(json!({"payment": "p1", "amount": 10, "payment_inputs": [{"value": "x"}]}), "payment_inputs[0].payment_input" ; "input without id")]
    #[test_case(json!({"amount": 10}), "payment" ; "missing payment")]
    fn test_payment_rules(data: Value, field: &str) {
        let err = validate_payment(&object(data)).unwrap_err();
        assert_eq!(err.field(), Some(field));
    }

    #[test]
    fn test_refund_needs_entries() {
        let err = validate_refund(&object(json!({"refund_payments": []}))).unwrap_err();
        assert_eq!(err.to_string(), "Refund payments must be a non-empty array");

        let err = validate_refund(&object(json!({
            "refund_payments": [{"payment": "p1", "amount": 0.001}]
        })))
        .unwrap_err();
        assert_eq!(err.field(), Some("refund_payments[0].amount"));
    }

    fn sent_body(mock: &MockHttpTransport) -> Value {
        serde_json::from_slice(mock.last_request().unwrap().body.as_ref().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_payment_sends_sanitized_body() {
        let (mock, client) = setup();
        mock.add_response(MockResponse::data(json!({"id": "o1"})));

        client
            .orders()
            .add_payment(
                "o1",
                &object(json!({
                    "payment": "  pm_1\u{0000}\u{0007} ",
                    "amount": 5,
                    "payment_inputs": [{"payment_input": "pi_1", "value": " 4242\u{0008}"}]
                })),
            )
            .await
            .unwrap();

        let body = sent_body(&mock);
        assert_eq!(body["payment"], "pm_1");
        assert_eq!(body["payment_inputs"][0]["value"], "4242");
        assert_eq!(body["amount"], 5);
    }

    #[tokio::test]
    async fn test_update_and_refund_send_sanitized_bodies() {
        let (mock, client) = setup();
        mock.add_response(MockResponse::data(json!({"id": "o1"})));
        mock.add_response(MockResponse::data(json!({"id": "o1"})));

        let orders = client.orders();
        orders
            .update(
                "o1",
                &object(json!({
                    "items": [{"item": " i1\u{0000}", "qty": 1, "notes": "no ice\u{0007}"}],
                    "order_info": {"first_name": "  Ann ", "email": " ann@example.com"}
                })),
            )
            .await
            .unwrap();
        let body = sent_body(&mock);
        assert_eq!(body["items"][0]["item"], "i1");
        assert_eq!(body["items"][0]["notes"], "no ice");
        assert_eq!(body["order_info"]["first_name"], "Ann");
        assert_eq!(body["order_info"]["email"], "ann@example.com");

        orders
            .add_refund(
                "o1",
                &object(json!({
                    "refund_no": " R1\u{0000}",
                    "refund_payments": [{"payment": "pm_1\u{001b}", "amount": 2}]
                })),
            )
            .await
            .unwrap();
        let body = sent_body(&mock);
        assert_eq!(body["refund_no"], "R1");
        assert_eq!(body["refund_payments"][0]["payment"], "pm_1");
    }

    #[tokio::test]
    async fn test_cart_submit_sends_sanitized_body() {
        let (mock, client) = setup();
        mock.add_response(MockResponse::data(json!({"id": "o1", "status": "pending"})));

        client
            .cart()
            .submit(&object(json!({
                "location": " L1\u{0000}",
                "items": [{"item": "i1\u{0007}", "qty": 1}],
                "order_info": {"notes": " leave at door "}
            })))
            .await
            .unwrap();

        let body = sent_body(&mock);
        assert_eq!(body["location"], "L1");
        assert_eq!(body["items"][0]["item"], "i1");
        assert_eq!(body["order_info"]["notes"], "leave at door");
    }

    #[tokio::test]
    async fn test_list_by_status_query() {
        let (mock, client) = setup();
        mock.add_response(MockResponse::data(json!([{"id": "o1", "status": "pending_payment"}])));

        let orders = client
            .orders()
            .list_by_status(OrderStatus::PendingPayment, &Params::new())
            .await
            .unwrap();

        assert_eq!(orders[0].status.as_deref(), Some("pending_payment"));
        assert_eq!(
            mock.last_request().unwrap().url.query(),
            Some("status=pending_payment")
        );
    }

    #[tokio::test]
    async fn test_kitchen_and_expedite_paths() {
        let (mock, client) = setup();
        mock.add_response(MockResponse::data(json!(null)));
        mock.add_response(MockResponse::empty(200));

        let orders = client.orders();
        orders
            .set_item_kitchen_status("o1", "it1", ItemStatus::Done)
            .await
            .unwrap();
        orders
            .set_item_expedite_status("o1", "it1", ItemStatus::Done)
            .await
            .unwrap();

        let paths: Vec<String> = mock
            .get_requests()
            .iter()
            .map(|r| r.url.path().to_string())
            .collect();
        assert_eq!(
            paths,
            vec![
                "/v1/r1/onlineorder/orders/o1/order_items/it1/kitchen/fulfill",
                "/v1/r1/onlineorder/orders/o1/order_items/it1/expedite/expedite",
            ]
        );
    }

    #[tokio::test]
    async fn test_reopen_posts_open() {
        let (mock, client) = setup();
        mock.add_response(MockResponse::data(json!({"id": "o1", "status": "open"})));

        let order = client.orders().reopen("o1").await.unwrap();

        assert!(order.is_open());
        let request = mock.last_request().unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.url.path(), "/v1/r1/onlineorder/orders/o1/open");
    }

    #[tokio::test]
    async fn test_date_range_over_limit_sends_nothing() {
        let (mock, client) = setup();

        let result = client
            .orders()
            .list_by_date_range(
                "2024-01-01T00:00:00+00:00",
                "2024-02-15T00:00:00+00:00",
                &Params::new(),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_cart_requires_items() {
        let (mock, client) = setup();

        let err = client
            .cart()
            .calculate(&object(json!({"location": "L1", "items": []})))
            .await
            .unwrap_err();
        assert_eq!(err.as_validation().unwrap().field(), Some("items"));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_cart_calculate() {
        let (mock, client) = setup();
        mock.add_response(MockResponse::data(json!({
            "subtotal": 20.0,
            "total": 21.4,
            "taxes": [{"tax": "t1", "amount": 1.4}]
        })));

        let summary = client
            .cart()
            .calculate(&object(json!({"location": "L1", "items": [{"item": "i1", "qty": 2}]})))
            .await
            .unwrap();

        assert_eq!(summary.total_tax(), 1.4);
        assert_eq!(
            mock.last_request().unwrap().url.path(),
            "/v1/r1/onlineorder/cart/calculate"
        );
    }
}
