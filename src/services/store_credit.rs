//! Store credit service.

use super::{object, path_id, Scope};
use crate::client::DinlrClient;
use crate::errors::{DinlrError, DinlrResult, ValidationError};
use crate::types::{StoreCreditBalance, StoreCreditTopup, StoreCreditTransaction};
use crate::validation::{
    is_missing, string_value, validate_numeric, validate_pagination, validate_required,
    validate_string, Params,
};
use once_cell::sync::Lazy;
use regex::Regex;
use crate::security::validate_datetime;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{debug, instrument};

const RESOURCE: &str = "store-credit";

const TOPUP_STRINGS: &[(&str, Option<usize>)] = &[
    ("customer", None),
    ("payment", None),
    ("location", None),
    ("notes", Some(200)),
];

static ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("alphanumeric pattern is a valid regex"));

/// Store credit service
pub struct StoreCreditService<'a> {
    scope: Scope<'a>,
}

impl<'a> StoreCreditService<'a> {
    /// Creates a new store credit service.
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

    /// Balance of one customer
    pub async fn customer_balance(&self, customer_id: &str) -> DinlrResult<StoreCreditBalance> {
        let id = path_id(customer_id, "Customer ID")?;
        let path = self.scope.path(RESOURCE, &["customers", &id])?;
        self.scope.client.get(&path, None).await
    }

    /// Record a credit movement; `amount` may be negative
    #[instrument(skip(self, data))]
    pub async fn create_transaction(&self, data: &Params) -> DinlrResult<StoreCreditTransaction> {
        let body = validate_transaction(data)?;
        let path = self.scope.path(RESOURCE, &["transactions"])?;
        self.scope.client.post(&path, &body).await
    }

    /// Search credit movements
    pub async fn search_transactions(&self, params: &Params) -> DinlrResult<Vec<StoreCreditTransaction>> {
        validate_pagination(params)?;
        let path = self.scope.path(RESOURCE, &["transactions", "search"])?;
        self.scope.client.get_list(&path, Some(params)).await
    }

    /// Record a paid top-up
    #[instrument(skip(self, data))]
    pub async fn create_topup(&self, data: &Params) -> DinlrResult<StoreCreditTopup> {
        let body = validate_topup(data)?;
        let path = self.scope.path(RESOURCE, &["topups"])?;
        self.scope.client.post(&path, &body).await
    }

    /// Credit a customer with `|amount|`
    pub async fn add_credit(
        &self,
        customer_id: &str,
        amount: f64,
        notes: Option<&str>,
        location_id: Option<&str>,
    ) -> DinlrResult<StoreCreditTransaction> {
        let data = transaction_body(customer_id, amount.abs(), notes, location_id);
        self.create_transaction(&data).await
    }

    /// Debit a customer by `|amount|`
    pub async fn deduct_credit(
        &self,
        customer_id: &str,
        amount: f64,
        notes: Option<&str>,
        location_id: Option<&str>,
    ) -> DinlrResult<StoreCreditTransaction> {
        let data = transaction_body(customer_id, -amount.abs(), notes, location_id);
        self.create_transaction(&data).await
    }

    /// Movements of one customer
    pub async fn customer_transactions(
        &self,
        customer_id: &str,
        params: &Params,
    ) -> DinlrResult<Vec<StoreCreditTransaction>> {
        self.search_with(params, "customer_id", customer_id, "Customer ID").await
    }

    /// Movements at one location
    pub async fn location_transactions(
        &self,
        location_id: &str,
        params: &Params,
    ) -> DinlrResult<Vec<StoreCreditTransaction>> {
        self.search_with(params, "location_id", location_id, "Location ID").await
    }

    /// Movements created by this app
    pub async fn current_app_transactions(&self, params: &Params) -> DinlrResult<Vec<StoreCreditTransaction>> {
        self.search_with(params, "app_id", "current", "app_id").await
    }

    /// Balances of several customers, keyed by customer id.
    ///
    /// Customers the API does not know are left out.
    pub async fn bulk_customer_balances(
        &self,
        customer_ids: &[&str],
    ) -> DinlrResult<HashMap<String, StoreCreditBalance>> {
        let mut balances = HashMap::with_capacity(customer_ids.len());

        for customer_id in customer_ids {
            match self.customer_balance(customer_id).await {
                Ok(balance) => {
                    balances.insert(customer_id.to_string(), balance);
                }
                Err(DinlrError::Api(e)) if e.is_not_found() => {
                    debug!(customer_id, "No store credit record");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(balances)
    }

    /// Movements created between `start` and `end`
    pub async fn transactions_by_date_range(
        &self,
        start: &str,
        end: &str,
        params: &Params,
    ) -> DinlrResult<Vec<StoreCreditTransaction>> {
        if validate_datetime(start, "Start date")? >= validate_datetime(end, "End date")? {
            return Err(ValidationError::RangeOrder {
                prefix: "Date range".to_string(),
            }
            .into());
        }
        let start = validate_string(start, "Start date", None, 1)?;
        let end = validate_string(end, "End date", None, 1)?;

        let mut params = params.clone();
        params.insert("created_at_min".into(), json!(start));
        params.insert("created_at_max".into(), json!(end));
        self.search_transactions(&params).await
    }

    async fn search_with(
        &self,
        params: &Params,
        key: &str,
        value: &str,
        field: &str,
    ) -> DinlrResult<Vec<StoreCreditTransaction>> {
        let value = validate_string(value, field, None, 1)?;
        let mut params = params.clone();
        params.insert(key.into(), json!(value));
        self.search_transactions(&params).await
    }
}

fn transaction_body(
    customer_id: &str,
    amount: f64,
    notes: Option<&str>,
    location_id: Option<&str>,
) -> Params {
    let mut data = object(json!({ "customer": customer_id, "amount": amount }));
    if let Some(notes) = notes.filter(|n| !n.is_empty()) {
        data.insert("notes".into(), json!(notes));
    }
    if let Some(location) = location_id.filter(|l| !l.is_empty()) {
        data.insert("location".into(), json!(location));
    }
    data
}

fn validate_transaction(data: &Params) -> Result<Params, ValidationError> {
    validate_required(data, &["customer", "amount"])?;
    let mut body = data.clone();

    if let Some(customer) = data.get("customer") {
        let customer = string_value(customer, "customer", None, 1)?;
        body.insert("customer".into(), json!(customer));
    }
    if let Some(amount) = data.get("amount") {
        validate_numeric(amount, "amount", None, None)?;
    }
    if let Some(notes) = data.get("notes").filter(|v| !is_missing(Some(v))) {
        let notes = string_value(notes, "notes", Some(200), 0)?;
        body.insert("notes".into(), json!(notes));
    }

    Ok(body)
}

fn validate_topup(data: &Params) -> Result<Params, ValidationError> {
    validate_required(data, &["customer", "topup_amount", "payment", "payment_amount"])?;
    let mut out = data.clone();

    for (field, max) in TOPUP_STRINGS {
        if let Some(value) = data.get(*field).filter(|v| !v.is_null()) {
            let sanitized = string_value(value, field, *max, 1)?;
            out.insert(field.to_string(), Value::String(sanitized));
        }
    }

    for (field, label) in [("topup_amount", "Topup amount"), ("payment_amount", "Payment amount")] {
        let positive = data
            .get(field)
            .map(|v| validate_numeric(v, field, None, None))
            .transpose()?
            .is_some_and(|n| n > 0.0);
        if !positive {
            return Err(ValidationError::invalid_value(
                field,
                format!("{} must be a positive number", label),
            ));
        }
    }

    if let Some(topup_no) = data.get("topup_no").filter(|v| !v.is_null()) {
        let topup_no = string_value(topup_no, "topup_no", Some(10), 0)?;
        if !ALPHANUMERIC.is_match(&topup_no) {
            return Err(ValidationError::invalid_value(
                "topup_no",
                "Topup number must be alphanumeric with no spaces",
            ));
        }
        out.insert("topup_no".into(), Value::String(topup_no));
    }

    Ok(out)
}
