//! Customers service.

use super::{path_id, Scope};
use crate::client::DinlrClient;
use crate::errors::{DinlrResult, ValidationError};
use crate::security::{sanitize_email, validate_date};
use crate::types::Customer;
use crate::validation::{
    is_missing, string_value, validate_and_sanitize, validate_pagination, Params, RuleSet,
    ValidationRule,
};
use serde_json::Value;
use tracing::instrument;

const RESOURCE: &str = "customers";

const STRING_LIMITS: &[(&str, usize)] = &[
    ("reference", 50),
    ("first_name", 50),
    ("last_name", 50),
    ("company_name", 50),
    ("email", 50),
    ("phone", 50),
    ("address1", 100),
    ("address2", 100),
    ("city", 100),
    ("postal", 50),
    ("notes", 200),
];

const CONSENT_FIELDS: &[&str] = &[
    "marketing_consent_email",
    "marketing_consent_text",
    "marketing_consent_phone",
];

const SEARCH_FIELDS: &[&str] = &["reference", "email", "phone"];

/// Customers service
pub struct CustomersService<'a> {
    scope: Scope<'a>,
}

impl<'a> CustomersService<'a> {
    /// Creates a new customers service.
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

    /// List customers
    pub async fn list(&self, params: &Params) -> DinlrResult<Vec<Customer>> {
        validate_pagination(params)?;
        let path = self.scope.path(RESOURCE, &[])?;
        self.scope.client.get_list(&path, Some(params)).await
    }

    /// Get a customer
    pub async fn get(&self, customer_id: &str) -> DinlrResult<Customer> {
        let id = path_id(customer_id, "Customer ID")?;
        let path = self.scope.path(RESOURCE, &[&id])?;
        self.scope.client.get(&path, None).await
    }

    /// Create a customer.
    ///
    /// The sanitized copy of `data` is what gets sent.
    #[instrument(skip(self, data))]
    pub async fn create(&self, data: &Params) -> DinlrResult<Customer> {
        let rules = RuleSet::new()
            .field("first_name", ValidationRule::string().max_length(50).required())
            .field("email", ValidationRule::email().required())
            .field("phone", ValidationRule::string().max_length(20));
        let sanitized = validate_and_sanitize(data, &rules)?;
        let body = validate_customer(&sanitized, true)?;

        let path = self.scope.path(RESOURCE, &[])?;
        self.scope.client.post(&path, &body).await
    }

    /// Update a customer.
    ///
    /// The current record is fetched and the fields in `data` are laid over
    /// it, so a partial map never blanks out other fields.
    #[instrument(skip(self, data))]
    pub async fn update(&self, customer_id: &str, data: &Params) -> DinlrResult<Customer> {
        let id = path_id(customer_id, "Customer ID")?;
        let path = self.scope.path(RESOURCE, &[&id])?;

        let mut merged: Params = self.scope.client.get(&path, None).await?;
        for (field, value) in data {
            merged.insert(field.clone(), value.clone());
        }
        let body = validate_customer(&merged, false)?;

        self.scope.client.put(&path, &body).await
    }

    /// Search by `reference`, `email` or `phone`
    pub async fn search(&self, params: &Params) -> DinlrResult<Vec<Customer>> {
        let params = validate_search(params)?;
        let path = self.scope.path(RESOURCE, &["search"])?;
        self.scope.client.get_list(&path, Some(&params)).await
    }
}

fn filled<'d>(data: &'d Params, field: &str) -> Option<&'d Value> {
    data.get(field).filter(|v| !is_missing(Some(v)))
}

/// Check customer fields and return the map with strings sanitized
fn validate_customer(data: &Params, is_create: bool) -> Result<Params, ValidationError> {
    if is_create && ["reference", "first_name", "last_name"].iter().all(|f| filled(data, f).is_none()) {
        return Err(ValidationError::invalid_value(
            "reference",
            "At least one of the following fields is required: reference, first_name, last_name",
        ));
    }

    let mut out = data.clone();

    for (field, max) in STRING_LIMITS {
        if let Some(value) = filled(data, field) {
            let sanitized = string_value(value, field, Some(*max), 1)?;
            out.insert(field.to_string(), Value::String(sanitized));
        }
    }

    if let Some(email) = filled(&out, "email").and_then(Value::as_str) {
        let email = sanitize_email(email, "email")?;
        out.insert("email".into(), Value::String(email));
    }

    if let Some(dob) = filled(data, "dob") {
        let dob = string_value(dob, "dob", None, 1)?;
        validate_date(&dob, "Date of birth")?;
    }

    if let Some(gender) = filled(data, "gender") {
        if !matches!(gender.as_str(), Some("M") | Some("F")) {
            return Err(ValidationError::invalid_value("gender", "Gender must be M or F"));
        }
    }

    if let Some(country) = filled(data, "country") {
        if country.as_str().map(|c| c.chars().count()) != Some(2) {
            return Err(ValidationError::invalid_value(
                "country",
                "Country must be a 2-character ISO Alpha-2 code",
            ));
        }
    }

    for field in CONSENT_FIELDS {
        match data.get(*field) {
            None | Some(Value::Null) | Some(Value::Bool(_)) => {}
            Some(_) => {
                return Err(ValidationError::InvalidType {
                    field: field.to_string(),
                    expected: "boolean",
                })
            }
        }
    }

    Ok(out)
}

fn validate_search(params: &Params) -> Result<Params, ValidationError> {
    let mut out = params.clone();
    let mut found = false;

    for field in SEARCH_FIELDS {
        if let Some(value) = filled(params, field) {
            found = true;
            let text = string_value(value, field, None, 1)?;
            let text = if *field == "email" {
                sanitize_email(&text, field)?
            } else {
                text
            };
            out.insert(field.to_string(), Value::String(text));
        }
    }

    if !found {
        return Err(ValidationError::MissingFields {
            fields: SEARCH_FIELDS.iter().map(|f| f.to_string()).collect(),
        });
    }

    Ok(out)
}
