//! Discounts, promotions, vouchers and floorplans.
//!
//! The API has no single-record endpoint for discounts, promotions or
//! floorplans, so `get` lists and filters.

use super::{path_id, Scope};
use crate::client::DinlrClient;
use crate::errors::{ApiError, DinlrResult, ValidationError};
use crate::types::{Discount, Floorplan, Location, Promotion, Voucher};
use crate::validation::{
    is_missing, is_present, string_value, validate_pagination, validate_required, Params,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::instrument;

async fn list_at<T: DeserializeOwned>(
    scope: &Scope<'_>,
    resource: &str,
    location_id: Option<&str>,
    params: &Params,
) -> DinlrResult<Vec<T>> {
    validate_pagination(params)?;
    let mut params = params.clone();
    if let Some(location_id) = location_id {
        params.insert("location_id".into(), json!(location_id));
    }
    let path = scope.path(resource, &[])?;
    scope.client.get_list(&path, Some(&params)).await
}

/// Discounts service
pub struct DiscountsService<'a> {
    scope: Scope<'a>,
}

impl<'a> DiscountsService<'a> {
    /// Creates a new discounts service.
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

    /// List discounts, optionally for one location
    pub async fn list(&self, location_id: Option<&str>) -> DinlrResult<Vec<Discount>> {
        list_at(&self.scope, "discounts", location_id, &Params::new()).await
    }

    /// Find a discount by id
    #[instrument(skip(self))]
    pub async fn get(&self, discount_id: &str, location_id: Option<&str>) -> DinlrResult<Discount> {
        self.list(location_id)
            .await?
            .into_iter()
            .find(|d| d.id == discount_id)
            .ok_or_else(|| {
                ApiError::not_found(format!("Discount with ID {} not found.", discount_id)).into()
            })
    }
}

/// Promotions service
pub struct PromotionsService<'a> {
    scope: Scope<'a>,
}

impl<'a> PromotionsService<'a> {
    /// Creates a new promotions service.
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

    /// List promotions, optionally for one location
    pub async fn list(&self, location_id: Option<&str>) -> DinlrResult<Vec<Promotion>> {
        list_at(&self.scope, "promotions", location_id, &Params::new()).await
    }

    /// Find a promotion by id
    #[instrument(skip(self))]
    pub async fn get(&self, promotion_id: &str, location_id: Option<&str>) -> DinlrResult<Promotion> {
        self.list(location_id)
            .await?
            .into_iter()
            .find(|p| p.id == promotion_id)
            .ok_or_else(|| {
                ApiError::not_found(format!("Promotion with ID {} not found.", promotion_id)).into()
            })
    }
}

/// Floorplans service
pub struct FloorplansService<'a> {
    scope: Scope<'a>,
}

impl<'a> FloorplansService<'a> {
    /// Creates a new floorplans service.
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

    /// List floorplans, optionally for one location
    pub async fn list(&self, location_id: Option<&str>) -> DinlrResult<Vec<Floorplan>> {
        list_at(&self.scope, "floorplans", location_id, &Params::new()).await
    }

    /// List floorplans after checking the location against `known_locations`.
    ///
    /// An empty `known_locations` skips the check.
    pub async fn list_checked(
        &self,
        location_id: &str,
        known_locations: &[Location],
    ) -> DinlrResult<Vec<Floorplan>> {
        if !known_locations.is_empty() && !known_locations.iter().any(|l| l.id == location_id) {
            return Err(ValidationError::invalid_value(
                "location_id",
                format!("Location ID \"{}\" is invalid.", location_id),
            )
            .into());
        }
        self.list(Some(location_id)).await
    }

    /// Find a floorplan of a location by id
    #[instrument(skip(self))]
    pub async fn get(&self, floorplan_id: &str, location_id: &str) -> DinlrResult<Floorplan> {
        self.list(Some(location_id))
            .await?
            .into_iter()
            .find(|f| f.id == floorplan_id)
            .ok_or_else(|| {
                ApiError::not_found(format!("Floorplan with ID {} not found.", floorplan_id)).into()
            })
    }
}

const VOUCHER_TYPES: &[&str] = &["discount", "promotion"];

const VOUCHER_STRINGS: &[&str] = &[
    "voucher_code",
    "discount",
    "promotion",
    "applicable",
    "customer",
    "start_date",
    "end_date",
];

/// Vouchers service
pub struct VouchersService<'a> {
    scope: Scope<'a>,
}

impl<'a> VouchersService<'a> {
    /// Creates a new vouchers service.
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

    /// List vouchers
    pub async fn list(&self, params: &Params) -> DinlrResult<Vec<Voucher>> {
        list_at(&self.scope, "vouchers", None, params).await
    }

    /// Get a voucher
    pub async fn get(&self, voucher_id: &str) -> DinlrResult<Voucher> {
        let id = path_id(voucher_id, "Voucher ID")?;
        let path = self.scope.path("vouchers", &[&id])?;
        self.scope.client.get(&path, None).await
    }

    /// Create a voucher
    #[instrument(skip(self, data))]
    pub async fn create(&self, data: &Params) -> DinlrResult<Voucher> {
        validate_required(data, &["voucher_code", "type", "start_date"])?;
        let body = validate_voucher(data, true)?;
        let path = self.scope.path("vouchers", &[])?;
        self.scope.client.post(&path, &body).await
    }

    /// Update a voucher; only the fields present are checked
    #[instrument(skip(self, data))]
    pub async fn update(&self, voucher_id: &str, data: &Params) -> DinlrResult<Voucher> {
        let id = path_id(voucher_id, "Voucher ID")?;
        let body = validate_voucher(data, false)?;
        let path = self.scope.path("vouchers", &[&id])?;
        self.scope.client.put(&path, &body).await
    }

    /// Search vouchers, e.g. by `voucher_code`
    pub async fn search(&self, params: &Params) -> DinlrResult<Vec<Voucher>> {
        let path = self.scope.path("vouchers", &["search"])?;
        self.scope.client.get_list(&path, Some(params)).await
    }
}

/// Type-dependent voucher checks.
///
/// On create a missing dependent field fails; on update only a field that
/// is sent empty does. Returns the body with its strings sanitized.
fn validate_voucher(data: &Params, is_create: bool) -> Result<Params, ValidationError> {
    let voucher_type = data.get("type").filter(|v| !v.is_null());

    if let Some(voucher_type) = voucher_type {
        if !voucher_type
            .as_str()
            .is_some_and(|t| VOUCHER_TYPES.contains(&t))
        {
            return Err(ValidationError::invalid_value(
                "type",
                "Invalid voucher type. Must be \"discount\" or \"promotion\"",
            ));
        }
    }

    let rejects = |field: &str| {
        if is_create {
            is_missing(data.get(field))
        } else {
            is_present(data, field) && is_missing(data.get(field))
        }
    };

    match voucher_type.and_then(Value::as_str) {
        Some("discount") if rejects("discount") => {
            return Err(ValidationError::invalid_value(
                "discount",
                "Discount ID is required for discount voucher",
            ));
        }
        Some("promotion") if rejects("promotion") => {
            return Err(ValidationError::invalid_value(
                "promotion",
                "Promotion ID is required for promotion voucher",
            ));
        }
        _ => {}
    }

    if data.get("applicable").and_then(Value::as_str) == Some("customer") && rejects("customer") {
        return Err(ValidationError::invalid_value(
            "customer",
            "Customer ID is required for customer voucher",
        ));
    }

    let mut out = data.clone();
    for field in VOUCHER_STRINGS {
        if let Some(value) = data.get(*field).filter(|v| !is_missing(Some(v))) {
            out.insert(field.to_string(), Value::String(string_value(value, field, None, 1)?));
        }
    }

    Ok(out)
}
