//! Loyalty service.
//!
//! Point amounts are taken unsigned and negated on debit paths, so a caller
//! cannot subtract by passing a negative number to `add_points`.

use super::{object, path_id, Scope};
use crate::client::DinlrClient;
use crate::errors::{DinlrResult, ValidationError};
use crate::security::validate_datetime;
use crate::types::{LoyaltyMember, LoyaltyProgram, LoyaltyReward, LoyaltyTransaction};
use crate::validation::{
    is_missing, string_value, validate_and_sanitize, validate_pagination, validate_required,
    validate_string, Params, RuleSet, ValidationRule,
};
use serde_json::{json, Value};
use tracing::instrument;

const RESOURCE: &str = "loyalty";

const SEARCH_STRING_FIELDS: &[&str] = &["location_id", "order_id", "member_id", "app_id"];

/// Optional details attached to a point transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointsOptions {
    /// Free-form note, at most 200 characters
    pub notes: Option<String>,
    /// Location the transaction happened at
    pub location_id: Option<String>,
}

impl PointsOptions {
    /// Attach a note
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Attach a location
    pub fn location(mut self, location_id: impl Into<String>) -> Self {
        self.location_id = Some(location_id.into());
        self
    }
}

/// Loyalty service
pub struct LoyaltyService<'a> {
    scope: Scope<'a>,
}

impl<'a> LoyaltyService<'a> {
    /// Creates a new loyalty service.
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

    fn program_path(&self, program_id: &str, segments: &[&str]) -> DinlrResult<String> {
        let program_id = path_id(program_id, "Loyalty program ID")?;
        let mut all = vec![program_id.as_str()];
        all.extend_from_slice(segments);
        self.scope.path(RESOURCE, &all)
    }

    /// List loyalty programs
    pub async fn programs(&self, params: &Params) -> DinlrResult<Vec<LoyaltyProgram>> {
        validate_pagination(params)?;
        check_datetime(params, "updated_at_min")?;
        let path = self.scope.path(RESOURCE, &["programs"])?;
        self.scope.client.get_list(&path, Some(params)).await
    }

    /// Get a loyalty program
    pub async fn program(&self, program_id: &str) -> DinlrResult<LoyaltyProgram> {
        let program_id = path_id(program_id, "Loyalty program ID")?;
        let path = self.scope.path(RESOURCE, &["programs", &program_id])?;
        self.scope.client.get(&path, None).await
    }

    /// List a program's rewards
    pub async fn rewards(&self, program_id: &str) -> DinlrResult<Vec<LoyaltyReward>> {
        let path = self.program_path(program_id, &["rewards"])?;
        self.scope.client.get_list(&path, None).await
    }

    /// List a program's members
    pub async fn members(&self, program_id: &str, params: &Params) -> DinlrResult<Vec<LoyaltyMember>> {
        validate_pagination(params)?;
        check_datetime(params, "updated_at_min")?;
        let path = self.program_path(program_id, &["members"])?;
        self.scope.client.get_list(&path, Some(params)).await
    }

    /// Get a member
    pub async fn member(&self, program_id: &str, member_id: &str) -> DinlrResult<LoyaltyMember> {
        let member_id = path_id(member_id, "Member ID")?;
        let path = self.program_path(program_id, &["members", &member_id])?;
        self.scope.client.get(&path, None).await
    }

    /// Find the member record of a customer, if enrolled
    pub async fn member_by_customer(
        &self,
        program_id: &str,
        customer_id: &str,
    ) -> DinlrResult<Option<LoyaltyMember>> {
        validate_string(customer_id, "Customer ID", None, 1)?;
        let members = self.members(program_id, &Params::new()).await?;
        Ok(members
            .into_iter()
            .find(|m| m.customer.as_deref() == Some(customer_id)))
    }

    /// Enrol a customer; `data` must carry `customer`
    #[instrument(skip(self, data))]
    pub async fn enrol_member(&self, program_id: &str, data: &Params) -> DinlrResult<LoyaltyMember> {
        let rules = RuleSet::new().field("customer", ValidationRule::string().required());
        let body = validate_and_sanitize(data, &rules)?;
        let path = self.program_path(program_id, &["members"])?;
        self.scope.client.post(&path, &body).await
    }

    /// Record a point transaction.
    ///
    /// `points` must be an integer and may be negative.
    #[instrument(skip(self, data))]
    pub async fn create_transaction(
        &self,
        program_id: &str,
        data: &Params,
    ) -> DinlrResult<LoyaltyTransaction> {
        let body = validate_transaction(data)?;
        let path = self.program_path(program_id, &["transactions"])?;
        self.scope.client.post(&path, &body).await
    }

    /// Search point transactions
    pub async fn search_transactions(
        &self,
        program_id: &str,
        params: &Params,
    ) -> DinlrResult<Vec<LoyaltyTransaction>> {
        let params = validate_search(params)?;
        let path = self.program_path(program_id, &["transactions", "search"])?;
        self.scope.client.get_list(&path, Some(&params)).await
    }

    /// Credit points to a member
    pub async fn add_points(
        &self,
        program_id: &str,
        member_id: &str,
        points: u32,
        options: PointsOptions,
    ) -> DinlrResult<LoyaltyTransaction> {
        let data = points_body(member_id, credit(points)?, options)?;
        self.create_transaction(program_id, &data).await
    }

    /// Debit points from a member
    pub async fn subtract_points(
        &self,
        program_id: &str,
        member_id: &str,
        points: u32,
        options: PointsOptions,
    ) -> DinlrResult<LoyaltyTransaction> {
        let data = points_body(member_id, -credit(points)?, options)?;
        self.create_transaction(program_id, &data).await
    }

    /// Credit points earned by an order
    pub async fn award_points_for_order(
        &self,
        program_id: &str,
        member_id: &str,
        order_id: &str,
        points: u32,
        location_id: Option<&str>,
    ) -> DinlrResult<LoyaltyTransaction> {
        let order_id = validate_string(order_id, "Order ID", None, 1)?;
        let options = PointsOptions {
            notes: Some(format!("Points awarded for order {}", order_id)),
            location_id: location_id.map(str::to_string),
        };
        let mut data = points_body(member_id, i64::from(points), options)?;
        data.insert("order".into(), json!(order_id));
        self.create_transaction(program_id, &data).await
    }

    /// Debit the points a reward costs
    pub async fn redeem_reward(
        &self,
        program_id: &str,
        member_id: &str,
        reward_id: &str,
        points_required: u32,
        location_id: Option<&str>,
    ) -> DinlrResult<LoyaltyTransaction> {
        let reward_id = validate_string(reward_id, "Reward ID", None, 1)?;
        let points = points_required_at_least_one(points_required, "Points required")?;
        let options = PointsOptions {
            notes: Some(format!("Reward redemption: {}", reward_id)),
            location_id: location_id.map(str::to_string),
        };
        let data = points_body(member_id, -points, options)?;
        self.create_transaction(program_id, &data).await
    }

    /// Transactions of one member
    pub async fn member_transactions(
        &self,
        program_id: &str,
        member_id: &str,
        params: &Params,
    ) -> DinlrResult<Vec<LoyaltyTransaction>> {
        self.search_with(program_id, params, "member_id", member_id, "Member ID")
            .await
    }

    /// Transactions at one location
    pub async fn location_transactions(
        &self,
        program_id: &str,
        location_id: &str,
        params: &Params,
    ) -> DinlrResult<Vec<LoyaltyTransaction>> {
        self.search_with(program_id, params, "location_id", location_id, "Location ID")
            .await
    }

    /// Transactions of one order
    pub async fn order_transactions(
        &self,
        program_id: &str,
        order_id: &str,
        params: &Params,
    ) -> DinlrResult<Vec<LoyaltyTransaction>> {
        self.search_with(program_id, params, "order_id", order_id, "Order ID")
            .await
    }

    /// Transactions created by this app
    pub async fn current_app_transactions(
        &self,
        program_id: &str,
        params: &Params,
    ) -> DinlrResult<Vec<LoyaltyTransaction>> {
        self.search_with(program_id, params, "app_id", "current", "app_id")
            .await
    }

    /// Transactions created at or after `start`.
    ///
    /// The search endpoint has no upper bound, so `end` is validated but not
    /// sent.
    pub async fn transactions_since(
        &self,
        program_id: &str,
        start: &str,
        end: &str,
        params: &Params,
    ) -> DinlrResult<Vec<LoyaltyTransaction>> {
        validate_datetime(start, "Start date")?;
        validate_datetime(end, "End date")?;
        let mut params = params.clone();
        params.insert("created_at_min".into(), json!(start));
        self.search_transactions(program_id, &params).await
    }

    async fn search_with(
        &self,
        program_id: &str,
        params: &Params,
        key: &str,
        value: &str,
        field: &str,
    ) -> DinlrResult<Vec<LoyaltyTransaction>> {
        let value = validate_string(value, field, None, 1)?;
        let mut params = params.clone();
        params.insert(key.into(), json!(value));
        self.search_transactions(program_id, &params).await
    }
}

fn check_datetime(params: &Params, field: &str) -> Result<(), ValidationError> {
    if let Some(value) = params.get(field).filter(|v| !v.is_null()) {
        let text = string_value(value, field, None, 1)?;
        validate_datetime(&text, field)?;
    }
    Ok(())
}

fn credit(points: u32) -> Result<i64, ValidationError> {
    points_required_at_least_one(points, "Points")
}

fn points_required_at_least_one(points: u32, field: &str) -> Result<i64, ValidationError> {
    if points == 0 {
        return Err(ValidationError::BelowMinimum {
            field: field.to_string(),
            min: 1.0,
        });
    }
    Ok(i64::from(points))
}

fn points_body(member_id: &str, points: i64, options: PointsOptions) -> Result<Params, ValidationError> {
    let member = validate_string(member_id, "Member ID", None, 1)?;
    let mut data = object(json!({ "member": member, "points": points }));

    if let Some(notes) = options.notes.filter(|n| !n.is_empty()) {
        data.insert("notes".into(), json!(notes));
    }
    if let Some(location) = options.location_id.filter(|l| !l.is_empty()) {
        data.insert("location".into(), json!(location));
    }

    Ok(data)
}

/// Check a transaction payload and return it with strings sanitized
fn validate_transaction(data: &Params) -> Result<Params, ValidationError> {
    let rules = RuleSet::new()
        .field("member", ValidationRule::string().required())
        .field("location", ValidationRule::string())
        .field("order", ValidationRule::string())
        .field("notes", ValidationRule::string().max_length(200));
    let body = validate_and_sanitize(data, &rules)?;

    validate_required(&body, &["points"])?;
    match body.get("points") {
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(body),
        _ => Err(ValidationError::InvalidType {
            field: "points".to_string(),
            expected: "integer",
        }),
    }
}

fn validate_search(params: &Params) -> Result<Params, ValidationError> {
    validate_pagination(params)?;
    let mut out = params.clone();

    for field in SEARCH_STRING_FIELDS {
        if let Some(value) = params.get(*field).filter(|v| !is_missing(Some(v))) {
            let value = string_value(value, field, None, 1)?;
            out.insert(field.to_string(), Value::String(value));
        }
    }
    check_datetime(params, "created_at_min")?;

    Ok(out)
}
