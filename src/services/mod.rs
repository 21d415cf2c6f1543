//! Resource services for the Dinlr API.
//!
//! Each service borrows the client and targets the client's restaurant
//! unless `for_restaurant` names another. Paths have the shape
//! `/<restaurant_id>/onlineorder/<resource>[/<sub>...]`, and every id placed
//! in a path is checked with [`sanitize_identifier`].

mod catalog;
mod customers;
mod inventory;
mod loyalty;
mod offers;
mod orders;
mod reservations;
mod store_credit;

pub use catalog::*;
pub use customers::*;
pub use inventory::*;
pub use loyalty::*;
pub use offers::*;
pub use orders::*;
pub use reservations::*;
pub use store_credit::*;

use crate::client::DinlrClient;
use crate::errors::{ConfigurationError, DinlrResult, ValidationError};
use crate::security::sanitize_identifier;
use crate::validation::Params;
use serde_json::Value;

/// Client and restaurant a service call targets
#[derive(Debug, Clone)]
pub(crate) struct Scope<'a> {
    pub(crate) client: &'a DinlrClient,
    restaurant_id: Option<String>,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(client: &'a DinlrClient) -> Self {
        Self {
            client,
            restaurant_id: None,
        }
    }

    pub(crate) fn with_restaurant(mut self, restaurant_id: impl Into<String>) -> Self {
        self.restaurant_id = Some(restaurant_id.into());
        self
    }

    fn restaurant(&self) -> DinlrResult<String> {
        let id = self
            .restaurant_id
            .clone()
            .or_else(|| self.client.restaurant_id())
            .ok_or(ConfigurationError::MissingRestaurantId)?;
        Ok(sanitize_identifier(&id, "restaurant_id")?)
    }

    /// Path of `resource` under the restaurant, with `segments` appended.
    ///
    /// Segments must already be checked ids or fixed path words.
    pub(crate) fn path(&self, resource: &str, segments: &[&str]) -> DinlrResult<String> {
        let mut path = format!("/{}/onlineorder/{}", self.restaurant()?, resource);
        for segment in segments {
            path.push('/');
            path.push_str(segment);
        }
        Ok(path)
    }
}

/// Check an id that will be placed in a path
pub(crate) fn path_id(id: &str, field: &str) -> Result<String, ValidationError> {
    sanitize_identifier(id, field)
}

/// Build a parameter map from a JSON object literal
pub(crate) fn object(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}
