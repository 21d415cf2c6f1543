//! Reservations service.

use super::{object, path_id, Scope};
use crate::client::DinlrClient;
use crate::errors::{DinlrResult, ValidationError};
use crate::security::validate_date;
use crate::types::{Reservation, Service};
use crate::validation::{validate_pagination, validate_required, validate_string, Params};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use tracing::instrument;

const RESOURCE: &str = "reservations";

const RESERVATION_INFO_FIELDS: &[&str] = &["reservation_time", "service", "pax", "adult", "children"];

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is a valid regex"));

/// Reservations service
pub struct ReservationsService<'a> {
    scope: Scope<'a>,
}

impl<'a> ReservationsService<'a> {
    /// Creates a new reservations service.
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

    /// Services bookable at a location on `date` (`YYYY-MM-DD`) for a party
    pub async fn available_services(
        &self,
        location_id: &str,
        date: &str,
        adult: u32,
        children: u32,
    ) -> DinlrResult<Vec<Service>> {
        let location_id = validate_string(location_id, "Location ID", None, 1)?;
        if !ISO_DATE.is_match(date) {
            return Err(ValidationError::BadDateFormat {
                field: "Date".to_string(),
                expected: "YYYY-MM-DD".to_string(),
            }
            .into());
        }
        validate_date(date, "Date")?;

        let params = object(json!({
            "location_id": location_id,
            "date": date,
            "adult": adult,
            "children": children,
        }));
        let path = self.scope.path("services", &[])?;
        self.scope.client.get_list(&path, Some(&params)).await
    }

    /// Book a table
    #[instrument(skip(self, data))]
    pub async fn book(&self, data: &Params) -> DinlrResult<Reservation> {
        validate_booking(data)?;
        let path = self.scope.path(RESOURCE, &[])?;
        self.scope.client.post(&path, data).await
    }

    /// List reservations
    pub async fn list(&self, params: &Params) -> DinlrResult<Vec<Reservation>> {
        validate_pagination(params)?;
        let path = self.scope.path(RESOURCE, &[])?;
        self.scope.client.get_list(&path, Some(params)).await
    }

    /// Get a reservation
    pub async fn get(&self, reservation_id: &str) -> DinlrResult<Reservation> {
        let id = path_id(reservation_id, "Reservation ID")?;
        let path = self.scope.path(RESOURCE, &[&id])?;
        self.scope.client.get(&path, None).await
    }

    /// Update a reservation
    #[instrument(skip(self, data))]
    pub async fn update(&self, reservation_id: &str, data: &Params) -> DinlrResult<Reservation> {
        let id = path_id(reservation_id, "Reservation ID")?;
        let path = self.scope.path(RESOURCE, &[&id])?;
        self.scope.client.put(&path, data).await
    }
}

fn validate_booking(data: &Params) -> Result<(), ValidationError> {
    validate_required(data, &["location", "reservation_info"])?;
    match data.get("reservation_info") {
        Some(Value::Object(info)) => validate_required(info, RESERVATION_INFO_FIELDS),
        _ => Err(ValidationError::InvalidType {
            field: "reservation_info".to_string(),
            expected: "object",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DinlrConfig;
    use crate::mocks::{MockHttpTransport, MockResponse};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

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

    #[tokio::test]
    async fn test_available_services_request() {
        let (mock, client) = setup();
        mock.add_response(MockResponse::data(json!([
            {"id": "s1", "name": "Dinner", "available_times": ["19:00"]}
        ])));

        let services = client
            .reservations()
            .available_services("L1", "2025-06-01", 2, 1)
            .await
            .unwrap();

        assert_eq!(services[0].name.as_deref(), Some("Dinner"));
        let url = mock.last_request().unwrap().url;
        assert_eq!(url.path(), "/v1/r1/onlineorder/services");
        assert_eq!(
            url.query(),
            Some("adult=2&children=1&date=2025-06-01&location_id=L1")
        );
    }

    #[tokio::test]
    async fn test_available_services_date_shape() {
        let (mock, client) = setup();

        let err = client
            .reservations()
            .available_services("L1", "01/06/2025", 2, 0)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Validation error: Date must be in YYYY-MM-DD format");
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_book_requires_reservation_info_fields() {
        let (mock, client) = setup();

        let err = client
            .reservations()
            .book(&object(json!({
                "location": "L1",
                "reservation_info": {"reservation_time": "2025-06-01T19:00:00+08:00", "pax": 2}
            })))
            .await
            .unwrap_err();

        assert_eq!(
            err.as_validation().unwrap().fields(),
            vec!["service", "adult", "children"]
        );
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_update_puts() {
        let (mock, client) = setup();
        mock.add_response(MockResponse::data(json!({"id": "res1", "status": "seated"})));

        let reservation = client
            .reservations()
            .update("res1", &object(json!({"status": "seated"})))
            .await
            .unwrap();

        assert_eq!(reservation.status.as_deref(), Some("seated"));
        assert_eq!(mock.last_request().unwrap().method, http::Method::PUT);
    }
}
