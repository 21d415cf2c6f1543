//! Test fixtures for Dinlr API responses.
//!
//! Provides realistic test data for unit and integration tests.

use crate::types::*;
use serde_json::{json, Map};

/// Restaurant ID used across fixtures
pub const RESTAURANT_ID: &str = "5d6d0eea3b6e2a0b3a6c5f21";

/// Location ID used across fixtures
pub const LOCATION_ID: &str = "5d6d0f283b6e2a0b3a6c5f3a";

/// Create a fixture location
pub fn location() -> Location {
    Location {
        id: LOCATION_ID.to_string(),
        name: Some("Orchard Road".to_string()),
        updated_at: Some("2024-11-02T09:15:00+08:00".to_string()),
    }
}

/// Create a fixture customer
pub fn customer() -> Customer {
    Customer {
        id: "cus_5e1c9a".to_string(),
        reference: Some("C0042".to_string()),
        first_name: Some("Mei".to_string()),
        last_name: Some("Tan".to_string()),
        company_name: None,
        email: Some("mei.tan@example.com".to_string()),
        phone: Some("+6591234567".to_string()),
        dob: Some("1990-04-12".to_string()),
        gender: Some("F".to_string()),
        address1: Some("1 Scotts Road".to_string()),
        address2: None,
        city: Some("Singapore".to_string()),
        country: Some("SG".to_string()),
        postal: Some("228208".to_string()),
        notes: None,
        customer_group: None,
        marketing_consent_email: Some(true),
        marketing_consent_text: Some(false),
        marketing_consent_phone: None,
        updated_at: Some("2024-11-02T09:15:00+08:00".to_string()),
        extra: Map::new(),
    }
}

/// Create a fixture loyalty member
pub fn loyalty_member() -> LoyaltyMember {
    LoyaltyMember {
        id: "mem_81f2".to_string(),
        customer: Some("cus_5e1c9a".to_string()),
        point: 240,
        updated_at: Some("2024-11-02T09:15:00+08:00".to_string()),
    }
}

/// Create a fixture store credit balance
pub fn store_credit_balance() -> StoreCreditBalance {
    StoreCreditBalance {
        id: "cus_5e1c9a".to_string(),
        store_credit: 35.5,
        updated_at: Some("2024-11-02T09:15:00+08:00".to_string()),
    }
}

/// Create fixture JSON responses
pub mod responses {
    use super::*;

    /// Wrap `data` in the API envelope
    pub fn envelope(data: serde_json::Value) -> serde_json::Value {
        json!({ "data": data })
    }

    /// Create a restaurant response
    pub fn restaurant() -> serde_json::Value {
        envelope(json!({
            "id": RESTAURANT_ID,
            "name": "Nava Kitchen",
            "currency": "SGD",
            "updated_at": "2024-10-01T00:00:00+08:00"
        }))
    }

    /// Create a locations list response
    pub fn locations_list() -> serde_json::Value {
        envelope(json!([
            {
                "id": LOCATION_ID,
                "name": "Orchard Road",
                "updated_at": "2024-11-02T09:15:00+08:00"
            },
            {
                "id": "5d6d0f283b6e2a0b3a6c5f3b",
                "name": "Tanjong Pagar",
                "updated_at": "2024-11-02T09:15:00+08:00"
            }
        ]))
    }

    /// Create a single customer response
    pub fn customer() -> serde_json::Value {
        envelope(json!({
            "id": "cus_5e1c9a",
            "reference": "C0042",
            "first_name": "Mei",
            "last_name": "Tan",
            "email": "mei.tan@example.com",
            "phone": "+6591234567",
            "marketing_consent_email": true
        }))
    }

    /// Create a single order response
    pub fn order() -> serde_json::Value {
        envelope(json!({
            "id": "ord_7a31",
            "location": LOCATION_ID,
            "order_no": "A0017",
            "status": "open",
            "financial_status": "unpaid",
            "subtotal": 24.0,
            "total": 26.16,
            "items": [
                {"id": "oi_1", "item": "itm_1", "qty": 2, "price": 12.0}
            ],
            "taxes": [
                {"tax": "tax_gst", "amount": 2.16}
            ],
            "created_at": "2024-11-02T12:01:00+08:00"
        }))
    }

    /// Create a cart calculation response
    pub fn cart_calculation() -> serde_json::Value {
        envelope(json!({
            "subtotal": 24.0,
            "total": 23.76,
            "financial_status": "unpaid",
            "discounts": [{"discount": "dsc_1", "amount": 2.4}],
            "taxes": [{"tax": "tax_gst", "amount": 2.16}]
        }))
    }

    /// Create a loyalty transaction response
    pub fn loyalty_transaction(points: i64) -> serde_json::Value {
        envelope(json!({
            "id": "ltx_19",
            "member": "mem_81f2",
            "point": points,
            "created_at": "2024-11-02T12:05:00+08:00"
        }))
    }

    /// Create an OAuth token response
    pub fn token(access_token: &str, refresh_token: &str) -> serde_json::Value {
        json!({
            "access_token": access_token,
            "refresh_token": refresh_token,
            "expires_in": 3600,
            "token_type": "Bearer"
        })
    }

    /// Create a webhook delivery body
    pub fn webhook_event(topic: &str) -> serde_json::Value {
        let object = topic.split('.').next().unwrap_or_default();
        json!({
            "id": "evt_4c2d",
            "object": object,
            "topic": topic,
            "restaurant": RESTAURANT_ID,
            "location": LOCATION_ID,
            "created_at": "2024-11-02T12:01:00+08:00",
            "data": {"id": "ord_7a31"}
        })
    }

    /// Create an error response
    pub fn error(message: &str) -> serde_json::Value {
        json!({ "message": message })
    }

    /// Create a success-status body that carries an `errors` object
    pub fn errors_object(status: u16, detail: &str) -> serde_json::Value {
        json!({
            "errors": {
                "status": status,
                "detail": detail
            }
        })
    }
}
