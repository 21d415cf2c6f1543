//! Restaurant setup and menu records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Restaurant account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    /// Restaurant ID
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// ISO currency code
    pub currency: Option<String>,
    /// Last update timestamp
    pub updated_at: Option<String>,
}

/// Outlet of a restaurant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Location ID
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Last update timestamp
    pub updated_at: Option<String>,
}

/// Dine-in, takeaway, delivery and similar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiningOption {
    /// Dining option ID
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Sort position
    pub sort: Option<i64>,
    /// Last update timestamp
    pub updated_at: Option<String>,
}

/// Input a payment method asks for, such as a card reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentInput {
    /// Input ID
    pub id: String,
    /// Display name
    pub name: Option<String>,
}

/// Accepted way of paying
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    /// Payment method ID
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Inputs collected with the payment
    #[serde(default)]
    pub payment_inputs: Vec<PaymentInput>,
    /// Sort position
    pub sort: Option<i64>,
    /// Last update timestamp
    pub updated_at: Option<String>,
}

/// Service charge or surcharge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    /// Charge ID
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Dining options the charge applies to
    #[serde(default)]
    pub dining_options: Vec<Value>,
    /// Last update timestamp
    pub updated_at: Option<String>,
}

/// Sellable menu item.
///
/// Variants and modifier links are kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Item ID
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Category ID
    pub category: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Image URL
    pub image: Option<String>,
    /// Item number
    pub item_no: Option<String>,
    /// Variants with prices
    #[serde(default)]
    pub variants: Vec<Value>,
    /// Linked modifiers
    #[serde(default)]
    pub modifiers: Vec<Value>,
    /// Last update timestamp
    pub updated_at: Option<String>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Item category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Category ID
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Parent category ID
    pub parent_category: Option<String>,
    /// Last update timestamp
    pub updated_at: Option<String>,
}

/// Group of options added to an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    /// Modifier ID
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Minimum selections
    pub min_selection: Option<i64>,
    /// Maximum selections
    pub max_selection: Option<i64>,
    /// Selectable options
    #[serde(default)]
    pub modifier_options: Vec<Value>,
    /// Sort position
    pub sort: Option<i64>,
    /// Last update timestamp
    pub updated_at: Option<String>,
}

/// Menu with its items and opening times
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    /// Menu ID
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Sort position
    pub sort: Option<i64>,
    /// Per-day availability
    #[serde(default)]
    pub times: Vec<Value>,
    /// Items on the menu
    #[serde(default)]
    pub items: Vec<Value>,
}

impl Menu {
    /// Whether the menu lists a time slot for `day` (1 = Monday)
    pub fn is_available_on_day(&self, day: i64) -> bool {
        self.times
            .iter()
            .any(|t| t.get("day").and_then(Value::as_i64) == Some(day))
    }
}

/// Discount definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    /// Discount ID
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// `percent` or `price`
    #[serde(rename = "type")]
    pub discount_type: Option<String>,
    /// Discount value
    pub value: Option<f64>,
    /// Cap for percentage discounts
    pub max_value: Option<f64>,
    /// Whether the discount combines with others
    pub stackable: Option<bool>,
    /// Whether the discount is manufacturer funded
    pub manufacturer_discount: Option<bool>,
    /// Last update timestamp
    pub updated_at: Option<String>,
}

/// Promotion definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    /// Promotion ID
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Promotion type
    #[serde(rename = "type")]
    pub promotion_type: Option<String>,
    /// Human readable summary
    pub summary: Option<String>,
    /// First valid date
    pub start_date: Option<String>,
    /// Last valid date
    pub end_date: Option<String>,
    /// Last update timestamp
    pub updated_at: Option<String>,
}

/// Voucher code for a discount or promotion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voucher {
    /// Voucher ID
    pub id: String,
    /// Code customers enter
    pub voucher_code: Option<String>,
    /// `discount` or `promotion`
    #[serde(rename = "type")]
    pub voucher_type: Option<String>,
    /// Discount ID for discount vouchers
    pub discount: Option<String>,
    /// Promotion ID for promotion vouchers
    pub promotion: Option<String>,
    /// `all` or `customer`
    pub applicable: Option<String>,
    /// Customer ID for customer vouchers
    pub customer: Option<String>,
    /// Redemption cap, absent when unlimited
    pub max_redemptions: Option<i64>,
    /// Times redeemed
    pub redeemed: Option<i64>,
    /// First valid date
    pub start_date: Option<String>,
    /// Last valid date
    pub end_date: Option<String>,
    /// Last update timestamp
    pub updated_at: Option<String>,
}

impl Voucher {
    /// Whether the voucher applies a discount
    pub fn is_discount_voucher(&self) -> bool {
        self.voucher_type.as_deref() == Some("discount")
    }

    /// Whether the voucher applies a promotion
    pub fn is_promotion_voucher(&self) -> bool {
        self.voucher_type.as_deref() == Some("promotion")
    }

    /// Whether the voucher is tied to one customer
    pub fn is_customer_voucher(&self) -> bool {
        self.applicable.as_deref() == Some("customer")
    }
}

/// Reservation experience
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    /// Experience ID
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Sort position
    pub sort: Option<i64>,
    /// Last update timestamp
    pub updated_at: Option<String>,
}

/// Area of tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSection {
    /// Table section ID
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Last update timestamp
    pub updated_at: Option<String>,
}

/// Floor layout of a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Floorplan {
    /// Floorplan ID
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Tables and other placed objects
    #[serde(default)]
    pub objects: Vec<Value>,
    /// Sort position
    pub sort: Option<i64>,
    /// Last update timestamp
    pub updated_at: Option<String>,
}
