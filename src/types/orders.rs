//! Order, cart and reservation records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Order status filter accepted by the orders list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Awaiting acceptance
    Pending,
    /// Open
    Open,
    /// Closed
    Closed,
    /// Cancelled
    Cancelled,
    /// Awaiting payment
    PendingPayment,
    /// Cancelled before payment completed
    CancelledPayment,
}

impl OrderStatus {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Open => "open",
            OrderStatus::Closed => "closed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::CancelledPayment => "cancelled_payment",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kitchen or expedite state of an order item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemStatus {
    /// Waiting
    Pending,
    /// Done: fulfilled in the kitchen, expedited at the pass
    Done,
    /// Cleared back to the default
    Default,
}

/// Order.
///
/// Line items, payments and the rest of the nested payload are kept as raw
/// JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID
    pub id: String,
    /// Location ID
    pub location: Option<String>,
    /// Order number
    pub order_no: Option<String>,
    /// Ticket shown to the kitchen
    pub order_ticket: Option<String>,
    /// Dining option ID
    pub dining_option: Option<String>,
    /// Dining option name
    pub dining_option_name: Option<String>,
    /// Customer ID
    pub customer: Option<String>,
    /// Number of guests
    pub pax: Option<i64>,
    /// Order status
    pub status: Option<String>,
    /// `paid`, `partially_paid` or `unpaid`
    pub financial_status: Option<String>,
    /// Kitchen status
    pub kitchen_status: Option<String>,
    /// Expedite status
    pub expedite_status: Option<String>,
    /// Subtotal
    pub subtotal: Option<f64>,
    /// Total
    pub total: Option<f64>,
    /// Amount paid
    pub paid: Option<f64>,
    /// Notes
    pub notes: Option<String>,
    /// Reason given when voided
    pub void_reason: Option<String>,
    /// Line items
    #[serde(default)]
    pub items: Vec<Value>,
    /// Charges
    #[serde(default)]
    pub charges: Vec<Value>,
    /// Discounts
    #[serde(default)]
    pub discounts: Vec<Value>,
    /// Taxes
    #[serde(default)]
    pub taxes: Vec<Value>,
    /// Payments
    #[serde(default)]
    pub payments: Vec<Value>,
    /// Refunds
    #[serde(default)]
    pub refunds: Vec<Value>,
    /// Creation timestamp
    pub created_at: Option<String>,
    /// Last update timestamp
    pub updated_at: Option<String>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Order {
    /// Whether the order is open
    pub fn is_open(&self) -> bool {
        self.status.as_deref() == Some("open")
    }

    /// Whether the order is closed
    pub fn is_closed(&self) -> bool {
        self.status.as_deref() == Some("closed")
    }

    /// Whether the order is cancelled
    pub fn is_cancelled(&self) -> bool {
        self.status.as_deref() == Some("cancelled")
    }

    /// Whether the order is fully paid
    pub fn is_paid(&self) -> bool {
        self.financial_status.as_deref() == Some("paid")
    }
}

/// Priced cart returned by cart calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSummary {
    /// Subtotal
    pub subtotal: Option<f64>,
    /// Total
    pub total: Option<f64>,
    /// Financial status
    pub financial_status: Option<String>,
    /// Priced items
    #[serde(default)]
    pub items: Vec<Value>,
    /// Charges
    #[serde(default)]
    pub charges: Vec<Value>,
    /// Discounts
    #[serde(default)]
    pub discounts: Vec<Value>,
    /// Manufacturer discounts
    #[serde(default)]
    pub manufacturer_discounts: Vec<Value>,
    /// Vouchers
    #[serde(default)]
    pub vouchers: Vec<Value>,
    /// Taxes
    #[serde(default)]
    pub taxes: Vec<Value>,
    /// Payments
    #[serde(default)]
    pub payments: Vec<Value>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CartSummary {
    /// Sum of tax amounts
    pub fn total_tax(&self) -> f64 {
        sum_amounts(&self.taxes)
    }

    /// Sum of discount amounts
    pub fn total_discount(&self) -> f64 {
        sum_amounts(&self.discounts)
    }
}

fn sum_amounts(entries: &[Value]) -> f64 {
    entries
        .iter()
        .filter_map(|e| e.get("amount").and_then(Value::as_f64))
        .sum()
}

/// Table reservation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    /// Reservation ID
    pub id: String,
    /// Reservation number
    pub reservation_no: Option<String>,
    /// Location ID
    pub location: Option<String>,
    /// Customer ID
    pub customer: Option<String>,
    /// Reserved time
    pub reservation_time: Option<String>,
    /// Total guests
    pub pax: Option<i64>,
    /// Adults
    pub adult: Option<i64>,
    /// Children
    pub children: Option<i64>,
    /// Status, e.g. `booked` or `seated`
    pub status: Option<String>,
    /// Service ID
    pub service: Option<String>,
    /// Service name
    pub service_name: Option<String>,
    /// Experience ID
    pub experience: Option<String>,
    /// Experience name
    pub experience_name: Option<String>,
    /// Table section ID
    pub table_section: Option<String>,
    /// Table section name
    pub table_section_name: Option<String>,
    /// Deposit collected
    pub total_deposit: Option<f64>,
    /// Notes
    pub notes: Option<String>,
    /// Cancellation reason
    pub cancel_reason: Option<String>,
    /// Creation timestamp
    pub created_at: Option<String>,
    /// Last update timestamp
    pub updated_at: Option<String>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Bookable reservation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Service ID
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Experience ID
    pub experience: Option<String>,
    /// Table section ID
    pub table_section: Option<String>,
    /// Bookable times
    #[serde(default)]
    pub available_times: Vec<Value>,
}
