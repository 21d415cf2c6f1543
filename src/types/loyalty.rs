//! Loyalty and store credit records.

use serde::{Deserialize, Serialize};

/// Loyalty program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyProgram {
    /// Program ID
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Singular name of a point
    pub term_single: Option<String>,
    /// Plural name of points
    pub term_plural: Option<String>,
    /// Last update timestamp
    pub updated_at: Option<String>,
}

/// Reward redeemable for points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyReward {
    /// Reward ID
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Points required
    pub point: Option<i64>,
}

/// Customer enrolled in a program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyMember {
    /// Member ID
    pub id: String,
    /// Customer ID
    pub customer: Option<String>,
    /// Point balance
    #[serde(default)]
    pub point: i64,
    /// Last update timestamp
    pub updated_at: Option<String>,
}

impl LoyaltyMember {
    /// Whether the balance is positive
    pub fn has_points(&self) -> bool {
        self.point > 0
    }

    /// Whether the balance covers `required`
    pub fn has_sufficient_points(&self, required: i64) -> bool {
        self.point >= required
    }
}

/// Point movement on a member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyTransaction {
    /// Transaction ID
    pub id: String,
    /// Member ID
    pub member: Option<String>,
    /// Points added, negative for deductions
    #[serde(default)]
    pub point: i64,
    /// Location ID
    pub location: Option<String>,
    /// Order ID
    pub order: Option<String>,
    /// Notes
    pub notes: Option<String>,
    /// Creation timestamp
    pub created_at: Option<String>,
}

/// Store credit held by a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreCreditBalance {
    /// Customer ID
    pub id: String,
    /// Balance
    #[serde(default)]
    pub store_credit: f64,
    /// Last update timestamp
    pub updated_at: Option<String>,
}

impl StoreCreditBalance {
    /// Whether the balance is positive
    pub fn has_store_credit(&self) -> bool {
        self.store_credit > 0.0
    }

    /// Whether the balance covers `amount`
    pub fn has_sufficient_credit(&self, amount: f64) -> bool {
        self.store_credit >= amount
    }
}

/// Store credit movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreCreditTransaction {
    /// Transaction ID
    pub id: String,
    /// Customer ID
    pub customer: Option<String>,
    /// Amount, negative for deductions
    #[serde(default)]
    pub amount: f64,
    /// Location ID
    pub location: Option<String>,
    /// Order ID
    pub order: Option<String>,
    /// Notes
    pub notes: Option<String>,
    /// Creation timestamp
    pub created_at: Option<String>,
}

/// Paid store credit top-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreCreditTopup {
    /// Top-up ID
    pub id: String,
    /// Top-up number
    pub topup_no: Option<String>,
    /// Customer ID
    pub customer: Option<String>,
    /// Location ID
    pub location: Option<String>,
    /// Credit added
    pub topup_amount: Option<f64>,
    /// Payment method ID
    pub payment: Option<String>,
    /// Amount paid
    pub payment_amount: Option<f64>,
    /// Creation timestamp
    pub created_at: Option<String>,
}
