//! Inventory records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw material tracked in inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Material ID
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Stock keeping unit
    pub sku: Option<String>,
    /// Unit of measure
    pub unit: Option<String>,
    /// Last update timestamp
    pub updated_at: Option<String>,
}

/// Stock level of a material at a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialStock {
    /// Material ID
    pub material: String,
    /// Quantity on hand
    pub qty: Option<f64>,
    /// Last update timestamp
    pub updated_at: Option<String>,
}

/// Stock count session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockTake {
    /// Stock take ID
    pub id: String,
    /// Location ID
    pub location: Option<String>,
    /// Start of the count
    pub start_date: Option<String>,
    /// End of the count
    pub end_date: Option<String>,
    /// Notes
    pub notes: Option<String>,
    /// Counted materials
    #[serde(default)]
    pub materials: Vec<Value>,
    /// Last update timestamp
    pub updated_at: Option<String>,
}
