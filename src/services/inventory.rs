//! Materials, stock levels and stock takes.

use super::{path_id, Scope};
use crate::client::DinlrClient;
use crate::errors::DinlrResult;
use crate::types::{Material, MaterialStock, StockTake};
use crate::validation::{validate_pagination, validate_string, Params};
use serde_json::json;

/// Materials service
pub struct MaterialsService<'a> {
    scope: Scope<'a>,
}

impl<'a> MaterialsService<'a> {
    /// Creates a new materials service.
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

    /// List materials, optionally for one location
    pub async fn list(&self, location_id: Option<&str>) -> DinlrResult<Vec<Material>> {
        let mut params = Params::new();
        if let Some(location_id) = location_id {
            params.insert("location_id".into(), json!(location_id));
        }
        let path = self.scope.path("materials", &[])?;
        self.scope.client.get_list(&path, Some(&params)).await
    }

    /// Get a material
    pub async fn get(&self, material_id: &str) -> DinlrResult<Material> {
        let id = path_id(material_id, "Material ID")?;
        let path = self.scope.path("materials", &[&id])?;
        self.scope.client.get(&path, None).await
    }

    /// Stock on hand at a location
    pub async fn stock_levels(&self, location_id: &str) -> DinlrResult<Vec<MaterialStock>> {
        let location_id = validate_string(location_id, "Location ID", None, 1)?;
        let mut params = Params::new();
        params.insert("location_id".into(), json!(location_id));
        let path = self.scope.path("material-stocks", &[])?;
        self.scope.client.get_list(&path, Some(&params)).await
    }

    /// List stock takes
    pub async fn stock_takes(&self, params: &Params) -> DinlrResult<Vec<StockTake>> {
        validate_pagination(params)?;
        let path = self.scope.path("stock-takes", &[])?;
        self.scope.client.get_list(&path, Some(params)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DinlrConfig;
    use crate::mocks::{MockHttpTransport, MockResponse};
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
    async fn test_stock_levels() {
        let (mock, client) = setup();
        mock.add_response(MockResponse::data(json!([
            {"material": "m1", "qty": 12.5, "updated_at": "2025-01-01T00:00:00+08:00"}
        ])));

        let stock = client.materials().stock_levels("L1").await.unwrap();

        assert_eq!(stock[0].qty, Some(12.5));
        assert_eq!(
            mock.last_request().unwrap().url.as_str(),
            "https://api.dinlr.com/v1/r1/onlineorder/material-stocks?location_id=L1"
        );
    }

    #[tokio::test]
    async fn test_list_without_location_has_no_query() {
        let (mock, client) = setup();
        mock.add_response(MockResponse::data(json!([{"id": "m1", "name": "Flour"}])));

        let materials = client.materials().list(None).await.unwrap();

        assert_eq!(materials[0].name.as_deref(), Some("Flour"));
        assert_eq!(mock.last_request().unwrap().url.query(), None);
    }
}
