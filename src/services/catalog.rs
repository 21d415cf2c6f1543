//! Read-only catalog resources: locations, menu setup and reservation setup.

use super::{object, path_id, Scope};
use crate::client::DinlrClient;
use crate::errors::DinlrResult;
use crate::types::{
    Category, Charge, CustomerGroup, DiningOption, Experience, Item, Location, Menu, Modifier,
    PaymentMethod, Restaurant, TableSection,
};
use crate::validation::{validate_pagination, Params};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::marker::PhantomData;
use tracing::instrument;

/// Record served by a list-and-get catalog endpoint
pub trait CatalogRecord: DeserializeOwned {
    /// Path segment under `onlineorder/`
    const RESOURCE: &'static str;
    /// Field name used in validation errors for ids
    const ID_FIELD: &'static str;
}

macro_rules! catalog_record {
    ($($record:ty => $resource:literal, $field:literal;)*) => {
        $(
            impl CatalogRecord for $record {
                const RESOURCE: &'static str = $resource;
                const ID_FIELD: &'static str = $field;
            }
        )*
    };
}

catalog_record! {
    Location => "locations", "Location ID";
    DiningOption => "dining-options", "Dining option ID";
    PaymentMethod => "payments", "Payment method ID";
    Charge => "charges", "Charge ID";
    Item => "items", "Item ID";
    Category => "categories", "Category ID";
    Modifier => "modifiers", "Modifier ID";
    CustomerGroup => "customer-groups", "Customer group ID";
    Experience => "experiences", "Experience ID";
    TableSection => "table-sections", "Table section ID";
}

/// List-and-get service for a catalog record type
pub struct CatalogService<'a, T> {
    scope: Scope<'a>,
    _record: PhantomData<fn() -> T>,
}

/// Locations service
pub type LocationsService<'a> = CatalogService<'a, Location>;
/// Dining options service
pub type DiningOptionsService<'a> = CatalogService<'a, DiningOption>;
/// Payment methods service
pub type PaymentMethodsService<'a> = CatalogService<'a, PaymentMethod>;
/// Charges service
pub type ChargesService<'a> = CatalogService<'a, Charge>;
/// Items service
pub type ItemsService<'a> = CatalogService<'a, Item>;
/// Categories service
pub type CategoriesService<'a> = CatalogService<'a, Category>;
/// Modifiers service
pub type ModifiersService<'a> = CatalogService<'a, Modifier>;
/// Customer groups service
pub type CustomerGroupsService<'a> = CatalogService<'a, CustomerGroup>;
/// Experiences service
pub type ExperiencesService<'a> = CatalogService<'a, Experience>;
/// Table sections service
pub type TableSectionsService<'a> = CatalogService<'a, TableSection>;

impl<'a, T: CatalogRecord> CatalogService<'a, T> {
    /// Creates a new catalog service.
    pub fn new(client: &'a DinlrClient) -> Self {
        Self {
            scope: Scope::new(client),
            _record: PhantomData,
        }
    }

    /// Target another restaurant
    pub fn for_restaurant(mut self, restaurant_id: impl Into<String>) -> Self {
        self.scope = self.scope.with_restaurant(restaurant_id);
        self
    }

    /// List records, optionally for one location
    pub async fn list(&self, location_id: Option<&str>) -> DinlrResult<Vec<T>> {
        let mut params = Params::new();
        if let Some(location_id) = location_id {
            params.insert("location_id".into(), json!(location_id));
        }
        self.list_with_params(&params).await
    }

    /// List records with query parameters
    #[instrument(skip(self, params), fields(resource = T::RESOURCE))]
    pub async fn list_with_params(&self, params: &Params) -> DinlrResult<Vec<T>> {
        validate_pagination(params)?;
        let path = self.scope.path(T::RESOURCE, &[])?;
        self.scope.client.get_list(&path, Some(params)).await
    }

    /// Get one record
    #[instrument(skip(self), fields(resource = T::RESOURCE))]
    pub async fn get(&self, id: &str) -> DinlrResult<T> {
        let id = path_id(id, T::ID_FIELD)?;
        let path = self.scope.path(T::RESOURCE, &[&id])?;
        self.scope.client.get(&path, None).await
    }
}

impl CatalogService<'_, Item> {
    /// List the items sold at a location
    pub async fn list_for_location(&self, location_id: &str, params: &Params) -> DinlrResult<Vec<Item>> {
        let mut params = params.clone();
        params.insert("location_id".into(), json!(location_id));
        self.list_with_params(&params).await
    }
}

/// Restaurant service
pub struct RestaurantService<'a> {
    scope: Scope<'a>,
}

impl<'a> RestaurantService<'a> {
    /// Creates a new restaurant service.
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

    /// Get the restaurant
    pub async fn get(&self) -> DinlrResult<Restaurant> {
        let path = self.scope.path("restaurant", &[])?;
        self.scope.client.get(&path, None).await
    }
}

#[derive(Deserialize)]
struct MenuEnvelope {
    #[serde(default)]
    menus: Vec<Menu>,
}

/// Menu service
pub struct MenuService<'a> {
    scope: Scope<'a>,
}

impl<'a> MenuService<'a> {
    /// Creates a new menu service.
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

    /// List the menus served at a location
    pub async fn list(&self, location_id: &str) -> DinlrResult<Vec<Menu>> {
        let path = self.scope.path("menu", &[])?;
        let params = object(json!({ "location_id": location_id }));
        let envelope: Option<MenuEnvelope> = self.scope.client.get_optional(&path, Some(&params)).await?;
        Ok(envelope.map(|e| e.menus).unwrap_or_default())
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
    async fn test_list_dining_options_for_location() {
        let (mock, client) = setup();
        mock.add_response(MockResponse::data(json!([{"id": "d1", "name": "Dine In"}])));

        let options = client.dining_options().list(Some("L1")).await.unwrap();

        assert_eq!(options[0].name.as_deref(), Some("Dine In"));
        assert_eq!(
            mock.last_request().unwrap().url.as_str(),
            "https://api.dinlr.com/v1/r1/onlineorder/dining-options?location_id=L1"
        );
    }

    #[tokio::test]
    async fn test_get_item_checks_id() {
        let (mock, client) = setup();

        let err = client.items().get("i1/../x").await.unwrap_err();

        assert_eq!(err.as_validation().unwrap().field(), Some("Item ID"));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_list_rejects_bad_pagination() {
        let (mock, client) = setup();
        let params = object(json!({"limit": 201}));

        assert!(client.categories().list_with_params(&params).await.is_err());
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_data_is_empty_list() {
        let (mock, client) = setup();
        mock.add_response(MockResponse::json(&json!({})));

        let locations = client.locations().list(None).await.unwrap();
        assert!(locations.is_empty());
    }

    #[tokio::test]
    async fn test_menu_reads_nested_menus() {
        let (mock, client) = setup();
        mock.add_response(MockResponse::data(json!({
            "menus": [{"id": "m1", "name": "Lunch", "times": [{"day": 1}]}]
        })));

        let menus = client.menu().for_restaurant("r2").list("L1").await.unwrap();

        assert_eq!(menus.len(), 1);
        assert!(menus[0].is_available_on_day(1));
        assert_eq!(
            mock.last_request().unwrap().url.path(),
            "/v1/r2/onlineorder/menu"
        );
    }

    #[tokio::test]
    async fn test_restaurant_get() {
        let (mock, client) = setup();
        mock.add_response(MockResponse::data(json!({"id": "r1", "currency": "SGD"})));

        let restaurant = client.restaurant().get().await.unwrap();
        assert_eq!(restaurant.currency.as_deref(), Some("SGD"));
    }
}
