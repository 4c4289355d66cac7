use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::shipping::Parcel;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCategory {
    Vehicle,
    Battery,
    Accessory,
}

/// The slice of the catalog the order engine needs. Catalog CRUD lives
/// outside this workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub name: String,
    pub unit_price: i64,
    pub category: ProductCategory,
    pub parcel: Parcel,
    /// Present when the sale requires a signed contract before payment.
    pub contract_template: Option<String>,
    pub available: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("product not found: {0}")]
    NotFound(Uuid),
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn get_product(&self, id: Uuid) -> Result<Product, CatalogError>;
    async fn mark_sold(&self, id: Uuid) -> Result<(), CatalogError>;
}

/// In-memory catalog used by tests and the dev profile.
#[derive(Default)]
pub struct InMemoryCatalog {
    products: Mutex<HashMap<Uuid, Product>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: Product) {
        self.products.lock().unwrap().insert(product.id, product);
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn get_product(&self, id: Uuid) -> Result<Product, CatalogError> {
        self.products
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(CatalogError::NotFound(id))
    }

    async fn mark_sold(&self, id: Uuid) -> Result<(), CatalogError> {
        let mut products = self.products.lock().unwrap();
        let product = products.get_mut(&id).ok_or(CatalogError::NotFound(id))?;
        product.available = false;
        Ok(())
    }
}
