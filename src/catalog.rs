use log::warn;
use std::path::PathBuf;
use crate::models::catalog::Product;
use crate::store::read_json_collection;

enum CatalogSource {
    File(PathBuf),
    Fixed(Vec<Product>),
}

/// Read-only product list. File-backed catalogs are re-read on every call.
pub struct CatalogStore {
    source: CatalogSource,
}

impl CatalogStore {
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self { source: CatalogSource::File(path.into()) }
    }

    pub fn from_products(products: Vec<Product>) -> Self {
        Self { source: CatalogSource::Fixed(products) }
    }

    /// Missing or unreadable catalogs come back empty.
    pub async fn load(&self) -> Vec<Product> {
        match &self.source {
            CatalogSource::Fixed(products) => products.clone(),
            CatalogSource::File(path) =>
                match read_json_collection(path).await {
                    Ok(products) => products,
                    Err(e) => {
                        warn!("Catalog not loaded, using empty catalog: {}", e);
                        Vec::new()
                    }
                }
        }
    }
}
