use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use khata_core::{ProductId, ProductRecord, WebsiteId};

use crate::StoreError;

/// Website-isolated access to the product catalog snapshot.
///
/// The catalog itself is owned elsewhere; this store holds the snapshot the
/// inventory core reads, and the `on_hand` counter it maintains.
pub trait ProductStore: Send + Sync {
    fn get(&self, website_id: WebsiteId, product_id: &ProductId)
        -> Result<Option<ProductRecord>, StoreError>;
    fn upsert(&self, website_id: WebsiteId, product: ProductRecord) -> Result<(), StoreError>;
    fn list(&self, website_id: WebsiteId) -> Result<Vec<ProductRecord>, StoreError>;
    /// Clear all products for a website (rebuild/test support).
    fn clear_website(&self, website_id: WebsiteId) -> Result<(), StoreError>;
}

impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    fn get(
        &self,
        website_id: WebsiteId,
        product_id: &ProductId,
    ) -> Result<Option<ProductRecord>, StoreError> {
        (**self).get(website_id, product_id)
    }

    fn upsert(&self, website_id: WebsiteId, product: ProductRecord) -> Result<(), StoreError> {
        (**self).upsert(website_id, product)
    }

    fn list(&self, website_id: WebsiteId) -> Result<Vec<ProductRecord>, StoreError> {
        (**self).list(website_id)
    }

    fn clear_website(&self, website_id: WebsiteId) -> Result<(), StoreError> {
        (**self).clear_website(website_id)
    }
}

/// In-memory product store for dev/test.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    inner: RwLock<HashMap<(WebsiteId, ProductId), ProductRecord>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProductStore for InMemoryProductStore {
    fn get(
        &self,
        website_id: WebsiteId,
        product_id: &ProductId,
    ) -> Result<Option<ProductRecord>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(map.get(&(website_id, *product_id)).cloned())
    }

    fn upsert(&self, website_id: WebsiteId, product: ProductRecord) -> Result<(), StoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        map.insert((website_id, product.id), product);
        Ok(())
    }

    fn list(&self, website_id: WebsiteId) -> Result<Vec<ProductRecord>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        let mut products: Vec<ProductRecord> = map
            .iter()
            .filter_map(|((w, _), p)| (*w == website_id).then(|| p.clone()))
            .collect();
        // Deterministic iteration order for callers that fan out per product.
        products.sort_by_key(|p| *p.id.as_uuid());
        Ok(products)
    }

    fn clear_website(&self, website_id: WebsiteId) -> Result<(), StoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        map.retain(|(w, _), _| *w != website_id);
        Ok(())
    }
}
