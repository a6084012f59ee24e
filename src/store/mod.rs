use std::collections::HashMap;

use crate::{
    error::AppResult,
    models::{Category, Product, ProductView, ResetCode, User},
    storage::{self, Storage, keys},
};

pub mod credentials;
pub mod entities;
pub mod session;

pub use credentials::{CredentialPolicy, CredentialStore, NewUser};
pub use entities::{EntityCache, NewProduct, ProductChanges, ProductFilter, ProductOrder};
pub use session::{Identity, Session};

/// The authoritative record set: accounts plus the category/product cache.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub credentials: CredentialStore,
    pub entities: EntityCache,
}

impl Catalog {
    pub fn new(policy: CredentialPolicy) -> Self {
        Self {
            credentials: CredentialStore::new(policy),
            entities: EntityCache::new(),
        }
    }

    pub async fn load(storage: &dyn Storage, policy: CredentialPolicy) -> AppResult<Self> {
        let users: Vec<User> = storage::load(storage, keys::USERS).await?.unwrap_or_default();
        let reset_codes: HashMap<String, ResetCode> = storage::load(storage, keys::OTP_STORE)
            .await?
            .unwrap_or_default();
        let categories: Vec<Category> = storage::load(storage, keys::CATEGORIES)
            .await?
            .unwrap_or_default();
        let products: Vec<Product> = storage::load(storage, keys::PRODUCTS)
            .await?
            .unwrap_or_default();

        Ok(Self {
            credentials: CredentialStore::from_records(policy, users, reset_codes),
            entities: EntityCache::from_records(categories, products),
        })
    }

    pub fn product_view(&self, product: &Product) -> ProductView {
        self.entities.view(product, &self.credentials)
    }
}

pub async fn save_credentials(storage: &dyn Storage, credentials: &CredentialStore) -> AppResult<()> {
    storage
        .put_many(vec![
            storage::entry(keys::USERS, credentials.users())?,
            storage::entry(keys::OTP_STORE, credentials.reset_codes())?,
        ])
        .await
}

pub async fn save_entities(storage: &dyn Storage, entities: &EntityCache) -> AppResult<()> {
    storage
        .put_many(vec![
            storage::entry(keys::CATEGORIES, entities.list_categories())?,
            storage::entry(keys::PRODUCTS, entities.products())?,
        ])
        .await
}
