//! Admin and public operations, one module per collection.
//!
//! Every operation re-reads its collection, edits a fresh copy and writes the
//! whole collection back. Nothing is cached between calls, so two tabs writing
//! the same collection back to back can lose one update (last write wins).

pub mod concerns;
pub mod inventory;
pub mod notifications;
pub mod quotations;
pub mod reports;
pub mod sales;
pub mod session;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{AdminCredentials, AppConfig, SaleMatching};
use crate::models::Record;
use crate::store::{Collection, Store};

#[derive(Debug, Clone)]
pub struct Repository {
    store: Arc<Store>,
    sale_matching: SaleMatching,
    credentials: AdminCredentials,
}

impl Repository {
    pub fn new(store: Arc<Store>) -> Self {
        Repository {
            store,
            sale_matching: SaleMatching::default(),
            credentials: AdminCredentials::default(),
        }
    }

    pub fn from_config(store: Arc<Store>, config: &AppConfig) -> Self {
        Repository {
            store,
            sale_matching: config.sale_matching,
            credentials: config.credentials(),
        }
    }

    pub fn with_sale_matching(mut self, sale_matching: SaleMatching) -> Self {
        self.sale_matching = sale_matching;
        self
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    fn append<T>(&self, collection: Collection, record: T)
    where
        T: Serialize + DeserializeOwned,
    {
        let mut records: Vec<T> = self.store.read(collection);
        records.push(record);
        self.store.write(collection, &records);
    }

    /// Applies `edit` to the first record with `id`. Unknown ids write nothing.
    fn update_record<T>(&self, collection: Collection, id: &str, edit: impl FnOnce(&mut T)) -> bool
    where
        T: Record + Serialize + DeserializeOwned,
    {
        let mut records: Vec<T> = self.store.read(collection);

        let Some(record) = records.iter_mut().find(|r| r.id() == id) else {
            return false;
        };
        edit(record);

        self.store.write(collection, &records);
        true
    }
}

fn matches_term(haystack: &str, term: &str) -> bool {
    haystack.to_lowercase().contains(&term.to_lowercase())
}
