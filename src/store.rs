//! Typed collections over a [`StorageArea`].
//!
//! Each collection lives under one key as a JSON array and is always written
//! whole. [`Store::read`] and [`Store::write`] never fail: decode and write
//! errors are logged and the caller sees an empty collection or a `false`.
//! The `try_` variants surface the error instead.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::bridge::{Broadcaster, ChangeListener, DbUpdate, Subscription};
use crate::error::Result;
use crate::models::{
    Concern, ConcernStatus, InventoryItem, LineItem, Quotation, QuotationStatus, ReadState,
};
use crate::storage::{StorageArea, TabId};

pub const DEFAULT_KEY_PREFIX: &str = "eps_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Inventory,
    Quotations,
    Concerns,
    Sales,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Inventory,
        Collection::Quotations,
        Collection::Concerns,
        Collection::Sales,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Inventory => "inventory",
            Collection::Quotations => "quotations",
            Collection::Concerns => "concerns",
            Collection::Sales => "sales",
        }
    }

    pub fn key(self, prefix: &str) -> String {
        format!("{prefix}{}", self.name())
    }
}

pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Namespace shared by the four collection keys.
    pub key_prefix: String,
    /// Fallback refresh period for [`ChangeListener`]s, never shorter than
    /// [`MIN_POLL_INTERVAL`].
    pub poll_interval: Duration,
    /// Populate absent collections on open.
    pub seed: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            poll_interval: Duration::from_secs(5),
            seed: true,
        }
    }
}

pub struct Store {
    area: StorageArea,
    tab: TabId,
    options: StoreOptions,
    updates: Broadcaster<DbUpdate>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("tab", &self.tab)
            .field("key_prefix", &self.options.key_prefix)
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Opens a new tab over `area`, seeding absent collections if asked to.
    pub fn open(area: StorageArea, options: StoreOptions) -> Self {
        let store = Store {
            area,
            tab: TabId::new(),
            options,
            updates: Broadcaster::new(),
        };

        if store.options.seed {
            store.ensure_seeded();
        }

        debug!(
            tab = %store.tab,
            inventory = store.read::<InventoryItem>(Collection::Inventory).len(),
            quotations = store.read::<Quotation>(Collection::Quotations).len(),
            concerns = store.read::<Concern>(Collection::Concerns).len(),
            "store initialized"
        );

        store
    }

    pub fn tab(&self) -> TabId {
        self.tab
    }

    pub fn key(&self, collection: Collection) -> String {
        collection.key(&self.options.key_prefix)
    }

    pub fn try_read<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
        match self.area.get(&self.key(collection))? {
            Some(raw) if !raw.is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }

    /// Empty when the entry is absent or unreadable.
    pub fn read<T: DeserializeOwned>(&self, collection: Collection) -> Vec<T> {
        self.try_read(collection).unwrap_or_else(|err| {
            warn!(key = %self.key(collection), error = %err, "error reading collection");
            Vec::new()
        })
    }

    /// Overwrites the whole collection, then raises one [`DbUpdate`].
    pub fn try_write<T: Serialize>(&self, collection: Collection, records: &[T]) -> Result<()> {
        let key = self.key(collection);
        let raw = serde_json::to_string(records)?;
        self.area.set(self.tab, &key, &raw)?;
        debug!(key = %key, records = records.len(), "collection written");
        self.updates.publish(DbUpdate);
        Ok(())
    }

    /// Returns whether the write reached storage.
    pub fn write<T: Serialize>(&self, collection: Collection, records: &[T]) -> bool {
        match self.try_write(collection, records) {
            Ok(()) => true,
            Err(err) => {
                error!(key = %self.key(collection), error = %err, "error saving collection");
                false
            }
        }
    }

    /// Present and non-empty in storage. Read errors count as absent.
    pub fn contains(&self, collection: Collection) -> bool {
        matches!(self.area.get(&self.key(collection)), Ok(Some(raw)) if !raw.is_empty())
    }

    /// Writes the demo dataset into whichever of inventory, quotations and
    /// concerns is absent. Sales always start empty.
    pub fn ensure_seeded(&self) {
        let now = Utc::now();

        if !self.contains(Collection::Inventory) {
            debug!("seeding inventory");
            self.write(Collection::Inventory, &seed_inventory(now));
        }
        if !self.contains(Collection::Quotations) {
            debug!("seeding quotations");
            self.write(Collection::Quotations, &seed_quotations(now));
        }
        if !self.contains(Collection::Concerns) {
            debug!("seeding concerns");
            self.write(Collection::Concerns, &seed_concerns(now));
        }
    }

    /// Raw access for entries outside the collection namespace. No [`DbUpdate`] is raised.
    pub fn get_entry(&self, key: &str) -> Result<Option<String>> {
        self.area.get(key)
    }

    pub fn set_entry(&self, key: &str, value: &str) -> Result<()> {
        self.area.set(self.tab, key, value)
    }

    pub fn remove_entry(&self, key: &str) -> Result<()> {
        self.area.remove(self.tab, key)
    }

    /// In-page signal only; see [`listen`](Self::listen) for the full set.
    pub fn subscribe(&self) -> Subscription<DbUpdate> {
        self.updates.subscribe()
    }

    pub fn listen(&self) -> ChangeListener {
        ChangeListener::new(
            self.tab,
            self.options.key_prefix.clone(),
            self.updates.subscribe(),
            self.area.subscribe(),
            self.options.poll_interval.max(MIN_POLL_INTERVAL),
        )
    }
}

fn seed_inventory(now: DateTime<Utc>) -> Vec<InventoryItem> {
    let item = |id: &str, name: &str, category: &str, quantity: i64, unit_price: f64, threshold: i64| InventoryItem {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        quantity,
        unit_price,
        threshold,
        last_updated: now,
    };

    vec![
        item("1", "Glossy Paper A4", "Paper", 500, 0.50, 100),
        item("2", "Matte Paper A4", "Paper", 300, 0.55, 50),
        item("3", "Epson Ink Black", "Ink", 20, 15.00, 5),
    ]
}

fn seed_quotations(now: DateTime<Utc>) -> Vec<Quotation> {
    vec![Quotation {
        id: "q1".to_string(),
        customer_name: "John Doe".to_string(),
        customer_email: "john@example.com".to_string(),
        items: vec![LineItem::named("Glossy Paper A4", 100, 50.0)],
        total_amount: 50.0,
        status: QuotationStatus::Pending,
        created_at: now,
        read: ReadState::Unread,
    }]
}

fn seed_concerns(now: DateTime<Utc>) -> Vec<Concern> {
    vec![Concern {
        id: "c1".to_string(),
        customer_name: "Jane Smith".to_string(),
        email: "jane@example.com".to_string(),
        subject: "Inquiry".to_string(),
        message: "I need help with my order.".to_string(),
        status: ConcernStatus::Open,
        created_at: now,
        read: ReadState::Unread,
    }]
}
