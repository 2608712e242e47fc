use chrono::Utc;

use super::{matches_term, Repository};
use crate::models::{InventoryItem, NewInventoryItem};
use crate::store::Collection;

impl Repository {
    pub fn inventory(&self) -> Vec<InventoryItem> {
        self.store.read(Collection::Inventory)
    }

    pub fn add_inventory_item(&self, item: InventoryItem) {
        self.append(Collection::Inventory, item);
    }

    /// "Add Item" form. `None` when name or category is blank.
    pub fn create_inventory_item(&self, input: NewInventoryItem) -> Option<InventoryItem> {
        let item = input.build(Utc::now())?;
        self.add_inventory_item(item.clone());
        Some(item)
    }

    /// Replaces the record with the same id and stamps `last_updated`.
    pub fn update_inventory_item(&self, item: InventoryItem) -> bool {
        let id = item.id.clone();
        self.update_record(Collection::Inventory, &id, |existing: &mut InventoryItem| {
            *existing = InventoryItem {
                last_updated: Utc::now(),
                ..item
            };
        })
    }

    pub fn delete_inventory_item(&self, id: &str) -> bool {
        let mut items = self.inventory();
        let before = items.len();
        items.retain(|i| i.id != id);

        if items.len() == before {
            return false;
        }

        self.store.write(Collection::Inventory, &items);
        true
    }

    /// Case-insensitive match on name or category.
    pub fn search_inventory(&self, term: &str) -> Vec<InventoryItem> {
        self.inventory()
            .into_iter()
            .filter(|i| matches_term(&i.name, term) || matches_term(&i.category, term))
            .collect()
    }

    /// Items at or below their threshold, lowest quantity first.
    pub fn low_stock(&self) -> Vec<InventoryItem> {
        let mut items: Vec<InventoryItem> = self
            .inventory()
            .into_iter()
            .filter(InventoryItem::is_low_stock)
            .collect();
        items.sort_by_key(|i| i.quantity);
        items
    }
}
