use chrono::Utc;
use tracing::{debug, info};

use super::{matches_term, Repository};
use crate::config::SaleMatching;
use crate::models::{InventoryItem, LineItem, NewSale, Sale, SaleReconciliation};
use crate::store::Collection;

impl Repository {
    pub fn sales(&self) -> Vec<Sale> {
        self.store.read(Collection::Sales)
    }

    /// Direct admin sale. `None` when it has no line items.
    pub fn create_sale(&self, input: NewSale) -> Option<(Sale, SaleReconciliation)> {
        let sale = input.build(Utc::now())?;
        let reconciliation = self.record_sale(sale.clone());
        Some((sale, reconciliation))
    }

    /// Appends `sale`, then deducts each line's quantity from the matching
    /// inventory item.
    ///
    /// The sale is written before inventory is touched, so a line that matches
    /// nothing (or a failed inventory write) costs stock accuracy but never the
    /// sale itself. Stock may go negative. Inventory is written once, after all
    /// lines are processed.
    pub fn record_sale(&self, sale: Sale) -> SaleReconciliation {
        let mut sales = self.sales();
        sales.push(sale.clone());
        let recorded = self.store.write(Collection::Sales, &sales);

        let mut inventory = self.inventory();
        let now = Utc::now();
        let mut reconciliation = SaleReconciliation {
            recorded,
            ..SaleReconciliation::default()
        };

        for line in &sale.items {
            match find_stock(&mut inventory, line, self.sale_matching) {
                Some(item) => {
                    item.quantity -= line.quantity;
                    item.last_updated = now;
                    reconciliation.matched_lines += 1;
                }
                None => {
                    debug!(item = %line.item_name, sale = %sale.id, "no inventory match for sale line");
                    reconciliation.unmatched_items.push(line.item_name.clone());
                }
            }
        }

        reconciliation.inventory_adjusted = self.store.write(Collection::Inventory, &inventory);

        info!(
            sale = %sale.id,
            total = sale.total_amount,
            inventory_adjusted = reconciliation.inventory_adjusted,
            matched = reconciliation.matched_lines,
            unmatched = reconciliation.unmatched_items.len(),
            "sale recorded"
        );

        reconciliation
    }

    /// Case-insensitive match on customer name or sale id.
    pub fn search_sales(&self, term: &str) -> Vec<Sale> {
        self.sales()
            .into_iter()
            .filter(|s| matches_term(&s.customer_name, term) || matches_term(&s.id, term))
            .collect()
    }
}

/// First match wins.
fn find_stock<'a>(
    inventory: &'a mut [InventoryItem],
    line: &LineItem,
    matching: SaleMatching,
) -> Option<&'a mut InventoryItem> {
    match (&line.item_id, matching) {
        (Some(id), SaleMatching::IdOrName) => inventory.iter_mut().find(|i| &i.id == id),
        _ => inventory.iter_mut().find(|i| i.name == line.item_name),
    }
}
