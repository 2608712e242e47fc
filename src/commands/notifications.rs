//! Alert-center projection over quotations, concerns and inventory.

use chrono::{DateTime, Utc};

use super::Repository;
use crate::models::{
    Concern, ConcernStatus, InventoryItem, Notification, NotificationKind, Quotation,
    QuotationStatus, ReadState,
};
use crate::store::Collection;

impl Repository {
    /// Recomputed from storage on every call, newest first.
    pub fn notifications(&self) -> Vec<Notification> {
        project_notifications(&self.quotations(), &self.concerns(), &self.inventory(), Utc::now())
    }

    pub fn unread_count(&self) -> usize {
        self.notifications().iter().filter(|n| !n.read.is_read()).count()
    }

    /// Marks the record behind a notification id (`q-<id>`, `c-<id>`) read.
    /// Low-stock notifications have nothing to mark.
    pub fn open_notification(&self, notification_id: &str) -> bool {
        let Some((prefix, id)) = notification_id.split_once('-') else {
            return false;
        };

        match NotificationKind::from_prefix(prefix) {
            Some(NotificationKind::Quote) => self.mark_quotation_read(id),
            Some(NotificationKind::Concern) => self.mark_concern_read(id),
            Some(NotificationKind::Inventory) | None => false,
        }
    }

    /// Marks every unread PENDING quotation and OPEN concern read.
    ///
    /// Writes both collections only when something flipped, so a second call
    /// in a row writes nothing. Returns whether anything flipped.
    pub fn mark_all_notifications_read(&self) -> bool {
        let mut quotations = self.quotations();
        let mut concerns = self.concerns();
        let mut modified = false;

        for q in quotations
            .iter_mut()
            .filter(|q| q.status == QuotationStatus::Pending && !q.read.is_read())
        {
            q.read = ReadState::Read;
            modified = true;
        }

        for c in concerns
            .iter_mut()
            .filter(|c| c.status == ConcernStatus::Open && !c.read.is_read())
        {
            c.read = ReadState::Read;
            modified = true;
        }

        if modified {
            self.store.write(Collection::Quotations, &quotations);
            self.store.write(Collection::Concerns, &concerns);
        }

        modified
    }
}

/// Pending quotations, open concerns and low-stock items, sorted by time
/// descending. Low-stock entries are stamped `now` and are never read.
pub fn project_notifications(
    quotations: &[Quotation],
    concerns: &[Concern],
    inventory: &[InventoryItem],
    now: DateTime<Utc>,
) -> Vec<Notification> {
    let entry = |kind: NotificationKind, id: &str, title: &str, description: String, time: DateTime<Utc>, read: ReadState| Notification {
        id: format!("{}-{}", kind.prefix(), id),
        title: title.to_string(),
        description,
        time,
        kind,
        path: kind.path().to_string(),
        read,
    };

    let quotes = quotations
        .iter()
        .filter(|q| q.status == QuotationStatus::Pending)
        .map(|q| {
            let from = if q.customer_name.is_empty() { "Unknown" } else { q.customer_name.as_str() };
            entry(
                NotificationKind::Quote,
                &q.id,
                "New Service Request",
                format!("From {from}"),
                q.created_at,
                q.read,
            )
        });

    let inquiries = concerns
        .iter()
        .filter(|c| c.status == ConcernStatus::Open)
        .map(|c| {
            let subject = if c.subject.is_empty() { "No Subject" } else { c.subject.as_str() };
            entry(
                NotificationKind::Concern,
                &c.id,
                "Customer Inquiry",
                subject.to_string(),
                c.created_at,
                c.read,
            )
        });

    let low_stock = inventory.iter().filter(|i| i.is_low_stock()).map(|i| {
        entry(
            NotificationKind::Inventory,
            &i.id,
            "Low Stock Alert",
            format!("{} ({} left)", i.name, i.quantity),
            now,
            ReadState::Unread,
        )
    });

    let mut notifications: Vec<Notification> = quotes.chain(inquiries).chain(low_stock).collect();
    notifications.sort_by(|a, b| b.time.cmp(&a.time));
    notifications
}
