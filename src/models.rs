use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Anything stored in a collection and addressed by its opaque id.
pub trait Record {
    fn id(&self) -> &str;
}

/// Whether an admin has acknowledged a quotation or concern.
///
/// Persisted as the boolean `isRead`; a missing field decodes as `Unread`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum ReadState {
    #[default]
    Unread,
    Read,
}

impl ReadState {
    pub fn is_read(self) -> bool {
        self == ReadState::Read
    }
}

impl From<bool> for ReadState {
    fn from(read: bool) -> Self {
        if read {
            ReadState::Read
        } else {
            ReadState::Unread
        }
    }
}

impl From<ReadState> for bool {
    fn from(state: ReadState) -> Self {
        state.is_read()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub category: String,
    pub quantity: i64,
    pub unit_price: f64,
    /// Low stock alert threshold
    pub threshold: i64,
    pub last_updated: DateTime<Utc>,
}

impl InventoryItem {
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.threshold
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub item_name: String,
    pub quantity: i64,
    pub price: f64,
    /// Inventory id, when the line was picked from stock rather than typed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
}

impl LineItem {
    pub fn named(item_name: impl Into<String>, quantity: i64, price: f64) -> Self {
        LineItem {
            item_name: item_name.into(),
            quantity,
            price,
            item_id: None,
        }
    }

    pub fn subtotal(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuotationStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<LineItem>,
    pub total_amount: f64,
    pub status: QuotationStatus,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "isRead", default)]
    pub read: ReadState,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConcernStatus {
    Open,
    InProgress,
    Resolved,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Concern {
    pub id: String,
    pub customer_name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub status: ConcernStatus,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "isRead", default)]
    pub read: ReadState,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Gcash,
    BankTransfer,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    /// Empty for walk-in customers
    pub customer_name: String,
    pub items: Vec<LineItem>,
    pub total_amount: f64,
    pub date: DateTime<Utc>,
    pub payment_method: PaymentMethod,
}

impl Record for InventoryItem {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Quotation {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Concern {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Sale {
    fn id(&self) -> &str {
        &self.id
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn present(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Admin "Add Item" form input.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryItem {
    pub name: String,
    pub category: String,
    pub quantity: Option<i64>,
    pub unit_price: Option<f64>,
    pub threshold: Option<i64>,
}

impl NewInventoryItem {
    /// Returns `None` when name or category is blank.
    pub fn build(self, now: DateTime<Utc>) -> Option<InventoryItem> {
        if !present(&self.name) || !present(&self.category) {
            return None;
        }

        Some(InventoryItem {
            id: new_id(),
            name: self.name,
            category: self.category,
            quantity: self.quantity.unwrap_or(0),
            unit_price: self.unit_price.unwrap_or(0.0),
            threshold: self.threshold.unwrap_or(0),
            last_updated: now,
        })
    }
}

/// Public quote request form.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewQuotation {
    pub customer_name: String,
    pub customer_email: String,
    /// Requested service, recorded as a single unpriced line item.
    pub service: String,
}

impl NewQuotation {
    pub fn build(self, now: DateTime<Utc>) -> Option<Quotation> {
        if !present(&self.customer_name) || !present(&self.customer_email) || !present(&self.service) {
            return None;
        }

        Some(Quotation {
            id: new_id(),
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            items: vec![LineItem::named(self.service, 1, 0.0)],
            total_amount: 0.0,
            status: QuotationStatus::Pending,
            created_at: now,
            read: ReadState::Unread,
        })
    }
}

/// Public concern form.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewConcern {
    pub customer_name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl NewConcern {
    pub fn build(self, now: DateTime<Utc>) -> Option<Concern> {
        if !present(&self.customer_name) || !present(&self.email) || !present(&self.message) {
            return None;
        }

        Some(Concern {
            id: new_id(),
            customer_name: self.customer_name,
            email: self.email,
            subject: self.subject,
            message: self.message,
            status: ConcernStatus::Open,
            created_at: now,
            read: ReadState::Unread,
        })
    }
}

/// Direct admin sale, not originating from a quotation.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub customer_name: String,
    pub items: Vec<LineItem>,
    pub payment_method: PaymentMethod,
}

impl NewSale {
    /// Total is the sum of line subtotals. Returns `None` for an empty sale.
    pub fn build(self, now: DateTime<Utc>) -> Option<Sale> {
        if self.items.is_empty() {
            return None;
        }

        let total_amount = self.items.iter().map(LineItem::subtotal).sum();

        Some(Sale {
            id: new_id(),
            customer_name: self.customer_name,
            items: self.items,
            total_amount,
            date: now,
            payment_method: self.payment_method,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Quote,
    Concern,
    Inventory,
}

impl NotificationKind {
    pub fn prefix(self) -> &'static str {
        match self {
            NotificationKind::Quote => "q",
            NotificationKind::Concern => "c",
            NotificationKind::Inventory => "i",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "q" => Some(NotificationKind::Quote),
            "c" => Some(NotificationKind::Concern),
            "i" => Some(NotificationKind::Inventory),
            _ => None,
        }
    }

    /// Admin page that lists the underlying record.
    pub fn path(self) -> &'static str {
        match self {
            NotificationKind::Quote => "/admin/quotations",
            NotificationKind::Concern => "/admin/concerns",
            NotificationKind::Inventory => "/admin/inventory",
        }
    }
}

/// Derived alert; never persisted.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub description: String,
    pub time: DateTime<Utc>,
    pub kind: NotificationKind,
    pub path: String,
    pub read: ReadState,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub pending_quotes: usize,
    pub total_sales: f64,
    pub open_concerns: usize,
    pub low_stock_items: usize,
}

/// What `record_sale` managed to do.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SaleReconciliation {
    /// False when the sales write itself failed.
    pub recorded: bool,
    /// False when the adjusted inventory could not be persisted; the sale stands.
    pub inventory_adjusted: bool,
    pub matched_lines: usize,
    pub unmatched_items: Vec<String>,
}
