use super::Repository;
use crate::models::{ConcernStatus, DashboardStats, QuotationStatus, Sale};

impl Repository {
    pub fn dashboard_stats(&self) -> DashboardStats {
        DashboardStats {
            pending_quotes: self
                .quotations()
                .iter()
                .filter(|q| q.status == QuotationStatus::Pending)
                .count(),
            total_sales: total_revenue(&self.sales()),
            open_concerns: self
                .concerns()
                .iter()
                .filter(|c| c.status == ConcernStatus::Open)
                .count(),
            low_stock_items: self.inventory().iter().filter(|i| i.is_low_stock()).count(),
        }
    }
}

pub fn total_revenue(sales: &[Sale]) -> f64 {
    sales.iter().map(|s| s.total_amount).sum()
}
