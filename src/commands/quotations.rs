use chrono::Utc;
use tracing::info;

use super::{matches_term, Repository};
use crate::models::{
    LineItem, NewQuotation, PaymentMethod, Quotation, QuotationStatus, ReadState, Sale,
};
use crate::store::Collection;

impl Repository {
    pub fn quotations(&self) -> Vec<Quotation> {
        self.store.read(Collection::Quotations)
    }

    pub fn add_quotation(&self, quotation: Quotation) {
        self.append(Collection::Quotations, quotation);
    }

    /// Public quote form: a PENDING quotation for the requested service.
    pub fn submit_quotation(&self, input: NewQuotation) -> Option<Quotation> {
        let quotation = input.build(Utc::now())?;
        info!(id = %quotation.id, customer = %quotation.customer_name, "quotation submitted");
        self.add_quotation(quotation.clone());
        Some(quotation)
    }

    /// Case-insensitive match on customer name or email, optionally narrowed
    /// to one status. An empty term matches everything.
    pub fn search_quotations(&self, term: &str, status: Option<QuotationStatus>) -> Vec<Quotation> {
        self.quotations()
            .into_iter()
            .filter(|q| status.map_or(true, |status| q.status == status))
            .filter(|q| matches_term(&q.customer_name, term) || matches_term(&q.customer_email, term))
            .collect()
    }

    /// Returns false, writing nothing, when `id` is unknown.
    pub fn update_quotation_status(&self, id: &str, status: QuotationStatus) -> bool {
        self.update_record(Collection::Quotations, id, |q: &mut Quotation| q.status = status)
    }

    pub fn mark_quotation_read(&self, id: &str) -> bool {
        self.update_record(Collection::Quotations, id, |q: &mut Quotation| q.read = ReadState::Read)
    }

    /// Records a sale for the quotation's line items, then marks it APPROVED.
    ///
    /// Refused for unknown or REJECTED quotations. A zero quotation total is
    /// replaced by the sum of its line subtotals.
    pub fn convert_quotation_to_sale(&self, id: &str, payment_method: PaymentMethod) -> Option<Sale> {
        let quotation = self
            .quotations()
            .into_iter()
            .find(|q| q.id == id && q.status != QuotationStatus::Rejected)?;

        let total_amount = if quotation.total_amount != 0.0 {
            quotation.total_amount
        } else {
            quotation.items.iter().map(LineItem::subtotal).sum()
        };

        let sale = Sale {
            id: uuid::Uuid::new_v4().to_string(),
            customer_name: quotation.customer_name,
            items: quotation.items,
            total_amount,
            date: Utc::now(),
            payment_method,
        };

        self.record_sale(sale.clone());
        self.update_quotation_status(id, QuotationStatus::Approved);
        info!(quotation = %id, sale = %sale.id, "quotation converted to sale");

        Some(sale)
    }
}
