use chrono::Utc;
use tracing::info;

use super::{matches_term, Repository};
use crate::models::{Concern, ConcernStatus, NewConcern, ReadState};
use crate::store::Collection;

impl Repository {
    pub fn concerns(&self) -> Vec<Concern> {
        self.store.read(Collection::Concerns)
    }

    pub fn add_concern(&self, concern: Concern) {
        self.append(Collection::Concerns, concern);
    }

    pub fn submit_concern(&self, input: NewConcern) -> Option<Concern> {
        let concern = input.build(Utc::now())?;
        info!(id = %concern.id, subject = %concern.subject, "concern submitted");
        self.add_concern(concern.clone());
        Some(concern)
    }

    /// Name or subject, case-insensitive.
    pub fn search_concerns(&self, term: &str, status: Option<ConcernStatus>) -> Vec<Concern> {
        self.concerns()
            .into_iter()
            .filter(|c| status.map_or(true, |status| c.status == status))
            .filter(|c| matches_term(&c.customer_name, term) || matches_term(&c.subject, term))
            .collect()
    }

    pub fn update_concern_status(&self, id: &str, status: ConcernStatus) -> bool {
        self.update_record(Collection::Concerns, id, |c: &mut Concern| c.status = status)
    }

    pub fn mark_concern_read(&self, id: &str) -> bool {
        self.update_record(Collection::Concerns, id, |c: &mut Concern| c.read = ReadState::Read)
    }
}
