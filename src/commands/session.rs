//! Logged-in admin marker, kept outside the collection namespace.

use tracing::{info, warn};

use super::Repository;

pub const SESSION_KEY: &str = "adminUser";

impl Repository {
    /// Checks the configured credentials and records the admin on success.
    pub fn login(&self, username: &str, password: &str) -> bool {
        if username != self.credentials.username || password != self.credentials.password {
            warn!(username, "rejected admin login");
            return false;
        }

        if let Err(err) = self.store.set_entry(SESSION_KEY, username) {
            warn!(error = %err, "could not persist admin session");
        }
        info!(username, "admin logged in");
        true
    }

    pub fn logout(&self) {
        if let Err(err) = self.store.remove_entry(SESSION_KEY) {
            warn!(error = %err, "could not clear admin session");
        }
    }

    pub fn current_admin(&self) -> Option<String> {
        match self.store.get_entry(SESSION_KEY) {
            Ok(user) => user.filter(|u| !u.is_empty()),
            Err(err) => {
                warn!(error = %err, "could not read admin session");
                None
            }
        }
    }
}
