//! Admin dashboard: check-in activity log, newest first.

use crate::domain::{AccessPolicy, DomainError, LOGS_COLLECTION, LogEntry, NewLogEntry, User};
use crate::ports::{Document, DocumentStore, Query, SortDirection, TIMESTAMP_FIELD};
use crate::usecases::live_query::{self, Subscription};
use std::sync::Arc;
use tracing::info;

fn log_entry_from(doc: Document) -> Result<LogEntry, DomainError> {
    let entry: NewLogEntry = doc.decode()?;
    Ok(LogEntry {
        id: doc.id,
        name: entry.name,
        employee_id: entry.employee_id,
        status: entry.status,
        details: entry.details,
        timestamp: doc.created_at,
    })
}

fn newest_first() -> Query {
    Query::new(LOGS_COLLECTION, TIMESTAMP_FIELD, SortDirection::Descending)
}

pub struct ActivityLogService {
    store: Arc<dyn DocumentStore>,
    policy: AccessPolicy,
}

impl ActivityLogService {
    pub fn new(store: Arc<dyn DocumentStore>, policy: AccessPolicy) -> Self {
        Self { store, policy }
    }

    /// Live view of the log. Any signed-in user may watch.
    pub fn watch(&self, user: Option<&User>) -> Result<Subscription<LogEntry>, DomainError> {
        self.policy.require_signed_in(user)?;
        Ok(live_query::spawn(
            Arc::clone(&self.store),
            newest_first(),
            log_entry_from,
        ))
    }

    /// Latest `limit` entries, newest first.
    pub async fn recent(
        &self,
        user: Option<&User>,
        limit: usize,
    ) -> Result<Vec<LogEntry>, DomainError> {
        self.policy.require_signed_in(user)?;
        self.store
            .query(&newest_first().with_limit(limit))
            .await?
            .into_iter()
            .map(log_entry_from)
            .collect()
    }

    /// Remove an entry. Admins only.
    pub async fn delete(&self, user: Option<&User>, id: &str) -> Result<(), DomainError> {
        let admin = self.policy.require_admin(user)?;
        self.store.delete(LOGS_COLLECTION, id).await?;
        info!(id, by = %admin.uid, "log entry deleted");
        Ok(())
    }
}
