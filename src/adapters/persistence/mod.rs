//! Document store adapters. Implement the DocumentStore port.

pub mod memory_store;
pub mod sqlite_store;

pub use memory_store::MemoryDocumentStore;
pub use sqlite_store::SqliteDocumentStore;

use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Store-assigned document id (UUID v4, hyphenless).
pub(crate) fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Creation timestamps at microsecond precision, strictly increasing per store,
/// so ordering by `timestamp` matches insertion order.
#[derive(Debug, Default)]
pub(crate) struct MonotonicClock {
    last_micros: Mutex<i64>,
}

impl MonotonicClock {
    pub(crate) fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_micros();
        let micros = match self.last_micros.lock() {
            Ok(mut last) => {
                let next = wall.max(*last + 1);
                *last = next;
                next
            }
            Err(_) => wall,
        };
        DateTime::<Utc>::from_timestamp_micros(micros).unwrap_or_else(Utc::now)
    }
}
