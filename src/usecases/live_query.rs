//! Live query: a snapshot of a collection, then a fresh snapshot after every write to it.
//!
//! Runs as a tokio task per subscriber. Dropping the [`Subscription`] (or calling
//! `unsubscribe`) stops the task.

use crate::domain::DomainError;
use crate::ports::{Document, DocumentStore, Query};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const SNAPSHOT_BUFFER: usize = 8;

pub type Snapshot<T> = Result<Vec<T>, DomainError>;

/// Handle to a running live query. Yields snapshots in commit order.
pub struct Subscription<T> {
    rx: mpsc::Receiver<Snapshot<T>>,
    task: JoinHandle<()>,
}

impl<T> Subscription<T> {
    /// Next snapshot. `None` once the store has shut down.
    pub async fn next(&mut self) -> Option<Snapshot<T>> {
        self.rx.recv().await
    }

    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start a live query over `store`. `map` turns each document into the caller's type;
/// a mapping failure turns the whole snapshot into an error.
pub fn spawn<T, F>(store: Arc<dyn DocumentStore>, query: Query, map: F) -> Subscription<T>
where
    T: Send + 'static,
    F: Fn(Document) -> Result<T, DomainError> + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);
    // Subscribe before the first read so no write between read and wait is missed.
    let mut changes = store.changes();

    let task = tokio::spawn(async move {
        loop {
            let snapshot = match store.query(&query).await {
                Ok(docs) => docs.into_iter().map(&map).collect::<Result<Vec<T>, _>>(),
                Err(e) => {
                    warn!(collection = %query.collection, error = %e, "live query read failed");
                    Err(e)
                }
            };
            if tx.send(snapshot).await.is_err() {
                break;
            }

            loop {
                tokio::select! {
                    _ = tx.closed() => return,
                    event = changes.recv() => match event {
                        Ok(collection) if collection == query.collection => break,
                        Ok(_) => continue,
                        // Missed notifications: re-read to catch up.
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(skipped, "live query lagged; re-reading");
                            break;
                        }
                        Err(RecvError::Closed) => return,
                    },
                }
            }
        }
        debug!(collection = %query.collection, "live query stopped");
    });

    Subscription { rx, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::MemoryDocumentStore;
    use crate::ports::{Fields, SortDirection, TIMESTAMP_FIELD};
    use std::time::Duration;

    fn ids(doc: Document) -> Result<String, DomainError> {
        Ok(doc.id)
    }

    #[tokio::test]
    async fn initial_snapshot_then_updates() {
        let store = Arc::new(MemoryDocumentStore::new());
        let first = store.create("logs", Fields::new()).await.unwrap();

        let query = Query::new("logs", TIMESTAMP_FIELD, SortDirection::Descending);
        let mut sub = spawn(store.clone(), query, ids);
        assert_eq!(sub.next().await.unwrap().unwrap(), vec![first.id.clone()]);

        // Writes elsewhere do not wake the subscriber.
        store.create("drivers", Fields::new()).await.unwrap();
        let second = store.create("logs", Fields::new()).await.unwrap();
        let snap = tokio::time::timeout(Duration::from_secs(2), sub.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(snap, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn mapping_error_is_delivered() {
        let store = Arc::new(MemoryDocumentStore::new());
        store.create("logs", Fields::new()).await.unwrap();
        let query = Query::new("logs", TIMESTAMP_FIELD, SortDirection::Ascending);
        let mut sub = spawn(store, query, |_doc| -> Result<(), DomainError> {
            Err(DomainError::Store("bad".into()))
        });
        assert!(sub.next().await.unwrap().is_err());
    }

    #[tokio::test]
    async fn unsubscribe_stops_the_task() {
        let store = Arc::new(MemoryDocumentStore::new());
        let query = Query::new("logs", TIMESTAMP_FIELD, SortDirection::Ascending);
        let mut sub = spawn(store.clone(), query, ids);
        sub.next().await.unwrap().unwrap();
        let task = sub.task.abort_handle();
        sub.unsubscribe();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(task.is_finished());
        // Writes after unsubscribe still succeed.
        store.create("logs", Fields::new()).await.unwrap();
    }
}
