//! Inbound port. UI (adapter) calls into the application.

use crate::domain::DomainError;

/// Input port: UI/CLI drives the application use cases.
#[async_trait::async_trait]
pub trait InputPort: Send + Sync {
    /// Run the interactive session (check-in form, admin views). Returns when the user exits.
    async fn run(&self) -> Result<(), DomainError>;
}
