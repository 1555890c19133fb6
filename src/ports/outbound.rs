//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{Coordinate, DomainError, LocationError, User};
use std::time::Duration;

/// Options for a single location reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationRequest {
    /// Ask the source for its most precise fix (GNSS over network positioning).
    pub high_accuracy: bool,
    /// How long the caller is willing to wait for a reading.
    pub timeout: Duration,
    /// Oldest cached reading the source may return. Zero means always fresh.
    pub maximum_age: Duration,
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::ZERO,
        }
    }
}

/// Location source. One request, one resolution.
#[async_trait::async_trait]
pub trait LocationPort: Send + Sync {
    /// Obtain the device's current position.
    ///
    /// # Errors
    /// `PermissionDenied` when the user refuses, `Timeout` when no fix arrives in time,
    /// `Unavailable` for anything else the source reports.
    async fn current_position(&self, request: &LocationRequest)
    -> Result<Coordinate, LocationError>;

    /// True when a person supplies the reading. `LocationRequest::timeout` then
    /// does not apply, since it would measure typing speed.
    fn is_interactive(&self) -> bool {
        false
    }
}

/// Identity provider. Sign-in flow details are the adapter's business.
#[async_trait::async_trait]
pub trait IdentityPort: Send + Sync {
    /// Run the sign-in flow and return the signed-in user.
    async fn sign_in(&self) -> Result<User, DomainError>;

    async fn sign_out(&self) -> Result<(), DomainError>;

    /// Currently signed-in user, if any.
    async fn current_user(&self) -> Option<User>;
}
