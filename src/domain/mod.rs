//! Core domain layer. No external I/O dependencies.
//!
//! Entities, the geofence evaluator and access rules live here. Dependencies flow inward.

pub mod access;
pub mod entities;
pub mod errors;
pub mod geofence;

pub use access::AccessPolicy;
pub use entities::{
    CheckInRequest, CheckInStatus, DRIVERS_COLLECTION, Driver, DriverInput, LOGS_COLLECTION,
    LogEntry, NewLogEntry, Notification, NotificationKind, User,
};
pub use errors::{DomainError, FieldError, LocationError};
pub use geofence::{Coordinate, Geofence, VerificationResult, haversine_distance, verify_location};
