//! Domain entities. Pure data structures for the core business.
//!
//! No storage/UI types here; adapters map documents and prompts into these.

use super::errors::{DomainError, FieldError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document store collection holding check-in log entries.
pub const LOGS_COLLECTION: &str = "logs";
/// Document store collection holding the driver roster.
pub const DRIVERS_COLLECTION: &str = "drivers";

/// Outcome recorded for a check-in attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckInStatus {
    Success,
    Failed,
    Error,
}

impl std::fmt::Display for CheckInStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CheckInStatus::Success => "success",
            CheckInStatus::Failed => "failed",
            CheckInStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Check-in form as submitted by a team member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInRequest {
    pub name: String,
    pub employee_id: String,
}

impl CheckInRequest {
    pub fn new(name: impl Into<String>, employee_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            employee_id: employee_id.into(),
        }
    }

    /// Trim fields and check the form rules. Returns the normalized request.
    pub fn validated(&self) -> Result<Self, DomainError> {
        let name = self.name.trim().to_string();
        let employee_id = self.employee_id.trim().to_string();
        let mut errors = Vec::new();
        if name.chars().count() < 2 {
            errors.push(FieldError::new("name", "Name must be at least 2 characters."));
        }
        if employee_id.is_empty() {
            errors.push(FieldError::new("employee_id", "Employee ID is required."));
        }
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }
        Ok(Self { name, employee_id })
    }
}

/// Log entry payload as written by the check-in flow. The timestamp is assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLogEntry {
    pub name: String,
    pub employee_id: String,
    pub status: CheckInStatus,
    pub details: String,
}

/// A stored check-in log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub name: String,
    pub employee_id: String,
    pub status: CheckInStatus,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

/// Driver form fields (everything but the document id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverInput {
    pub name: String,
    pub employee_id: String,
    pub vehicle: String,
    pub plate: String,
}

/// Brazilian plates (old and Mercosul layout) are 7 characters.
pub const PLATE_LEN: usize = 7;

impl DriverInput {
    /// Trim fields, upper-case the plate, and check the form rules.
    pub fn validated(&self) -> Result<Self, DomainError> {
        let name = self.name.trim().to_string();
        let employee_id = self.employee_id.trim().to_string();
        let vehicle = self.vehicle.trim().to_string();
        let plate = self.plate.trim().to_uppercase();

        let mut errors = Vec::new();
        if name.chars().count() < 2 {
            errors.push(FieldError::new("name", "Name must be at least 2 characters."));
        }
        if employee_id.is_empty() {
            errors.push(FieldError::new("employee_id", "Employee ID is required."));
        }
        if vehicle.chars().count() < 2 {
            errors.push(FieldError::new("vehicle", "Vehicle is required."));
        }
        if plate.chars().count() != PLATE_LEN {
            errors.push(FieldError::new(
                "plate",
                format!("Plate must have {} characters.", PLATE_LEN),
            ));
        }
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }
        Ok(Self {
            name,
            employee_id,
            vehicle,
            plate,
        })
    }
}

/// A roster entry. `id` is the store document id, not the employee id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub id: String,
    pub name: String,
    pub employee_id: String,
    pub vehicle: String,
    pub plate: String,
}

impl Driver {
    pub fn input(&self) -> DriverInput {
        DriverInput {
            name: self.name.clone(),
            employee_id: self.employee_id.clone(),
            vehicle: self.vehicle.clone(),
            plate: self.plate.clone(),
        }
    }
}

/// Identity handed out by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Destructive,
}

/// A user-facing message (toast). One per terminal check-in outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: Option<String>,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            title: title.into(),
            description,
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Destructive,
            title: title.into(),
            description: Some(description.into()),
        }
    }
}
