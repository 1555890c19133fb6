//! Check-in flow: validate form -> acquire location -> geofence verdict -> notify -> log.
//!
//! - The user-facing outcome depends only on the location step and the geofence verdict
//! - Exactly one notification per terminal outcome
//! - The log write is best effort; its failure is reported beside the outcome, never instead of it

use crate::domain::{
    CheckInRequest, CheckInStatus, DomainError, Geofence, LOGS_COLLECTION, LocationError,
    NewLogEntry, Notification, VerificationResult,
};
use crate::ports::{DocumentStore, LocationPort, LocationRequest, to_fields};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Result of one check-in attempt.
#[derive(Debug)]
pub struct CheckInOutcome {
    pub status: CheckInStatus,
    /// Present when a reading was obtained.
    pub verdict: Option<VerificationResult>,
    pub notification: Notification,
    /// Id of the log entry, when it was written.
    pub log_id: Option<String>,
    /// Secondary error: the log entry could not be written.
    pub log_error: Option<DomainError>,
}

pub struct CheckInService {
    location: Option<Arc<dyn LocationPort>>,
    store: Arc<dyn DocumentStore>,
    geofence: Geofence,
    request: LocationRequest,
}

impl CheckInService {
    /// `location` is `None` when the device has no usable location source.
    pub fn new(
        location: Option<Arc<dyn LocationPort>>,
        store: Arc<dyn DocumentStore>,
        geofence: Geofence,
        request: LocationRequest,
    ) -> Self {
        Self {
            location,
            store,
            geofence,
            request,
        }
    }

    pub fn geofence(&self) -> Geofence {
        self.geofence
    }

    /// Run one check-in. Only form validation fails the call; every other
    /// outcome is reported in [`CheckInOutcome`].
    pub async fn check_in(&self, request: &CheckInRequest) -> Result<CheckInOutcome, DomainError> {
        let form = request.validated()?;

        let reading = match &self.location {
            None => Err(LocationError::Unsupported),
            Some(source) if source.is_interactive() => {
                source.current_position(&self.request).await
            }
            Some(source) => {
                match tokio::time::timeout(
                    self.request.timeout,
                    source.current_position(&self.request),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(LocationError::Timeout),
                }
            }
        };

        let (status, verdict, notification, details) = match reading {
            Err(e) => {
                warn!(employee_id = %form.employee_id, error = %e, "location acquisition failed");
                let message = e.to_string();
                (
                    CheckInStatus::Error,
                    None,
                    Notification::destructive("Geolocation error", message.clone()),
                    message,
                )
            }
            Ok(position) => {
                let verdict = self.geofence.verify(position.latitude, position.longitude);
                info!(
                    employee_id = %form.employee_id,
                    position = %position,
                    distance = verdict.distance,
                    in_range = verdict.is_in_range,
                    "geofence verdict"
                );
                if verdict.is_in_range {
                    (
                        CheckInStatus::Success,
                        Some(verdict),
                        Notification::info(
                            "Check-in successful!",
                            Some(format!(
                                "Welcome, {}. You are inside the designated area.",
                                form.name
                            )),
                        ),
                        format!("Checked in {:.0}m from target.", verdict.distance),
                    )
                } else {
                    (
                        CheckInStatus::Failed,
                        Some(verdict),
                        Notification::destructive(
                            "Check-in failed",
                            "You are too far from the site.",
                        ),
                        format!("User is {:.0}m away from target.", verdict.distance),
                    )
                }
            }
        };

        let entry = NewLogEntry {
            name: form.name,
            employee_id: form.employee_id,
            status,
            details,
        };
        let (log_id, log_error) = match self.write_log(&entry).await {
            Ok(id) => (Some(id), None),
            Err(e) => {
                error!(
                    employee_id = %entry.employee_id,
                    status = %status,
                    error = %e,
                    "failed to write check-in log"
                );
                (None, Some(e))
            }
        };

        Ok(CheckInOutcome {
            status,
            verdict,
            notification,
            log_id,
            log_error,
        })
    }

    async fn write_log(&self, entry: &NewLogEntry) -> Result<String, DomainError> {
        let doc = self.store.create(LOGS_COLLECTION, to_fields(entry)?).await?;
        Ok(doc.id)
    }
}
