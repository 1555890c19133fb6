//! Terminal location source. Asks the operator to type the reading from their device.
//!
//! inquire is blocking, so prompts run on the blocking pool.

use crate::domain::{Coordinate, LocationError};
use crate::ports::{LocationPort, LocationRequest};
use inquire::validator::Validation;
use inquire::{CustomType, InquireError};

pub struct PromptLocationSource;

impl PromptLocationSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PromptLocationSource {
    fn default() -> Self {
        Self::new()
    }
}

fn map_inquire(e: InquireError) -> LocationError {
    match e {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => {
            LocationError::PermissionDenied("User denied location access.".into())
        }
        InquireError::NotTTY => LocationError::Unsupported,
        other => LocationError::Unavailable(other.to_string()),
    }
}

fn ask(label: &str, limit: f64) -> Result<f64, LocationError> {
    CustomType::<f64>::new(label)
        .with_help_message("Decimal degrees, e.g. -23.6675")
        .with_error_message("Enter a decimal number")
        .with_validator(move |v: &f64| {
            if v.is_finite() && (-limit..=limit).contains(v) {
                Ok(Validation::Valid)
            } else {
                Ok(Validation::Invalid(
                    format!("Must be between -{} and {}", limit, limit).into(),
                ))
            }
        })
        .prompt()
        .map_err(map_inquire)
}

#[async_trait::async_trait]
impl LocationPort for PromptLocationSource {
    async fn current_position(
        &self,
        _request: &LocationRequest,
    ) -> Result<Coordinate, LocationError> {
        tokio::task::spawn_blocking(|| {
            let latitude = ask("Latitude:", 90.0)?;
            let longitude = ask("Longitude:", 180.0)?;
            Ok(Coordinate::new(latitude, longitude))
        })
        .await
        .map_err(|e| LocationError::Unavailable(format!("location prompt failed: {}", e)))?
    }

    fn is_interactive(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_maps_to_permission_denied() {
        assert!(matches!(
            map_inquire(InquireError::OperationCanceled),
            LocationError::PermissionDenied(_)
        ));
        assert_eq!(map_inquire(InquireError::NotTTY), LocationError::Unsupported);
    }

    #[test]
    fn operator_input_is_interactive() {
        assert!(PromptLocationSource::new().is_interactive());
    }
}
