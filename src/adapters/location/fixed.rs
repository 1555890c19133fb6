//! Fixed location source. Returns the configured coordinate for every request.

use crate::domain::{Coordinate, LocationError};
use crate::ports::{LocationPort, LocationRequest};
use tracing::debug;

/// For kiosks mounted at a known spot, and for demos.
pub struct FixedLocationSource {
    coordinate: Coordinate,
}

impl FixedLocationSource {
    pub fn new(coordinate: Coordinate) -> Self {
        Self { coordinate }
    }
}

#[async_trait::async_trait]
impl LocationPort for FixedLocationSource {
    async fn current_position(
        &self,
        _request: &LocationRequest,
    ) -> Result<Coordinate, LocationError> {
        debug!(position = %self.coordinate, "fixed location reading");
        Ok(self.coordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_configured_point() {
        let p = Coordinate::new(-23.6675, -46.4608);
        let source = FixedLocationSource::new(p);
        let got = source
            .current_position(&LocationRequest::default())
            .await
            .unwrap();
        assert_eq!(got, p);
    }
}
