//! Application configuration. Geofence, location source, storage, admins.

use crate::domain::geofence::{DEFAULT_RADIUS_METERS, DEFAULT_TARGET};
use crate::domain::{Coordinate, DomainError, Geofence};
use crate::ports::LocationRequest;
use serde::Deserialize;
use std::time::Duration;

/// Default wait for a location reading.
pub const DEFAULT_LOCATION_TIMEOUT_MS: u64 = 10_000;

/// Where the document store lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Sqlite,
    Memory,
}

/// Which adapter supplies location readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSourceKind {
    Prompt,
    Fixed,
    Http,
    /// The device has no location capability.
    None,
}

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    pub data_dir: Option<String>,

    /// "sqlite" (default) or "memory". Read from SPX_CHECKIN_STORE.
    #[serde(default)]
    pub store: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Geofence
    // ─────────────────────────────────────────────────────────────────────────
    /// Site latitude in degrees. Read from SPX_CHECKIN_TARGET_LATITUDE.
    #[serde(default)]
    pub target_latitude: Option<f64>,

    /// Site longitude in degrees. Read from SPX_CHECKIN_TARGET_LONGITUDE.
    #[serde(default)]
    pub target_longitude: Option<f64>,

    /// Allowed distance from the site in meters (default 500). Read from SPX_CHECKIN_RADIUS_METERS.
    #[serde(default)]
    pub radius_meters: Option<f64>,

    // ─────────────────────────────────────────────────────────────────────────
    // Location source
    // ─────────────────────────────────────────────────────────────────────────
    /// "prompt" (default), "fixed", "http" or "none". Read from SPX_CHECKIN_LOCATION_SOURCE.
    #[serde(default)]
    pub location_source: Option<String>,

    /// Reading returned by the fixed source.
    #[serde(default)]
    pub fixed_latitude: Option<f64>,
    #[serde(default)]
    pub fixed_longitude: Option<f64>,

    /// Positioning bridge endpoint for the http source. Read from SPX_CHECKIN_LOCATION_URL.
    #[serde(default)]
    pub location_url: Option<String>,

    /// Reading timeout in ms (default 10000). Read from LOCATION_TIMEOUT_MS or SPX_CHECKIN_LOCATION_TIMEOUT_MS.
    #[serde(default)]
    pub location_timeout_ms: Option<u64>,

    #[serde(default)]
    pub location_high_accuracy: Option<bool>,

    /// Oldest acceptable cached reading in ms (default 0 = always fresh).
    #[serde(default)]
    pub location_maximum_age_ms: Option<u64>,

    // ─────────────────────────────────────────────────────────────────────────
    // Access
    // ─────────────────────────────────────────────────────────────────────────
    /// Comma-separated admin allow-list. Read from ADMIN_EMAILS or SPX_CHECKIN_ADMIN_EMAILS.
    #[serde(default)]
    pub admin_emails: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("SPX_CHECKIN"));
        if let Ok(path) = std::env::var("SPX_CHECKIN_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        let mut cfg: Self = c.build()?.try_deserialize()?;
        // ADMIN_EMAILS is read directly (no prefix) so .env can share it with other tools
        if let Ok(s) = std::env::var("ADMIN_EMAILS") {
            cfg.admin_emails = Some(s);
        }
        // LOCATION_TIMEOUT_MS: how long a check-in waits for a reading
        if let Ok(s) = std::env::var("LOCATION_TIMEOUT_MS") {
            if let Ok(ms) = s.parse::<u64>() {
                cfg.location_timeout_ms = Some(ms);
            }
        }
        Ok(cfg)
    }

    /// Returns the data directory. Defaults to ./data.
    pub fn data_dir_or_default(&self) -> String {
        self.data_dir.clone().unwrap_or_else(|| "./data".to_string())
    }

    pub fn store_kind(&self) -> Result<StoreKind, DomainError> {
        match self.store.as_deref().map(str::trim) {
            None | Some("") | Some("sqlite") => Ok(StoreKind::Sqlite),
            Some("memory") => Ok(StoreKind::Memory),
            Some(other) => Err(DomainError::Config(format!(
                "unknown store {:?} (expected sqlite or memory)",
                other
            ))),
        }
    }

    /// Build the geofence, falling back to the Mauá site and 500 m.
    /// Rejects non-finite or out-of-range values so a bad deploy fails at startup.
    pub fn geofence(&self) -> Result<Geofence, DomainError> {
        let target = Coordinate::new(
            self.target_latitude.unwrap_or(DEFAULT_TARGET.latitude),
            self.target_longitude.unwrap_or(DEFAULT_TARGET.longitude),
        );
        if !target.is_valid() {
            return Err(DomainError::Config(format!(
                "geofence target {} is not a valid coordinate",
                target
            )));
        }
        let radius = self.radius_meters.unwrap_or(DEFAULT_RADIUS_METERS);
        if !radius.is_finite() || radius <= 0.0 {
            return Err(DomainError::Config(format!(
                "geofence radius must be a positive number of meters, got {}",
                radius
            )));
        }
        Ok(Geofence::new(target, radius))
    }

    pub fn location_source_kind(&self) -> Result<LocationSourceKind, DomainError> {
        match self.location_source.as_deref().map(str::trim) {
            None | Some("") | Some("prompt") => Ok(LocationSourceKind::Prompt),
            Some("fixed") => Ok(LocationSourceKind::Fixed),
            Some("http") => Ok(LocationSourceKind::Http),
            Some("none") => Ok(LocationSourceKind::None),
            Some(other) => Err(DomainError::Config(format!(
                "unknown location source {:?} (expected prompt, fixed, http or none)",
                other
            ))),
        }
    }

    /// Reading for the fixed source. Both components are required.
    pub fn fixed_location(&self) -> Result<Coordinate, DomainError> {
        match (self.fixed_latitude, self.fixed_longitude) {
            (Some(lat), Some(lon)) if Coordinate::new(lat, lon).is_valid() => {
                Ok(Coordinate::new(lat, lon))
            }
            (Some(lat), Some(lon)) => Err(DomainError::Config(format!(
                "fixed location ({}, {}) is not a valid coordinate",
                lat, lon
            ))),
            _ => Err(DomainError::Config(
                "fixed location source needs SPX_CHECKIN_FIXED_LATITUDE and SPX_CHECKIN_FIXED_LONGITUDE"
                    .into(),
            )),
        }
    }

    pub fn location_url(&self) -> Result<String, DomainError> {
        self.location_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                DomainError::Config("http location source needs SPX_CHECKIN_LOCATION_URL".into())
            })
    }

    /// Returns the reading timeout in milliseconds. Defaults to 10000.
    pub fn location_timeout_ms_or_default(&self) -> u64 {
        self.location_timeout_ms.unwrap_or(DEFAULT_LOCATION_TIMEOUT_MS)
    }

    pub fn location_request(&self) -> LocationRequest {
        LocationRequest {
            high_accuracy: self.location_high_accuracy.unwrap_or(true),
            timeout: Duration::from_millis(self.location_timeout_ms_or_default()),
            maximum_age: Duration::from_millis(self.location_maximum_age_ms.unwrap_or(0)),
        }
    }

    /// Admin allow-list, trimmed and lower-cased. Empty when unset.
    pub fn admin_emails(&self) -> Vec<String> {
        self.admin_emails
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_maua_site() {
        let cfg = AppConfig::default();
        let fence = cfg.geofence().unwrap();
        assert_eq!(fence.target(), DEFAULT_TARGET);
        assert_eq!(fence.radius_meters(), 500.0);
        assert_eq!(cfg.store_kind().unwrap(), StoreKind::Sqlite);
        assert_eq!(cfg.location_source_kind().unwrap(), LocationSourceKind::Prompt);
        assert_eq!(cfg.data_dir_or_default(), "./data");

        let req = cfg.location_request();
        assert!(req.high_accuracy);
        assert_eq!(req.timeout, Duration::from_secs(10));
        assert!(req.maximum_age.is_zero());
    }

    #[test]
    fn bad_geofence_is_rejected() {
        let cfg = AppConfig {
            radius_meters: Some(0.0),
            ..Default::default()
        };
        assert!(matches!(cfg.geofence(), Err(DomainError::Config(_))));

        let cfg = AppConfig {
            target_latitude: Some(95.0),
            ..Default::default()
        };
        assert!(matches!(cfg.geofence(), Err(DomainError::Config(_))));
    }

    #[test]
    fn custom_geofence() {
        let cfg = AppConfig {
            target_latitude: Some(-23.5505),
            target_longitude: Some(-46.6333),
            radius_meters: Some(250.0),
            ..Default::default()
        };
        let fence = cfg.geofence().unwrap();
        assert_eq!(fence.target(), Coordinate::new(-23.5505, -46.6333));
        assert_eq!(fence.radius_meters(), 250.0);
    }

    #[test]
    fn admin_emails_are_split_and_normalized() {
        let cfg = AppConfig {
            admin_emails: Some(" Ops@SPX.com, ,lead@spx.com ".into()),
            ..Default::default()
        };
        assert_eq!(cfg.admin_emails(), vec!["ops@spx.com", "lead@spx.com"]);
        assert!(AppConfig::default().admin_emails().is_empty());
    }

    #[test]
    fn location_source_parsing() {
        let mut cfg = AppConfig {
            location_source: Some("fixed".into()),
            ..Default::default()
        };
        assert_eq!(cfg.location_source_kind().unwrap(), LocationSourceKind::Fixed);
        assert!(cfg.fixed_location().is_err());
        cfg.fixed_latitude = Some(-23.6675);
        cfg.fixed_longitude = Some(-46.4608);
        assert_eq!(cfg.fixed_location().unwrap(), DEFAULT_TARGET);

        cfg.location_source = Some("gps".into());
        assert!(cfg.location_source_kind().is_err());
        cfg.location_source = Some("none".into());
        assert_eq!(cfg.location_source_kind().unwrap(), LocationSourceKind::None);
        assert!(cfg.location_url().is_err());
    }
}
