//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here; the check-in flow lives in CheckInService.

use dotenv::dotenv;
use spx_checkin::adapters::identity::PromptIdentity;
use spx_checkin::adapters::location::{
    FixedLocationSource, HttpLocationSource, PromptLocationSource,
};
use spx_checkin::adapters::persistence::{MemoryDocumentStore, SqliteDocumentStore};
use spx_checkin::adapters::ui::tui::TuiInputPort;
use spx_checkin::domain::AccessPolicy;
use spx_checkin::ports::{DocumentStore, IdentityPort, InputPort, LocationPort};
use spx_checkin::shared::config::{AppConfig, LocationSourceKind, StoreKind};
use spx_checkin::usecases::{ActivityLogService, CheckInService, DriverService};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let cfg = AppConfig::load()?;

    // --- Geofence: fixed for the lifetime of the process ---
    let geofence = cfg.geofence()?;
    info!(
        site = %geofence.target(),
        radius_m = geofence.radius_meters(),
        "geofence configured"
    );
    spx_checkin::adapters::ui::init_ui(&format!(
        "Geolocation check-in · site {} · radius {} m",
        geofence.target(),
        geofence.radius_meters()
    ));

    // --- Document store ---
    let store: Arc<dyn DocumentStore> = match cfg.store_kind()? {
        StoreKind::Sqlite => {
            let data_path = PathBuf::from(cfg.data_dir_or_default());
            let sqlite = SqliteDocumentStore::connect(&data_path)
                .await
                .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?;
            let abs = sqlite
                .path()
                .canonicalize()
                .unwrap_or_else(|_| sqlite.path().to_path_buf());
            info!(path = %abs.display(), "document store: sqlite");
            Arc::new(sqlite)
        }
        StoreKind::Memory => {
            warn!("document store: memory (records are lost on exit)");
            Arc::new(MemoryDocumentStore::new())
        }
    };

    // --- Location source (None = device has no location capability) ---
    let source_kind = cfg.location_source_kind()?;
    let location: Option<Arc<dyn LocationPort>> = match source_kind {
        LocationSourceKind::Prompt => Some(Arc::new(PromptLocationSource::new())),
        LocationSourceKind::Fixed => {
            let at = cfg.fixed_location()?;
            info!(position = %at, "location source: fixed");
            Some(Arc::new(FixedLocationSource::new(at)))
        }
        LocationSourceKind::Http => {
            let url = cfg.location_url()?;
            info!(url = %url, "location source: positioning bridge");
            Some(Arc::new(HttpLocationSource::new(url)))
        }
        LocationSourceKind::None => {
            warn!("location source: none (every check-in will be logged as an error)");
            None
        }
    };
    let location_request = cfg.location_request();
    info!(
        timeout_ms = location_request.timeout.as_millis() as u64,
        high_accuracy = location_request.high_accuracy,
        maximum_age_ms = location_request.maximum_age.as_millis() as u64,
        "location request options"
    );

    // --- Access ---
    let admins = cfg.admin_emails();
    if admins.is_empty() {
        warn!("ADMIN_EMAILS is empty; nobody can manage drivers");
    } else {
        info!(count = admins.len(), "admin allow-list loaded");
    }
    let policy = AccessPolicy::new(&admins);

    // --- Services ---
    let check_in = Arc::new(CheckInService::new(
        location,
        Arc::clone(&store),
        geofence,
        location_request,
    ));
    let activity_log = Arc::new(ActivityLogService::new(Arc::clone(&store), policy.clone()));
    let drivers = Arc::new(DriverService::new(Arc::clone(&store), policy));

    let identity: Arc<dyn IdentityPort> = Arc::new(PromptIdentity::new());
    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(
        identity,
        check_in,
        activity_log,
        drivers,
        source_kind != LocationSourceKind::Prompt,
    ));

    // --- Run (main menu -> Check in / Activity log / Drivers) ---
    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    info!("bye");
    Ok(())
}
