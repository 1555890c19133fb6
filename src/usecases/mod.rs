//! Application use cases. Orchestrate domain logic via ports.

pub mod activity_log_service;
pub mod check_in_service;
pub mod driver_service;
pub mod live_query;

pub use activity_log_service::ActivityLogService;
pub use check_in_service::{CheckInOutcome, CheckInService};
pub use driver_service::DriverService;
pub use live_query::Subscription;
