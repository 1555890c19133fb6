//! Location source adapters. Implement LocationPort.
//!
//! Fixed (kiosk/demo), terminal prompt, and HTTP positioning bridge.

pub mod fixed;
pub mod http;
pub mod prompt;

pub use fixed::FixedLocationSource;
pub use http::HttpLocationSource;
pub use prompt::PromptLocationSource;
