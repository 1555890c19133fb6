//! Infrastructure adapters. Implement ports.
//!
//! Document stores, location sources, identity, terminal UI. Map errors to DomainError.

pub mod identity;
pub mod location;
pub mod persistence;
pub mod ui;
