//! Identity adapters. Implement IdentityPort.

pub mod prompt_identity;

pub use prompt_identity::PromptIdentity;
