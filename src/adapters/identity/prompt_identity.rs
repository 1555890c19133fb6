//! Implements IdentityPort with a terminal email prompt and an in-memory session.
//!
//! Holds the signed-in user between menu actions. No global lock.
//!
//! Placeholder identity, not a trust boundary: no credential is checked, so anyone at
//! the terminal who types an allow-listed email is treated as that admin. Deployments
//! that need real authentication must supply another `IdentityPort`.

use crate::domain::{DomainError, User};
use crate::ports::IdentityPort;
use async_trait::async_trait;
use inquire::validator::Validation;
use inquire::{InquireError, Text};
use tokio::sync::RwLock;
use tracing::info;

/// Session identity for the terminal. One user at a time.
pub struct PromptIdentity {
    session: RwLock<Option<User>>,
}

impl PromptIdentity {
    pub fn new() -> Self {
        Self {
            session: RwLock::new(None),
        }
    }
}

impl Default for PromptIdentity {
    fn default() -> Self {
        Self::new()
    }
}

fn user_for(email: &str) -> User {
    let email = email.trim().to_lowercase();
    User {
        uid: format!("local:{}", email),
        email: Some(email),
    }
}

fn looks_like_email(s: &str) -> bool {
    let s = s.trim();
    match s.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !s.contains(' '),
        None => false,
    }
}

#[async_trait]
impl IdentityPort for PromptIdentity {
    async fn sign_in(&self) -> Result<User, DomainError> {
        let email = tokio::task::spawn_blocking(|| {
            Text::new("Admin email:")
                .with_validator(|s: &str| {
                    if looks_like_email(s) {
                        Ok(Validation::Valid)
                    } else {
                        Ok(Validation::Invalid("Enter a valid email address".into()))
                    }
                })
                .prompt()
        })
        .await
        .map_err(|e| DomainError::Auth(e.to_string()))?
        .map_err(|e| match e {
            InquireError::OperationCanceled | InquireError::OperationInterrupted => {
                DomainError::Auth("sign-in cancelled".into())
            }
            other => DomainError::Ui(other.to_string()),
        })?;

        let user = user_for(&email);
        info!(uid = %user.uid, "signed in");
        *self.session.write().await = Some(user.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), DomainError> {
        if let Some(user) = self.session.write().await.take() {
            info!(uid = %user.uid, "signed out");
        }
        Ok(())
    }

    async fn current_user(&self) -> Option<User> {
        self.session.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(looks_like_email("ops@spx.com.br"));
        assert!(!looks_like_email("ops@localhost"));
        assert!(!looks_like_email("@spx.com"));
        assert!(!looks_like_email("o ps@spx.com"));
    }

    #[tokio::test]
    async fn session_normalizes_email_and_signs_out() {
        let identity = PromptIdentity::new();
        assert!(identity.current_user().await.is_none());
        *identity.session.write().await = Some(user_for(" Ops@SPX.com "));
        let user = identity.current_user().await.unwrap();
        assert_eq!(user.email.as_deref(), Some("ops@spx.com"));
        assert_eq!(user.uid, "local:ops@spx.com");

        identity.sign_out().await.unwrap();
        assert!(identity.current_user().await.is_none());
    }
}
