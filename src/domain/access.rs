//! Access rules for the admin views.
//!
//! The activity log is open to any signed-in user; roster management and log
//! deletion need an email on the admin allow-list.

use super::entities::User;
use super::errors::DomainError;

#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    admin_emails: Vec<String>,
}

impl AccessPolicy {
    pub fn new<I, S>(admin_emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            admin_emails: admin_emails
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn is_admin(&self, user: &User) -> bool {
        user.email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .is_some_and(|e| self.admin_emails.contains(&e))
    }

    pub fn require_signed_in<'a>(&self, user: Option<&'a User>) -> Result<&'a User, DomainError> {
        user.ok_or_else(|| {
            DomainError::AccessDenied("you must be signed in to view this page".into())
        })
    }

    pub fn require_admin<'a>(&self, user: Option<&'a User>) -> Result<&'a User, DomainError> {
        let user = self.require_signed_in(user)?;
        if self.is_admin(user) {
            Ok(user)
        } else {
            Err(DomainError::AccessDenied(
                "you do not have permission to manage this resource".into(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: Option<&str>) -> User {
        User {
            uid: "u1".into(),
            email: email.map(String::from),
        }
    }

    #[test]
    fn admin_match_is_case_insensitive() {
        let policy = AccessPolicy::new(["Ops@Example.com", " "]);
        assert!(policy.is_admin(&user(Some("ops@example.COM"))));
        assert!(!policy.is_admin(&user(Some("driver@example.com"))));
        assert!(!policy.is_admin(&user(None)));
    }

    #[test]
    fn anonymous_is_rejected_everywhere() {
        let policy = AccessPolicy::new(["ops@example.com"]);
        assert!(matches!(
            policy.require_signed_in(None),
            Err(DomainError::AccessDenied(_))
        ));
        assert!(matches!(
            policy.require_admin(None),
            Err(DomainError::AccessDenied(_))
        ));
    }

    #[test]
    fn signed_in_non_admin_can_only_view() {
        let policy = AccessPolicy::new(["ops@example.com"]);
        let u = user(Some("someone@example.com"));
        assert!(policy.require_signed_in(Some(&u)).is_ok());
        assert!(policy.require_admin(Some(&u)).is_err());
    }
}
