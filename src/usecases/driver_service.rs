//! Driver roster management. Admin-only CRUD over the `drivers` collection.

use crate::domain::{AccessPolicy, DRIVERS_COLLECTION, DomainError, Driver, DriverInput, User};
use crate::ports::{Document, DocumentStore, Query, SortDirection, to_fields};
use crate::usecases::live_query::{self, Subscription};
use std::sync::Arc;
use tracing::info;

fn driver_from(doc: Document) -> Result<Driver, DomainError> {
    let input: DriverInput = doc.decode()?;
    Ok(Driver {
        id: doc.id,
        name: input.name,
        employee_id: input.employee_id,
        vehicle: input.vehicle,
        plate: input.plate,
    })
}

fn by_name() -> Query {
    Query::new(DRIVERS_COLLECTION, "name", SortDirection::Ascending)
}

pub struct DriverService {
    store: Arc<dyn DocumentStore>,
    policy: AccessPolicy,
}

impl DriverService {
    pub fn new(store: Arc<dyn DocumentStore>, policy: AccessPolicy) -> Self {
        Self { store, policy }
    }

    pub fn is_admin(&self, user: Option<&User>) -> bool {
        user.is_some_and(|u| self.policy.is_admin(u))
    }

    /// Live roster ordered by name.
    pub fn watch(&self, user: Option<&User>) -> Result<Subscription<Driver>, DomainError> {
        self.policy.require_admin(user)?;
        Ok(live_query::spawn(Arc::clone(&self.store), by_name(), driver_from))
    }

    pub async fn list(&self, user: Option<&User>) -> Result<Vec<Driver>, DomainError> {
        self.policy.require_admin(user)?;
        self.store
            .query(&by_name())
            .await?
            .into_iter()
            .map(driver_from)
            .collect()
    }

    pub async fn create(
        &self,
        user: Option<&User>,
        input: &DriverInput,
    ) -> Result<Driver, DomainError> {
        let admin = self.policy.require_admin(user)?;
        let input = input.validated()?;
        let doc = self
            .store
            .create(DRIVERS_COLLECTION, to_fields(&input)?)
            .await?;
        info!(id = %doc.id, employee_id = %input.employee_id, by = %admin.uid, "driver added");
        driver_from(doc)
    }

    pub async fn update(
        &self,
        user: Option<&User>,
        id: &str,
        input: &DriverInput,
    ) -> Result<(), DomainError> {
        let admin = self.policy.require_admin(user)?;
        let input = input.validated()?;
        self.store
            .update(DRIVERS_COLLECTION, id, to_fields(&input)?)
            .await?;
        info!(id, by = %admin.uid, "driver updated");
        Ok(())
    }

    pub async fn delete(&self, user: Option<&User>, id: &str) -> Result<(), DomainError> {
        let admin = self.policy.require_admin(user)?;
        self.store.delete(DRIVERS_COLLECTION, id).await?;
        info!(id, by = %admin.uid, "driver deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::MemoryDocumentStore;
    use std::time::Duration;

    fn admin() -> User {
        User {
            uid: "local:ops@spx.com".into(),
            email: Some("ops@spx.com".into()),
        }
    }

    fn input(name: &str, plate: &str) -> DriverInput {
        DriverInput {
            name: name.into(),
            employee_id: "SPX42".into(),
            vehicle: "Fiat Fiorino".into(),
            plate: plate.into(),
        }
    }

    fn service() -> DriverService {
        DriverService::new(
            Arc::new(MemoryDocumentStore::new()),
            AccessPolicy::new(["ops@spx.com"]),
        )
    }

    #[tokio::test]
    async fn non_admins_are_rejected() {
        let svc = service();
        let other = User {
            uid: "local:x@spx.com".into(),
            email: Some("x@spx.com".into()),
        };
        assert!(!svc.is_admin(Some(&other)));
        assert!(matches!(
            svc.list(Some(&other)).await,
            Err(DomainError::AccessDenied(_))
        ));
        assert!(matches!(
            svc.create(None, &input("Ana", "ABC1D23")).await,
            Err(DomainError::AccessDenied(_))
        ));
        assert!(svc.watch(Some(&other)).is_err());
    }

    #[tokio::test]
    async fn crud_roundtrip_sorted_by_name() {
        let svc = service();
        let a = admin();
        let bruno = svc.create(Some(&a), &input("Bruno", "bbb2b22")).await.unwrap();
        svc.create(Some(&a), &input("Ana", "AAA1A11")).await.unwrap();
        assert_eq!(bruno.plate, "BBB2B22");

        let names: Vec<_> = svc
            .list(Some(&a))
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, ["Ana", "Bruno"]);

        let mut edit = bruno.input();
        edit.vehicle = "VW Delivery".into();
        svc.update(Some(&a), &bruno.id, &edit).await.unwrap();
        let roster = svc.list(Some(&a)).await.unwrap();
        assert_eq!(roster[1].vehicle, "VW Delivery");
        assert_eq!(roster[1].id, bruno.id);

        svc.delete(Some(&a), &bruno.id).await.unwrap();
        assert_eq!(svc.list(Some(&a)).await.unwrap().len(), 1);
        assert!(matches!(
            svc.delete(Some(&a), &bruno.id).await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn invalid_plate_is_not_stored() {
        let svc = service();
        let a = admin();
        assert!(matches!(
            svc.create(Some(&a), &input("Ana", "ABC12")).await,
            Err(DomainError::Validation(_))
        ));
        assert!(svc.list(Some(&a)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_missing_driver_is_not_found() {
        let svc = service();
        let a = admin();
        assert!(matches!(
            svc.update(Some(&a), "missing", &input("Ana", "ABC1D23")).await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn watch_tracks_roster_changes() {
        let svc = service();
        let a = admin();
        let mut sub = svc.watch(Some(&a)).unwrap();
        assert!(sub.next().await.unwrap().unwrap().is_empty());
        svc.create(Some(&a), &input("Ana", "ABC1D23")).await.unwrap();
        let snap = tokio::time::timeout(Duration::from_secs(2), sub.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(snap[0].name, "Ana");
    }
}
