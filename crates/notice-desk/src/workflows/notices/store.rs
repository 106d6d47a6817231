use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

use super::clock::{Clock, SystemClock};
use super::domain::RecordId;
use super::repository::{Entity, Repository, RepositoryError};

/// Process-local repository backed by a vector in insertion order.
///
/// New ids are `max(existing) + 1`. Writers inside one process are serialized by
/// the lock; separate processes sharing data need an external id allocator.
pub struct InMemoryRepository<E> {
    records: Mutex<Vec<E>>,
    clock: Arc<dyn Clock>,
}

impl<E: Entity> InMemoryRepository<E> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_records(Vec::new(), clock)
    }

    pub fn with_records(records: Vec<E>, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Mutex::new(records),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().map(|records| records.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<E>>, RepositoryError> {
        self.records.lock().map_err(|_| {
            RepositoryError::OperationFailed(format!("{} store lock poisoned", E::KIND))
        })
    }

    fn next_id(records: &[E]) -> E::Id {
        let max = records
            .iter()
            .map(|record| record.id().raw())
            .max()
            .unwrap_or(0);
        E::Id::from_raw(max + 1)
    }
}

impl<E: Entity> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

#[async_trait]
impl<E: Entity> Repository<E> for InMemoryRepository<E> {
    async fn get_all(&self) -> Result<Vec<E>, RepositoryError> {
        Ok(self.lock()?.clone())
    }

    async fn get_by_id(&self, id: E::Id) -> Result<E, RepositoryError> {
        self.lock()?
            .iter()
            .find(|record| record.id() == id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found::<E>(id))
    }

    async fn create(&self, draft: E::Draft) -> Result<E, RepositoryError> {
        let mut records = self.lock()?;
        let id = Self::next_id(&records);
        let record = E::materialize(id, draft, self.clock.now());
        records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: E::Id, patch: E::Patch) -> Result<E, RepositoryError> {
        let mut records = self.lock()?;
        let record = records
            .iter_mut()
            .find(|record| record.id() == id)
            .ok_or_else(|| RepositoryError::not_found::<E>(id))?;
        record.apply_patch(patch, self.clock.now());
        Ok(record.clone())
    }

    async fn delete(&self, id: E::Id) -> Result<bool, RepositoryError> {
        let mut records = self.lock()?;
        let index = records
            .iter()
            .position(|record| record.id() == id)
            .ok_or_else(|| RepositoryError::not_found::<E>(id))?;
        records.remove(index);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::notices::clock::ManualClock;
    use crate::workflows::notices::domain::{NewOfficer, Officer, OfficerId, OfficerPatch, Region};
    use chrono::{Duration, TimeZone, Utc};

    fn new_officer(name: &str) -> NewOfficer {
        NewOfficer {
            name: name.to_string(),
            organization: "Queensland Police Service".to_string(),
            state: Region::Qld,
            branch: None,
            office: None,
            badge_number: None,
            email: format!("{}@police.qld.gov.au", name.to_lowercase()),
        }
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
        ))
    }

    #[tokio::test]
    async fn create_assigns_max_plus_one_and_timestamps() {
        let clock = clock();
        let repository = InMemoryRepository::<Officer>::new(clock.clone());

        let first = repository.create(new_officer("Ada")).await.expect("create");
        let second = repository.create(new_officer("Ben")).await.expect("create");
        assert_eq!(first.id, OfficerId(1));
        assert_eq!(second.id, OfficerId(2));
        assert_eq!(first.created_at, clock.now());

        repository.delete(first.id).await.expect("delete");
        let third = repository.create(new_officer("Cal")).await.expect("create");
        assert_eq!(third.id, OfficerId(3));

        let names: Vec<_> = repository
            .get_all()
            .await
            .expect("list")
            .into_iter()
            .map(|officer| officer.name)
            .collect();
        assert_eq!(names, vec!["Ben", "Cal"]);
    }

    #[tokio::test]
    async fn update_merges_patch_and_refreshes_updated_at() {
        let clock = clock();
        let repository = InMemoryRepository::<Officer>::new(clock.clone());
        let created = repository.create(new_officer("Ada")).await.expect("create");

        clock.advance(Duration::hours(2));
        let updated = repository
            .update(
                created.id,
                OfficerPatch {
                    office: Some("Brisbane City".to_string()),
                    ..OfficerPatch::default()
                },
            )
            .await
            .expect("update");

        assert_eq!(updated.name, "Ada");
        assert_eq!(updated.office.as_deref(), Some("Brisbane City"));
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.updated_at, created.created_at + Duration::hours(2));
    }

    #[tokio::test]
    async fn missing_records_report_not_found() {
        let repository = InMemoryRepository::<Officer>::new(clock());

        let error = repository
            .get_by_id(OfficerId(9))
            .await
            .expect_err("missing");
        assert_eq!(
            error,
            RepositoryError::NotFound {
                entity: "officer",
                id: 9
            }
        );
        assert!(matches!(
            repository.update(OfficerId(9), OfficerPatch::default()).await,
            Err(RepositoryError::NotFound { .. })
        ));
        assert!(matches!(
            repository.delete(OfficerId(9)).await,
            Err(RepositoryError::NotFound { .. })
        ));
    }
}
