use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::domain::{ErrorKind, Notice, Officer, RecordId, Template};

/// A record type stored behind a [`Repository`].
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: RecordId;
    /// Fields supplied on create; the repository assigns id and timestamps.
    type Draft: Send + 'static;
    /// Fields merged over an existing record on update.
    type Patch: Send + 'static;

    const KIND: &'static str;

    fn id(&self) -> Self::Id;
    fn materialize(id: Self::Id, draft: Self::Draft, now: DateTime<Utc>) -> Self;
    fn apply_patch(&mut self, patch: Self::Patch, now: DateTime<Utc>);
}

/// Storage contract shared by officers, templates and notices.
///
/// `get_all` returns records in insertion order. Every call may suspend; callers
/// must not hold session locks across them.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    async fn get_all(&self) -> Result<Vec<E>, RepositoryError>;
    async fn get_by_id(&self, id: E::Id) -> Result<E, RepositoryError>;
    async fn create(&self, draft: E::Draft) -> Result<E, RepositoryError>;
    async fn update(&self, id: E::Id, patch: E::Patch) -> Result<E, RepositoryError>;
    async fn delete(&self, id: E::Id) -> Result<bool, RepositoryError>;
}

pub type OfficerRepository = dyn Repository<Officer>;
pub type TemplateRepository = dyn Repository<Template>;
pub type NoticeRepository = dyn Repository<Notice>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },
    #[error("repository operation failed: {0}")]
    OperationFailed(String),
}

impl RepositoryError {
    pub fn not_found<E: Entity>(id: E::Id) -> Self {
        Self::NotFound {
            entity: E::KIND,
            id: id.raw(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::OperationFailed(_) => ErrorKind::OperationFailed,
        }
    }
}
