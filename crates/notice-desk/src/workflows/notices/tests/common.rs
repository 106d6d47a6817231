use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use tokio::sync::Notify;

use crate::workflows::notices::clock::{Clock, ManualClock};
use crate::workflows::notices::composer::{ComposeContext, NoticeComposer, DEFAULT_DATE_FORMAT};
use crate::workflows::notices::domain::{
    NewNotice, NewOfficer, NewTemplate, Notice, NoticeId, NoticePatch, Officer, Region, Template,
    DEFAULT_TEMPLATE_CATEGORY,
};
use crate::workflows::notices::repository::{NoticeRepository, Repository, RepositoryError};
use crate::workflows::notices::store::InMemoryRepository;

pub(super) const OPERATOR: &str = "Current User";
pub(super) const SENDER: &str = "Living Council Member";

pub(super) fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
        .single()
        .expect("valid start")
}

pub(super) fn brisbane() -> FixedOffset {
    FixedOffset::east_opt(10 * 3600).expect("valid offset")
}

pub(super) fn jane() -> NewOfficer {
    NewOfficer {
        name: "Jane Citizen".to_string(),
        organization: "NSW Police Force".to_string(),
        state: Region::Nsw,
        branch: Some("Traffic".to_string()),
        office: Some("Parramatta".to_string()),
        badge_number: Some("4471".to_string()),
        email: "jane.citizen@police.nsw.gov.au".to_string(),
    }
}

pub(super) fn sam() -> NewOfficer {
    NewOfficer {
        name: "Sam Ward".to_string(),
        organization: "Victoria Police".to_string(),
        state: Region::Vic,
        branch: None,
        office: None,
        badge_number: None,
        email: "sam.ward@police.vic.gov.au".to_string(),
    }
}

pub(super) fn obligation_template() -> NewTemplate {
    NewTemplate {
        name: "Notice of Fiduciary Obligation".to_string(),
        subject: "Notice to {officer.name}".to_string(),
        body: "Dear {officer.name} of {officer.organization} ({officer.state}),\n\
               Badge: {officer.badgeNumber}\n\
               Issued {notice.date} by {sender.name}. Ref {case.ref}"
            .to_string(),
        category: DEFAULT_TEMPLATE_CATEGORY.to_string(),
        created_by: OPERATOR.to_string(),
    }
}

pub(super) fn liability_template() -> NewTemplate {
    NewTemplate {
        name: "Notice of Liability".to_string(),
        subject: "Liability notice for {officer.organization}".to_string(),
        body: "To {officer.name}, office {officer.office}.".to_string(),
        category: DEFAULT_TEMPLATE_CATEGORY.to_string(),
        created_by: OPERATOR.to_string(),
    }
}

/// Seeded repositories sharing one manual clock.
pub(super) struct Desk {
    pub(super) clock: Arc<ManualClock>,
    pub(super) officers: Arc<InMemoryRepository<Officer>>,
    pub(super) templates: Arc<InMemoryRepository<Template>>,
    pub(super) notices: Arc<InMemoryRepository<Notice>>,
}

impl Desk {
    pub(super) async fn seeded() -> Self {
        let clock = Arc::new(ManualClock::new(start()));
        let officers = Arc::new(InMemoryRepository::<Officer>::new(clock.clone()));
        let templates = Arc::new(InMemoryRepository::<Template>::new(clock.clone()));
        let notices = Arc::new(InMemoryRepository::<Notice>::new(clock.clone()));

        officers.create(jane()).await.expect("seed jane");
        officers.create(sam()).await.expect("seed sam");
        templates
            .create(obligation_template())
            .await
            .expect("seed obligation template");
        templates
            .create(liability_template())
            .await
            .expect("seed liability template");

        Self {
            clock,
            officers,
            templates,
            notices,
        }
    }

    pub(super) fn composer(&self) -> NoticeComposer {
        self.composer_with(self.notices.clone())
    }

    pub(super) fn composer_with(&self, notices: Arc<NoticeRepository>) -> NoticeComposer {
        NoticeComposer::new(self.officers.clone(), self.templates.clone(), notices)
    }

    pub(super) fn context(&self) -> ComposeContext {
        ComposeContext {
            operator: OPERATOR.to_string(),
            sender_name: SENDER.to_string(),
            now: self.clock.now().with_timezone(&brisbane()),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

/// Notice repository whose writes always fail.
#[derive(Default)]
pub(super) struct FailingNotices;

#[async_trait]
impl Repository<Notice> for FailingNotices {
    async fn get_all(&self) -> Result<Vec<Notice>, RepositoryError> {
        Ok(Vec::new())
    }

    async fn get_by_id(&self, id: NoticeId) -> Result<Notice, RepositoryError> {
        Err(RepositoryError::not_found::<Notice>(id))
    }

    async fn create(&self, _draft: NewNotice) -> Result<Notice, RepositoryError> {
        Err(RepositoryError::OperationFailed("notice store offline".to_string()))
    }

    async fn update(&self, id: NoticeId, _patch: NoticePatch) -> Result<Notice, RepositoryError> {
        Err(RepositoryError::not_found::<Notice>(id))
    }

    async fn delete(&self, id: NoticeId) -> Result<bool, RepositoryError> {
        Err(RepositoryError::not_found::<Notice>(id))
    }
}

/// Notice repository that parks `create` until released.
pub(super) struct BlockingNotices {
    inner: InMemoryRepository<Notice>,
    pub(super) entered: Notify,
    pub(super) release: Notify,
}

impl BlockingNotices {
    pub(super) fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            inner: InMemoryRepository::new(clock),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl Repository<Notice> for BlockingNotices {
    async fn get_all(&self) -> Result<Vec<Notice>, RepositoryError> {
        self.inner.get_all().await
    }

    async fn get_by_id(&self, id: NoticeId) -> Result<Notice, RepositoryError> {
        self.inner.get_by_id(id).await
    }

    async fn create(&self, draft: NewNotice) -> Result<Notice, RepositoryError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.create(draft).await
    }

    async fn update(&self, id: NoticeId, patch: NoticePatch) -> Result<Notice, RepositoryError> {
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: NoticeId) -> Result<bool, RepositoryError> {
        self.inner.delete(id).await
    }
}
