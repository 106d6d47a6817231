//! Guided notice composition.
//!
//! A session walks `SelectRecipient -> SelectTemplate -> ReviewAndSend`. Forward
//! moves are gated on the selections made so far; backward moves are always
//! allowed and keep everything already chosen. `send` is the only step that
//! persists anything, and it either stores the whole notice or leaves the
//! session exactly as it was.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use super::domain::{
    ErrorKind, NewNotice, Notice, Officer, OfficerId, Template, TemplateId, ValidationError,
};
use super::repository::{
    NoticeRepository, OfficerRepository, RepositoryError, TemplateRepository,
};
use super::template::{substitute, Bindings};

pub const DEFAULT_DATE_FORMAT: &str = "%-d/%-m/%Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComposerStep {
    SelectRecipient,
    SelectTemplate,
    ReviewAndSend,
}

impl ComposerStep {
    pub const fn ordered() -> [Self; 3] {
        [Self::SelectRecipient, Self::SelectTemplate, Self::ReviewAndSend]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::SelectRecipient => "Select Recipient",
            Self::SelectTemplate => "Select Template",
            Self::ReviewAndSend => "Review and Send",
        }
    }

    pub const fn number(self) -> u8 {
        match self {
            Self::SelectRecipient => 1,
            Self::SelectTemplate => 2,
            Self::ReviewAndSend => 3,
        }
    }

    pub const fn next(self) -> Option<Self> {
        match self {
            Self::SelectRecipient => Some(Self::SelectTemplate),
            Self::SelectTemplate => Some(Self::ReviewAndSend),
            Self::ReviewAndSend => None,
        }
    }

    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::SelectRecipient => None,
            Self::SelectTemplate => Some(Self::SelectRecipient),
            Self::ReviewAndSend => Some(Self::SelectTemplate),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub subject: String,
    pub body: String,
}

/// Ambient inputs for a composition call: who is acting and when.
#[derive(Debug, Clone)]
pub struct ComposeContext {
    /// Recorded as `sent_by` on stored notices.
    pub operator: String,
    /// Bound to `{sender.name}`.
    pub sender_name: String,
    pub now: DateTime<FixedOffset>,
    /// strftime pattern for `{notice.date}`.
    pub date_format: String,
}

impl ComposeContext {
    pub fn notice_date(&self) -> String {
        let mut rendered = String::new();
        if write!(rendered, "{}", self.now.format(&self.date_format)).is_err() {
            rendered.clear();
            rendered.push_str(&self.now.format("%Y-%m-%d").to_string());
        }
        rendered
    }

    fn bindings_for(&self, officer: &Officer) -> Bindings {
        Bindings::for_notice(officer, &self.sender_name, &self.notice_date())
    }
}

/// The mail-client hand-off for a sent notice. Subject and body are already
/// percent-encoded and must be passed through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailDraft {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl MailDraft {
    pub fn compose(to: &str, subject: &str, body: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: urlencoding::encode(subject).into_owned(),
            body: urlencoding::encode(body).into_owned(),
        }
    }

    pub fn mailto_uri(&self) -> String {
        format!(
            "mailto:{}?subject={}&body={}",
            self.to, self.subject, self.body
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendReceipt {
    pub notice: Notice,
    pub mail: MailDraft,
}

/// Serializable view of a composition session.
#[derive(Debug, Clone, Serialize)]
pub struct ComposerSnapshot {
    pub step: ComposerStep,
    pub step_label: &'static str,
    pub step_number: u8,
    pub officer: Option<Officer>,
    pub template: Option<Template>,
    pub draft: Draft,
    pub can_advance: bool,
    pub can_send: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("cannot {action} during '{}'; expected '{}'", .actual.label(), .expected.label())]
    WrongStep {
        action: &'static str,
        expected: ComposerStep,
        actual: ComposerStep,
    },
    #[error("a send is already in progress for this session")]
    SendInProgress,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ComposeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::WrongStep { .. } | Self::SendInProgress => {
                ErrorKind::Validation
            }
            Self::Repository(err) => err.kind(),
        }
    }
}

#[derive(Debug, Clone)]
struct SessionState {
    step: ComposerStep,
    officer: Option<Officer>,
    template: Option<Template>,
    draft: Draft,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            step: ComposerStep::SelectRecipient,
            officer: None,
            template: None,
            draft: Draft::default(),
        }
    }
}

impl SessionState {
    fn expect_step(&self, action: &'static str, expected: ComposerStep) -> Result<(), ComposeError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(ComposeError::WrongStep {
                action,
                expected,
                actual: self.step,
            })
        }
    }

    fn missing_for(&self, target: ComposerStep) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if target >= ComposerStep::SelectTemplate && self.officer.is_none() {
            missing.push("officer");
        }
        if target >= ComposerStep::ReviewAndSend && self.template.is_none() {
            missing.push("template");
        }
        missing
    }

    fn missing_for_send(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.officer.is_none() {
            missing.push("officer");
        }
        if self.draft.subject.is_empty() {
            missing.push("subject");
        }
        if self.draft.body.is_empty() {
            missing.push("body");
        }
        missing
    }
}

/// Clears the in-flight flag when a send finishes, fails, or is dropped.
struct SendGuard<'a>(&'a AtomicBool);

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One operator's composition session over injected repositories.
pub struct NoticeComposer {
    officers: Arc<OfficerRepository>,
    templates: Arc<TemplateRepository>,
    notices: Arc<NoticeRepository>,
    state: Mutex<SessionState>,
    sending: AtomicBool,
}

impl NoticeComposer {
    pub fn new(
        officers: Arc<OfficerRepository>,
        templates: Arc<TemplateRepository>,
        notices: Arc<NoticeRepository>,
    ) -> Self {
        Self {
            officers,
            templates,
            notices,
            state: Mutex::new(SessionState::default()),
            sending: AtomicBool::new(false),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn step(&self) -> ComposerStep {
        self.state().step
    }

    pub fn draft(&self) -> Draft {
        self.state().draft.clone()
    }

    pub fn snapshot(&self) -> ComposerSnapshot {
        let state = self.state();
        let can_advance = state
            .step
            .next()
            .is_some_and(|next| state.missing_for(next).is_empty());
        let can_send =
            state.step == ComposerStep::ReviewAndSend && state.missing_for_send().is_empty();

        ComposerSnapshot {
            step: state.step,
            step_label: state.step.label(),
            step_number: state.step.number(),
            officer: state.officer.clone(),
            template: state.template.clone(),
            draft: state.draft.clone(),
            can_advance,
            can_send,
        }
    }

    /// Choose the recipient. Draft text is left untouched.
    pub async fn select_officer(&self, id: OfficerId) -> Result<Officer, ComposeError> {
        const ACTION: &str = "select an officer";

        self.state()
            .expect_step(ACTION, ComposerStep::SelectRecipient)?;
        let officer = self.officers.get_by_id(id).await?;

        let mut state = self.state();
        state.expect_step(ACTION, ComposerStep::SelectRecipient)?;
        state.officer = Some(officer.clone());
        debug!(officer_id = %officer.id, "recipient selected");
        Ok(officer)
    }

    /// Choose a template and re-render the draft against the current officer,
    /// replacing any earlier edits.
    pub async fn select_template(
        &self,
        id: TemplateId,
        context: &ComposeContext,
    ) -> Result<Draft, ComposeError> {
        const ACTION: &str = "select a template";

        {
            let state = self.state();
            state.expect_step(ACTION, ComposerStep::SelectTemplate)?;
            if state.officer.is_none() {
                return Err(ValidationError::missing(vec!["officer"]).into());
            }
        }
        let template = self.templates.get_by_id(id).await?;

        let mut state = self.state();
        state.expect_step(ACTION, ComposerStep::SelectTemplate)?;
        let officer = state
            .officer
            .as_ref()
            .ok_or_else(|| ValidationError::missing(vec!["officer"]))?;

        let bindings = context.bindings_for(officer);
        let draft = Draft {
            subject: substitute(&template.subject, &bindings),
            body: substitute(&template.body, &bindings),
        };
        state.draft = draft.clone();
        state.template = Some(template);
        debug!(template_id = %id, "draft rendered from template");
        Ok(draft)
    }

    /// Move one step forward.
    pub fn advance(&self) -> Result<ComposerStep, ComposeError> {
        let current = self.step();
        match current.next() {
            Some(next) => self.go_to(next),
            None => Err(ComposeError::WrongStep {
                action: "advance",
                expected: ComposerStep::SelectTemplate,
                actual: current,
            }),
        }
    }

    /// Move one step back; a no-op on the first step.
    pub fn back(&self) -> ComposerStep {
        let mut state = self.state();
        if let Some(previous) = state.step.previous() {
            state.step = previous;
        }
        state.step
    }

    /// Jump to `target`. Forward jumps check every requirement up to `target`.
    pub fn go_to(&self, target: ComposerStep) -> Result<ComposerStep, ComposeError> {
        let mut state = self.state();
        if target > state.step {
            ValidationError::missing(state.missing_for(target)).check()?;
        }
        state.step = target;
        Ok(target)
    }

    /// Free-text edits made while reviewing.
    pub fn edit_draft(
        &self,
        subject: Option<String>,
        body: Option<String>,
    ) -> Result<Draft, ComposeError> {
        let mut state = self.state();
        state.expect_step("edit the draft", ComposerStep::ReviewAndSend)?;
        if let Some(subject) = subject {
            state.draft.subject = subject;
        }
        if let Some(body) = body {
            state.draft.body = body;
        }
        Ok(state.draft.clone())
    }

    /// Persist the notice and hand back the mail draft. On failure the session
    /// stays in review with the draft intact.
    pub async fn send(&self, context: &ComposeContext) -> Result<SendReceipt, ComposeError> {
        if self.sending.swap(true, Ordering::AcqRel) {
            return Err(ComposeError::SendInProgress);
        }
        let _guard = SendGuard(&self.sending);

        let (officer, new_notice) = {
            let state = self.state();
            state.expect_step("send", ComposerStep::ReviewAndSend)?;
            ValidationError::missing(state.missing_for_send()).check()?;
            let officer = state
                .officer
                .clone()
                .ok_or_else(|| ValidationError::missing(vec!["officer"]))?;
            let new_notice = NewNotice::addressed_to(
                &officer,
                state.template.as_ref().map(|template| template.id),
                state.draft.subject.clone(),
                state.draft.body.clone(),
                context.operator.clone(),
            );
            (officer, new_notice)
        };

        let notice = match self.notices.create(new_notice).await {
            Ok(notice) => notice,
            Err(err) => {
                warn!(officer_id = %officer.id, error = %err, "notice send failed");
                return Err(err.into());
            }
        };

        let mail = MailDraft::compose(&officer.email, &notice.subject, &notice.body);
        *self.state() = SessionState::default();
        info!(
            notice_id = %notice.id,
            officer_id = %officer.id,
            state = %notice.state,
            "notice sent"
        );

        Ok(SendReceipt { notice, mail })
    }

    /// Abandon the session. Nothing has been persisted before `send`.
    pub fn reset(&self) {
        *self.state() = SessionState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn steps_walk_in_order() {
        assert_eq!(
            ComposerStep::SelectRecipient.next(),
            Some(ComposerStep::SelectTemplate)
        );
        assert_eq!(ComposerStep::ReviewAndSend.next(), None);
        assert_eq!(ComposerStep::SelectRecipient.previous(), None);
        assert!(ComposerStep::SelectTemplate < ComposerStep::ReviewAndSend);
        assert_eq!(ComposerStep::ReviewAndSend.number(), 3);
    }

    #[test]
    fn mail_draft_percent_encodes_subject_and_body() {
        let mail = MailDraft::compose(
            "jane@police.nsw.gov.au",
            "Notice & Demand",
            "Dear Jane,\nPay 100%",
        );
        assert_eq!(mail.subject, "Notice%20%26%20Demand");
        assert_eq!(mail.body, "Dear%20Jane%2C%0APay%20100%25");
        assert_eq!(
            mail.mailto_uri(),
            "mailto:jane@police.nsw.gov.au?subject=Notice%20%26%20Demand&body=Dear%20Jane%2C%0APay%20100%25"
        );
    }

    #[test]
    fn notice_date_uses_configured_format() {
        let offset = FixedOffset::east_opt(10 * 3600).expect("valid offset");
        let context = ComposeContext {
            operator: "Current User".to_string(),
            sender_name: "Living Council Member".to_string(),
            now: offset.with_ymd_and_hms(2026, 7, 4, 8, 30, 0).unwrap(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        };
        assert_eq!(context.notice_date(), "4/7/2026");

        let iso = ComposeContext {
            date_format: "%Y-%m-%d".to_string(),
            ..context
        };
        assert_eq!(iso.notice_date(), "2026-07-04");
    }
}
