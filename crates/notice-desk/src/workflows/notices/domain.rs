use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use super::repository::Entity;
use super::template::extract_variables;

pub const DEFAULT_TEMPLATE_CATEGORY: &str = "fiduciary";

/// Integer key assigned by a repository. Ids are never reused or rewritten.
pub trait RecordId:
    Copy + Eq + Ord + std::hash::Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    fn from_raw(raw: u64) -> Self;
    fn raw(self) -> u64;
}

macro_rules! record_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl RecordId for $name {
            fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(OfficerId);
record_id!(TemplateId);
record_id!(NoticeId);

/// States and territories an officer can be registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "NSW")]
    Nsw,
    #[serde(rename = "VIC")]
    Vic,
    #[serde(rename = "QLD")]
    Qld,
    #[serde(rename = "WA")]
    Wa,
    #[serde(rename = "SA")]
    Sa,
    #[serde(rename = "TAS")]
    Tas,
    #[serde(rename = "ACT")]
    Act,
    #[serde(rename = "NT")]
    Nt,
}

impl Region {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::Nsw,
            Self::Vic,
            Self::Qld,
            Self::Wa,
            Self::Sa,
            Self::Tas,
            Self::Act,
            Self::Nt,
        ]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::Nsw => "NSW",
            Self::Vic => "VIC",
            Self::Qld => "QLD",
            Self::Wa => "WA",
            Self::Sa => "SA",
            Self::Tas => "TAS",
            Self::Act => "ACT",
            Self::Nt => "NT",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Nsw => "New South Wales",
            Self::Vic => "Victoria",
            Self::Qld => "Queensland",
            Self::Wa => "Western Australia",
            Self::Sa => "South Australia",
            Self::Tas => "Tasmania",
            Self::Act => "Australian Capital Territory",
            Self::Nt => "Northern Territory",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown region code '{0}'")]
pub struct UnknownRegion(pub String);

impl FromStr for Region {
    type Err = UnknownRegion;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ordered()
            .into_iter()
            .find(|region| region.code().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownRegion(trimmed.to_string()))
    }
}

/// Coarse classification shared by every error the notice workflows raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Validation,
    OperationFailed,
}

/// Rejected input; `fields` names every field that blocked the operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}: {}", .fields.join(", "))]
pub struct ValidationError {
    pub reason: &'static str,
    pub fields: Vec<&'static str>,
}

impl ValidationError {
    pub fn missing(fields: Vec<&'static str>) -> Self {
        Self {
            reason: "missing required field(s)",
            fields,
        }
    }

    pub fn invalid(fields: Vec<&'static str>) -> Self {
        Self {
            reason: "missing or invalid field(s)",
            fields,
        }
    }

    pub(crate) fn check(self) -> Result<(), Self> {
        if self.fields.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Officer {
    pub id: OfficerId,
    pub name: String,
    pub organization: String,
    pub state: Region,
    pub branch: Option<String>,
    pub office: Option<String>,
    pub badge_number: Option<String>,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOfficer {
    pub name: String,
    pub organization: String,
    pub state: Region,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub office: Option<String>,
    #[serde(default)]
    pub badge_number: Option<String>,
    pub email: String,
}

impl NewOfficer {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut fields = Vec::new();
        if self.name.trim().is_empty() {
            fields.push("name");
        }
        if self.organization.trim().is_empty() {
            fields.push("organization");
        }
        if !is_plausible_email(&self.email) {
            fields.push("email");
        }
        ValidationError::invalid(fields).check()
    }
}

/// Partial officer update. `Some("")` on an optional field clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfficerPatch {
    pub name: Option<String>,
    pub organization: Option<String>,
    pub state: Option<Region>,
    pub branch: Option<String>,
    pub office: Option<String>,
    pub badge_number: Option<String>,
    pub email: Option<String>,
}

impl OfficerPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut fields = Vec::new();
        if is_blank(self.name.as_deref()) {
            fields.push("name");
        }
        if is_blank(self.organization.as_deref()) {
            fields.push("organization");
        }
        if matches!(self.email.as_deref(), Some(email) if !is_plausible_email(email)) {
            fields.push("email");
        }
        ValidationError::invalid(fields).check()
    }
}

impl Entity for Officer {
    type Id = OfficerId;
    type Draft = NewOfficer;
    type Patch = OfficerPatch;

    const KIND: &'static str = "officer";

    fn id(&self) -> OfficerId {
        self.id
    }

    fn materialize(id: OfficerId, draft: NewOfficer, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            organization: draft.organization,
            state: draft.state,
            branch: non_blank(draft.branch),
            office: non_blank(draft.office),
            badge_number: non_blank(draft.badge_number),
            email: draft.email,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: OfficerPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(organization) = patch.organization {
            self.organization = organization;
        }
        if let Some(state) = patch.state {
            self.state = state;
        }
        if patch.branch.is_some() {
            self.branch = non_blank(patch.branch);
        }
        if patch.office.is_some() {
            self.office = non_blank(patch.office);
        }
        if patch.badge_number.is_some() {
            self.badge_number = non_blank(patch.badge_number);
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub category: String,
    /// Tokens found in `body`, in first-occurrence order.
    pub variables: Vec<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTemplate {
    pub name: String,
    pub subject: String,
    pub body: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub created_by: String,
}

impl NewTemplate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut fields = Vec::new();
        if self.name.trim().is_empty() {
            fields.push("name");
        }
        if self.subject.trim().is_empty() {
            fields.push("subject");
        }
        if self.body.trim().is_empty() {
            fields.push("body");
        }
        ValidationError::missing(fields).check()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub category: Option<String>,
}

impl TemplatePatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut fields = Vec::new();
        if is_blank(self.name.as_deref()) {
            fields.push("name");
        }
        if is_blank(self.subject.as_deref()) {
            fields.push("subject");
        }
        if is_blank(self.body.as_deref()) {
            fields.push("body");
        }
        ValidationError::missing(fields).check()
    }
}

impl Entity for Template {
    type Id = TemplateId;
    type Draft = NewTemplate;
    type Patch = TemplatePatch;

    const KIND: &'static str = "template";

    fn id(&self) -> TemplateId {
        self.id
    }

    fn materialize(id: TemplateId, draft: NewTemplate, now: DateTime<Utc>) -> Self {
        let variables = extract_variables(&draft.body);
        Self {
            id,
            name: draft.name,
            subject: draft.subject,
            body: draft.body,
            category: draft.category,
            variables,
            created_by: draft.created_by,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: TemplatePatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(subject) = patch.subject {
            self.subject = subject;
        }
        if let Some(body) = patch.body {
            self.variables = extract_variables(&body);
            self.body = body;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        self.updated_at = now;
    }
}

/// A sent notice. Organization and state are copies taken from the officer at
/// send time and never follow later officer edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub id: NoticeId,
    pub recipient_id: OfficerId,
    pub template_id: Option<TemplateId>,
    pub subject: String,
    pub body: String,
    pub sent_by: String,
    pub organization: String,
    pub state: Region,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNotice {
    pub recipient_id: OfficerId,
    pub template_id: Option<TemplateId>,
    pub subject: String,
    pub body: String,
    pub sent_by: String,
    pub organization: String,
    pub state: Region,
}

impl NewNotice {
    /// Snapshot the officer's organization and state for a new notice.
    pub fn addressed_to(
        officer: &Officer,
        template_id: Option<TemplateId>,
        subject: impl Into<String>,
        body: impl Into<String>,
        sent_by: impl Into<String>,
    ) -> Self {
        Self {
            recipient_id: officer.id,
            template_id,
            subject: subject.into(),
            body: body.into(),
            sent_by: sent_by.into(),
            organization: officer.organization.clone(),
            state: officer.state,
        }
    }
}

/// Corrections to a stored notice. `sent_at` and the recipient snapshot are fixed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticePatch {
    pub subject: Option<String>,
    pub body: Option<String>,
}

impl Entity for Notice {
    type Id = NoticeId;
    type Draft = NewNotice;
    type Patch = NoticePatch;

    const KIND: &'static str = "notice";

    fn id(&self) -> NoticeId {
        self.id
    }

    fn materialize(id: NoticeId, draft: NewNotice, now: DateTime<Utc>) -> Self {
        Self {
            id,
            recipient_id: draft.recipient_id,
            template_id: draft.template_id,
            subject: draft.subject,
            body: draft.body,
            sent_by: draft.sent_by,
            organization: draft.organization,
            state: draft.state,
            sent_at: now,
        }
    }

    fn apply_patch(&mut self, patch: NoticePatch, _now: DateTime<Utc>) {
        if let Some(subject) = patch.subject {
            self.subject = subject;
        }
        if let Some(body) = patch.body {
            self.body = body;
        }
    }
}

fn default_category() -> String {
    DEFAULT_TEMPLATE_CATEGORY.to_string()
}

fn is_blank(value: Option<&str>) -> bool {
    matches!(value, Some(text) if text.trim().is_empty())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn is_plausible_email(value: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern compiles"))
        .is_match(value.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_officer() -> NewOfficer {
        NewOfficer {
            name: "Jane Citizen".to_string(),
            organization: "NSW Police Force".to_string(),
            state: Region::Nsw,
            branch: Some("  ".to_string()),
            office: None,
            badge_number: Some("4471".to_string()),
            email: "jane.citizen@police.nsw.gov.au".to_string(),
        }
    }

    #[test]
    fn region_parses_codes_case_insensitively() {
        assert_eq!("vic".parse::<Region>(), Ok(Region::Vic));
        assert_eq!(" ACT ".parse::<Region>(), Ok(Region::Act));
        assert_eq!(
            "XYZ".parse::<Region>(),
            Err(UnknownRegion("XYZ".to_string()))
        );
        assert_eq!(Region::Tas.label(), "Tasmania");
    }

    #[test]
    fn region_serializes_as_code() {
        let json = serde_json::to_string(&Region::Qld).expect("serializes");
        assert_eq!(json, "\"QLD\"");
    }

    #[test]
    fn officer_validation_names_every_failing_field() {
        let mut officer = new_officer();
        officer.name = " ".to_string();
        officer.email = "not-an-email".to_string();

        let error = officer.validate().expect_err("invalid officer");
        assert_eq!(error.fields, vec!["name", "email"]);
        assert!(error.to_string().contains("name, email"));
    }

    #[test]
    fn materialized_officer_drops_blank_optionals() {
        let now = Utc::now();
        let officer = Officer::materialize(OfficerId(3), new_officer(), now);
        assert_eq!(officer.branch, None);
        assert_eq!(officer.badge_number.as_deref(), Some("4471"));
        assert_eq!(officer.created_at, officer.updated_at);
    }

    #[test]
    fn template_patch_rederives_variables_from_body() {
        let now = Utc::now();
        let mut template = Template::materialize(
            TemplateId(1),
            NewTemplate {
                name: "Notice of Liability".to_string(),
                subject: "Re: {officer.name}".to_string(),
                body: "Dear {officer.name}".to_string(),
                category: default_category(),
                created_by: "Current User".to_string(),
            },
            now,
        );
        assert_eq!(template.variables, vec!["officer.name"]);

        template.apply_patch(
            TemplatePatch {
                body: Some("{notice.date} - {officer.office}".to_string()),
                ..TemplatePatch::default()
            },
            now,
        );
        assert_eq!(template.variables, vec!["notice.date", "officer.office"]);
    }

    #[test]
    fn template_validation_reports_missing_fields() {
        let template = NewTemplate {
            name: "Fee schedule".to_string(),
            subject: String::new(),
            body: "\n".to_string(),
            category: default_category(),
            created_by: "Current User".to_string(),
        };
        let error = template.validate().expect_err("missing subject and body");
        assert_eq!(error.fields, vec!["subject", "body"]);
    }
}
