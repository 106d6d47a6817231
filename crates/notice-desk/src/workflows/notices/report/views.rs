use super::super::domain::{Notice, NoticeId, Officer, OfficerId, Region, Template, TemplateId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

pub const UNKNOWN_OFFICER: &str = "Unknown Officer";
pub const CUSTOM_TEMPLATE: &str = "Custom Template";

/// A notice denormalized with its recipient and template names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoticeReportRow {
    pub id: NoticeId,
    pub recipient_id: OfficerId,
    pub recipient_name: String,
    pub recipient_email: String,
    pub template_id: Option<TemplateId>,
    pub template_name: String,
    pub subject: String,
    pub body: String,
    pub sent_by: String,
    pub organization: String,
    pub state: Region,
    pub state_label: &'static str,
    pub sent_at: DateTime<Utc>,
}

impl NoticeReportRow {
    /// One row per notice, in the order given. Dangling references fall back to
    /// placeholder names rather than dropping the notice.
    pub fn join(notices: &[Notice], officers: &[Officer], templates: &[Template]) -> Vec<Self> {
        let officers: HashMap<OfficerId, &Officer> =
            officers.iter().map(|officer| (officer.id, officer)).collect();
        let templates: HashMap<TemplateId, &Template> = templates
            .iter()
            .map(|template| (template.id, template))
            .collect();

        notices
            .iter()
            .map(|notice| {
                let officer = officers.get(&notice.recipient_id);
                let template_name = notice
                    .template_id
                    .and_then(|id| templates.get(&id))
                    .map(|template| template.name.clone())
                    .unwrap_or_else(|| CUSTOM_TEMPLATE.to_string());

                Self {
                    id: notice.id,
                    recipient_id: notice.recipient_id,
                    recipient_name: officer
                        .map(|officer| officer.name.clone())
                        .unwrap_or_else(|| UNKNOWN_OFFICER.to_string()),
                    recipient_email: officer
                        .map(|officer| officer.email.clone())
                        .unwrap_or_default(),
                    template_id: notice.template_id,
                    template_name,
                    subject: notice.subject.clone(),
                    body: notice.body.clone(),
                    sent_by: notice.sent_by.clone(),
                    organization: notice.organization.clone(),
                    state: notice.state,
                    state_label: notice.state.label(),
                    sent_at: notice.sent_at,
                }
            })
            .collect()
    }
}

/// Distinct values available to the report's filter pickers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportFacets {
    pub states: Vec<Region>,
    pub organizations: Vec<String>,
}

impl ReportFacets {
    pub fn from_rows(rows: &[NoticeReportRow]) -> Self {
        let states: BTreeSet<Region> = rows.iter().map(|row| row.state).collect();
        let organizations: BTreeSet<&str> = rows
            .iter()
            .map(|row| row.organization.as_str())
            .filter(|organization| !organization.trim().is_empty())
            .collect();

        Self {
            states: states.into_iter().collect(),
            organizations: organizations.into_iter().map(str::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NoticeReport {
    pub total: usize,
    pub matched: usize,
    pub rows: Vec<NoticeReportRow>,
    pub facets: ReportFacets,
}

impl NoticeReport {
    /// `rows` is the filtered view; facets and `total` come from `all`.
    pub fn build(all: &[NoticeReportRow], rows: Vec<NoticeReportRow>) -> Self {
        Self {
            total: all.len(),
            matched: rows.len(),
            facets: ReportFacets::from_rows(all),
            rows,
        }
    }
}
