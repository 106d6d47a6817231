use super::super::domain::{Notice, NoticeId, Officer, OfficerId, Region, Template};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

pub const RECENT_NOTICE_LIMIT: usize = 5;

const UNKNOWN_OFFICER: &str = "Unknown Officer";
const UNKNOWN_ORGANIZATION: &str = "Unknown Organization";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentNotice {
    pub id: NoticeId,
    pub recipient_id: OfficerId,
    pub recipient_name: String,
    /// The officer's current organization, not the snapshot on the notice.
    pub recipient_organization: String,
    pub subject: String,
    pub state: Region,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub total_officers: usize,
    pub total_templates: usize,
    pub total_notices: usize,
    pub recent_notices: Vec<RecentNotice>,
}

impl DashboardSummary {
    pub fn build(officers: &[Officer], templates: &[Template], notices: &[Notice]) -> Self {
        let by_id: HashMap<OfficerId, &Officer> =
            officers.iter().map(|officer| (officer.id, officer)).collect();

        let mut recent: Vec<&Notice> = notices.iter().collect();
        recent.sort_by(|a, b| b.sent_at.cmp(&a.sent_at).then(b.id.cmp(&a.id)));

        let recent_notices = recent
            .into_iter()
            .take(RECENT_NOTICE_LIMIT)
            .map(|notice| {
                let officer = by_id.get(&notice.recipient_id);
                RecentNotice {
                    id: notice.id,
                    recipient_id: notice.recipient_id,
                    recipient_name: officer
                        .map(|officer| officer.name.clone())
                        .unwrap_or_else(|| UNKNOWN_OFFICER.to_string()),
                    recipient_organization: officer
                        .map(|officer| officer.organization.clone())
                        .unwrap_or_else(|| UNKNOWN_ORGANIZATION.to_string()),
                    subject: notice.subject.clone(),
                    state: notice.state,
                    sent_at: notice.sent_at,
                }
            })
            .collect();

        Self {
            total_officers: officers.len(),
            total_templates: templates.len(),
            total_notices: notices.len(),
            recent_notices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn notice(id: u64, recipient: u64, hours_after: i64) -> Notice {
        Notice {
            id: NoticeId(id),
            recipient_id: OfficerId(recipient),
            template_id: None,
            subject: format!("Notice {id}"),
            body: String::new(),
            sent_by: "Current User".to_string(),
            organization: "Snapshot Org".to_string(),
            state: Region::Qld,
            sent_at: Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap()
                + Duration::hours(hours_after),
        }
    }

    #[test]
    fn recent_notices_are_the_five_newest() {
        let notices: Vec<Notice> = (1..=7).map(|id| notice(id, 1, id as i64)).collect();
        let summary = DashboardSummary::build(&[], &[], &notices);

        assert_eq!(summary.total_notices, 7);
        let ids: Vec<u64> = summary.recent_notices.iter().map(|n| n.id.0).collect();
        assert_eq!(ids, vec![7, 6, 5, 4, 3]);
        assert_eq!(summary.recent_notices[0].recipient_name, "Unknown Officer");
        assert_eq!(
            summary.recent_notices[0].recipient_organization,
            "Unknown Organization"
        );
    }
}
