use super::super::domain::Region;
use super::views::NoticeReportRow;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// How far back the report looks. Parsed from `"all"` or a positive day count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange", into = "String")]
pub enum DateRange {
    #[default]
    AllTime,
    LastDays(u32),
}

impl DateRange {
    /// Earliest qualifying `sent_at`. A window reaching past the calendar's
    /// range has no cutoff.
    pub fn cutoff(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::AllTime => None,
            Self::LastDays(days) => Duration::try_days(i64::from(days))
                .and_then(|window| now.checked_sub_signed(window)),
        }
    }

    pub fn label(self) -> String {
        match self {
            Self::AllTime => "All Time".to_string(),
            Self::LastDays(days) => format!("Last {days} Days"),
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllTime => f.write_str("all"),
            Self::LastDays(days) => write!(f, "{days}"),
        }
    }
}

impl From<DateRange> for String {
    fn from(range: DateRange) -> Self {
        range.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("date range must be 'all' or a positive number of days, got '{0}'")]
pub struct InvalidDateRange(pub String);

impl FromStr for DateRange {
    type Err = InvalidDateRange;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::AllTime);
        }
        match trimmed.parse::<u32>() {
            Ok(days) if days > 0 => Ok(Self::LastDays(days)),
            _ => Err(InvalidDateRange(trimmed.to_string())),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDateRange {
    Days(u32),
    Text(String),
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = InvalidDateRange;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        match raw {
            RawDateRange::Days(0) => Err(InvalidDateRange("0".to_string())),
            RawDateRange::Days(days) => Ok(Self::LastDays(days)),
            RawDateRange::Text(text) => text.parse(),
        }
    }
}

/// Report criteria. Every active predicate must hold; blank text is inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportFilter {
    pub search: Option<String>,
    #[serde(deserialize_with = "blank_region_as_none")]
    pub state: Option<Region>,
    pub organization: Option<String>,
    pub date_range: DateRange,
}

impl ReportFilter {
    pub fn is_active(&self) -> bool {
        active_text(self.search.as_deref()).is_some()
            || self.state.is_some()
            || active_text(self.organization.as_deref()).is_some()
            || self.date_range != DateRange::AllTime
    }

    pub fn matches(&self, row: &NoticeReportRow, now: DateTime<Utc>) -> bool {
        if let Some(term) = active_text(self.search.as_deref()) {
            let term = term.to_lowercase();
            let hit = [&row.recipient_name, &row.organization, &row.subject]
                .iter()
                .any(|field| field.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }

        if let Some(state) = self.state {
            if row.state != state {
                return false;
            }
        }

        if let Some(organization) = active_text(self.organization.as_deref()) {
            if !row
                .organization
                .to_lowercase()
                .contains(&organization.to_lowercase())
            {
                return false;
            }
        }

        match self.date_range.cutoff(now) {
            Some(cutoff) => row.sent_at >= cutoff,
            None => true,
        }
    }

    /// Filter, then order newest first with ties broken by descending id.
    pub fn apply(&self, rows: &[NoticeReportRow], now: DateTime<Utc>) -> Vec<NoticeReportRow> {
        let mut matched: Vec<NoticeReportRow> = rows
            .iter()
            .filter(|row| self.matches(row, now))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.sent_at.cmp(&a.sent_at).then(b.id.cmp(&a.id)));
        matched
    }
}

fn active_text(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}

fn blank_region_as_none<'de, D>(deserializer: D) -> Result<Option<Region>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(code) => code.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
