use super::views::NoticeReportRow;
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::str::FromStr;

pub const CSV_HEADER: [&str; 7] = [
    "Date Sent",
    "Recipient Name",
    "Organization",
    "State",
    "Subject",
    "Template Used",
    "Sent By",
];

pub const DATE_SENT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// How CSV cells are quoted. Both styles wrap every cell in double quotes and
/// separate records with `\n` without a trailing terminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsvQuoting {
    /// Cells are wrapped verbatim; embedded quotes are not escaped.
    #[default]
    Legacy,
    /// Embedded quotes are doubled.
    Rfc4180,
}

impl FromStr for CsvQuoting {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "rfc4180" | "rfc-4180" => Ok(Self::Rfc4180),
            other => Err(format!("unsupported csv quoting '{other}'")),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("report is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Clone, Copy)]
pub struct CsvExport {
    pub quoting: CsvQuoting,
    /// Offset used to render `Date Sent`.
    pub offset: FixedOffset,
}

impl Default for CsvExport {
    fn default() -> Self {
        Self {
            quoting: CsvQuoting::default(),
            offset: Utc.fix(),
        }
    }
}

impl CsvExport {
    pub fn new(quoting: CsvQuoting, offset: FixedOffset) -> Self {
        Self { quoting, offset }
    }

    pub fn write<W: Write>(
        &self,
        rows: &[NoticeReportRow],
        mut writer: W,
    ) -> Result<(), ReportError> {
        let records = std::iter::once(CSV_HEADER.map(str::to_string))
            .chain(rows.iter().map(|row| self.record(row)));

        match self.quoting {
            CsvQuoting::Legacy => {
                for (index, record) in records.enumerate() {
                    if index > 0 {
                        writer.write_all(b"\n")?;
                    }
                    let line = record
                        .iter()
                        .map(|cell| format!("\"{cell}\""))
                        .collect::<Vec<_>>()
                        .join(",");
                    writer.write_all(line.as_bytes())?;
                }
            }
            CsvQuoting::Rfc4180 => {
                let mut csv_writer = csv::WriterBuilder::new()
                    .quote_style(csv::QuoteStyle::Always)
                    .terminator(csv::Terminator::Any(b'\n'))
                    .from_writer(Vec::new());
                for record in records {
                    csv_writer.write_record(&record)?;
                }
                let mut buffer = csv_writer
                    .into_inner()
                    .map_err(|err| ReportError::Io(err.into_error()))?;
                if buffer.last() == Some(&b'\n') {
                    buffer.pop();
                }
                writer.write_all(&buffer)?;
            }
        }

        writer.flush()?;
        Ok(())
    }

    pub fn render(&self, rows: &[NoticeReportRow]) -> Result<String, ReportError> {
        let mut buffer = Vec::new();
        self.write(rows, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    pub fn file_name(&self, now: DateTime<Utc>) -> String {
        Self::file_name_for(now.with_timezone(&self.offset).date_naive())
    }

    pub fn file_name_for(date: NaiveDate) -> String {
        format!("notice_report_{}.csv", date.format("%Y-%m-%d"))
    }

    fn record(&self, row: &NoticeReportRow) -> [String; 7] {
        [
            row.sent_at
                .with_timezone(&self.offset)
                .format(DATE_SENT_FORMAT)
                .to_string(),
            row.recipient_name.clone(),
            row.organization.clone(),
            row.state.code().to_string(),
            row.subject.clone(),
            row.template_name.clone(),
            row.sent_by.clone(),
        ]
    }
}

/// One record of an exported report, as read back from CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedRow {
    #[serde(rename = "Date Sent")]
    pub date_sent: String,
    #[serde(rename = "Recipient Name")]
    pub recipient_name: String,
    #[serde(rename = "Organization")]
    pub organization: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Template Used")]
    pub template_used: String,
    #[serde(rename = "Sent By")]
    pub sent_by: String,
}

/// Parse an export. Legacy exports only read back cleanly when no cell
/// contains a double quote.
pub fn read_report_csv<R: Read>(reader: R) -> Result<Vec<ExportedRow>, ReportError> {
    let mut csv_reader = csv::ReaderBuilder::new().from_reader(reader);
    let mut rows = Vec::new();
    for record in csv_reader.deserialize::<ExportedRow>() {
        rows.push(record?);
    }
    Ok(rows)
}
