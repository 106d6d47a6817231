mod dashboard;
mod export;
mod filter;
pub mod views;

pub use dashboard::{DashboardSummary, RecentNotice, RECENT_NOTICE_LIMIT};
pub use export::{
    read_report_csv, CsvExport, CsvQuoting, ExportedRow, ReportError, CSV_HEADER,
    DATE_SENT_FORMAT,
};
pub use filter::{DateRange, InvalidDateRange, ReportFilter};
pub use views::{NoticeReport, NoticeReportRow, ReportFacets};
