//! Notice tracking: officer and template records, guided notice composition,
//! and reporting over sent notices.

pub mod clock;
pub mod composer;
pub mod directory;
pub mod domain;
pub mod report;
pub mod repository;
pub mod store;
pub mod template;

#[cfg(test)]
mod tests;

pub use clock::{Clock, ManualClock, SystemClock};
pub use composer::{
    ComposeContext, ComposeError, ComposerSnapshot, ComposerStep, Draft, MailDraft,
    NoticeComposer, SendReceipt, DEFAULT_DATE_FORMAT,
};
pub use directory::{officer_matches, search_officers, search_templates, template_matches};
pub use domain::{
    ErrorKind, NewNotice, NewOfficer, NewTemplate, Notice, NoticeId, NoticePatch, Officer,
    OfficerId, OfficerPatch, RecordId, Region, Template, TemplateId, TemplatePatch,
    UnknownRegion, ValidationError, DEFAULT_TEMPLATE_CATEGORY,
};
pub use report::{
    CsvExport, CsvQuoting, DashboardSummary, DateRange, NoticeReport, NoticeReportRow,
    ReportError, ReportFacets, ReportFilter,
};
pub use repository::{
    Entity, NoticeRepository, OfficerRepository, Repository, RepositoryError,
    TemplateRepository,
};
pub use store::InMemoryRepository;
pub use template::{extract_variables, substitute, Bindings, BINDING_NAMES};
