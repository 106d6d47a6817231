use metrics_exporter_prometheus::PrometheusHandle;
use notice_desk::config::{NoticeConfig, ReportConfig};
use notice_desk::workflows::notices::{
    Clock, ComposeContext, DateRange, InMemoryRepository, NewOfficer, NewTemplate, Notice,
    NoticeComposer, NoticeReportRow, NoticeRepository, Officer, OfficerRepository, Region,
    RepositoryError, Template, TemplateRepository, DEFAULT_TEMPLATE_CATEGORY,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Repositories, the operator's composition session, and the settings the
/// handlers need to build compose contexts and exports.
#[derive(Clone)]
pub(crate) struct DeskState {
    pub(crate) officers: Arc<OfficerRepository>,
    pub(crate) templates: Arc<TemplateRepository>,
    pub(crate) notices: Arc<NoticeRepository>,
    pub(crate) composer: Arc<NoticeComposer>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) notice_config: NoticeConfig,
    pub(crate) report_config: ReportConfig,
}

impl DeskState {
    pub(crate) fn in_memory(
        clock: Arc<dyn Clock>,
        notice_config: NoticeConfig,
        report_config: ReportConfig,
    ) -> Self {
        let officers: Arc<OfficerRepository> =
            Arc::new(InMemoryRepository::<Officer>::new(clock.clone()));
        let templates: Arc<TemplateRepository> =
            Arc::new(InMemoryRepository::<Template>::new(clock.clone()));
        let notices: Arc<NoticeRepository> =
            Arc::new(InMemoryRepository::<Notice>::new(clock.clone()));
        let composer = Arc::new(NoticeComposer::new(
            officers.clone(),
            templates.clone(),
            notices.clone(),
        ));

        Self {
            officers,
            templates,
            notices,
            composer,
            clock,
            notice_config,
            report_config,
        }
    }

    /// Load the sample officer and template directory.
    pub(crate) async fn seed(&self) -> Result<(), RepositoryError> {
        for officer in sample_officers() {
            self.officers.create(officer).await?;
        }
        for template in sample_templates(&self.notice_config.operator) {
            self.templates.create(template).await?;
        }
        Ok(())
    }

    pub(crate) fn context(&self) -> ComposeContext {
        self.notice_config.context(self.clock.now())
    }

    pub(crate) async fn report_rows(&self) -> Result<Vec<NoticeReportRow>, RepositoryError> {
        let notices = self.notices.get_all().await?;
        let officers = self.officers.get_all().await?;
        let templates = self.templates.get_all().await?;
        Ok(NoticeReportRow::join(&notices, &officers, &templates))
    }
}

pub(crate) fn sample_officers() -> Vec<NewOfficer> {
    vec![
        NewOfficer {
            name: "Jane Citizen".to_string(),
            organization: "NSW Police Force".to_string(),
            state: Region::Nsw,
            branch: Some("Traffic and Highway Patrol".to_string()),
            office: Some("Parramatta".to_string()),
            badge_number: Some("4471".to_string()),
            email: "jane.citizen@police.nsw.gov.au".to_string(),
        },
        NewOfficer {
            name: "Sam Ward".to_string(),
            organization: "Victoria Police".to_string(),
            state: Region::Vic,
            branch: None,
            office: Some("Melbourne East".to_string()),
            badge_number: Some("VP-20931".to_string()),
            email: "sam.ward@police.vic.gov.au".to_string(),
        },
        NewOfficer {
            name: "Alex Brennan".to_string(),
            organization: "Brisbane City Council".to_string(),
            state: Region::Qld,
            branch: Some("Compliance and Regulatory Services".to_string()),
            office: None,
            badge_number: None,
            email: "alex.brennan@brisbane.qld.gov.au".to_string(),
        },
    ]
}

pub(crate) fn sample_templates(created_by: &str) -> Vec<NewTemplate> {
    vec![
        NewTemplate {
            name: "Notice of Fiduciary Obligation".to_string(),
            subject: "Notice of Fiduciary Obligation: {officer.name}".to_string(),
            body: "Dear {officer.name},\n\n\
                   As an officer of {officer.organization} ({officer.state}), badge \
                   {officer.badgeNumber}, you hold a position of public trust.\n\n\
                   This notice is issued on {notice.date}.\n\n\
                   Regards,\n{sender.name}"
                .to_string(),
            category: DEFAULT_TEMPLATE_CATEGORY.to_string(),
            created_by: created_by.to_string(),
        },
        NewTemplate {
            name: "Request for Identification".to_string(),
            subject: "Request for identification from {officer.office}".to_string(),
            body: "To {officer.name} of {officer.branch},\n\n\
                   Please provide your full name, badge number and the lawful authority \
                   under which you acted.\n\n{sender.name}, {notice.date}"
                .to_string(),
            category: "identification".to_string(),
            created_by: created_by.to_string(),
        },
    ]
}

pub(crate) fn parse_region(raw: &str) -> Result<Region, String> {
    raw.parse::<Region>().map_err(|err| err.to_string())
}

pub(crate) fn parse_date_range(raw: &str) -> Result<DateRange, String> {
    raw.parse::<DateRange>().map_err(|err| err.to_string())
}
