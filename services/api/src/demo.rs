use crate::infra::DeskState;
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use notice_desk::config::AppConfig;
use notice_desk::error::AppError;
use notice_desk::workflows::notices::{
    Clock, ComposerSnapshot, CsvQuoting, DashboardSummary, DateRange, ManualClock, NewNotice,
    NoticeReport, NoticeReportRow, OfficerId, Region, ReportFilter, SendReceipt, TemplateId,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Notices replayed into the in-memory store before a demo or report:
/// (officer, template, days before now).
const SAMPLE_HISTORY: [(u64, Option<u64>, i64); 4] = [
    (1, Some(1), 40),
    (2, Some(2), 12),
    (3, Some(1), 3),
    (2, None, 1),
];

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Officer to address in the walkthrough
    #[arg(long, default_value_t = 1)]
    pub(crate) officer: u64,
    /// Template used to render the walkthrough draft
    #[arg(long, default_value_t = 1)]
    pub(crate) template: u64,
    /// Print the rendered body in full instead of the first line
    #[arg(long)]
    pub(crate) full_body: bool,
    /// Skip replaying the sample notice history before the walkthrough
    #[arg(long)]
    pub(crate) skip_history: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ReportArgs {
    /// Case-insensitive match on recipient, organization or subject
    #[arg(long)]
    pub(crate) search: Option<String>,
    /// State or territory code (NSW, VIC, QLD, WA, SA, TAS, ACT, NT)
    #[arg(long, value_parser = crate::infra::parse_region)]
    pub(crate) state: Option<Region>,
    /// Case-insensitive match on organization
    #[arg(long)]
    pub(crate) organization: Option<String>,
    /// Only include notices sent in the last N days ("all" for no limit)
    #[arg(long, value_parser = crate::infra::parse_date_range)]
    pub(crate) days: Option<DateRange>,
    /// Write the CSV export to this path instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Override the configured CSV quoting (legacy or rfc4180)
    #[arg(long)]
    pub(crate) quoting: Option<CsvQuoting>,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        officer,
        template,
        full_body,
        skip_history,
    } = args;

    let config = AppConfig::load()?;
    let now = Utc::now();
    let (desk, clock) = seeded_desk(&config, now).await?;
    if !skip_history {
        replay_history(&desk, &clock, now).await?;
    }
    clock.set(now);

    println!("Notice composition demo");
    println!(
        "Operator: {} | signing as {}",
        desk.notice_config.operator, desk.notice_config.sender_name
    );

    let composer = &desk.composer;
    render_snapshot(&composer.snapshot());

    let selected = composer.select_officer(OfficerId(officer)).await?;
    println!(
        "- Recipient: {} ({}, {}) <{}>",
        selected.name, selected.organization, selected.state, selected.email
    );
    composer.advance()?;
    render_snapshot(&composer.snapshot());

    let context = desk.context();
    let draft = composer.select_template(TemplateId(template), &context).await?;
    println!("- Subject: {}", draft.subject);
    if full_body {
        println!("- Body:\n{}", draft.body);
    } else {
        let first_line = draft.body.lines().next().unwrap_or_default();
        println!("- Body: {} ...", first_line);
    }
    composer.advance()?;
    render_snapshot(&composer.snapshot());

    let receipt = composer.send(&context).await?;
    render_receipt(&receipt);
    render_snapshot(&composer.snapshot());

    let rows = desk.report_rows().await?;
    let filter = ReportFilter {
        date_range: DateRange::LastDays(30),
        ..ReportFilter::default()
    };
    let filtered = filter.apply(&rows, desk.clock.now());
    render_report(&NoticeReport::build(&rows, filtered), &filter);

    let officers = desk.officers.get_all().await?;
    let templates = desk.templates.get_all().await?;
    let notices = desk.notices.get_all().await?;
    render_dashboard(&DashboardSummary::build(&officers, &templates, &notices));

    Ok(())
}

pub(crate) async fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs {
        search,
        state,
        organization,
        days,
        output,
        quoting,
    } = args;

    let config = AppConfig::load()?;
    let now = Utc::now();
    let (desk, clock) = seeded_desk(&config, now).await?;
    replay_history(&desk, &clock, now).await?;
    clock.set(now);

    let filter = ReportFilter {
        search,
        state,
        organization,
        date_range: days.unwrap_or_default(),
    };
    let rows = filter.apply(&desk.report_rows().await?, now);

    let mut export = desk.report_config.csv_export();
    if let Some(quoting) = quoting {
        export.quoting = quoting;
    }

    match output {
        Some(path) => {
            let file = std::fs::File::create(&path)?;
            export.write(&rows, file)?;
            println!(
                "Wrote {} notice(s) to {} ({})",
                rows.len(),
                path.display(),
                filter.date_range.label()
            );
        }
        None => {
            println!("{}", export.render(&rows)?);
            eprintln!("Suggested file name: {}", export.file_name(now));
        }
    }

    Ok(())
}

async fn seeded_desk(
    config: &AppConfig,
    now: DateTime<Utc>,
) -> Result<(DeskState, Arc<ManualClock>), AppError> {
    let clock = Arc::new(ManualClock::new(now - Duration::days(SAMPLE_HISTORY[0].2 + 5)));
    let desk = DeskState::in_memory(clock.clone(), config.notices.clone(), config.reports.clone());
    desk.seed().await?;
    Ok((desk, clock))
}

async fn replay_history(
    desk: &DeskState,
    clock: &ManualClock,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let composer = &desk.composer;
    for (officer, template, days_ago) in SAMPLE_HISTORY {
        clock.set(now - Duration::days(days_ago));
        match template {
            Some(template) => {
                composer.select_officer(OfficerId(officer)).await?;
                composer.advance()?;
                composer
                    .select_template(TemplateId(template), &desk.context())
                    .await?;
                composer.advance()?;
                composer.send(&desk.context()).await?;
            }
            None => {
                // Hand-written notices bypass the composer and carry no template.
                let recipient = desk.officers.get_by_id(OfficerId(officer)).await?;
                desk.notices
                    .create(NewNotice::addressed_to(
                        &recipient,
                        None,
                        "Notice of Claim",
                        format!("Dear {},\n\nPlease find my claim enclosed.", recipient.name),
                        desk.notice_config.operator.clone(),
                    ))
                    .await?;
            }
        }
    }
    Ok(())
}

fn render_snapshot(snapshot: &ComposerSnapshot) {
    println!("\nStep {} of 3: {}", snapshot.step_number, snapshot.step_label);
    println!(
        "  can advance: {} | can send: {}",
        yes_no(snapshot.can_advance),
        yes_no(snapshot.can_send)
    );
}

fn render_receipt(receipt: &SendReceipt) {
    println!(
        "- Recorded notice #{} to {} at {}",
        receipt.notice.id,
        receipt.mail.to,
        receipt.notice.sent_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!(
        "  Snapshot: {} ({})",
        receipt.notice.organization, receipt.notice.state
    );
    println!("  Mail link: {}", receipt.mail.mailto_uri());
}

fn render_report(report: &NoticeReport, filter: &ReportFilter) {
    println!(
        "\nNotice report ({}): {} of {} notice(s)",
        filter.date_range.label(),
        report.matched,
        report.total
    );
    for row in &report.rows {
        render_report_row(row);
    }
    let states: Vec<&str> = report.facets.states.iter().map(|state| state.code()).collect();
    println!("States on record: {}", states.join(", "));
    println!(
        "Organizations on record: {}",
        report.facets.organizations.join(", ")
    );
}

fn render_report_row(row: &NoticeReportRow) {
    println!(
        "- {} | {} | {} ({}) | {} | {}",
        row.sent_at.format("%Y-%m-%d"),
        row.recipient_name,
        row.organization,
        row.state,
        row.subject,
        row.template_name
    );
}

fn render_dashboard(summary: &DashboardSummary) {
    println!("\nDashboard");
    println!(
        "- {} officers | {} templates | {} notices sent",
        summary.total_officers, summary.total_templates, summary.total_notices
    );
    if summary.recent_notices.is_empty() {
        println!("Recent notices: none");
        return;
    }
    println!("Recent notices");
    for notice in &summary.recent_notices {
        println!(
            "- {} to {} ({}) on {}",
            notice.subject,
            notice.recipient_name,
            notice.recipient_organization,
            notice.sent_at.format("%Y-%m-%d")
        );
    }
}

const fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
