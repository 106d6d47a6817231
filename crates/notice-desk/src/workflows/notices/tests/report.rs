use super::common::*;
use crate::workflows::notices::clock::Clock;
use crate::workflows::notices::domain::{OfficerId, Region, TemplateId};
use crate::workflows::notices::report::{
    read_report_csv, CsvExport, CsvQuoting, DashboardSummary, DateRange, NoticeReport,
    NoticeReportRow, ReportFilter,
};
use crate::workflows::notices::repository::Repository;
use chrono::Duration;

async fn send_to(desk: &Desk, officer: u64, template: u64) {
    let composer = desk.composer();
    composer
        .select_officer(OfficerId(officer))
        .await
        .expect("officer");
    composer.advance().expect("officer selected");
    composer
        .select_template(TemplateId(template), &desk.context())
        .await
        .expect("template");
    composer.advance().expect("template selected");
    composer.send(&desk.context()).await.expect("send");
}

async fn rows(desk: &Desk) -> Vec<NoticeReportRow> {
    NoticeReportRow::join(
        &desk.notices.get_all().await.expect("notices"),
        &desk.officers.get_all().await.expect("officers"),
        &desk.templates.get_all().await.expect("templates"),
    )
}

/// Three notices: Jane 40 days ago, Sam 10 days ago, Jane today.
async fn history() -> Desk {
    let desk = Desk::seeded().await;
    send_to(&desk, 1, 1).await;
    desk.clock.advance(Duration::days(30));
    send_to(&desk, 2, 2).await;
    desk.clock.advance(Duration::days(10));
    send_to(&desk, 1, 2).await;
    desk
}

#[tokio::test]
async fn report_filters_and_orders_sent_notices() {
    let desk = history().await;
    let all = rows(&desk).await;
    let now = desk.clock.now();

    let everything = ReportFilter::default().apply(&all, now);
    let ids: Vec<u64> = everything.iter().map(|row| row.id.0).collect();
    assert_eq!(ids, vec![3, 2, 1]);

    let recent = ReportFilter {
        date_range: DateRange::LastDays(30),
        ..ReportFilter::default()
    }
    .apply(&all, now);
    assert_eq!(recent.len(), 2);

    let jane_in_nsw = ReportFilter {
        search: Some("jane".to_string()),
        state: Some(Region::Nsw),
        ..ReportFilter::default()
    }
    .apply(&all, now);
    assert_eq!(jane_in_nsw.len(), 2);
    assert!(jane_in_nsw
        .iter()
        .all(|row| row.recipient_name == "Jane Citizen"));

    let report = NoticeReport::build(&all, recent);
    assert_eq!(report.total, 3);
    assert_eq!(report.matched, 2);
    assert_eq!(report.facets.states, vec![Region::Nsw, Region::Vic]);
}

#[tokio::test]
async fn deleted_records_fall_back_to_placeholder_names() {
    let desk = history().await;
    desk.officers.delete(OfficerId(2)).await.expect("delete sam");
    desk.templates
        .delete(TemplateId(2))
        .await
        .expect("delete template");

    let all = rows(&desk).await;
    let sams = all
        .iter()
        .find(|row| row.recipient_id == OfficerId(2))
        .expect("notice survives officer deletion");
    assert_eq!(sams.recipient_name, "Unknown Officer");
    assert_eq!(sams.template_name, "Custom Template");
    assert_eq!(sams.organization, "Victoria Police");
}

#[tokio::test]
async fn csv_export_reads_back_in_report_order() {
    let desk = history().await;
    let all = rows(&desk).await;
    let ordered = ReportFilter::default().apply(&all, desk.clock.now());

    let export = CsvExport::new(CsvQuoting::Rfc4180, brisbane());
    let csv = export.render(&ordered).expect("export");
    let parsed = read_report_csv(csv.as_bytes()).expect("read back");

    assert_eq!(parsed.len(), 3);
    assert_eq!(parsed[0].recipient_name, "Jane Citizen");
    assert_eq!(parsed[0].template_used, "Notice of Liability");
    assert_eq!(parsed[1].state, "VIC");
    assert_eq!(parsed[2].date_sent, "2026-03-02 19:00:00");
    assert_eq!(parsed[2].sent_by, OPERATOR);
    assert_eq!(
        export.file_name(desk.clock.now()),
        "notice_report_2026-04-11.csv"
    );
}

#[tokio::test]
async fn dashboard_reflects_current_officer_details() {
    let desk = history().await;
    let summary = DashboardSummary::build(
        &desk.officers.get_all().await.expect("officers"),
        &desk.templates.get_all().await.expect("templates"),
        &desk.notices.get_all().await.expect("notices"),
    );

    assert_eq!(summary.total_officers, 2);
    assert_eq!(summary.total_templates, 2);
    assert_eq!(summary.total_notices, 3);
    assert_eq!(summary.recent_notices[0].recipient_name, "Jane Citizen");
    assert_eq!(
        summary.recent_notices[1].recipient_organization,
        "Victoria Police"
    );
}
