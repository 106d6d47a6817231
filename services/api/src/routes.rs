use crate::infra::{AppState, DeskState};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use notice_desk::error::AppError;
use notice_desk::workflows::notices::{
    search_officers, search_templates, Clock, ComposerSnapshot, ComposerStep, DashboardSummary,
    MailDraft, NewOfficer, NewTemplate, Notice, NoticeId, NoticeReport, Officer, OfficerId,
    OfficerPatch, ReportFilter, Template, TemplateId, TemplatePatch, DEFAULT_TEMPLATE_CATEGORY,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchRequest {
    #[serde(default)]
    pub(crate) term: String,
}

/// Template payload; the author is the configured operator.
#[derive(Debug, Deserialize)]
pub(crate) struct TemplateRequest {
    pub(crate) name: String,
    pub(crate) subject: String,
    pub(crate) body: String,
    #[serde(default)]
    pub(crate) category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecipientRequest {
    pub(crate) officer_id: OfficerId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TemplateSelection {
    pub(crate) template_id: TemplateId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StepRequest {
    pub(crate) step: ComposerStep,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DraftEdit {
    #[serde(default)]
    pub(crate) subject: Option<String>,
    #[serde(default)]
    pub(crate) body: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SendResponse {
    pub(crate) notice: Notice,
    pub(crate) mail: MailDraft,
    pub(crate) mailto: String,
}

pub(crate) fn notice_router(desk: DeskState) -> Router {
    Router::new()
        .route("/api/v1/officers", get(list_officers).post(create_officer))
        .route("/api/v1/officers/search", post(search_officer_directory))
        .route(
            "/api/v1/officers/:id",
            get(get_officer).put(update_officer).delete(delete_officer),
        )
        .route("/api/v1/templates", get(list_templates).post(create_template))
        .route("/api/v1/templates/search", post(search_template_library))
        .route(
            "/api/v1/templates/:id",
            get(get_template).put(update_template).delete(delete_template),
        )
        .route("/api/v1/notices", get(list_notices))
        .route("/api/v1/notices/:id", get(get_notice))
        .route("/api/v1/compose", get(compose_snapshot))
        .route("/api/v1/compose/recipient", post(compose_recipient))
        .route("/api/v1/compose/template", post(compose_template))
        .route("/api/v1/compose/advance", post(compose_advance))
        .route("/api/v1/compose/back", post(compose_back))
        .route("/api/v1/compose/step", post(compose_step))
        .route("/api/v1/compose/draft", post(compose_draft))
        .route("/api/v1/compose/send", post(compose_send))
        .route("/api/v1/compose/reset", post(compose_reset))
        .route("/api/v1/reports/notices", post(notice_report))
        .route("/api/v1/reports/notices/csv", post(notice_report_csv))
        .route("/api/v1/dashboard", get(dashboard))
        .with_state(desk)
}

pub(crate) fn with_notice_routes(desk: DeskState) -> Router {
    notice_router(desk)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

async fn list_officers(State(desk): State<DeskState>) -> Result<Json<Vec<Officer>>, AppError> {
    Ok(Json(desk.officers.get_all().await?))
}

async fn create_officer(
    State(desk): State<DeskState>,
    Json(payload): Json<NewOfficer>,
) -> Result<(StatusCode, Json<Officer>), AppError> {
    payload.validate()?;
    let officer = desk.officers.create(payload).await?;
    info!(officer_id = %officer.id, "officer created");
    Ok((StatusCode::CREATED, Json(officer)))
}

async fn get_officer(
    State(desk): State<DeskState>,
    Path(id): Path<u64>,
) -> Result<Json<Officer>, AppError> {
    Ok(Json(desk.officers.get_by_id(OfficerId(id)).await?))
}

async fn update_officer(
    State(desk): State<DeskState>,
    Path(id): Path<u64>,
    Json(patch): Json<OfficerPatch>,
) -> Result<Json<Officer>, AppError> {
    patch.validate()?;
    Ok(Json(desk.officers.update(OfficerId(id), patch).await?))
}

async fn delete_officer(
    State(desk): State<DeskState>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = desk.officers.delete(OfficerId(id)).await?;
    Ok(Json(json!({ "deleted": deleted })))
}

async fn search_officer_directory(
    State(desk): State<DeskState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Vec<Officer>>, AppError> {
    let officers = desk.officers.get_all().await?;
    Ok(Json(search_officers(officers, &request.term)))
}

async fn list_templates(State(desk): State<DeskState>) -> Result<Json<Vec<Template>>, AppError> {
    Ok(Json(desk.templates.get_all().await?))
}

async fn create_template(
    State(desk): State<DeskState>,
    Json(payload): Json<TemplateRequest>,
) -> Result<(StatusCode, Json<Template>), AppError> {
    let draft = NewTemplate {
        name: payload.name,
        subject: payload.subject,
        body: payload.body,
        category: payload
            .category
            .filter(|category| !category.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TEMPLATE_CATEGORY.to_string()),
        created_by: desk.notice_config.operator.clone(),
    };
    draft.validate()?;
    let template = desk.templates.create(draft).await?;
    info!(template_id = %template.id, variables = template.variables.len(), "template created");
    Ok((StatusCode::CREATED, Json(template)))
}

async fn get_template(
    State(desk): State<DeskState>,
    Path(id): Path<u64>,
) -> Result<Json<Template>, AppError> {
    Ok(Json(desk.templates.get_by_id(TemplateId(id)).await?))
}

async fn update_template(
    State(desk): State<DeskState>,
    Path(id): Path<u64>,
    Json(patch): Json<TemplatePatch>,
) -> Result<Json<Template>, AppError> {
    patch.validate()?;
    Ok(Json(desk.templates.update(TemplateId(id), patch).await?))
}

async fn delete_template(
    State(desk): State<DeskState>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = desk.templates.delete(TemplateId(id)).await?;
    Ok(Json(json!({ "deleted": deleted })))
}

async fn search_template_library(
    State(desk): State<DeskState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Vec<Template>>, AppError> {
    let templates = desk.templates.get_all().await?;
    Ok(Json(search_templates(templates, &request.term)))
}

async fn list_notices(State(desk): State<DeskState>) -> Result<Json<Vec<Notice>>, AppError> {
    Ok(Json(desk.notices.get_all().await?))
}

async fn get_notice(
    State(desk): State<DeskState>,
    Path(id): Path<u64>,
) -> Result<Json<Notice>, AppError> {
    Ok(Json(desk.notices.get_by_id(NoticeId(id)).await?))
}

async fn compose_snapshot(State(desk): State<DeskState>) -> Json<ComposerSnapshot> {
    Json(desk.composer.snapshot())
}

async fn compose_recipient(
    State(desk): State<DeskState>,
    Json(request): Json<RecipientRequest>,
) -> Result<Json<ComposerSnapshot>, AppError> {
    desk.composer.select_officer(request.officer_id).await?;
    Ok(Json(desk.composer.snapshot()))
}

async fn compose_template(
    State(desk): State<DeskState>,
    Json(request): Json<TemplateSelection>,
) -> Result<Json<ComposerSnapshot>, AppError> {
    let context = desk.context();
    desk.composer
        .select_template(request.template_id, &context)
        .await?;
    Ok(Json(desk.composer.snapshot()))
}

async fn compose_advance(
    State(desk): State<DeskState>,
) -> Result<Json<ComposerSnapshot>, AppError> {
    desk.composer.advance()?;
    Ok(Json(desk.composer.snapshot()))
}

async fn compose_back(State(desk): State<DeskState>) -> Json<ComposerSnapshot> {
    desk.composer.back();
    Json(desk.composer.snapshot())
}

async fn compose_step(
    State(desk): State<DeskState>,
    Json(request): Json<StepRequest>,
) -> Result<Json<ComposerSnapshot>, AppError> {
    desk.composer.go_to(request.step)?;
    Ok(Json(desk.composer.snapshot()))
}

async fn compose_draft(
    State(desk): State<DeskState>,
    Json(edit): Json<DraftEdit>,
) -> Result<Json<ComposerSnapshot>, AppError> {
    desk.composer.edit_draft(edit.subject, edit.body)?;
    Ok(Json(desk.composer.snapshot()))
}

async fn compose_send(
    State(desk): State<DeskState>,
) -> Result<(StatusCode, Json<SendResponse>), AppError> {
    let context = desk.context();
    let receipt = desk.composer.send(&context).await?;
    let mailto = receipt.mail.mailto_uri();
    Ok((
        StatusCode::CREATED,
        Json(SendResponse {
            notice: receipt.notice,
            mail: receipt.mail,
            mailto,
        }),
    ))
}

async fn compose_reset(State(desk): State<DeskState>) -> Json<ComposerSnapshot> {
    desk.composer.reset();
    Json(desk.composer.snapshot())
}

async fn notice_report(
    State(desk): State<DeskState>,
    Json(filter): Json<ReportFilter>,
) -> Result<Json<NoticeReport>, AppError> {
    let all = desk.report_rows().await?;
    let rows = filter.apply(&all, desk.clock.now());
    Ok(Json(NoticeReport::build(&all, rows)))
}

async fn notice_report_csv(
    State(desk): State<DeskState>,
    Json(filter): Json<ReportFilter>,
) -> Result<impl IntoResponse, AppError> {
    let now = desk.clock.now();
    let all = desk.report_rows().await?;
    let rows = filter.apply(&all, now);

    let export = desk.report_config.csv_export();
    let body = export.render(&rows)?;
    let disposition = format!("attachment; filename=\"{}\"", export.file_name(now));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime::TEXT_CSV_UTF_8.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

async fn dashboard(State(desk): State<DeskState>) -> Result<Json<DashboardSummary>, AppError> {
    let officers = desk.officers.get_all().await?;
    let templates = desk.templates.get_all().await?;
    let notices = desk.notices.get_all().await?;
    Ok(Json(DashboardSummary::build(&officers, &templates, &notices)))
}
