use super::AppState;
use crate::api::middleware::AuthenticatedUser;
use crate::api::models::ReportListResponse;
use crate::error::Result;
use crate::repositories::StoredReport;
use axum::{
    extract::{Path, State},
    Extension, Json,
};

/// GET /api/v1/reports
/// Returns the caller's reports, newest first
pub async fn list_reports(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ReportListResponse>> {
    let ctx = state.context(&user);
    let reports = state.service.list_reports(&ctx).await?;

    Ok(Json(ReportListResponse { reports }))
}

/// GET /api/v1/reports/{id}
pub async fn get_report(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<StoredReport>> {
    let ctx = state.context(&user);
    Ok(Json(state.service.get_report(&ctx, &id).await?))
}
