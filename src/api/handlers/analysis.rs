use super::AppState;
use crate::api::middleware::AuthenticatedUser;
use crate::api::models::CreateReportRequest;
use crate::error::{AppError, Result};
use crate::repositories::{StoredAnalysis, StoredReport};
use crate::services::ReportPreview;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};

const FILE_FIELD: &str = "file";

/// POST /api/v1/analyses
/// Analyses the multipart `file` upload and stores the per-feeder results
pub async fn upload(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<StoredAnalysis>)> {
    let ctx = state.context(&user);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload.csv").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let stored = state.service.analyze_upload(&ctx, &file_name, &bytes).await?;
        return Ok((StatusCode::CREATED, Json(stored)));
    }

    Err(AppError::BadRequest("No file uploaded".into()))
}

/// GET /api/v1/analyses/latest
pub async fn get_latest(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<StoredAnalysis>> {
    let ctx = state.context(&user);
    Ok(Json(state.service.latest_analysis(&ctx).await?))
}

/// GET /api/v1/analyses/{id}
pub async fn get_analysis(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoredAnalysis>> {
    Ok(Json(state.service.get_analysis(&id).await?))
}

/// GET /api/v1/analyses/{id}/feeders/{feeder}/recommendations
/// Computes recommendations and report figures without storing them
pub async fn preview_recommendations(
    State(state): State<AppState>,
    Path((id, feeder)): Path<(String, String)>,
) -> Result<Json<ReportPreview>> {
    Ok(Json(state.service.preview(&id, &feeder).await?))
}

/// POST /api/v1/analyses/{id}/reports
pub async fn create_report(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(request): Json<CreateReportRequest>,
) -> Result<(StatusCode, Json<StoredReport>)> {
    let ctx = state.context(&user);

    let report = state
        .service
        .generate_report(&ctx, &id, &request.feeder_name)
        .await?;

    Ok((StatusCode::CREATED, Json(report)))
}
