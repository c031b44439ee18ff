use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Extension,
};
use serde::Deserialize;

use super::utils::{parse_number, parse_uuid, EVERYONE, STAFF};
use crate::app::AppState;
use crate::error::ApiError;
use crate::grading::RosterGrid;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, PdfAttachment};
use crate::services::StudentSummary;

#[derive(Debug, Deserialize)]
pub struct RosterQuery {
    pub cycle: Option<String>,
}

/// GET /api/grades/student/:student/:cycle - Per-subject averages
pub async fn student_summary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((student, cycle)): Path<(String, String)>,
) -> ApiResult<StudentSummary> {
    user.require(EVERYONE)?;
    let student = parse_uuid("student", &student)?;
    let cycle = parse_number("cycle", &cycle)?;

    Ok(ApiResponse::success(state.grades.student_summary(student, cycle).await?))
}

/// GET /api/grades/roster/:course/:subject/:period?cycle= - Class grid for one subject and period
pub async fn roster(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((course, subject, period)): Path<(String, String, String)>,
    query: Result<Query<RosterQuery>, QueryRejection>,
) -> ApiResult<RosterGrid> {
    user.require(STAFF)?;
    let course = parse_uuid("course", &course)?;
    let subject = parse_uuid("subject", &subject)?;
    let period = parse_number("period", &period)?;
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let cycle = query
        .cycle
        .as_deref()
        .ok_or_else(|| ApiError::invalid_field("cycle", "is required"))
        .and_then(|raw| parse_number("cycle", raw))?;

    let grid = state.grades.roster_grid(course, subject, period, cycle).await?;
    Ok(ApiResponse::success(grid))
}

/// GET /api/grades/transcript/:student/:cycle - Report card as PDF
pub async fn transcript(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((student, cycle)): Path<(String, String)>,
) -> Result<PdfAttachment, ApiError> {
    user.require(EVERYONE)?;
    let student = parse_uuid("student", &student)?;
    let cycle = parse_number("cycle", &cycle)?;

    let transcript = state.grades.render_transcript(student, cycle).await?;
    Ok(PdfAttachment {
        filename: transcript.filename,
        bytes: transcript.bytes,
    })
}
