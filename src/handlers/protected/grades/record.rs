use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    Extension, Json,
};

use super::utils::{parse_uuid, EVERYONE, GRADE_WRITERS, STAFF};
use crate::app::AppState;
use crate::database::models::GradeRecord;
use crate::error::ApiError;
use crate::grading::GradeEdit;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{GradePage, ListGrades, RegisterGrade};
use crate::types::Role;

/// POST /api/grades - Register a grade for an enrolled student
pub async fn register(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<RegisterGrade>, JsonRejection>,
) -> ApiResult<GradeRecord> {
    user.require(GRADE_WRITERS)?;
    let Json(request) = payload?;

    let grade = state.grades.register_grade(request, user.user_id).await?;
    Ok(ApiResponse::created(grade))
}

/// GET /api/grades - Active grades, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    query: Result<Query<ListGrades>, QueryRejection>,
) -> ApiResult<GradePage> {
    user.require(STAFF)?;
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;

    Ok(ApiResponse::success(state.grades.list_grades(query).await?))
}

/// GET /api/grades/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<GradeRecord> {
    user.require(EVERYONE)?;
    let id = parse_uuid("id", &id)?;

    Ok(ApiResponse::success(state.grades.get_grade(id).await?))
}

/// PUT /api/grades/:id - Partial update; the total is recomputed
pub async fn edit(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<GradeEdit>, JsonRejection>,
) -> ApiResult<GradeRecord> {
    user.require(GRADE_WRITERS)?;
    let id = parse_uuid("id", &id)?;
    let Json(edit) = payload?;

    Ok(ApiResponse::success(state.grades.edit_grade(id, edit).await?))
}

/// DELETE /api/grades/:id - Soft delete
pub async fn deactivate(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<GradeRecord> {
    user.require(&[Role::Admin])?;
    let id = parse_uuid("id", &id)?;

    Ok(ApiResponse::success(state.grades.deactivate_grade(id).await?))
}
