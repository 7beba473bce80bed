//! Company listing and administration. The listing is public (used while
//! registering); the rest is platform-operator territory and runs against
//! the shared database only.

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::models::company::{Company, CompanyResponse};
use crate::repositories::company as company_repo;
use crate::services::resolver::RequestContext;
use crate::state::AppState;

pub async fn list_companies(
    State(state): State<AppState>,
) -> Result<Json<Vec<CompanyResponse>>, AppError> {
    let companies = state.directory.list_active().await?;
    Ok(Json(
        companies.into_iter().map(CompanyResponse::from).collect(),
    ))
}

pub async fn get_company(
    State(_state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(company_id): Path<String>,
) -> Result<Json<Company>, AppError> {
    let company = company_repo::find_by_id(ctx.db().shared(), &company_id)
        .await
        .map_err(|err| AppError::InternalServerError(err.into()))?
        .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;
    Ok(Json(company))
}

/// Soft-deactivates a tenant. The record and its database file stay; new
/// resolutions for this company are rejected from now on, while requests
/// already holding a connection run to completion.
pub async fn deactivate_company(
    State(state): State<AppState>,
    Extension(_ctx): Extension<RequestContext>,
    Path(company_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.directory.deactivate(&company_id).await?;
    Ok(Json(json!({"message": "Company deactivated"})))
}
