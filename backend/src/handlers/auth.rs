//! Registration, login, and token lifecycle endpoints. These run outside
//! the per-request tenant routing (no tenant is resolved yet) and only
//! touch the shared database, through `TokenService` and `TenantDirectory`.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use validator::Validate;

use crate::error::AppError;
use crate::models::company::{Company, CompanyResponse};
use crate::models::user::{
    AccessTokenResponse, LoginRequest, LoginResponse, LogoutRequest, RefreshRequest,
    RegisterRequest, User, UserRole, UserResponse,
};
use crate::repositories::user as user_repo;
use crate::services::directory::DirectoryError;
use crate::services::resolver::RequestContext;
use crate::services::token::{TokenError, TokenServiceTrait};
use crate::state::AppState;
use crate::utils::password::{hash_password, verify_password};

/// Creates a user account. `company_name` registers a brand-new tenant
/// (provisioning its database) with the caller as its admin;
/// `company_id` joins an existing active company as a regular member.
#[allow(dead_code)]
fn _assert_register_send(state: AppState, payload: RegisterRequest) {
    fn needs_send<T: Send>(_: &T) {}
    let fut = register(State(state), Json(payload));
    needs_send(&fut);
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), AppError> {
    payload.validate()?;

    if user_repo::email_exists(&state.shared_pool, &payload.email)
        .await
        .map_err(|err| AppError::InternalServerError(err.into()))?
    {
        return Err(AppError::Conflict("Email is already registered".to_string()));
    }

    let (company, role) = match (&payload.company_name, &payload.company_id) {
        (Some(name), None) => {
            let company = state.directory.register(name, &payload.email).await?;
            // The founding user administers the new company.
            (company, UserRole::Admin)
        }
        (None, Some(company_id)) => {
            let company = state.directory.lookup(company_id).await.map_err(|err| {
                match err {
                    DirectoryError::UnknownTenant => {
                        AppError::BadRequest("Company not found or inactive".to_string())
                    }
                    other => other.into(),
                }
            })?;
            (company, UserRole::User)
        }
        _ => {
            return Err(AppError::BadRequest(
                "Either company_name or company_id must be provided".to_string(),
            ))
        }
    };

    let password_hash = hash_password(&payload.password)?;
    let user = User::new(
        payload.email,
        password_hash,
        payload.first_name,
        payload.last_name,
        Some(company.id.clone()),
        role,
    );
    user_repo::insert_user(&state.shared_pool, &user)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Email is already registered".to_string())
            }
            _ => AppError::InternalServerError(err.into()),
        })?;

    let response = login_response(&state, user, Some(company)).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = user_repo::find_by_email(&state.shared_pool, &payload.email)
        .await
        .map_err(|err| AppError::InternalServerError(err.into()))?
        .filter(|user| user.is_active)
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    let matches = verify_password(&payload.password, &user.password_hash)?;
    if !matches {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    // A token must not be minted against a deactivated tenant.
    let company = match &user.company_id {
        Some(company_id) => Some(state.directory.lookup(company_id).await.map_err(|err| {
            match err {
                DirectoryError::UnknownTenant => {
                    AppError::Unauthorized("Company is deactivated".to_string())
                }
                other => other.into(),
            }
        })?),
        None => None,
    };

    let response = login_response(&state, user, company).await?;
    Ok(Json(response))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AccessTokenResponse>, AppError> {
    let access_token = state
        .tokens
        .refresh(&payload.refresh_token)
        .await
        .map_err(refresh_error)?;
    Ok(Json(AccessTokenResponse { access_token }))
}

/// Revokes the presented refresh token so it can no longer mint access
/// tokens. Idempotent.
pub async fn logout(
    State(state): State<AppState>,
    Extension(_ctx): Extension<RequestContext>,
    Json(payload): Json<LogoutRequest>,
) -> Result<Json<Value>, AppError> {
    state
        .tokens
        .revoke(&payload.refresh_token)
        .await
        .map_err(|err| match err {
            TokenError::Invalid => AppError::BadRequest("Invalid refresh token".to_string()),
            other => other.into(),
        })?;
    Ok(Json(json!({"message": "Logged out"})))
}

pub async fn profile(
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<UserResponse>, AppError> {
    let company = ctx.company.clone().map(CompanyResponse::from);
    Ok(Json(UserResponse::from_user(ctx.user.clone(), company)))
}

fn refresh_error(err: TokenError) -> AppError {
    match err {
        TokenError::Revoked => AppError::Unauthorized("Refresh token revoked".to_string()),
        TokenError::Expired => AppError::Unauthorized("Refresh token expired".to_string()),
        TokenError::Invalid => AppError::Unauthorized("Invalid refresh token".to_string()),
        other => other.into(),
    }
}

async fn login_response(
    state: &AppState,
    user: User,
    company: Option<Company>,
) -> Result<LoginResponse, AppError> {
    let pair = state.tokens.issue(&user).await?;
    Ok(LoginResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        user: UserResponse::from_user(user, company.map(CompanyResponse::from)),
    })
}
