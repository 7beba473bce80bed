//! Request router: authenticate, resolve the tenant, bind the connection,
//! then run the handler. Role guards run after resolution (the role comes
//! from verified claims) and before any handler code.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::services::resolver::RequestContext;
use crate::state::AppState;

/// Authenticates the request and binds the routing context. No handler
/// runs before the context is complete; the bound tenant connection is
/// released when the context drops at the end of the request, whether the
/// handler succeeded or failed.
pub async fn auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = resolve_request(&state, &request).await?;
    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

/// Auth + require a product-management role (manager or admin).
pub async fn auth_manager(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = resolve_request(&state, &request).await?;
    if !ctx.user.can_manage_products() {
        return Err(AppError::Forbidden(
            "Manager or admin role required".to_string(),
        ));
    }

    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

/// Auth + require the company admin role.
pub async fn auth_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = resolve_request(&state, &request).await?;
    if !ctx.user.is_admin() {
        return Err(AppError::Forbidden("Admin role required".to_string()));
    }

    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

/// Auth + require a platform operator. These requests carry no tenant
/// claim and route to the shared database only.
pub async fn auth_superuser(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = resolve_request(&state, &request).await?;
    if !ctx.user.is_superuser {
        return Err(AppError::Forbidden(
            "Platform operator access required".to_string(),
        ));
    }

    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

async fn resolve_request(state: &AppState, request: &Request) -> Result<RequestContext, AppError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;
    state.resolver.resolve(&token).await
}

fn bearer_token(headers: &axum::http::HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    parse_bearer_token(value).map(|token| token.to_string())
}

fn parse_bearer_token(header: &str) -> Option<&str> {
    let (scheme, rest) = header.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        let token = rest.trim_start();
        (!token.is_empty()).then_some(token)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bearer_token_accepts_any_scheme_casing() {
        assert_eq!(parse_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(parse_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(parse_bearer_token("BEARER  abc"), Some("abc"));
    }

    #[test]
    fn parse_bearer_token_rejects_other_schemes_and_empty_tokens() {
        assert_eq!(parse_bearer_token("Basic abc"), None);
        assert_eq!(parse_bearer_token("Bearer "), None);
        assert_eq!(parse_bearer_token("token"), None);
    }
}
