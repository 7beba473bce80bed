//! Issues, verifies, refreshes, and revokes signed tokens.
//!
//! All persistent token state (outstanding refresh tokens and the
//! revocation blacklist) lives in the shared database; no tenant database
//! is ever touched from here.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::error::AppError;
use crate::models::user::User;
use crate::repositories::token as token_repo;
use crate::utils::jwt::{
    create_access_token, create_refresh_token, decode_token_allow_expired, verify_token, Claims,
};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid,
    #[error("token expired")]
    Expired,
    #[error("token revoked")]
    Revoked,
    #[error(transparent)]
    Backend(#[from] sqlx::Error),
    #[error(transparent)]
    Signing(#[from] anyhow::Error),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => AppError::Unauthorized("Invalid token".to_string()),
            TokenError::Expired => AppError::Unauthorized("Token expired".to_string()),
            TokenError::Revoked => AppError::Unauthorized("Token revoked".to_string()),
            TokenError::Backend(err) => AppError::InternalServerError(err.into()),
            TokenError::Signing(err) => AppError::InternalServerError(err),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[async_trait]
pub trait TokenServiceTrait: Send + Sync {
    async fn issue(&self, user: &User) -> Result<TokenPair, TokenError>;
    fn verify_access(&self, token: &str) -> Result<Claims, TokenError>;
    async fn refresh(&self, refresh_token: &str) -> Result<String, TokenError>;
    async fn revoke(&self, refresh_token: &str) -> Result<(), TokenError>;
}

pub struct TokenService {
    pool: SqlitePool,
    secret: String,
    access_minutes: u64,
    refresh_days: u64,
}

impl TokenService {
    pub fn new(pool: SqlitePool, config: &Config) -> Self {
        Self {
            pool,
            secret: config.jwt_secret.clone(),
            access_minutes: config.jwt_expiration_minutes,
            refresh_days: config.refresh_token_expiration_days,
        }
    }

    fn classify(err: anyhow::Error) -> TokenError {
        match err.downcast_ref::<jsonwebtoken::errors::Error>() {
            Some(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => TokenError::Expired,
            _ => TokenError::Invalid,
        }
    }

    fn expiry_of(claims: &Claims) -> DateTime<Utc> {
        Utc.timestamp_opt(claims.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// Deletes outstanding and blacklist rows for tokens past their natural
    /// expiry. Run from the `token_cleanup` bin.
    pub async fn purge_expired(&self) -> Result<(u64, u64), TokenError> {
        let now = Utc::now();
        let outstanding = token_repo::delete_expired_outstanding(&self.pool, now).await?;
        let blacklisted = token_repo::delete_expired_blacklisted(&self.pool, now).await?;
        Ok((outstanding, blacklisted))
    }
}

#[async_trait]
impl TokenServiceTrait for TokenService {
    /// Issues an access/refresh pair carrying the user's identity, role,
    /// and company. The refresh token's jti is recorded as outstanding.
    async fn issue(&self, user: &User) -> Result<TokenPair, TokenError> {
        let (access_token, _) = create_access_token(
            user.id.clone(),
            user.email.clone(),
            user.company_id.clone(),
            user.role.as_str().to_string(),
            &self.secret,
            self.access_minutes,
        )?;

        let (refresh_token, refresh_claims) = create_refresh_token(
            user.id.clone(),
            user.email.clone(),
            user.company_id.clone(),
            user.role.as_str().to_string(),
            &self.secret,
            self.refresh_days,
        )?;

        token_repo::insert_outstanding(
            &self.pool,
            &refresh_claims.jti,
            &user.id,
            Self::expiry_of(&refresh_claims),
        )
        .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Checks signature, expiry, and the type claim. Deliberately does not
    /// consult the tenant directory; that happens at resolution.
    fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = verify_token(token, &self.secret).map_err(Self::classify)?;
        if !claims.is_access() {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }

    /// Exchanges a refresh token for a new access token. The blacklist is
    /// consulted exactly here, so a revoked token fails before anything
    /// else is looked at.
    async fn refresh(&self, refresh_token: &str) -> Result<String, TokenError> {
        let claims = verify_token(refresh_token, &self.secret).map_err(Self::classify)?;
        if !claims.is_refresh() {
            return Err(TokenError::Invalid);
        }
        if token_repo::is_blacklisted(&self.pool, &claims.jti).await? {
            return Err(TokenError::Revoked);
        }
        if !token_repo::outstanding_exists(&self.pool, &claims.jti).await? {
            return Err(TokenError::Invalid);
        }

        let (access_token, _) = create_access_token(
            claims.sub,
            claims.email,
            claims.tenant_id,
            claims.role,
            &self.secret,
            self.access_minutes,
        )?;
        Ok(access_token)
    }

    /// Idempotent. Accepts already-expired tokens so logout never errors on
    /// a token that just ran out.
    async fn revoke(&self, refresh_token: &str) -> Result<(), TokenError> {
        let claims =
            decode_token_allow_expired(refresh_token, &self.secret).map_err(|_| TokenError::Invalid)?;
        if !claims.is_refresh() {
            return Err(TokenError::Invalid);
        }
        token_repo::blacklist(&self.pool, &claims.jti, Self::expiry_of(&claims)).await?;
        Ok(())
    }
}
