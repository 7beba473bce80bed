use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub email: String,
    /// Company the token is scoped to. Absent for platform operators, whose
    /// requests route to the shared database only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    pub role: String,
    pub token_type: String,
    pub exp: i64,    // expiration time
    pub iat: i64,    // issued at
    pub jti: String, // JWT ID
}

impl Claims {
    fn new(
        user_id: String,
        email: String,
        tenant_id: Option<String>,
        role: String,
        token_type: &str,
        lifetime: Duration,
    ) -> Self {
        let now = Utc::now();
        let exp = now + lifetime;

        Self {
            sub: user_id,
            email,
            tenant_id,
            role,
            token_type: token_type.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    pub fn is_access(&self) -> bool {
        self.token_type == TOKEN_TYPE_ACCESS
    }

    pub fn is_refresh(&self) -> bool {
        self.token_type == TOKEN_TYPE_REFRESH
    }
}

fn sign(claims: &Claims, secret: &str) -> anyhow::Result<String> {
    let token = encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;
    Ok(token)
}

pub fn create_access_token(
    user_id: String,
    email: String,
    tenant_id: Option<String>,
    role: String,
    secret: &str,
    expiration_minutes: u64,
) -> anyhow::Result<(String, Claims)> {
    let claims = Claims::new(
        user_id,
        email,
        tenant_id,
        role,
        TOKEN_TYPE_ACCESS,
        Duration::minutes(expiration_minutes as i64),
    );
    let token = sign(&claims, secret)?;
    Ok((token, claims))
}

pub fn create_refresh_token(
    user_id: String,
    email: String,
    tenant_id: Option<String>,
    role: String,
    secret: &str,
    expiration_days: u64,
) -> anyhow::Result<(String, Claims)> {
    let claims = Claims::new(
        user_id,
        email,
        tenant_id,
        role,
        TOKEN_TYPE_REFRESH,
        Duration::days(expiration_days as i64),
    );
    let token = sign(&claims, secret)?;
    Ok((token, claims))
}

pub fn verify_token(token: &str, secret: &str) -> anyhow::Result<Claims> {
    let validation = Validation::default();
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation,
    )?;

    Ok(token_data.claims)
}

/// Decodes a token accepting an elapsed `exp`. Signature and structure are
/// still enforced. Used when revoking, so logging out with an expired
/// refresh token stays a no-op instead of an error.
pub fn decode_token_allow_expired(token: &str, secret: &str) -> anyhow::Result<Claims> {
    let mut validation = Validation::default();
    validation.validate_exp = false;
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation,
    )?;

    Ok(token_data.claims)
}
