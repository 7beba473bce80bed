//! Models that represent users, authentication payloads, and role metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::company::CompanyResponse;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
/// Database representation of an authenticated user account.
pub struct User {
    pub id: String,
    /// Login identifier; unique across all companies.
    pub email: String,
    /// Argon2 hash of the user's password.
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    /// Owning company. Platform operators carry no company and route to the
    /// shared database only.
    pub company_id: Option<String>,
    /// Role describing the user's privileges within their company.
    pub role: UserRole,
    /// Flag promoting the user to platform-operator status.
    pub is_superuser: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema, Default)]
#[sqlx(rename_all = "snake_case")]
/// Supported user roles stored in the database.
pub enum UserRole {
    /// Company administrator with full control over the company's catalog
    /// and members.
    Admin,
    /// Can manage products but not company settings.
    Manager,
    /// Read-only catalog access.
    #[default]
    User,
}

impl UserRole {
    /// Returns the canonical snake_case representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Manager => "manager",
            UserRole::User => "user",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(UserRole::Admin),
            "manager" => Some(UserRole::Manager),
            "user" => Some(UserRole::User),
            _ => None,
        }
    }
}

impl Serialize for UserRole {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        UserRole::parse(&s.to_lowercase()).ok_or_else(|| {
            serde::de::Error::unknown_variant(&s, &["admin", "manager", "user"])
        })
    }
}

impl User {
    /// Constructs a new user with freshly generated identifiers.
    pub fn new(
        email: String,
        password_hash: String,
        first_name: String,
        last_name: String,
        company_id: Option<String>,
        role: UserRole,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            first_name,
            last_name,
            company_id,
            role,
            is_superuser: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` when the user holds the `Admin` role.
    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }

    /// Admins and managers may create, update, and delete products.
    pub fn can_manage_products(&self) -> bool {
        matches!(self.role, UserRole::Admin | UserRole::Manager)
    }

    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim().to_string();
        if name.is_empty() {
            self.email.clone()
        } else {
            name
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
/// Payload for the registration endpoint. Exactly one of `company_name`
/// (create a new tenant) or `company_id` (join an existing one) must be set.
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(min = 1, max = 150))]
    pub first_name: String,
    #[validate(length(min = 1, max = 150))]
    pub last_name: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 255))]
    pub company_name: Option<String>,
    #[serde(default)]
    pub company_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Credentials submitted by a user attempting to authenticate.
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Authentication tokens returned after a successful login or registration.
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Public-facing representation of a user returned by the API.
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub is_superuser: bool,
    pub company: Option<CompanyResponse>,
}

impl UserResponse {
    pub fn from_user(user: User, company: Option<CompanyResponse>) -> Self {
        let full_name = user.full_name();
        UserResponse {
            id: user.id,
            email: user.email,
            full_name,
            role: user.role.as_str().to_string(),
            is_superuser: user.is_superuser,
            company,
        }
    }
}
