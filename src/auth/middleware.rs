use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use serde::{Deserialize, Serialize};

/// User role carried in JWT claims and tagged onto every live connection.
/// Owners manage employees and tasks; employees see only their own work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Employee => "employee",
        }
    }
}

/// JWT claims extracted from Authorization: Bearer header.
/// Implements axum's FromRequestParts for use as an extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID (owner or employee, depending on role)
    pub sub: String,
    /// Role the token was issued for
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Extract Bearer token from Authorization header
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(StatusCode::UNAUTHORIZED)?;

        // Get JWT secret from request extensions (set by middleware layer)
        let jwt_secret = parts
            .extensions
            .get::<JwtSecret>()
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

        crate::auth::jwt::validate_access_token(&jwt_secret.0, token)
            .map_err(|_| StatusCode::UNAUTHORIZED)
    }
}

/// Claims guard that additionally requires the owner role.
#[derive(Debug, Clone)]
pub struct OwnerClaims(pub Claims);

impl<S> FromRequestParts<S> for OwnerClaims
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let claims = Claims::from_request_parts(parts, state).await?;
        if claims.role != Role::Owner {
            return Err(StatusCode::FORBIDDEN);
        }
        Ok(Self(claims))
    }
}

/// Claims guard that additionally requires the employee role.
#[derive(Debug, Clone)]
pub struct EmployeeClaims(pub Claims);

impl<S> FromRequestParts<S> for EmployeeClaims
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let claims = Claims::from_request_parts(parts, state).await?;
        if claims.role != Role::Employee {
            return Err(StatusCode::FORBIDDEN);
        }
        Ok(Self(claims))
    }
}

/// JWT secret stored in request extensions for the Claims extractor
#[derive(Clone)]
pub struct JwtSecret(pub Vec<u8>);
