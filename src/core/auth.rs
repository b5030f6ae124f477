//! Identity carried by a verified session token

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("No session token provided")]
    MissingToken,

    #[error("Malformed session token")]
    Malformed,

    #[error("Invalid session token signature")]
    BadSignature,

    #[error("Session token expired")]
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[serde(alias = "viewer")]
    User,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
        }
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" | "viewer" => Ok(Role::User),
            _ => Err(anyhow::anyhow!("Invalid role: {}", s)),
        }
    }
}

/// Payload of a session token. Times are unix seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub uid: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<SessionClaims> for AuthenticatedUser {
    fn from(claims: SessionClaims) -> Self {
        let display_name = claims
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| claims.email.clone());
        Self {
            uid: claims.uid,
            email: claims.email,
            display_name,
            role: claims.role,
        }
    }
}

pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<SessionClaims, AuthError>;

    fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        self.verify(token).map(AuthenticatedUser::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(name: Option<&str>) -> SessionClaims {
        SessionClaims {
            uid: "u1".to_string(),
            email: "a@b.com".to_string(),
            name: name.map(str::to_string),
            role: Role::User,
            iat: 0,
            exp: 10,
        }
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let user = AuthenticatedUser::from(claims(None));
        assert_eq!(user.display_name, "a@b.com");

        let blank = AuthenticatedUser::from(claims(Some("  ")));
        assert_eq!(blank.display_name, "a@b.com");

        let named = AuthenticatedUser::from(claims(Some("Ana")));
        assert_eq!(named.display_name, "Ana");
    }

    #[test]
    fn test_user_serializes_camel_case() {
        let json = serde_json::to_value(AuthenticatedUser::from(claims(None))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "uid": "u1",
                "email": "a@b.com",
                "displayName": "a@b.com",
                "role": "user"
            })
        );
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("viewer".parse::<Role>().unwrap(), Role::User);
        assert!("root".parse::<Role>().is_err());
        let role: Role = serde_json::from_str("\"viewer\"").unwrap();
        assert_eq!(role, Role::User);
    }
}
