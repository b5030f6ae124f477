use crate::core::config::AppConfig;
use crate::core::{Role, SessionClaims};
use crate::providers::session_token::HmacTokenVerifier;
use anyhow::{Result, bail};
use chrono::Utc;

#[derive(Debug, Clone)]
pub struct MintTokenArgs {
    pub uid: String,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub ttl_secs: Option<i64>,
}

/// Signs a session token with the configured secret. Lifetime defaults to
/// the configured session max-age.
pub fn mint_token(config: &AppConfig, args: &MintTokenArgs) -> Result<String> {
    let ttl = args.ttl_secs.unwrap_or(config.auth.session_max_age_secs);
    if ttl <= 0 {
        bail!("Token lifetime must be positive, got {ttl}s");
    }
    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        uid: args.uid.clone(),
        email: args.email.clone(),
        name: args.name.clone(),
        role: args.role,
        iat: now,
        exp: now + ttl,
    };
    HmacTokenVerifier::new(&config.auth.secret)?.sign(&claims)
}
