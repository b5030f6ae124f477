use crate::core::{AuthError, AuthenticatedUser};
use crate::http::AppState;
use crate::http::error::ApiError;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;

pub const AUTH_COOKIE: &str = "auth-token";

#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub secure: bool,
    pub max_age_secs: i64,
}

/// Verified identity of the caller, extracted once per request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user: AuthenticatedUser,
}

#[async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(AuthError::MissingToken)?;
        let user = state.verifier.authenticate(&token)?;
        Ok(RequestContext { user })
    }
}

/// The `auth-token` cookie wins over an `Authorization: Bearer` header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, AUTH_COOKIE).or_else(|| bearer_token(headers))
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

pub fn session_cookie(token: &str, settings: &CookieSettings) -> String {
    cookie(token, settings.max_age_secs, settings.secure)
}

pub fn cleared_cookie(settings: &CookieSettings) -> String {
    cookie("", 0, settings.secure)
}

fn cookie(value: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{AUTH_COOKIE}={value}; Max-Age={max_age_secs}; Path=/; HttpOnly; SameSite=Strict"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(axum::http::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_cookie_is_found_among_others() {
        let map = headers(&[(COOKIE, "theme=dark; auth-token=abc.def; lang=pt")]);
        assert_eq!(session_token(&map).as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_cookie_preferred_over_bearer() {
        let map = headers(&[
            (AUTHORIZATION, "Bearer from-header"),
            (COOKIE, "auth-token=from-cookie"),
        ]);
        assert_eq!(session_token(&map).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_bearer_fallback() {
        let map = headers(&[(AUTHORIZATION, "bearer tok")]);
        assert_eq!(session_token(&map).as_deref(), Some("tok"));

        let basic = headers(&[(AUTHORIZATION, "Basic dXNlcjpwdw==")]);
        assert_eq!(session_token(&basic), None);
        assert_eq!(session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let settings = CookieSettings {
            secure: true,
            max_age_secs: 3600,
        };
        let set = session_cookie("tok", &settings);
        assert!(set.starts_with("auth-token=tok;"));
        assert!(set.contains("Max-Age=3600"));
        assert!(set.contains("HttpOnly"));
        assert!(set.contains("SameSite=Strict"));
        assert!(set.ends_with("; Secure"));

        let cleared = cleared_cookie(&CookieSettings {
            secure: false,
            max_age_secs: 3600,
        });
        assert_eq!(
            cleared,
            "auth-token=; Max-Age=0; Path=/; HttpOnly; SameSite=Strict"
        );
    }
}
