//! Login gate for the HTML surface.
//!
//! Every request carrying a valid session cookie for an active account gets
//! its [`UserClaims`] attached as a request extension. Requests without one
//! are redirected to the login page unless their path is in the exemption
//! table.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{models::account::UserClaims, AppState};

pub const LOGIN_URL: &str = "/accounts/login/";

/// Paths (without the leading slash) reachable without a session
static EXEMPT_PATHS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^static/",
        r"^accounts/login/?$",
        r"^accounts/logout/?$",
        r"^about_us/?$",
        r"^about/?$",
        // JSON API and its docs authenticate with bearer tokens
        r"^api/v1/",
        r"^swagger-ui",
        r"^api-docs/",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

pub fn is_exempt(path: &str) -> bool {
    let path = path.trim_start_matches('/');
    EXEMPT_PATHS.iter().any(|re| re.is_match(path))
}

/// Login URL that sends the user back to `path` afterwards
pub fn login_redirect(path: &str) -> String {
    format!("{}?next={}", LOGIN_URL, path)
}

/// Only same-site absolute paths are accepted as a post-login target
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') => n,
        _ => "/",
    }
}

async fn session_claims(state: &AppState, jar: &CookieJar) -> Option<UserClaims> {
    let cookie = jar.get(&state.config.auth.session_cookie)?;
    match state.services.auth.verify_session(cookie.value()).await {
        Ok(claims) => Some(claims),
        Err(e) => {
            tracing::debug!("Session cookie rejected: {}", e);
            None
        }
    }
}

pub async fn login_required(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let jar = CookieJar::from_headers(req.headers());

    if let Some(claims) = session_claims(&state, &jar).await {
        req.extensions_mut().insert(claims);
        return next.run(req).await;
    }

    let path = req.uri().path().to_string();
    if is_exempt(&path) {
        return next.run(req).await;
    }

    tracing::debug!("Unauthenticated request to {}, redirecting to login", path);
    Redirect::to(&login_redirect(&path)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exempt_paths() {
        assert!(is_exempt("/static/css/style.css"));
        assert!(is_exempt("/accounts/login/"));
        assert!(is_exempt("/accounts/login"));
        assert!(is_exempt("/accounts/logout/"));
        assert!(is_exempt("/about/"));
        assert!(is_exempt("/about_us/"));
        assert!(is_exempt("/api/v1/health"));
        assert!(is_exempt("/swagger-ui/"));
        assert!(is_exempt("/api-docs/openapi.json"));
    }

    #[test]
    fn test_protected_paths() {
        assert!(!is_exempt("/"));
        assert!(!is_exempt("/books/"));
        assert!(!is_exempt("/books/lend/"));
        assert!(!is_exempt("/members/3/delete/"));
        assert!(!is_exempt("/api/books/"));
        assert!(!is_exempt("/about/team"));
        assert!(!is_exempt("/accounts/login/extra"));
    }

    #[test]
    fn test_login_redirect() {
        assert_eq!(login_redirect("/books/"), "/accounts/login/?next=/books/");
    }

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/books/lent/")), "/books/lent/");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
