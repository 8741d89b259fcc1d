/// Session cookie authentication
///
/// [`require_session`] guards `/app`. It reads the `session_token` cookie,
/// resolves it through the [`SessionManager`](budgetmate_shared::auth::session::SessionManager)
/// (cache first, database on a miss) and inserts two request extensions:
///
/// - [`SessionUser`]: who is calling and which family they belong to
/// - [`SessionToken`]: the raw cookie token, for logout and password changes
///
/// Requests without a live session get `401`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use budgetmate_shared::models::session::SessionUser;

pub const SESSION_COOKIE: &str = "session_token";

/// The caller's raw session token
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

/// Extracts the session token from the `Cookie` headers.
pub fn read_session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value that stores `token` for `max_age_secs`.
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> ApiResult<HeaderValue> {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax",
        SESSION_COOKIE, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }

    HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::InternalError(format!("Invalid session cookie: {}", e)))
}

/// `Set-Cookie` value that deletes the session cookie.
pub fn clear_session_cookie(secure: bool) -> HeaderValue {
    if secure {
        HeaderValue::from_static("session_token=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax; Secure")
    } else {
        HeaderValue::from_static("session_token=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax")
    }
}

/// Resolves the caller's session, if any, without rejecting the request.
pub async fn current_user(state: &AppState, headers: &HeaderMap) -> ApiResult<Option<SessionUser>> {
    match read_session_token(headers) {
        Some(token) => Ok(state.sessions.resolve(&token).await?),
        None => Ok(None),
    }
}

pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = read_session_token(req.headers())
        .ok_or_else(|| ApiError::Unauthorized("Not logged in".to_string()))?;

    let user = state
        .sessions
        .resolve(&token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Session expired".to_string()))?;

    req.extensions_mut().insert(user);
    req.extensions_mut().insert(SessionToken(token));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_read_session_token() {
        assert_eq!(
            read_session_token(&headers("theme=dark; session_token=abc123; lang=en")),
            Some("abc123".to_string())
        );
        assert_eq!(read_session_token(&headers("session_token=abc")), Some("abc".to_string()));
    }

    #[test]
    fn test_missing_or_empty_token() {
        assert_eq!(read_session_token(&HeaderMap::new()), None);
        assert_eq!(read_session_token(&headers("theme=dark")), None);
        assert_eq!(read_session_token(&headers("session_token=")), None);
        assert_eq!(read_session_token(&headers("xsession_token=abc")), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc", 604800, false).unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("session_token=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(!cookie.contains("Secure"));

        let secure = session_cookie("abc", 60, true).unwrap();
        assert!(secure.to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn test_clear_cookie() {
        assert!(clear_session_cookie(false).to_str().unwrap().contains("Max-Age=0"));
        assert!(clear_session_cookie(true).to_str().unwrap().contains("Secure"));
    }
}
