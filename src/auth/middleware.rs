use axum::{
    extract::{FromRef, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use crate::{
    auth::{claims::Identity, jwt::JwtKeys},
    state::AppState,
};

/// Attach the verified identity to the request, if a valid session token is
/// present. Absent or rejected tokens leave the request anonymous; this
/// middleware never fails and always runs the rest of the stack.
pub async fn attach_identity(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let keys = JwtKeys::from_ref(&state);
    if let Some(token) = session_token(&jar, req.headers(), keys.cookie_name()) {
        match keys.verify(&token) {
            Ok(claims) => {
                req.extensions_mut().insert(Identity::from(claims));
            }
            Err(_) => {
                debug!("session token rejected, continuing anonymous");
            }
        }
    }
    next.run(req).await
}

/// Session cookie first, `Bearer` Authorization header as fallback.
fn session_token(jar: &CookieJar, headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(cookie) = jar.get(cookie_name) {
        return Some(cookie.value().to_string());
    }
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum_extra::extract::cookie::Cookie;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn prefers_cookie_over_header() {
        let jar = CookieJar::new().add(Cookie::new("auth", "cookie-token"));
        let headers = headers_with_auth("Bearer header-token");
        assert_eq!(
            session_token(&jar, &headers, "auth").as_deref(),
            Some("cookie-token")
        );
    }

    #[test]
    fn falls_back_to_bearer_header() {
        let jar = CookieJar::new();
        let headers = headers_with_auth("Bearer header-token");
        assert_eq!(
            session_token(&jar, &headers, "auth").as_deref(),
            Some("header-token")
        );
    }

    #[test]
    fn absent_everywhere_is_none() {
        let jar = CookieJar::new();
        assert_eq!(session_token(&jar, &HeaderMap::new(), "auth"), None);
    }

    #[test]
    fn non_bearer_scheme_is_ignored() {
        let jar = CookieJar::new();
        let headers = headers_with_auth("Basic dXNlcjpwdw==");
        assert_eq!(session_token(&jar, &headers, "auth"), None);
    }
}
