use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::Next;
use axum::response::Response;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::PantryState;

const MANAGER_USER: &str = "manager";

pub(crate) async fn manager_auth(
    State(state): State<PantryState>,
    headers: HeaderMap,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let key = extract_manager_key(&headers).ok_or(StatusCode::UNAUTHORIZED)?;
    if key != *state.manager_password {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(req).await)
}

/// Accepts `x-manager-key`, `Authorization: Bearer <password>`, or
/// `Authorization: Basic` with the `manager` user.
fn extract_manager_key(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get("x-manager-key")
        && let Ok(s) = value.to_str()
    {
        let s = s.trim();
        if !s.is_empty() {
            return Some(s.to_string());
        }
    }

    let auth = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = auth.split_once(' ')?;
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    if scheme.eq_ignore_ascii_case("bearer") {
        return Some(token.to_string());
    }
    if scheme.eq_ignore_ascii_case("basic") {
        let decoded = STANDARD.decode(token).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (user, password) = decoded.split_once(':')?;
        if user == MANAGER_USER {
            return Some(password.to_string());
        }
    }
    None
}
