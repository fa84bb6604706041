use axum::{
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use shared::domain::SessionId;
use storage::SessionData;
use tracing::warn;

use crate::app_state::AppState;

const REQUESTED_WITH: &str = "x-requested-with";

/// The caller's session for one request. A fresh session adds `Set-Cookie` to the response.
pub(crate) struct SessionScope {
    pub(crate) id: SessionId,
    fresh: bool,
}

impl SessionScope {
    pub(crate) async fn open(state: &AppState, headers: &HeaderMap) -> Self {
        let requested = session_id_from_headers(headers, &state.cookie_name);
        let (id, fresh) = state.storage.open(requested).await;
        Self { id, fresh }
    }

    pub(crate) async fn run<R>(
        &self,
        state: &AppState,
        f: impl FnOnce(&mut SessionData) -> R,
    ) -> R {
        state.storage.with_session(self.id, f).await
    }

    pub(crate) fn respond(self, state: &AppState, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if self.fresh {
            let max_age = state.storage.ttl().num_seconds();
            let cookie = session_cookie(&state.cookie_name, self.id, max_age);
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(error) => warn!(%error, "session cookie could not be encoded"),
            }
        }
        response
    }
}

pub(crate) fn session_id_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .and_then(|(_, value)| value.parse().ok())
}

pub(crate) fn session_cookie(
    cookie_name: &str,
    session_id: SessionId,
    max_age_seconds: i64,
) -> String {
    format!("{cookie_name}={session_id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_seconds}")
}

/// Script-issued requests announce themselves with `X-Requested-With: XMLHttpRequest`.
pub(crate) fn is_async_request(headers: &HeaderMap) -> bool {
    headers
        .get(REQUESTED_WITH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("XMLHttpRequest"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_session_cookie_among_others() {
        let session_id = SessionId::generate();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; todo_session={session_id}; lang=en"))
                .expect("header"),
        );
        assert_eq!(
            session_id_from_headers(&headers, "todo_session"),
            Some(session_id)
        );
        assert_eq!(session_id_from_headers(&headers, "other"), None);
    }

    #[test]
    fn garbage_cookie_value_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("todo_session=nope"));
        assert_eq!(session_id_from_headers(&headers, "todo_session"), None);
    }

    #[test]
    fn detects_async_requests() {
        let mut headers = HeaderMap::new();
        assert!(!is_async_request(&headers));
        headers.insert(REQUESTED_WITH, HeaderValue::from_static("XMLHttpRequest"));
        assert!(is_async_request(&headers));
    }

    #[test]
    fn cookie_carries_attributes() {
        let session_id = SessionId::generate();
        let cookie = session_cookie("todo_session", session_id, 60);
        assert!(cookie.starts_with(&format!("todo_session={session_id};")));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=60"));
    }
}
