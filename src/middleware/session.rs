//! Cookie-backed session state.
//!
//! The authenticated identity travels in an encrypted private cookie; flash
//! messages ride in a second, short-lived private cookie set next to a
//! redirect and cleared when the next page renders. The theme preference is
//! a plain cookie so it also works for anonymous visitors.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, Key, PrivateCookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::config::COOKIE_KEY;
use crate::db::models::AuthUser;
use crate::error::RitualError;

const SESSION_COOKIE: &str = "ritual_session";
const FLASH_COOKIE: &str = "ritual_flash";
const THEME_COOKIE: &str = "theme";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Danger,
    Warning,
    Info,
}

impl FlashLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Danger => "danger",
            FlashLevel::Warning => "warning",
            FlashLevel::Info => "info",
        }
    }
}

/// One-shot user-visible message, consumed by the next rendered page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

// ---- session ----

/// Replace any existing session with a fresh one for `user`.
pub fn establish(jar: PrivateCookieJar, user: &AuthUser) -> PrivateCookieJar {
    let data = SessionData {
        user_id: user.id,
        username: user.username.clone(),
    };
    // SessionData contains no map keys that can fail to serialize.
    let payload = serde_json::to_string(&data).unwrap_or_default();
    jar.remove(clear_cookie(SESSION_COOKIE))
        .add(build_cookie(SESSION_COOKIE, payload, None))
}

pub fn clear_session(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(clear_cookie(SESSION_COOKIE))
}

pub fn session_of(jar: &PrivateCookieJar) -> Option<SessionData> {
    let cookie = jar.get(SESSION_COOKIE)?;
    serde_json::from_str(cookie.value()).ok()
}

// ---- flash ----

pub fn flash(jar: PrivateCookieJar, level: FlashLevel, message: &str) -> PrivateCookieJar {
    let payload = serde_json::to_string(&Flash {
        level,
        message: message.to_string(),
    })
    .unwrap_or_default();
    jar.add(build_cookie(FLASH_COOKIE, payload, Some(Duration::minutes(5))))
}

/// Pop the pending flash message, clearing its cookie.
pub fn take_flash(jar: PrivateCookieJar) -> (Option<Flash>, PrivateCookieJar) {
    let parsed = jar
        .get(FLASH_COOKIE)
        .and_then(|c| serde_json::from_str(c.value()).ok());
    if parsed.is_some() {
        let jar = jar.remove(clear_cookie(FLASH_COOKIE));
        (parsed, jar)
    } else {
        (None, jar)
    }
}

/// Flash `message` and send the browser to `target`. Usable outside a
/// handler (error conversion), so it builds its jar from the process key.
pub fn flash_redirect(level: FlashLevel, message: &str, target: &str) -> Response {
    let jar = PrivateCookieJar::from_headers(&HeaderMap::new(), COOKIE_KEY.clone());
    let jar = flash(jar, level, message);
    (jar, Redirect::to(target)).into_response()
}

// ---- theme ----

pub fn theme_of(jar: &CookieJar) -> &'static str {
    match jar.get(THEME_COOKIE).map(|c| c.value()) {
        Some("dark") => "dark",
        _ => "light",
    }
}

pub fn theme_cookie(theme: &'static str) -> Cookie<'static> {
    build_cookie(THEME_COOKIE, theme.to_string(), Some(Duration::days(365)))
}

// ---- cookie plumbing ----

fn build_cookie(name: &str, value: String, max_age: Option<Duration>) -> Cookie<'static> {
    let mut builder = Cookie::build(Cookie::new(name.to_string(), value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    if let Some(age) = max_age {
        builder = builder.max_age(age);
    }
    builder.build()
}

fn clear_cookie(name: &str) -> Cookie<'static> {
    Cookie::build(Cookie::new(name.to_string(), ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

// ---- auth gate ----

/// Authenticated identity, resolved from the session cookie.
///
/// Composes in front of every habit-related handler: a request without a
/// valid session short-circuits to `/login` before touching storage.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: i64,
    pub username: String,
}

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::from_headers(&parts.headers, Key::from_ref(state));
        match session_of(&jar) {
            Some(session) => Ok(Self {
                user_id: session.user_id,
                username: session.username,
            }),
            None => Err(RitualError::AuthRequired.into_response()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_payload_round_trips() {
        let jar = PrivateCookieJar::from_headers(&HeaderMap::new(), Key::generate());
        let user = AuthUser {
            id: 7,
            username: "alice".to_string(),
        };
        let jar = establish(jar, &user);
        let session = session_of(&jar).expect("session readable");
        assert_eq!(session.user_id, 7);
        assert_eq!(session.username, "alice");

        let jar = clear_session(jar);
        assert!(session_of(&jar).is_none());
    }

    #[test]
    fn take_flash_consumes_the_message() {
        let jar = PrivateCookieJar::from_headers(&HeaderMap::new(), Key::generate());
        let jar = flash(jar, FlashLevel::Success, "Welcome!");
        let (msg, jar) = take_flash(jar);
        let msg = msg.expect("flash present");
        assert_eq!(msg.level, FlashLevel::Success);
        assert_eq!(msg.message, "Welcome!");

        let (again, _jar) = take_flash(jar);
        assert!(again.is_none());
    }
}
