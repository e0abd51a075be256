use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Redirect};
use axum_extra::extract::cookie::{CookieJar, PrivateCookieJar};

use crate::middleware::session;
use crate::views;

/// GET / -> landing page.
pub async fn index(jar: CookieJar, pjar: PrivateCookieJar) -> impl IntoResponse {
    let theme = session::theme_of(&jar);
    let (flash, pjar) = session::take_flash(pjar);
    let logged_in = session::session_of(&pjar).is_some();
    (pjar, views::index_page(theme, flash.as_ref(), logged_in))
}

/// POST /toggle_theme -> flip the display preference and go back.
pub async fn toggle_theme(headers: HeaderMap, jar: CookieJar) -> impl IntoResponse {
    let next = match session::theme_of(&jar) {
        "dark" => "light",
        _ => "dark",
    };
    let jar = jar.add(session::theme_cookie(next));

    let back = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .map(referer_path)
        .unwrap_or_else(|| "/".to_string());
    (jar, Redirect::to(&back))
}

/// Reduce a referer to its path component so the redirect never leaves the
/// site.
fn referer_path(referer: &str) -> String {
    if let Some(rest) = referer
        .strip_prefix("http://")
        .or_else(|| referer.strip_prefix("https://"))
    {
        match rest.find('/') {
            Some(i) => rest[i..].to_string(),
            None => "/".to_string(),
        }
    } else if referer.starts_with('/') {
        referer.to_string()
    } else {
        "/".to_string()
    }
}
