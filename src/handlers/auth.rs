use axum::Form;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{CookieJar, PrivateCookieJar};
use serde::Deserialize;
use tracing::info;

use crate::error::RitualError;
use crate::middleware::session::{self, FlashLevel};
use crate::router::RitualState;
use crate::views;

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirm: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// GET /register
pub async fn register_page(jar: CookieJar, pjar: PrivateCookieJar) -> impl IntoResponse {
    let theme = session::theme_of(&jar);
    let (flash, pjar) = session::take_flash(pjar);
    (pjar, views::register_page(theme, flash.as_ref()))
}

/// POST /register -> create the account, then hand off to the login page.
pub async fn register_submit(
    State(state): State<RitualState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, RitualError> {
    let user_id = state
        .accounts
        .register(&form.username, &form.password, &form.confirm)
        .await?;
    info!(user_id, "account created");
    Ok(session::flash_redirect(
        FlashLevel::Success,
        "Account created. Please log in.",
        "/login",
    ))
}

/// GET /login
pub async fn login_page(jar: CookieJar, pjar: PrivateCookieJar) -> impl IntoResponse {
    let theme = session::theme_of(&jar);
    let (flash, pjar) = session::take_flash(pjar);
    (pjar, views::login_page(theme, flash.as_ref()))
}

/// POST /login -> verify credentials and establish the session cookie.
pub async fn login_submit(
    State(state): State<RitualState>,
    pjar: PrivateCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, RitualError> {
    let user = state.accounts.verify(&form.username, &form.password).await?;
    info!(user_id = user.id, "login");
    let pjar = session::establish(pjar, &user);
    let pjar = session::flash(pjar, FlashLevel::Success, "Welcome!");
    Ok((pjar, Redirect::to("/dashboard")).into_response())
}

/// GET /logout -> drop the session, back to the landing page.
pub async fn logout(pjar: PrivateCookieJar) -> impl IntoResponse {
    let pjar = session::clear_session(pjar);
    let pjar = session::flash(pjar, FlashLevel::Info, "Logged out.");
    (pjar, Redirect::to("/"))
}
