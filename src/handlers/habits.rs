use axum::Form;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{CookieJar, PrivateCookieJar};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::db::sqlite::MarkOutcome;
use crate::error::RitualError;
use crate::middleware::session::{self, AuthSession, FlashLevel};
use crate::router::RitualState;
use crate::views;

#[derive(Debug, Deserialize)]
pub struct HabitForm {
    pub habit: String,
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// GET /dashboard -> owned habits plus whether each is done today.
pub async fn dashboard(
    State(state): State<RitualState>,
    auth: AuthSession,
    jar: CookieJar,
    pjar: PrivateCookieJar,
) -> Result<Response, RitualError> {
    let theme = session::theme_of(&jar);
    let (flash, pjar) = session::take_flash(pjar);

    let habits = state.store.list_habits(auth.user_id).await?;
    let date = today();
    let mut entries = Vec::with_capacity(habits.len());
    for habit in habits {
        let done = state.store.today_status(auth.user_id, habit.id, date).await?;
        entries.push((habit, done));
    }

    Ok((
        pjar,
        views::dashboard_page(theme, flash.as_ref(), &auth.username, &entries),
    )
        .into_response())
}

/// POST /add
pub async fn add_habit(
    State(state): State<RitualState>,
    auth: AuthSession,
    Form(form): Form<HabitForm>,
) -> Result<Response, RitualError> {
    state.store.create_habit(auth.user_id, &form.habit).await?;
    Ok(session::flash_redirect(
        FlashLevel::Success,
        "Habit added.",
        "/dashboard",
    ))
}

/// GET /edit/{habit_id}
pub async fn edit_page(
    State(state): State<RitualState>,
    auth: AuthSession,
    Path(habit_id): Path<i64>,
    jar: CookieJar,
    pjar: PrivateCookieJar,
) -> Result<Response, RitualError> {
    let habit = state
        .store
        .habit_by_id(auth.user_id, habit_id)
        .await?
        .ok_or(RitualError::HabitNotFound)?;
    let theme = session::theme_of(&jar);
    let (flash, pjar) = session::take_flash(pjar);
    Ok((pjar, views::edit_page(theme, flash.as_ref(), &habit)).into_response())
}

/// POST /edit/{habit_id}
pub async fn edit_submit(
    State(state): State<RitualState>,
    auth: AuthSession,
    Path(habit_id): Path<i64>,
    Form(form): Form<HabitForm>,
) -> Result<Response, RitualError> {
    if form.habit.trim().is_empty() {
        // Stay on the edit form rather than bouncing to the dashboard.
        return Ok(session::flash_redirect(
            FlashLevel::Danger,
            "Habit name cannot be empty.",
            &format!("/edit/{habit_id}"),
        ));
    }
    state
        .store
        .rename_habit(auth.user_id, habit_id, &form.habit)
        .await?;
    Ok(session::flash_redirect(
        FlashLevel::Success,
        "Habit updated.",
        "/dashboard",
    ))
}

/// POST /delete/{habit_id} -> delete the habit and its logs. A non-owned or
/// unknown id deletes nothing but still reports success.
pub async fn delete_habit(
    State(state): State<RitualState>,
    auth: AuthSession,
    Path(habit_id): Path<i64>,
) -> Result<Response, RitualError> {
    state.store.delete_habit(auth.user_id, habit_id).await?;
    Ok(session::flash_redirect(
        FlashLevel::Info,
        "Habit deleted.",
        "/dashboard",
    ))
}

/// POST /done/{habit_id} -> mark today done, idempotently.
pub async fn mark_done(
    State(state): State<RitualState>,
    auth: AuthSession,
    Path(habit_id): Path<i64>,
) -> Result<Response, RitualError> {
    let outcome = state.store.mark_done(auth.user_id, habit_id, today()).await?;
    let response = match outcome {
        MarkOutcome::Marked => {
            session::flash_redirect(FlashLevel::Success, "Marked as done.", "/dashboard")
        }
        MarkOutcome::AlreadyMarked => {
            session::flash_redirect(FlashLevel::Warning, "Already marked today.", "/dashboard")
        }
    };
    Ok(response)
}

/// GET /history/{habit_id} -> completion dates, most recent first.
pub async fn history(
    State(state): State<RitualState>,
    auth: AuthSession,
    Path(habit_id): Path<i64>,
    jar: CookieJar,
    pjar: PrivateCookieJar,
) -> Result<Response, RitualError> {
    let habit = state
        .store
        .habit_by_id(auth.user_id, habit_id)
        .await?
        .ok_or(RitualError::HabitNotFound)?;
    let dates = state.store.history(auth.user_id, habit_id).await?;
    let theme = session::theme_of(&jar);
    let (flash, pjar) = session::take_flash(pjar);
    Ok((pjar, views::history_page(theme, flash.as_ref(), &habit, &dates)).into_response())
}
