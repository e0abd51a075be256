use axum::extract::FromRef;
use axum::routing::{get, post};
use axum::Router;
use axum_extra::extract::cookie::Key;

use crate::config::COOKIE_KEY;
use crate::db::sqlite::HabitStore;
use crate::handlers::{auth, habits, site};
use crate::service::Accounts;

#[derive(Clone)]
pub struct RitualState {
    pub store: HabitStore,
    pub accounts: Accounts,
    cookie_key: Key,
}

impl RitualState {
    pub fn new(store: HabitStore) -> Self {
        let accounts = Accounts::new(store.clone());
        Self {
            store,
            accounts,
            cookie_key: COOKIE_KEY.clone(),
        }
    }
}

// Required by the private cookie jar extractors.
impl FromRef<RitualState> for Key {
    fn from_ref(state: &RitualState) -> Key {
        state.cookie_key.clone()
    }
}

pub fn ritual_router(state: RitualState) -> Router {
    Router::new()
        .route("/", get(site::index))
        .route("/register", get(auth::register_page).post(auth::register_submit))
        .route("/login", get(auth::login_page).post(auth::login_submit))
        .route("/logout", get(auth::logout))
        .route("/dashboard", get(habits::dashboard))
        .route("/add", post(habits::add_habit))
        .route("/edit/{habit_id}", get(habits::edit_page).post(habits::edit_submit))
        .route("/delete/{habit_id}", post(habits::delete_habit))
        .route("/done/{habit_id}", post(habits::mark_done))
        .route("/history/{habit_id}", get(habits::history))
        .route("/toggle_theme", post(site::toggle_theme))
        .with_state(state)
}
