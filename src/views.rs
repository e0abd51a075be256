//! Minimal server-rendered pages, plain string assembly. User-supplied text
//! goes through `escape` before landing in markup.

use axum::response::Html;
use chrono::NaiveDate;

use crate::db::models::Habit;
use crate::middleware::session::Flash;

fn layout(title: &str, theme: &str, flash: Option<&Flash>, body: &str) -> Html<String> {
    let banner = match flash {
        Some(f) => format!(
            "<p class=\"flash {}\">{}</p>\n",
            f.level.as_str(),
            escape(&f.message)
        ),
        None => String::new(),
    };
    Html(format!(
        "<!doctype html>\n<html data-theme=\"{theme}\">\n<head><meta charset=\"utf-8\"><title>{title} · ritual</title></head>\n<body>\n{banner}{body}\n<form method=\"post\" action=\"/toggle_theme\"><button>toggle theme</button></form>\n</body>\n</html>\n",
        title = escape(title),
    ))
}

pub fn index_page(theme: &str, flash: Option<&Flash>, logged_in: bool) -> Html<String> {
    let nav = if logged_in {
        "<p><a href=\"/dashboard\">dashboard</a> · <a href=\"/logout\">log out</a></p>"
    } else {
        "<p><a href=\"/login\">log in</a> · <a href=\"/register\">register</a></p>"
    };
    let body = format!("<h1>ritual</h1>\n<p>Track your daily habits.</p>\n{nav}");
    layout("home", theme, flash, &body)
}

pub fn register_page(theme: &str, flash: Option<&Flash>) -> Html<String> {
    let body = "<h1>Register</h1>\n\
        <form method=\"post\" action=\"/register\">\n\
        <input name=\"username\" placeholder=\"username\">\n\
        <input name=\"password\" type=\"password\" placeholder=\"password\">\n\
        <input name=\"confirm\" type=\"password\" placeholder=\"confirm password\">\n\
        <button>create account</button>\n\
        </form>\n\
        <p>Already registered? <a href=\"/login\">log in</a></p>";
    layout("register", theme, flash, body)
}

pub fn login_page(theme: &str, flash: Option<&Flash>) -> Html<String> {
    let body = "<h1>Log in</h1>\n\
        <form method=\"post\" action=\"/login\">\n\
        <input name=\"username\" placeholder=\"username\">\n\
        <input name=\"password\" type=\"password\" placeholder=\"password\">\n\
        <button>log in</button>\n\
        </form>\n\
        <p>New here? <a href=\"/register\">register</a></p>";
    layout("log in", theme, flash, body)
}

pub fn dashboard_page(
    theme: &str,
    flash: Option<&Flash>,
    username: &str,
    habits: &[(Habit, bool)],
) -> Html<String> {
    let mut body = format!(
        "<h1>Dashboard</h1>\n<p>Signed in as {} · <a href=\"/logout\">log out</a></p>\n",
        escape(username)
    );
    if habits.is_empty() {
        body.push_str("<p>No habits yet. Add one below.</p>\n");
    } else {
        body.push_str("<ul class=\"habits\">\n");
        for (habit, done_today) in habits {
            let status = if *done_today {
                "<span class=\"done\">✓ done today</span>".to_string()
            } else {
                format!(
                    "<form method=\"post\" action=\"/done/{}\"><button>mark done</button></form>",
                    habit.id
                )
            };
            body.push_str(&format!(
                "<li><span class=\"habit-name\">{name}</span> {status} \
                 <a href=\"/edit/{id}\">edit</a> \
                 <a href=\"/history/{id}\">history</a> \
                 <form method=\"post\" action=\"/delete/{id}\"><button>delete</button></form></li>\n",
                name = escape(&habit.name),
                id = habit.id,
            ));
        }
        body.push_str("</ul>\n");
    }
    body.push_str(
        "<form method=\"post\" action=\"/add\">\
         <input name=\"habit\" placeholder=\"new habit\">\
         <button>add</button></form>",
    );
    layout("dashboard", theme, flash, &body)
}

pub fn edit_page(theme: &str, flash: Option<&Flash>, habit: &Habit) -> Html<String> {
    let body = format!(
        "<h1>Rename habit</h1>\n\
         <form method=\"post\" action=\"/edit/{id}\">\n\
         <input name=\"habit\" value=\"{name}\">\n\
         <button>save</button>\n\
         </form>\n\
         <p><a href=\"/dashboard\">back</a></p>",
        id = habit.id,
        name = escape(&habit.name),
    );
    layout("edit habit", theme, flash, &body)
}

pub fn history_page(
    theme: &str,
    flash: Option<&Flash>,
    habit: &Habit,
    dates: &[NaiveDate],
) -> Html<String> {
    let mut body = format!("<h1>{} · history</h1>\n", escape(&habit.name));
    if dates.is_empty() {
        body.push_str("<p>No completions yet.</p>\n");
    } else {
        body.push_str("<ul class=\"dates\">\n");
        for date in dates {
            body.push_str(&format!("<li>{date}</li>\n"));
        }
        body.push_str("</ul>\n");
    }
    body.push_str("<p><a href=\"/dashboard\">back</a></p>");
    layout("history", theme, flash, &body)
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
