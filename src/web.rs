//! Server-rendered pages for the browser flows.
//!
//! Every form post answers with a `303 See Other` and leaves a one-shot flash
//! message in the session; the next page render shows it and clears it.

use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::{Local, NaiveDate};
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::Arc;
use tower_sessions::Session;
use tracing::warn;

use crate::api::AppState;
use crate::api::auth::{SESSION_USER_KEY, session_user};
use crate::api::validation::{parse_date, parse_id};
use crate::domain::{DailyLogId, DateRange, MealType};
use crate::services::{AuthUser, DailyLogDto, DailyLogError, MealDto, NewMeal};

const FLASH_KEY: &str = "flash";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard") }))
        .route("/login", get(login_page).post(login_submit))
        .route("/logout", post(logout))
        .route("/dashboard", get(dashboard))
        .route("/profile", get(profile_page).post(profile_submit))
        .route("/logs", get(logs_page).post(create_log))
        .route("/logs/new", get(new_log_page))
        .route("/logs/{date}", get(log_page))
        .route("/logs/{date}/notes", post(update_notes))
        .route("/meals", post(add_meal))
}

// ============================================================================
// Session helpers
// ============================================================================

async fn set_flash(session: &Session, message: impl Into<String>) {
    if let Err(e) = session.insert(FLASH_KEY, message.into()).await {
        warn!(error = %e, "Failed to store flash message");
    }
}

async fn take_flash(session: &Session) -> Option<String> {
    session.remove::<String>(FLASH_KEY).await.ok().flatten()
}

/// Redirects with a flash message.
async fn flash_redirect(session: &Session, to: &str, message: impl Into<String>) -> Response {
    set_flash(session, message).await;
    Redirect::to(to).into_response()
}

async fn require_user(state: &AppState, session: &Session) -> Result<AuthUser, Response> {
    session_user(state, session)
        .await
        .ok_or_else(|| Redirect::to("/login").into_response())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ============================================================================
// Rendering
// ============================================================================

fn page(title: &str, user: Option<&AuthUser>, flash: Option<&str>, body: &str) -> Html<String> {
    let mut html = String::with_capacity(body.len() + 512);
    let _ = write!(
        html,
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{} - FitTrack</title></head><body>",
        text(title)
    );

    if let Some(user) = user {
        let _ = write!(
            html,
            "<nav><a href=\"/dashboard\">Dashboard</a> | <a href=\"/logs\">Logs</a> | \
             <a href=\"/profile\">Profile</a> | {} \
             <form method=\"post\" action=\"/logout\" style=\"display:inline\"><button>Log out</button></form></nav>",
            text(&user.username)
        );
    }

    if let Some(message) = flash {
        let _ = write!(html, "<p class=\"flash\">{}</p>", text(message));
    }

    let _ = write!(html, "<h1>{}</h1>{body}</body></html>", text(title));
    Html(html)
}

fn log_summary(log: &DailyLogDto) -> String {
    format!(
        "<p>In: {} kcal, Out: {} kcal, Net: {} kcal</p>",
        log.total_calories_in, log.total_calories_out, log.net_calories
    )
}

fn meal_rows(meals: &[MealDto]) -> String {
    if meals.is_empty() {
        return "<p>No meals yet.</p>".to_string();
    }

    let mut rows = String::from(
        "<table><tr><th>Type</th><th>Food</th><th>Serving</th><th>Calories</th></tr>",
    );
    for meal in meals {
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            meal.meal_type.map_or("", |t| t.as_str()),
            text(&meal.food_name),
            text(&meal.serving_size),
            meal.calories.map_or_else(|| "-".to_string(), |c| c.to_string()),
        );
    }
    rows.push_str("</table>");
    rows
}

// ============================================================================
// Login
// ============================================================================

#[derive(Debug, Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn login_page(session: Session) -> Html<String> {
    let flash = take_flash(&session).await;
    page(
        "Log in",
        None,
        flash.as_deref(),
        "<form method=\"post\" action=\"/login\">\
         <label>Username <input name=\"username\" required></label>\
         <label>Password <input name=\"password\" type=\"password\" required></label>\
         <button>Log in</button></form>",
    )
}

async fn login_submit(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let result = match state
        .shared
        .auth
        .login(form.username.trim(), &form.password)
        .await
    {
        Ok(result) => result,
        Err(e) => return flash_redirect(&session, "/login", e.to_string()).await,
    };

    if let Err(e) = session.cycle_id().await {
        warn!(error = %e, "Failed to rotate session id");
    }
    if let Err(e) = session.insert(SESSION_USER_KEY, result.user.id).await {
        warn!(error = %e, "Failed to store session user");
        return flash_redirect(&session, "/login", "Could not start a session").await;
    }

    Redirect::to("/dashboard").into_response()
}

async fn logout(session: Session) -> Response {
    if let Err(e) = session.flush().await {
        warn!(error = %e, "Failed to flush session");
    }
    Redirect::to("/login").into_response()
}

// ============================================================================
// Dashboard and profile
// ============================================================================

async fn dashboard(State(state): State<Arc<AppState>>, session: Session) -> Response {
    let user = match require_user(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    let flash = take_flash(&session).await;
    let date = today();

    let mut body = String::new();
    match state.shared.daily_logs.compute_daily_totals(user.id, date).await {
        Ok(log) => body.push_str(&log_summary(&log)),
        Err(DailyLogError::NotFound(_)) => body.push_str(
            "<p>No log for today yet. <a href=\"/logs\">Start one</a>.</p>",
        ),
        Err(e) => {
            warn!(error = %e, "Dashboard totals failed");
            body.push_str("<p>Totals are unavailable right now.</p>");
        }
    }

    body.push_str("<h2>Recent workouts</h2>");
    match state
        .shared
        .workouts
        .recent_workouts(user.id, date - chrono::Duration::days(7), 5)
        .await
    {
        Ok(workouts) if workouts.is_empty() => body.push_str("<p>No workouts this week.</p>"),
        Ok(workouts) => {
            body.push_str("<ul>");
            for w in &workouts {
                let _ = write!(
                    body,
                    "<li>{} {} {} min, {} kcal</li>",
                    w.date_time.format("%Y-%m-%d %H:%M"),
                    w.workout_type,
                    w.duration_minutes.unwrap_or_default(),
                    w.calories_burned.unwrap_or_default()
                );
            }
            body.push_str("</ul>");
        }
        Err(e) => {
            warn!(error = %e, "Dashboard workouts failed");
            body.push_str("<p>Workouts are unavailable right now.</p>");
        }
    }

    page("Dashboard", Some(&user), flash.as_deref(), &body).into_response()
}

#[derive(Debug, Deserialize)]
struct ProfileForm {
    #[serde(default)]
    age: Option<String>,
    #[serde(default)]
    weight: Option<String>,
    #[serde(default)]
    goal: Option<String>,
}

async fn profile_page(State(state): State<Arc<AppState>>, session: Session) -> Response {
    let user = match require_user(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    let flash = take_flash(&session).await;

    let profile = match state.shared.users.get_profile(user.id).await {
        Ok(profile) => profile,
        Err(e) => return flash_redirect(&session, "/dashboard", e.to_string()).await,
    };

    let mut goals = String::from("<option value=\"\"></option>");
    for goal in crate::domain::Goal::ALL {
        let selected = if profile.goal == Some(*goal) { " selected" } else { "" };
        let _ = write!(goals, "<option{selected}>{goal}</option>");
    }

    let body = format!(
        "<p>{} &lt;{}&gt;</p>\
         <form method=\"post\" action=\"/profile\">\
         <label>Age <input name=\"age\" value=\"{}\"></label>\
         <label>Weight (kg) <input name=\"weight\" value=\"{}\"></label>\
         <label>Goal <select name=\"goal\">{goals}</select></label>\
         <button>Save</button></form>",
        text(&profile.username),
        text(&profile.email),
        profile.age.map(|a| a.to_string()).unwrap_or_default(),
        attr(&profile.current_weight_kg.map(|w| w.to_string()).unwrap_or_default()),
    );

    page("Profile", Some(&user), flash.as_deref(), &body).into_response()
}

async fn profile_submit(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<ProfileForm>,
) -> Response {
    let user = match require_user(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    let age = match blank_to_none(form.age.as_deref()).map(str::parse::<i32>) {
        None => None,
        Some(Ok(age)) => Some(age),
        Some(Err(_)) => return flash_redirect(&session, "/profile", "Invalid age").await,
    };

    let message = match state
        .shared
        .users
        .update_profile_fields(user.id, age, form.weight.as_deref(), form.goal.as_deref())
        .await
    {
        Ok(_) => "Profile updated".to_string(),
        Err(e) => e.to_string(),
    };

    flash_redirect(&session, "/profile", message).await
}

// ============================================================================
// Daily logs
// ============================================================================

#[derive(Debug, Deserialize)]
struct LogForm {
    date: String,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NotesForm {
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewLogQuery {
    #[serde(default)]
    date: Option<String>,
}

/// Logs with notes, newest first. Today's log is created on the way.
async fn logs_page(State(state): State<Arc<AppState>>, session: Session) -> Response {
    let user = match require_user(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    let flash = take_flash(&session).await;
    let date = today();

    if let Err(e) = state
        .shared
        .daily_logs
        .create_or_update(user.id, date, None)
        .await
    {
        warn!(error = %e, "Failed to ensure today's log");
    }

    let mut logs = match state
        .shared
        .daily_logs
        .get_logs_between(user.id, DateRange::unbounded())
        .await
    {
        Ok(logs) => logs,
        Err(e) => return flash_redirect(&session, "/dashboard", e.to_string()).await,
    };
    logs.retain(|l| l.date != date && l.notes.is_some());
    logs.reverse();

    let mut body = format!(
        "<p><a href=\"/logs/{date}\">Today ({date})</a></p>\
         <form method=\"post\" action=\"/logs\">\
         <label>Date <input name=\"date\" type=\"date\" value=\"{date}\" required></label>\
         <label>Notes <input name=\"notes\"></label><button>Save</button></form><ul>"
    );
    for log in &logs {
        let _ = write!(
            body,
            "<li><a href=\"/logs/{0}\">{0}</a> {1}</li>",
            log.date,
            text(log.notes.as_deref().unwrap_or_default())
        );
    }
    body.push_str("</ul>");

    page("Daily logs", Some(&user), flash.as_deref(), &body).into_response()
}

async fn new_log_page(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<NewLogQuery>,
) -> Response {
    let user = match require_user(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    let flash = take_flash(&session).await;

    let date = query
        .date
        .as_deref()
        .and_then(|d| parse_date(d).ok())
        .unwrap_or_else(today);

    let body = format!(
        "<p>There is no log for {date} yet.</p>\
         <form method=\"post\" action=\"/logs\">\
         <input type=\"hidden\" name=\"date\" value=\"{date}\">\
         <label>Notes <input name=\"notes\"></label><button>Create</button></form>"
    );

    page("New daily log", Some(&user), flash.as_deref(), &body).into_response()
}

async fn create_log(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<LogForm>,
) -> Response {
    let user = match require_user(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    let Ok(date) = parse_date(&form.date) else {
        return flash_redirect(&session, "/logs", "Invalid date").await;
    };

    match state
        .shared
        .daily_logs
        .create_or_update(user.id, date, form.notes.as_deref())
        .await
    {
        Ok(log) => flash_redirect(&session, &format!("/logs/{}", log.date), "Daily log saved").await,
        Err(e) => flash_redirect(&session, "/logs", e.to_string()).await,
    }
}

async fn log_page(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(raw_date): Path<String>,
) -> Response {
    let user = match require_user(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    let Ok(date) = parse_date(&raw_date) else {
        return flash_redirect(&session, "/logs", "Invalid date").await;
    };

    let log = match state.shared.daily_logs.get_by_date(user.id, date).await {
        Ok(Some(log)) => log,
        Ok(None) => return Redirect::to(&format!("/logs/new?date={date}")).into_response(),
        Err(e) => return flash_redirect(&session, "/logs", e.to_string()).await,
    };

    let meals = match state.shared.meals.list_meals(user.id, log.id).await {
        Ok(meals) => meals,
        Err(e) => {
            warn!(error = %e, "Failed to list meals");
            Vec::new()
        }
    };
    let flash = take_flash(&session).await;

    let mut meal_types = String::new();
    for meal_type in MealType::ALL {
        let _ = write!(meal_types, "<option>{meal_type}</option>");
    }

    let body = format!(
        "{summary}\
         <form method=\"post\" action=\"/logs/{date}/notes\">\
         <label>Notes <textarea name=\"notes\">{notes}</textarea></label><button>Save notes</button></form>\
         <h2>Meals</h2>{meals}\
         <form method=\"post\" action=\"/meals\">\
         <input type=\"hidden\" name=\"daily_log_id\" value=\"{log_id}\">\
         <label>Type <select name=\"meal_type\">{meal_types}</select></label>\
         <label>Food <input name=\"food_name\" required></label>\
         <label>Serving <input name=\"serving_size\" required></label>\
         <label>Calories <input name=\"calories\"></label>\
         <button>Add meal</button></form>",
        summary = log_summary(&log),
        notes = text(log.notes.as_deref().unwrap_or_default()),
        meals = meal_rows(&meals),
        log_id = log.id,
    );

    page(&format!("Log for {date}"), Some(&user), flash.as_deref(), &body).into_response()
}

async fn update_notes(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(raw_date): Path<String>,
    Form(form): Form<NotesForm>,
) -> Response {
    let user = match require_user(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    let Ok(date) = parse_date(&raw_date) else {
        return flash_redirect(&session, "/logs", "Invalid date").await;
    };
    let back = format!("/logs/{date}");

    let log = match state.shared.daily_logs.get_by_date(user.id, date).await {
        Ok(Some(log)) => log,
        Ok(None) => return Redirect::to(&format!("/logs/new?date={date}")).into_response(),
        Err(e) => return flash_redirect(&session, &back, e.to_string()).await,
    };

    let message = match state
        .shared
        .daily_logs
        .update_notes(user.id, log.id, form.notes.as_deref())
        .await
    {
        Ok(_) => "Notes updated".to_string(),
        Err(e) => e.to_string(),
    };

    flash_redirect(&session, &back, message).await
}

// ============================================================================
// Meals
// ============================================================================

#[derive(Debug, Deserialize)]
struct MealForm {
    daily_log_id: String,
    #[serde(default)]
    meal_type: Option<String>,
    #[serde(default)]
    food_name: Option<String>,
    #[serde(default)]
    serving_size: Option<String>,
    #[serde(default)]
    calories: Option<String>,
}

async fn add_meal(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<MealForm>,
) -> Response {
    let user = match require_user(&state, &session).await {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    let Ok(log_id) = parse_id::<DailyLogId>(&form.daily_log_id, "daily log") else {
        return flash_redirect(&session, "/logs", "Unknown daily log").await;
    };

    let meal_type = match blank_to_none(form.meal_type.as_deref()).map(str::parse::<MealType>) {
        None => None,
        Some(Ok(t)) => Some(t),
        Some(Err(e)) => return flash_redirect(&session, "/logs", e.to_string()).await,
    };
    let calories = match blank_to_none(form.calories.as_deref()).map(str::parse::<i32>) {
        None => None,
        Some(Ok(c)) => Some(c),
        Some(Err(_)) => return flash_redirect(&session, "/logs", "Invalid calories").await,
    };

    let meal = NewMeal {
        meal_type,
        food_name: form.food_name,
        serving_size: form.serving_size,
        calories,
        ..NewMeal::default()
    };

    match state.shared.meals.add_meal(user.id, log_id, meal).await {
        Ok(written) => {
            let back = format!("/logs/{}", written.daily_log.date);
            flash_redirect(&session, &back, "Meal added").await
        }
        Err(e) => flash_redirect(&session, "/logs", e.to_string()).await,
    }
}
