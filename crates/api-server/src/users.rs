//! Handlers for `/api/users` and the per-user exercise routes.

use crate::error::ApiResult;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};
use sqlite::SqliteStore;
use tracing::instrument;
use tracker::coerce::format_date;
use tracker::{
    Exercise, ExerciseFields, ExerciseLog, ExerciseTracker, ExerciseTracking, LogFilter, RecordId,
    User,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", post(create_user).get(list_users))
        .route("/api/users/:_id/exercises", post(add_exercise))
        .route("/api/users/:_id/logs", get(exercise_log))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserForm {
    username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    username: String,
    #[serde(rename = "_id")]
    id: RecordId,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            id: user.id,
        }
    }
}

// `_id` is the owning user's id, not the exercise's
#[derive(Debug, Serialize)]
pub struct AddExerciseResponse {
    username: String,
    description: String,
    duration: Option<i64>,
    date: String,
    #[serde(rename = "_id")]
    id: RecordId,
}

#[derive(Debug, Serialize)]
pub struct LogEntry {
    description: String,
    duration: Option<i64>,
    date: String,
}

impl From<Exercise> for LogEntry {
    fn from(exercise: Exercise) -> Self {
        Self {
            date: format_date(&exercise.date),
            description: exercise.description,
            duration: exercise.duration,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogResponse {
    username: String,
    count: usize,
    #[serde(rename = "_id")]
    id: RecordId,
    log: Vec<LogEntry>,
}

fn tracker_for(state: &AppState) -> ExerciseTracker<'_, SqliteStore, SqliteStore> {
    ExerciseTracker::new(state.store.as_ref(), state.store.as_ref())
}

#[instrument(skip(state))]
async fn create_user(
    State(state): State<AppState>,
    Form(form): Form<CreateUserForm>,
) -> ApiResult<Json<UserResponse>> {
    let username = form.username.unwrap_or_default();
    let user = tracker_for(&state).create_user(username).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = tracker_for(&state).list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[instrument(skip(state))]
async fn add_exercise(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Form(fields): Form<ExerciseFields>,
) -> ApiResult<Json<AddExerciseResponse>> {
    let user_id: RecordId = user_id.parse()?;
    let (user, exercise) = tracker_for(&state).add_exercise(&user_id, fields).await?;

    Ok(Json(AddExerciseResponse {
        username: user.username,
        description: exercise.description,
        duration: exercise.duration,
        date: format_date(&exercise.date),
        id: user.id,
    }))
}

#[instrument(skip(state))]
async fn exercise_log(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(filter): Query<LogFilter>,
) -> ApiResult<Json<LogResponse>> {
    let user_id: RecordId = user_id.parse()?;
    let log = tracker_for(&state).exercise_log(&user_id, filter).await?;
    let count = log.count();
    let ExerciseLog { user, exercises } = log;
    Ok(Json(LogResponse {
        username: user.username,
        count,
        id: user.id,
        log: exercises.into_iter().map(LogEntry::from).collect(),
    }))
}
