//! Axum route handlers for the agent memory REST API.
//!
//! Each handler performs its own load -> mutate -> save cycle against the
//! store with no await point in between.

use crate::dashboard;
use crate::error::ApiError;
use crate::store::MemoryStore;
use agent_memory_types::*;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, put};
use axum::Router;
use std::sync::Arc;
use std::time::Instant;

const TASK_NOT_FOUND: &str = "Task not found";
const NOTE_NOT_FOUND: &str = "Note not found";

pub struct AppState {
    pub store: Arc<dyn MemoryStore>,
    pub port: u16,
    pub start_time: Instant,
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = tower_http::cors::CorsLayer::permissive();

    Router::new()
        .route("/", get(dashboard::dashboard))
        // Tasks
        .route("/api/tasks", get(list_tasks).post(add_task))
        .route("/api/tasks/pending", get(list_pending_tasks))
        .route("/api/tasks/:index", put(update_task).delete(delete_task))
        // Notes
        .route("/api/notes", get(list_notes).post(add_note))
        .route("/api/notes/:index", axum::routing::delete(delete_note))
        // Service
        .route("/api/stats", get(stats))
        .route("/api/health", get(health))
        .with_state(state)
        .layer(cors)
}

fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn rejected(err: ApiError) -> ApiError {
    log::warn!("Rejected request: {}", err);
    err
}

/// Write the document back; on failure log the cause and report only
/// `public_msg` to the client.
fn persist(store: &dyn MemoryStore, doc: &Document, public_msg: &str) -> Result<(), ApiError> {
    store.save(doc).map_err(|e| {
        log::error!("{}: {}", public_msg, e);
        ApiError::Persistence(public_msg.to_string())
    })
}

// =====================================================
// Task Endpoints
// =====================================================

// GET /api/tasks
pub async fn list_tasks(State(state): State<Arc<AppState>>) -> Json<Vec<Task>> {
    Json(state.store.load().tasks)
}

// GET /api/tasks/pending
pub async fn list_pending_tasks(State(state): State<Arc<AppState>>) -> Json<Vec<Task>> {
    Json(state.store.load().pending_tasks())
}

// POST /api/tasks
pub async fn add_task(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AddTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(req) = body.map_err(|e| rejected(e.into()))?;
    let text = req
        .task
        .filter(|t| !t.is_empty())
        .ok_or_else(|| rejected(ApiError::Validation("Task text required".into())))?;

    let mut doc = state.store.load();
    let task = Task::new(text, now_iso());
    doc.push_task(task.clone());
    persist(state.store.as_ref(), &doc, "Failed to save task")?;

    log::info!("Added task #{}: {}", doc.tasks.len() - 1, task.text);
    Ok((StatusCode::CREATED, Json(task)))
}

// PUT /api/tasks/:index
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(index): Path<String>,
    body: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let mut doc = state.store.load();
    let pos = doc
        .task_position(&index)
        .ok_or_else(|| rejected(ApiError::NotFound(TASK_NOT_FOUND.into())))?;

    let Json(req) = body.map_err(|e| rejected(e.into()))?;
    let done = req
        .done
        .ok_or_else(|| rejected(ApiError::Validation("Done flag required".into())))?;

    let updated = doc
        .set_task_done(pos, done)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(TASK_NOT_FOUND.into()))?;
    persist(state.store.as_ref(), &doc, "Failed to update task")?;

    log::info!("Task #{} marked done={}", pos, done);
    Ok(Json(updated))
}

// DELETE /api/tasks/:index
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(index): Path<String>,
) -> Result<Json<Deleted<Task>>, ApiError> {
    let mut doc = state.store.load();
    let removed = doc
        .task_position(&index)
        .and_then(|pos| doc.remove_task(pos))
        .ok_or_else(|| rejected(ApiError::NotFound(TASK_NOT_FOUND.into())))?;
    persist(state.store.as_ref(), &doc, "Failed to delete task")?;

    log::info!("Deleted task #{}: {}", index, removed.text);
    Ok(Json(Deleted { deleted: removed }))
}

// =====================================================
// Note Endpoints
// =====================================================

// GET /api/notes
pub async fn list_notes(State(state): State<Arc<AppState>>) -> Json<Vec<Note>> {
    Json(state.store.load().notes)
}

// POST /api/notes
pub async fn add_note(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AddNoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let Json(req) = body.map_err(|e| rejected(e.into()))?;
    let text = req
        .note
        .filter(|n| !n.is_empty())
        .ok_or_else(|| rejected(ApiError::Validation("Note text required".into())))?;

    let mut doc = state.store.load();
    let note = Note::new(text, now_iso());
    doc.push_note(note.clone());
    persist(state.store.as_ref(), &doc, "Failed to save note")?;

    log::info!("Added note #{}", doc.notes.len() - 1);
    Ok((StatusCode::CREATED, Json(note)))
}

// DELETE /api/notes/:index
pub async fn delete_note(
    State(state): State<Arc<AppState>>,
    Path(index): Path<String>,
) -> Result<Json<Deleted<Note>>, ApiError> {
    let mut doc = state.store.load();
    let removed = doc
        .note_position(&index)
        .and_then(|pos| doc.remove_note(pos))
        .ok_or_else(|| rejected(ApiError::NotFound(NOTE_NOT_FOUND.into())))?;
    persist(state.store.as_ref(), &doc, "Failed to delete note")?;

    log::info!("Deleted note #{}", index);
    Ok(Json(Deleted { deleted: removed }))
}

// =====================================================
// Service Endpoints
// =====================================================

// GET /api/stats
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<MemoryStats> {
    Json(state.store.load().stats())
}

// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "Server running".to_string(),
        port: state.port,
    })
}
