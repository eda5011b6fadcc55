//! Backup HTTP Routes
//!
//! The caller-facing surface consumed by the application's UI: trigger a
//! local export, trigger a cloud backup, list/inspect/delete stored
//! backups, restore, and manage the auto-backup schedule.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::scheduler::{BackupSchedule, FileScheduleStore};
use crate::service::{
    BackupDetails, BackupError, BackupService, CloudBackupDescriptor, RestoreOptions,
    RestoreReport,
};
use crate::snapshot::BackupSnapshot;

/// Shared state for backup handlers.
pub struct BackupState {
    pub service: Arc<BackupService>,
    pub schedule_store: FileScheduleStore,
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBackupRequest {
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreRequest {
    #[serde(default)]
    pub delete_existing_data: bool,
    #[serde(default)]
    pub collections: Option<BTreeSet<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupsListResponse {
    pub backups: Vec<CloudBackupDescriptor>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScheduleRequest {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub cron: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn backup_error_response(err: BackupError) -> HandlerError {
    let status = match &err {
        BackupError::NotFound(_) => StatusCode::NOT_FOUND,
        BackupError::Corrupt { .. } | BackupError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        BackupError::RestoreInProgress => StatusCode::CONFLICT,
        BackupError::Cancelled { .. } => StatusCode::CONFLICT,
        _ => StatusCode::BAD_GATEWAY,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: status.as_u16(),
        }),
    )
}

fn internal_error(message: impl Into<String>) -> HandlerError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: message.into(),
            code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        }),
    )
}

// ==================
// Routes
// ==================

/// Create backup routes
pub fn backup_routes(state: Arc<BackupState>) -> Router {
    Router::new()
        .route("/export", post(export_handler))
        .route("/backups", post(create_backup_handler))
        .route("/backups", get(list_backups_handler))
        .route("/backups/:name", get(get_backup_handler))
        .route("/backups/:name", delete(delete_backup_handler))
        .route("/backups/:name/restore", post(restore_backup_handler))
        .route("/schedule", get(get_schedule_handler))
        .route("/schedule", patch(update_schedule_handler))
        .with_state(state)
}

// ==================
// Handlers
// ==================

/// Export a snapshot and return it directly, without storing it. This is
/// the "download a local backup" path.
async fn export_handler(
    State(state): State<Arc<BackupState>>,
    Json(request): Json<CreateBackupRequest>,
) -> Result<Json<BackupSnapshot>, HandlerError> {
    state
        .service
        .export_snapshot(request.description)
        .map(Json)
        .map_err(backup_error_response)
}

async fn create_backup_handler(
    State(state): State<Arc<BackupState>>,
    Json(request): Json<CreateBackupRequest>,
) -> Result<(StatusCode, Json<CloudBackupDescriptor>), HandlerError> {
    state
        .service
        .backup_to_cloud(request.description)
        .map(|descriptor| (StatusCode::CREATED, Json(descriptor)))
        .map_err(backup_error_response)
}

async fn list_backups_handler(
    State(state): State<Arc<BackupState>>,
) -> Result<Json<BackupsListResponse>, HandlerError> {
    let backups = state
        .service
        .list_backups()
        .map_err(backup_error_response)?;
    let total = backups.len();
    Ok(Json(BackupsListResponse { backups, total }))
}

async fn get_backup_handler(
    State(state): State<Arc<BackupState>>,
    Path(name): Path<String>,
) -> Result<Json<BackupDetails>, HandlerError> {
    state
        .service
        .backup_details(&name)
        .map(Json)
        .map_err(backup_error_response)
}

async fn delete_backup_handler(
    State(state): State<Arc<BackupState>>,
    Path(name): Path<String>,
) -> Result<StatusCode, HandlerError> {
    state
        .service
        .delete_backup(&name)
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(backup_error_response)
}

async fn restore_backup_handler(
    State(state): State<Arc<BackupState>>,
    Path(name): Path<String>,
    Json(request): Json<RestoreRequest>,
) -> Result<Json<RestoreReport>, HandlerError> {
    let options = RestoreOptions {
        delete_existing_data: request.delete_existing_data,
        collections: request.collections,
        ..Default::default()
    };
    state
        .service
        .restore(&name, &options)
        .map(Json)
        .map_err(backup_error_response)
}

async fn get_schedule_handler(
    State(state): State<Arc<BackupState>>,
) -> Result<Json<BackupSchedule>, HandlerError> {
    state
        .schedule_store
        .load()
        .map(Json)
        .map_err(|e| internal_error(e.to_string()))
}

async fn update_schedule_handler(
    State(state): State<Arc<BackupState>>,
    Json(request): Json<UpdateScheduleRequest>,
) -> Result<Json<BackupSchedule>, HandlerError> {
    let mut schedule = state
        .schedule_store
        .load()
        .map_err(|e| internal_error(e.to_string()))?;

    if let Some(enabled) = request.enabled {
        schedule.enabled = enabled;
    }
    if let Some(cron) = request.cron {
        // Reject bad expressions before persisting them.
        let probe = BackupSchedule {
            cron: cron.clone(),
            ..schedule.clone()
        };
        probe
            .next_occurrence_after(chrono::Utc::now())
            .map_err(|e| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: e.to_string(),
                        code: StatusCode::BAD_REQUEST.as_u16(),
                    }),
                )
            })?;
        schedule.cron = cron;
        schedule.next_run = None;
    }

    state
        .schedule_store
        .save(&schedule)
        .map_err(|e| internal_error(e.to_string()))?;
    Ok(Json(schedule))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::LocalBlobStore;
    use crate::document::MemoryDocumentStore;
    use tempfile::TempDir;

    #[test]
    fn test_error_mapping_statuses() {
        let (status, _) = backup_error_response(BackupError::NotFound("x".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = backup_error_response(BackupError::RestoreInProgress);
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = backup_error_response(BackupError::Validation("bad".into()));
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = backup_error_response(BackupError::Upload("io".into()));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_routes_assemble() {
        let temp = TempDir::new().unwrap();
        let documents = Arc::new(MemoryDocumentStore::new());
        let blobs = Arc::new(LocalBlobStore::new(temp.path().join("blobs")));
        let state = Arc::new(BackupState {
            service: Arc::new(BackupService::new(documents, blobs)),
            schedule_store: FileScheduleStore::new(temp.path().join("schedule.json")),
        });

        let _router = backup_routes(state);
    }
}
