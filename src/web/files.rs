//! Recent file-change scan over the project directory.
//!
//! Thin glob wrapper with no derivation logic: files matching the
//! configured patterns that were modified inside the trailing window are
//! reported, newest last, capped at ten.

use axum::extract::State;
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use super::api::ApiState;

/// Only changes inside this trailing window are reported
const CHANGE_WINDOW_SECS: i64 = 300;
/// Maximum number of changes in a response
const MAX_CHANGES: usize = 10;

/// One recently modified file
#[derive(Debug, Clone, Serialize)]
pub struct FileChange {
    /// Path relative to the project directory
    pub path: String,
    /// Modification time, epoch seconds
    pub modified: i64,
    #[serde(rename = "type")]
    pub change_type: &'static str,
}

/// File changes response
#[derive(Debug, Serialize)]
pub struct FileChangesResponse {
    pub changes: Vec<FileChange>,
}

/// Scan the project directory for recently modified files.
fn scan_recent_changes(
    project_dir: &Path,
    patterns: &[String],
    now: DateTime<Utc>,
) -> Vec<FileChange> {
    let mut changes = Vec::new();

    for pattern in patterns {
        let full_pattern = project_dir.join(pattern);
        let Some(full_pattern) = full_pattern.to_str() else {
            continue;
        };
        let paths = match glob::glob(full_pattern) {
            Ok(paths) => paths,
            Err(e) => {
                tracing::warn!("Invalid file-change pattern {:?}: {}", pattern, e);
                continue;
            }
        };

        for path in paths.flatten() {
            if !path.is_file() {
                continue;
            }
            let Ok(modified) = path.metadata().and_then(|m| m.modified()) else {
                continue;
            };
            let modified = DateTime::<Utc>::from(modified).timestamp();
            if now.timestamp() - modified >= CHANGE_WINDOW_SECS {
                continue;
            }

            let relative = path
                .strip_prefix(project_dir)
                .unwrap_or(&path)
                .to_string_lossy()
                .to_string();
            changes.push(FileChange {
                path: relative,
                modified,
                change_type: "modified",
            });
        }
    }

    changes.sort_by_key(|c| c.modified);
    if changes.len() > MAX_CHANGES {
        changes.drain(..changes.len() - MAX_CHANGES);
    }
    changes
}

/// Get project files modified within the trailing window
pub async fn file_changes(State(state): State<Arc<ApiState>>) -> Json<FileChangesResponse> {
    let changes = scan_recent_changes(
        &state.settings.files.project_dir,
        &state.settings.files.patterns,
        Utc::now(),
    );
    Json(FileChangesResponse { changes })
}
