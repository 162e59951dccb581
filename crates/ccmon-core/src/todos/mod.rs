//! Per-agent todo file reading from `~/.claude/todos/`.
//!
//! The agent runtime writes one JSON file per agent, named
//! `{session}-agent-{agent-id}.json`. This module only reads them.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Status of a single todo item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    /// Item is waiting to be started
    Pending,
    /// Item is currently being worked on
    InProgress,
    /// Item has been completed
    Completed,
}

impl std::fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TodoStatus::Pending => write!(f, "pending"),
            TodoStatus::InProgress => write!(f, "in_progress"),
            TodoStatus::Completed => write!(f, "completed"),
        }
    }
}

/// A single work item from an agent's todo file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoItem {
    /// Item text
    #[serde(default)]
    pub content: String,
    /// Current status
    #[serde(default = "default_todo_status")]
    pub status: TodoStatus,
}

fn default_todo_status() -> TodoStatus {
    TodoStatus::Pending
}

/// One agent's todo file: id, modification time, and its items
#[derive(Debug, Clone)]
pub struct AgentTodoFile {
    /// Agent id extracted from the filename
    pub agent_id: String,
    /// Filesystem modification time
    pub modified_at: DateTime<Utc>,
    /// Items in file order
    pub items: Vec<TodoItem>,
}

/// Default number of agent files returned by [`list_recent_agent_files`]
pub const DEFAULT_AGENT_FILE_LIMIT: usize = 20;

/// Extract the agent id from a todo filename stem.
///
/// Filenames look like `{uuid}-agent-{uuid}.json`; the id is everything
/// after the last `-agent-` marker.
fn agent_id_from_stem(stem: &str) -> Option<&str> {
    let idx = stem.rfind("-agent-")?;
    let id = &stem[idx + "-agent-".len()..];
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Read the items of a single todo file
pub fn read_todos(path: &Path) -> Result<Vec<TodoItem>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read todo file: {:?}", path))?;

    let items: Vec<TodoItem> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse todo file: {:?}", path))?;

    Ok(items)
}

/// Sort candidates by modification time, newest first, and truncate.
fn most_recent(mut candidates: Vec<(PathBuf, String, SystemTime)>, limit: usize) -> Vec<(PathBuf, String, SystemTime)> {
    candidates.sort_by(|a, b| b.2.cmp(&a.2));
    candidates.truncate(limit);
    candidates
}

/// List the most recently modified agent todo files in a directory.
///
/// Returns at most `limit` files, newest first. A file that fails to parse
/// is logged and skipped; one bad file never fails the whole listing. A
/// missing directory yields an empty list.
pub fn list_recent_agent_files(dir: &Path, limit: usize) -> Result<Vec<AgentTodoFile>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read todos directory: {:?}", dir))?;

    let mut candidates = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();

        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let Some(agent_id) = agent_id_from_stem(stem) else {
            continue;
        };
        let agent_id = agent_id.to_string();

        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("Skipping todo file {:?}: no mtime: {}", path, e);
                continue;
            }
        };

        candidates.push((path, agent_id, modified));
    }

    let mut files = Vec::new();
    for (path, agent_id, modified) in most_recent(candidates, limit) {
        match read_todos(&path) {
            Ok(items) => files.push(AgentTodoFile {
                agent_id,
                modified_at: DateTime::<Utc>::from(modified),
                items,
            }),
            Err(e) => {
                tracing::warn!("Skipping malformed todo file {:?}: {}", path, e);
            }
        }
    }

    Ok(files)
}
