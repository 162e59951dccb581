//! Claude Code session metadata from `~/.claude/statsig/`.
//!
//! The runtime drops a `statsig.session_id.{n}` JSON file containing the
//! current session id and its start time in epoch milliseconds. Absence of
//! the file just means no live session; it is never an error.

use serde::Deserialize;
use std::path::Path;

/// Parsed session metadata
#[derive(Debug, Clone, Deserialize)]
pub struct SessionInfo {
    /// Session identifier
    #[serde(rename = "sessionID")]
    pub session_id: String,
    /// Session start time, epoch milliseconds
    #[serde(rename = "startTime")]
    pub start_time_ms: i64,
}

impl SessionInfo {
    /// Session start time in epoch seconds
    pub fn start_time_secs(&self) -> i64 {
        self.start_time_ms / 1_000
    }
}

/// Read session metadata from a Claude config directory, if present.
///
/// Looks for `statsig/statsig.session_id.*` and returns the first file that
/// parses. Unreadable or malformed files are logged and ignored.
pub fn read_session_info(claude_dir: &Path) -> Option<SessionInfo> {
    let statsig_dir = claude_dir.join("statsig");
    let entries = std::fs::read_dir(&statsig_dir).ok()?;

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.starts_with("statsig.session_id.") {
            continue;
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<SessionInfo>(&content) {
                Ok(info) => return Some(info),
                Err(e) => {
                    tracing::warn!("Ignoring malformed session file {:?}: {}", path, e);
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read session file {:?}: {}", path, e);
            }
        }
    }

    None
}
