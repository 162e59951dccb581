//! Derivation of a display-ready agent state from a todo file snapshot.
//!
//! Pure computation: given the same file contents and the same `now`, the
//! output is identical. Nothing here touches the filesystem.

mod classify;

pub use classify::estimated_time;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::todos::{AgentTodoFile, TodoItem, TodoStatus};

/// Activity state shown for an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// In-progress work with a fresh file (modified < 5 min ago)
    Active,
    /// In-progress work but the file has gone stale
    Coordinating,
    /// No in-progress work, file modified within the last hour
    Ready,
    /// Nothing in progress, no recent modification
    Idle,
}

impl AgentStatus {
    /// Whether the agent counts toward the active-agents total
    pub fn is_active(self) -> bool {
        matches!(self, AgentStatus::Active | AgentStatus::Coordinating)
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Active => write!(f, "active"),
            AgentStatus::Coordinating => write!(f, "coordinating"),
            AgentStatus::Ready => write!(f, "ready"),
            AgentStatus::Idle => write!(f, "idle"),
        }
    }
}

/// Priority label for a queued task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Critical,
    High,
    Normal,
}

/// One entry in an agent's pending task queue
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedTask {
    /// Task text, truncated for display
    pub task: String,
    /// Priority derived from the item's status
    pub priority: TaskPriority,
    /// Deterministic completion-time estimate (e.g. "12m")
    pub estimated_time: String,
}

/// Ephemeral, recomputed-per-request summary of one agent's activity
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentState {
    /// Agent id, shortened for display
    pub id: String,
    /// Heuristic display name
    pub name: String,
    /// Derived activity status
    pub status: AgentStatus,
    /// What the agent is working on right now
    pub current_task: String,
    /// Bounded token-usage estimate
    pub tokens_used: u64,
    /// Number of completed items
    pub tasks_completed: usize,
    /// Completion ratio as a percentage, one decimal
    pub efficiency: f64,
    /// Unix timestamp of the file's last modification
    pub last_activity: i64,
    /// Up to five pending tasks, in file order
    pub task_queue: Vec<QueuedTask>,
    /// True count of non-completed items (may exceed the queue length)
    pub queue_count: usize,
}

/// Lower bound of the token-usage estimate
pub const MIN_TOKEN_ESTIMATE: u64 = 500;
/// Upper bound of the token-usage estimate
pub const MAX_TOKEN_ESTIMATE: u64 = 15_000;

/// Base tokens attributed to each todo item
const TOKENS_PER_ITEM: u64 = 100;

/// In-progress work is considered live for this long after the last write
const ACTIVE_WINDOW_SECS: i64 = 300;
/// Without in-progress work, a file this fresh still counts as ready
const READY_WINDOW_SECS: i64 = 3_600;

/// Maximum queue entries in a derived state
const MAX_QUEUE_LEN: usize = 5;
/// Display truncation for the current task
const CURRENT_TASK_LEN: usize = 50;
/// Display truncation for queued tasks
const QUEUE_TASK_LEN: usize = 40;
/// Display truncation for the agent id
const AGENT_ID_LEN: usize = 12;

/// Derive the display state for one agent todo file.
pub fn derive(file: &AgentTodoFile, now: DateTime<Utc>) -> AgentState {
    let age_secs = (now - file.modified_at).num_seconds();
    let status = derive_status(&file.items, age_secs);

    let content_lower = joined_content(&file.items).to_lowercase();
    let total = file.items.len();
    let completed = file
        .items
        .iter()
        .filter(|t| t.status == TodoStatus::Completed)
        .count();

    let pending: Vec<&TodoItem> = file
        .items
        .iter()
        .filter(|t| t.status != TodoStatus::Completed)
        .collect();

    let task_queue: Vec<QueuedTask> = pending
        .iter()
        .take(MAX_QUEUE_LEN)
        .map(|t| QueuedTask {
            task: truncate(&t.content, QUEUE_TASK_LEN),
            priority: priority_for(t.status),
            estimated_time: classify::estimated_time(&t.content),
        })
        .collect();

    AgentState {
        id: file.agent_id.chars().take(AGENT_ID_LEN).collect(),
        name: derive_name(&file.items, &content_lower, &file.agent_id),
        status,
        current_task: current_task(&file.items),
        tokens_used: estimate_tokens(total, &content_lower, status),
        tasks_completed: completed,
        efficiency: efficiency(completed, total),
        last_activity: file.modified_at.timestamp(),
        queue_count: pending.len(),
        task_queue,
    }
}

/// Status decision table; first match wins.
fn derive_status(items: &[TodoItem], age_secs: i64) -> AgentStatus {
    let in_progress = items.iter().any(|t| t.status == TodoStatus::InProgress);
    if in_progress && age_secs < ACTIVE_WINDOW_SECS {
        AgentStatus::Active
    } else if in_progress {
        AgentStatus::Coordinating
    } else if age_secs < READY_WINDOW_SECS {
        AgentStatus::Ready
    } else {
        AgentStatus::Idle
    }
}

/// Name an agent from its todo content, or from its id when the list is empty.
fn derive_name(items: &[TodoItem], content_lower: &str, agent_id: &str) -> String {
    if items.is_empty() {
        let short: String = agent_id.chars().take(8).collect();
        return format!("Agent {}", short);
    }
    classify::agent_name(content_lower).to_string()
}

/// Bounded token-usage estimate from item count, content, and status.
fn estimate_tokens(item_count: usize, content_lower: &str, status: AgentStatus) -> u64 {
    let base = (item_count as u64 * TOKENS_PER_ITEM) as f64;
    let complexity = classify::complexity_multiplier(content_lower);
    let status_mult = match status {
        AgentStatus::Active => 1.5,
        AgentStatus::Coordinating => 2.0,
        AgentStatus::Ready => 0.8,
        AgentStatus::Idle => 0.3,
    };

    let estimate = (base * complexity * status_mult) as u64;
    estimate.clamp(MIN_TOKEN_ESTIMATE, MAX_TOKEN_ESTIMATE)
}

/// Completion ratio as a percentage rounded to one decimal.
fn efficiency(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = completed as f64 / total as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

/// First in-progress item, else the first item, else "Idle".
fn current_task(items: &[TodoItem]) -> String {
    items
        .iter()
        .find(|t| t.status == TodoStatus::InProgress)
        .or_else(|| items.first())
        .map(|t| truncate(&t.content, CURRENT_TASK_LEN))
        .unwrap_or_else(|| "Idle".to_string())
}

fn priority_for(status: TodoStatus) -> TaskPriority {
    match status {
        TodoStatus::InProgress => TaskPriority::Critical,
        TodoStatus::Pending => TaskPriority::High,
        TodoStatus::Completed => TaskPriority::Normal,
    }
}

fn joined_content(items: &[TodoItem]) -> String {
    items
        .iter()
        .map(|t| t.content.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate to `max` characters, appending "..." when anything was cut.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn item(content: &str, status: TodoStatus) -> TodoItem {
        TodoItem {
            content: content.to_string(),
            status,
        }
    }

    fn file_with_age(items: Vec<TodoItem>, age_secs: i64, now: DateTime<Utc>) -> AgentTodoFile {
        AgentTodoFile {
            agent_id: "0123456789abcdef".to_string(),
            modified_at: now - Duration::seconds(age_secs),
            items,
        }
    }

    #[test]
    fn test_status_table() {
        let in_progress = vec![item("work", TodoStatus::InProgress)];
        let pending = vec![item("work", TodoStatus::Pending)];
        assert_eq!(derive_status(&in_progress, 10), AgentStatus::Active);
        assert_eq!(derive_status(&in_progress, 400), AgentStatus::Coordinating);
        assert_eq!(derive_status(&pending, 1_800), AgentStatus::Ready);
        assert_eq!(derive_status(&pending, 4_000), AgentStatus::Idle);
    }

    #[test]
    fn test_status_boundary_values() {
        let in_progress = vec![item("work", TodoStatus::InProgress)];
        let pending = vec![item("work", TodoStatus::Pending)];
        assert_eq!(derive_status(&in_progress, 299), AgentStatus::Active);
        assert_eq!(derive_status(&in_progress, 300), AgentStatus::Coordinating);
        assert_eq!(derive_status(&pending, 3_599), AgentStatus::Ready);
        assert_eq!(derive_status(&pending, 3_600), AgentStatus::Idle);
    }

    #[test]
    fn test_name_precedence_email_before_pdf() {
        let now = Utc::now();
        let file = file_with_age(
            vec![
                item("Draft the email reply", TodoStatus::Pending),
                item("Summarize the pdf attachment", TodoStatus::Pending),
            ],
            10,
            now,
        );
        assert_eq!(derive(&file, now).name, "Email Processing Agent");
    }

    #[test]
    fn test_name_empty_list_uses_id_prefix() {
        let now = Utc::now();
        let file = file_with_age(vec![], 10, now);
        assert_eq!(derive(&file, now).name, "Agent 01234567");
    }

    #[test]
    fn test_token_estimate_bounds() {
        // One cheap idle item would estimate 30; clamps up to the floor
        let now = Utc::now();
        let file = file_with_age(vec![item("note", TodoStatus::Pending)], 10_000, now);
        assert_eq!(derive(&file, now).tokens_used, MIN_TOKEN_ESTIMATE);

        // 60 openai items while coordinating: 60*100*3.0*2.0 = 36000, clamps down
        let items: Vec<TodoItem> = (0..60)
            .map(|i| item(&format!("openai task {}", i), TodoStatus::InProgress))
            .collect();
        let file = file_with_age(items, 400, now);
        assert_eq!(derive(&file, now).tokens_used, MAX_TOKEN_ESTIMATE);
    }

    #[test]
    fn test_token_estimate_multipliers() {
        // 4 plain items, active: 4*100*1.0*1.5 = 600
        let now = Utc::now();
        let items = vec![
            item("alpha", TodoStatus::InProgress),
            item("beta", TodoStatus::Pending),
            item("gamma", TodoStatus::Pending),
            item("delta", TodoStatus::Pending),
        ];
        let file = file_with_age(items, 10, now);
        assert_eq!(derive(&file, now).tokens_used, 600);
    }

    #[test]
    fn test_efficiency_rounding() {
        assert_eq!(efficiency(1, 3), 33.3);
        assert_eq!(efficiency(2, 3), 66.7);
        assert_eq!(efficiency(0, 0), 0.0);
        assert_eq!(efficiency(3, 3), 100.0);
    }

    #[test]
    fn test_queue_cap_and_count() {
        let now = Utc::now();
        let mut items: Vec<TodoItem> = (0..8)
            .map(|i| item(&format!("pending {}", i), TodoStatus::Pending))
            .collect();
        items.push(item("done", TodoStatus::Completed));

        let state = derive(&file_with_age(items, 10, now), now);
        assert_eq!(state.task_queue.len(), 5);
        assert_eq!(state.queue_count, 8);
        assert_eq!(state.tasks_completed, 1);
        // Original order preserved
        assert_eq!(state.task_queue[0].task, "pending 0");
    }

    #[test]
    fn test_queue_priorities() {
        let now = Utc::now();
        let items = vec![
            item("urgent", TodoStatus::InProgress),
            item("soon", TodoStatus::Pending),
        ];
        let state = derive(&file_with_age(items, 10, now), now);
        assert_eq!(state.task_queue[0].priority, TaskPriority::Critical);
        assert_eq!(state.task_queue[1].priority, TaskPriority::High);
    }

    #[test]
    fn test_current_task_prefers_in_progress() {
        let now = Utc::now();
        let items = vec![
            item("first pending", TodoStatus::Pending),
            item("the live one", TodoStatus::InProgress),
        ];
        let state = derive(&file_with_age(items, 10, now), now);
        assert_eq!(state.current_task, "the live one");

        let state = derive(
            &file_with_age(vec![item("only pending", TodoStatus::Pending)], 10, now),
            now,
        );
        assert_eq!(state.current_task, "only pending");

        let state = derive(&file_with_age(vec![], 10, now), now);
        assert_eq!(state.current_task, "Idle");
    }

    #[test]
    fn test_truncation() {
        let long = "x".repeat(60);
        assert_eq!(truncate(&long, 50).chars().count(), 53);
        assert!(truncate(&long, 50).ends_with("..."));
        assert_eq!(truncate("short", 50), "short");
    }

    #[test]
    fn test_id_shortened_to_twelve_chars() {
        let now = Utc::now();
        let state = derive(&file_with_age(vec![], 10, now), now);
        assert_eq!(state.id, "0123456789ab");
    }

    #[test]
    fn test_invariants_hold_across_inputs() {
        let now = Utc::now();
        let contents = ["fix the ui", "openai workflow", "plain chore", ""];
        let ages = [0_i64, 299, 300, 3_599, 3_600, 100_000];
        for (i, content) in contents.iter().enumerate() {
            for &age in &ages {
                let items: Vec<TodoItem> = (0..=i * 3)
                    .map(|n| {
                        item(
                            content,
                            if n % 3 == 0 {
                                TodoStatus::Completed
                            } else if n % 3 == 1 {
                                TodoStatus::InProgress
                            } else {
                                TodoStatus::Pending
                            },
                        )
                    })
                    .collect();
                let state = derive(&file_with_age(items, age, now), now);
                assert!(state.tokens_used >= MIN_TOKEN_ESTIMATE);
                assert!(state.tokens_used <= MAX_TOKEN_ESTIMATE);
                assert!((0.0..=100.0).contains(&state.efficiency));
                assert!(state.task_queue.len() <= 5);
                assert!(state.queue_count >= state.task_queue.len());
            }
        }
    }

    #[test]
    fn test_serializes_camel_case() {
        let now = Utc::now();
        let state = derive(
            &file_with_age(vec![item("work", TodoStatus::InProgress)], 10, now),
            now,
        );
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["status"], "active");
        assert!(json.get("currentTask").is_some());
        assert!(json.get("tokensUsed").is_some());
        assert!(json.get("queueCount").is_some());
        assert!(json["taskQueue"][0].get("estimatedTime").is_some());
    }
}
