//! REST API handlers for agent status and usage reporting

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use ccmon_core::derive::{self, AgentState};
use ccmon_core::session;
use ccmon_core::store::{AgentUsageRecord, UsageBreakdown, UsageSnapshot, UsageStore};
use ccmon_core::todos::{self, DEFAULT_AGENT_FILE_LIMIT};

use crate::config::Settings;
use crate::demo;

/// Session id reported when no live session metadata is found
const DEFAULT_SESSION_ID: &str = "claude-sonnet-4-20250514";

/// Context-window size assumed for the session
const TOTAL_TOKENS: u64 = 200_000;

/// Baseline token breakdown for the non-agent context categories.
///
/// These are heuristic constants, not measurements (the runtime is not
/// instrumented); agent context is added on top from the derived agents.
const BASE_SYSTEM_PROMPT: u64 = 6_700;
const BASE_SYSTEM_TOOLS: u64 = 11_400;
const BASE_MCP_TOOLS: u64 = 9_600;
const BASE_MEMORY_FILES: u64 = 4_300;
const BASE_MESSAGES: u64 = 115_700;

/// Dollars per 1K tokens
const COST_PER_1K_TOKENS: f64 = 0.015;

/// Shared application state for API handlers
pub struct ApiState {
    pub settings: Settings,
    pub store: UsageStore,
    /// Server start instant, injected at construction; used for session
    /// time when no session metadata file exists
    pub started_at: DateTime<Utc>,
}

/// Helper to create JSON error responses
pub(super) fn json_error(
    status: StatusCode,
    message: &str,
) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(serde_json::json!({"error": message})))
}

/// Aggregate agent status response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub connected: bool,
    pub session_id: String,
    pub active_agents: usize,
    pub total_agents: usize,
    pub agents: Vec<AgentState>,
    /// Seconds since the session (or server) started
    pub session_time: i64,
    pub last_activity: i64,
    /// False when the agents list is the demonstration fallback
    pub real_data: bool,
    pub total_agent_files: usize,
}

/// Current token usage response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsageResponse {
    pub used: u64,
    pub total: u64,
    pub percentage: f64,
    pub breakdown: UsageBreakdown,
    /// Tokens attributed to each agent
    pub agent_breakdown: BTreeMap<String, u64>,
    /// Context tokens held by each agent
    pub agent_context: BTreeMap<String, u64>,
    pub agent_total: u64,
    pub agent_context_total: u64,
    pub estimated_cost: f64,
    pub cost_per_agent: BTreeMap<String, f64>,
}

/// Usage history query parameters
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    /// Trailing window size in hours
    #[serde(default = "default_history_hours")]
    pub hours: u32,
}

fn default_history_hours() -> u32 {
    24
}

/// Usage history response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub history: Vec<UsageSnapshot>,
    pub total_records: usize,
    pub time_range_hours: u32,
    pub oldest_record: Option<DateTime<Utc>>,
    pub newest_record: Option<DateTime<Utc>>,
}

/// Derive the current agent set from the todo files.
///
/// Returns the derived agents, whether they are real, and the number of
/// agent files found. Falls back to the demonstration set when no agent
/// files exist so callers always get a non-empty list.
fn current_agents(
    state: &ApiState,
    now: DateTime<Utc>,
) -> Result<(Vec<AgentState>, bool, usize), (StatusCode, Json<serde_json::Value>)> {
    let files = todos::list_recent_agent_files(&state.settings.todos_dir(), DEFAULT_AGENT_FILE_LIMIT)
        .map_err(|e| {
            tracing::error!("Failed to list agent todo files: {:#}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        })?;

    let real_count = files.len();
    if real_count == 0 {
        return Ok((demo::demo_agents(now), false, 0));
    }

    let agents = files.iter().map(|f| derive::derive(f, now)).collect();
    Ok((agents, true, real_count))
}

/// Get aggregate session status with per-agent detail
pub async fn claude_status(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<serde_json::Value>)> {
    let now = Utc::now();
    let (agents, real_data, total_agent_files) = current_agents(&state, now)?;

    let session_info = session::read_session_info(&state.settings.claude_dir());
    let session_id = session_info
        .as_ref()
        .map(|s| s.session_id.clone())
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string());
    let session_start = session_info
        .as_ref()
        .map(|s| s.start_time_secs())
        .unwrap_or_else(|| state.started_at.timestamp());

    let active_agents = agents.iter().filter(|a| a.status.is_active()).count();

    Ok(Json(StatusResponse {
        connected: true,
        session_id,
        active_agents,
        total_agents: agents.len(),
        session_time: (now.timestamp() - session_start).max(0),
        last_activity: now.timestamp(),
        real_data,
        total_agent_files,
        agents,
    }))
}

/// Round to three decimals for dollar amounts
fn round_cost(cost: f64) -> f64 {
    (cost * 1_000.0).round() / 1_000.0
}

/// Context tokens attributed to an agent, estimated from its usage
fn context_tokens_for(tokens_used: u64) -> u64 {
    tokens_used * 3 / 4
}

/// Get current token usage; appends a snapshot to the history store.
///
/// Persistence is best-effort: a store failure is logged and the computed
/// usage is still returned to the client.
pub async fn token_usage(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<TokenUsageResponse>, (StatusCode, Json<serde_json::Value>)> {
    let now = Utc::now();
    let (agents, _real_data, _) = current_agents(&state, now)?;

    let mut agent_breakdown = BTreeMap::new();
    let mut agent_context = BTreeMap::new();
    let mut cost_per_agent = BTreeMap::new();
    for agent in &agents {
        let context = context_tokens_for(agent.tokens_used);
        agent_breakdown.insert(agent.name.clone(), agent.tokens_used);
        agent_context.insert(agent.name.clone(), context);
        cost_per_agent.insert(
            agent.name.clone(),
            round_cost(agent.tokens_used as f64 * COST_PER_1K_TOKENS / 1_000.0),
        );
    }

    let agent_total: u64 = agent_breakdown.values().sum();
    let agent_context_total: u64 = agent_context.values().sum();

    let base_used = BASE_SYSTEM_PROMPT
        + BASE_SYSTEM_TOOLS
        + BASE_MCP_TOOLS
        + BASE_MEMORY_FILES
        + BASE_MESSAGES;
    let used = (base_used + agent_context_total).min(TOTAL_TOKENS);
    let percentage = (used as f64 / TOTAL_TOKENS as f64 * 1_000.0).round() / 10.0;
    let estimated_cost = round_cost(used as f64 * COST_PER_1K_TOKENS / 1_000.0);

    let breakdown = UsageBreakdown {
        system_prompt: BASE_SYSTEM_PROMPT,
        system_tools: BASE_SYSTEM_TOOLS,
        mcp_tools: BASE_MCP_TOOLS,
        memory_files: BASE_MEMORY_FILES,
        messages: BASE_MESSAGES,
        agent_context: agent_context_total,
    };

    let session_id = session::read_session_info(&state.settings.claude_dir())
        .map(|s| s.session_id)
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string());

    let snapshot = UsageSnapshot {
        id: None,
        timestamp: now,
        total_tokens: TOTAL_TOKENS,
        used_tokens: used,
        percentage,
        breakdown: breakdown.clone(),
        estimated_cost,
        session_id,
        agent_breakdown: agent_breakdown.clone(),
    };
    let records: Vec<AgentUsageRecord> = agents
        .iter()
        .map(|agent| AgentUsageRecord {
            agent_name: agent.name.clone(),
            tokens_used: agent.tokens_used,
            context_tokens: context_tokens_for(agent.tokens_used),
            cost: round_cost(agent.tokens_used as f64 * COST_PER_1K_TOKENS / 1_000.0),
            efficiency: agent.efficiency,
            tasks_completed: agent.tasks_completed as u64,
        })
        .collect();

    if let Err(e) = state.store.append(&snapshot, &records) {
        tracing::warn!("Failed to persist usage snapshot: {}", e);
    }

    Ok(Json(TokenUsageResponse {
        used,
        total: TOTAL_TOKENS,
        percentage,
        breakdown,
        agent_breakdown,
        agent_context,
        agent_total,
        agent_context_total,
        estimated_cost,
        cost_per_agent,
    }))
}

/// Get persisted usage history for a trailing window
pub async fn usage_history(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, (StatusCode, Json<serde_json::Value>)> {
    let history = state.store.query_window(params.hours).map_err(|e| {
        tracing::error!("Usage history query failed: {}", e);
        json_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
    })?;

    Ok(Json(HistoryResponse {
        total_records: history.len(),
        time_range_hours: params.hours,
        oldest_record: history.last().map(|s| s.timestamp),
        newest_record: history.first().map(|s| s.timestamp),
        history,
    }))
}
