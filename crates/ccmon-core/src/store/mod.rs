//! SQLite-backed append-only store for usage snapshots.
//!
//! Two tables: `usage_snapshots` (one row per usage query) and
//! `agent_usage_records` (zero or more per snapshot, written in the same
//! transaction). Writes are serialised through a mutex around the single
//! connection so concurrent appends cannot interleave a snapshot with
//! another snapshot's agent rows.

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Token breakdown by context category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageBreakdown {
    pub system_prompt: u64,
    pub system_tools: u64,
    pub mcp_tools: u64,
    pub memory_files: u64,
    pub messages: u64,
    pub agent_context: u64,
}

/// One point-in-time record of aggregate token usage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    /// Store-assigned id; `None` until appended
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// When the snapshot was taken
    pub timestamp: DateTime<Utc>,
    pub total_tokens: u64,
    pub used_tokens: u64,
    pub percentage: f64,
    pub breakdown: UsageBreakdown,
    pub estimated_cost: f64,
    pub session_id: String,
    /// Tokens attributed to each agent by name
    pub agent_breakdown: BTreeMap<String, u64>,
}

/// Per-agent usage row persisted alongside a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentUsageRecord {
    pub agent_name: String,
    pub tokens_used: u64,
    pub context_tokens: u64,
    pub cost: f64,
    pub efficiency: f64,
    pub tasks_completed: u64,
}

/// Store failure
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Append-only usage history store.
///
/// Cheap to clone; clones share one connection.
#[derive(Clone)]
pub struct UsageStore {
    conn: Arc<Mutex<Connection>>,
}

impl UsageStore {
    /// Open (or create) the store at `path` and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;\
             PRAGMA synchronous=NORMAL;\
             PRAGMA foreign_keys=ON;\
             PRAGMA busy_timeout=5000;",
        )?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS usage_snapshots (\
               id INTEGER PRIMARY KEY AUTOINCREMENT,\
               timestamp INTEGER NOT NULL,\
               total_tokens INTEGER NOT NULL,\
               used_tokens INTEGER NOT NULL,\
               percentage REAL NOT NULL,\
               system_prompt INTEGER NOT NULL DEFAULT 0,\
               system_tools INTEGER NOT NULL DEFAULT 0,\
               mcp_tools INTEGER NOT NULL DEFAULT 0,\
               memory_files INTEGER NOT NULL DEFAULT 0,\
               messages INTEGER NOT NULL DEFAULT 0,\
               agent_context INTEGER NOT NULL DEFAULT 0,\
               estimated_cost REAL NOT NULL DEFAULT 0,\
               session_id TEXT NOT NULL DEFAULT '',\
               agent_breakdown TEXT NOT NULL DEFAULT '{}'\
             );\
             CREATE TABLE IF NOT EXISTS agent_usage_records (\
               id INTEGER PRIMARY KEY AUTOINCREMENT,\
               snapshot_id INTEGER NOT NULL REFERENCES usage_snapshots(id),\
               agent_name TEXT NOT NULL,\
               tokens_used INTEGER NOT NULL DEFAULT 0,\
               context_tokens INTEGER NOT NULL DEFAULT 0,\
               cost REAL NOT NULL DEFAULT 0,\
               efficiency REAL NOT NULL DEFAULT 0,\
               tasks_completed INTEGER NOT NULL DEFAULT 0\
             );\
             CREATE INDEX IF NOT EXISTS idx_snapshots_timestamp ON usage_snapshots(timestamp);\
             CREATE INDEX IF NOT EXISTS idx_agent_records_snapshot ON agent_usage_records(snapshot_id);",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Append a snapshot and its per-agent rows in one transaction.
    ///
    /// Returns the store-assigned snapshot id. Either everything is
    /// persisted or nothing is.
    pub fn append(
        &self,
        snapshot: &UsageSnapshot,
        records: &[AgentUsageRecord],
    ) -> Result<i64, StoreError> {
        let agent_breakdown = serde_json::to_string(&snapshot.agent_breakdown)?;

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO usage_snapshots \
             (timestamp, total_tokens, used_tokens, percentage, system_prompt, system_tools, \
              mcp_tools, memory_files, messages, agent_context, estimated_cost, session_id, \
              agent_breakdown) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                snapshot.timestamp.timestamp(),
                snapshot.total_tokens,
                snapshot.used_tokens,
                snapshot.percentage,
                snapshot.breakdown.system_prompt,
                snapshot.breakdown.system_tools,
                snapshot.breakdown.mcp_tools,
                snapshot.breakdown.memory_files,
                snapshot.breakdown.messages,
                snapshot.breakdown.agent_context,
                snapshot.estimated_cost,
                snapshot.session_id,
                agent_breakdown,
            ],
        )?;
        let snapshot_id = tx.last_insert_rowid();

        for record in records {
            tx.execute(
                "INSERT INTO agent_usage_records \
                 (snapshot_id, agent_name, tokens_used, context_tokens, cost, efficiency, \
                  tasks_completed) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    snapshot_id,
                    record.agent_name,
                    record.tokens_used,
                    record.context_tokens,
                    record.cost,
                    record.efficiency,
                    record.tasks_completed,
                ],
            )?;
        }

        tx.commit()?;
        Ok(snapshot_id)
    }

    /// Snapshots with `timestamp > now - hours`, newest first.
    pub fn query_window(&self, hours: u32) -> Result<Vec<UsageSnapshot>, StoreError> {
        self.query_window_at(hours, Utc::now())
    }

    /// Window query with an explicit `now`, so the cutoff is testable.
    pub fn query_window_at(
        &self,
        hours: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<UsageSnapshot>, StoreError> {
        let cutoff = now.timestamp() - i64::from(hours) * 3_600;

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, total_tokens, used_tokens, percentage, system_prompt, \
                    system_tools, mcp_tools, memory_files, messages, agent_context, \
                    estimated_cost, session_id, agent_breakdown \
             FROM usage_snapshots \
             WHERE timestamp > ?1 \
             ORDER BY timestamp DESC, id DESC",
        )?;

        let rows = stmt.query_map(params![cutoff], |row| {
            let ts: i64 = row.get(1)?;
            let agent_breakdown_json: String = row.get(13)?;
            Ok(UsageSnapshot {
                id: Some(row.get(0)?),
                timestamp: Utc.timestamp_opt(ts, 0).single().unwrap_or_default(),
                total_tokens: row.get(2)?,
                used_tokens: row.get(3)?,
                percentage: row.get(4)?,
                breakdown: UsageBreakdown {
                    system_prompt: row.get(5)?,
                    system_tools: row.get(6)?,
                    mcp_tools: row.get(7)?,
                    memory_files: row.get(8)?,
                    messages: row.get(9)?,
                    agent_context: row.get(10)?,
                },
                estimated_cost: row.get(11)?,
                session_id: row.get(12)?,
                agent_breakdown: serde_json::from_str(&agent_breakdown_json)
                    .unwrap_or_default(),
            })
        })?;

        let mut snapshots = Vec::new();
        for row in rows {
            snapshots.push(row?);
        }
        Ok(snapshots)
    }

    /// Per-agent rows for one snapshot, in insertion order.
    pub fn agent_records(&self, snapshot_id: i64) -> Result<Vec<AgentUsageRecord>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT agent_name, tokens_used, context_tokens, cost, efficiency, tasks_completed \
             FROM agent_usage_records WHERE snapshot_id = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![snapshot_id], |row| {
            Ok(AgentUsageRecord {
                agent_name: row.get(0)?,
                tokens_used: row.get(1)?,
                context_tokens: row.get(2)?,
                cost: row.get(3)?,
                efficiency: row.get(4)?,
                tasks_completed: row.get(5)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn snapshot_at(timestamp: DateTime<Utc>, used: u64) -> UsageSnapshot {
        UsageSnapshot {
            id: None,
            timestamp,
            total_tokens: 200_000,
            used_tokens: used,
            percentage: used as f64 / 200_000.0 * 100.0,
            breakdown: UsageBreakdown {
                system_prompt: 6_700,
                system_tools: 11_400,
                mcp_tools: 9_600,
                memory_files: 4_300,
                messages: used.saturating_sub(32_000),
                agent_context: 0,
            },
            estimated_cost: 1.5,
            session_id: "claude-sonnet-4".to_string(),
            agent_breakdown: BTreeMap::from([("Quality Assurance Agent".to_string(), 4_200)]),
        }
    }

    fn record(name: &str) -> AgentUsageRecord {
        AgentUsageRecord {
            agent_name: name.to_string(),
            tokens_used: 4_200,
            context_tokens: 3_200,
            cost: 0.063,
            efficiency: 96.8,
            tasks_completed: 12,
        }
    }

    #[test]
    fn test_append_then_query_window() {
        let store = UsageStore::open_in_memory().unwrap();
        let now = Utc::now();

        let id = store.append(&snapshot_at(now, 148_000), &[record("A")]).unwrap();
        assert!(id > 0);

        let history = store.query_window_at(24, now).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, Some(id));
        assert_eq!(history[0].used_tokens, 148_000);
        assert_eq!(
            history[0].agent_breakdown.get("Quality Assurance Agent"),
            Some(&4_200)
        );

        // Zero-hour window excludes everything at or before `now`
        assert!(store.query_window_at(0, now).unwrap().is_empty());
    }

    #[test]
    fn test_query_window_excludes_old_records() {
        let store = UsageStore::open_in_memory().unwrap();
        let now = Utc::now();

        store
            .append(&snapshot_at(now - Duration::hours(30), 10_000), &[])
            .unwrap();
        store
            .append(&snapshot_at(now - Duration::hours(1), 20_000), &[])
            .unwrap();

        let history = store.query_window_at(24, now).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].used_tokens, 20_000);
    }

    #[test]
    fn test_query_window_orders_newest_first() {
        let store = UsageStore::open_in_memory().unwrap();
        let now = Utc::now();

        store
            .append(&snapshot_at(now - Duration::seconds(2), 10_000), &[])
            .unwrap();
        store
            .append(&snapshot_at(now - Duration::seconds(1), 20_000), &[])
            .unwrap();

        let history = store.query_window_at(24, now).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].used_tokens, 20_000);
        assert_eq!(history[1].used_tokens, 10_000);
    }

    #[test]
    fn test_monotonic_ids() {
        let store = UsageStore::open_in_memory().unwrap();
        let now = Utc::now();
        let a = store.append(&snapshot_at(now, 1), &[]).unwrap();
        let b = store.append(&snapshot_at(now, 2), &[]).unwrap();
        assert!(b > a);
    }

    #[test]
    fn test_agent_records_round_trip() {
        let store = UsageStore::open_in_memory().unwrap();
        let now = Utc::now();

        let id = store
            .append(&snapshot_at(now, 1_000), &[record("A"), record("B")])
            .unwrap();

        let records = store.agent_records(id).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].agent_name, "A");
        assert_eq!(records[1].agent_name, "B");
        assert_eq!(records[0], record("A"));

        // Rows belong to their own snapshot only
        let other = store.append(&snapshot_at(now, 2_000), &[]).unwrap();
        assert!(store.agent_records(other).unwrap().is_empty());
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/usage_history.db");
        let store = UsageStore::open(&path).unwrap();
        store.append(&snapshot_at(Utc::now(), 1), &[]).unwrap();
        assert!(path.exists());
    }
}
