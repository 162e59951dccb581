//! Keyword-table classification over joined todo content.
//!
//! Every heuristic here is an ordered table of (keyword set -> value) pairs
//! evaluated by one generic matcher; first matching row wins. Extending a
//! policy means adding a row, not touching control flow.

/// Ordered (keywords -> agent display name) table
const AGENT_NAMES: &[(&[&str], &str)] = &[
    (&["email", "outlook"], "Email Processing Agent"),
    (&["pdf", "document"], "Document Analysis Agent"),
    (&["excel", "data"], "Data Processing Agent"),
    (&["workflow", "n8n"], "Workflow Automation Agent"),
    (&["ui", "design"], "UI/UX Design Agent"),
    (&["test", "debug"], "Quality Assurance Agent"),
    (&["monitor", "real-time"], "Monitoring System Agent"),
    (&["database", "sql"], "Database Management Agent"),
];

/// Fallback name when no keyword row matches
const DEFAULT_AGENT_NAME: &str = "Task Management Agent";

/// Ordered (keywords -> token complexity multiplier) table
const COMPLEXITY: &[(&[&str], f64)] = &[
    (&["ai", "openai"], 3.0),
    (&["workflow", "integration"], 2.5),
    (&["ui", "frontend"], 2.0),
    (&["fix", "debug"], 1.5),
];

/// Time-estimate verb classes: (keywords, minutes range inclusive)
const TIME_RANGES: &[(&[&str], u64, u64)] = &[
    (&["create", "build", "develop", "implement"], 15, 45),
    (&["fix", "update", "modify", "adjust"], 5, 20),
    (&["test", "verify", "check"], 3, 15),
];

/// Default minutes range when no verb class matches
const DEFAULT_TIME_RANGE: (u64, u64) = (5, 30);

/// Find the first table row whose keyword set matches the content.
///
/// `content` must already be lowercased by the caller.
fn first_match<'a, T>(content: &str, table: &'a [(&[&str], T)]) -> Option<&'a T> {
    table
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| content.contains(k)))
        .map(|(_, value)| value)
}

/// Derive a display name for an agent from its lowercased joined content.
pub fn agent_name(content_lower: &str) -> &'static str {
    first_match(content_lower, AGENT_NAMES)
        .copied()
        .unwrap_or(DEFAULT_AGENT_NAME)
}

/// Token-estimate complexity multiplier for the lowercased joined content.
pub fn complexity_multiplier(content_lower: &str) -> f64 {
    first_match(content_lower, COMPLEXITY).copied().unwrap_or(1.0)
}

/// Stable 64-bit FNV-1a hash, used to keep time estimates deterministic.
fn fnv1a(input: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in input.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Estimate completion time for a task as a minutes string (e.g. `"12m"`).
///
/// The verb class picks the range; a stable hash of the content picks the
/// point inside it, so the same task text always maps to the same estimate.
pub fn estimated_time(content: &str) -> String {
    let lower = content.to_lowercase();
    let (lo, hi) = first_match(&lower, &time_table())
        .copied()
        .unwrap_or(DEFAULT_TIME_RANGE);
    let minutes = lo + fnv1a(content) % (hi - lo + 1);
    format!("{}m", minutes)
}

/// TIME_RANGES reshaped to fit the generic matcher's pair layout
fn time_table() -> Vec<(&'static [&'static str], (u64, u64))> {
    TIME_RANGES
        .iter()
        .map(|&(keywords, lo, hi)| (keywords, (lo, hi)))
        .collect()
}
