//! The summary fold: raw events in, dashboard figures out.
//!
//! `summarize` is pure and deterministic: the same event set and date range
//! always produce an identical summary. Ties in the top-N rankings break by
//! name so that hash-map iteration order never leaks into the output.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use parla_core::{ChatMetricEvent, DateRange, FlowId};

/// Ranking sizes, fixed across versions.
pub const TOP_FLOWS: usize = 5;
pub const TOP_OPTIONS: usize = 10;
pub const TOP_USERS: usize = 5;

/// The daily series keeps at most this many calendar-day buckets.
pub const DAILY_BUCKETS: usize = 30;

/// Option label that counts as "reached a satisfying exit" for the
/// completion heuristic.
const BACK_LABEL: &str = "Voltar";

// =============================================================================
// Summary types
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowCount {
    pub flow: String,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionCount {
    pub option: String,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCount {
    pub user_name: String,
    pub count: u64,
}

/// One calendar-day bucket (UTC date, `YYYY-MM-DD`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    pub date: String,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowCompletion {
    pub flow: String,
    /// Percentage of visiting sessions that reached the heuristic exit.
    pub completion_rate: f64,
}

/// The derived dashboard summary. Stateless; recomputed on every request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_interactions: u64,
    pub total_sessions: u64,
    pub avg_messages_per_session: f64,
    pub most_common_flows: Vec<FlowCount>,
    pub most_clicked_options: Vec<OptionCount>,
    /// Percentage over the voted subset only; 0 when nobody voted.
    pub helpfulness_rate: f64,
    pub ai_usage_rate: f64,
    pub total_tokens: u64,
    /// Average over events that recorded a nonzero latency.
    pub avg_response_time_ms: f64,
    pub top_users: Vec<UserCount>,
    pub interactions_by_day: Vec<DayCount>,
    pub completion_rate_by_flow: Vec<FlowCompletion>,
}

// =============================================================================
// The fold
// =============================================================================

/// Fold the event log into a [`MetricsSummary`], optionally restricted to an
/// inclusive date range.
pub fn summarize(events: &[ChatMetricEvent], range: Option<DateRange>) -> MetricsSummary {
    let filtered: Vec<&ChatMetricEvent> = events
        .iter()
        .filter(|e| range.map_or(true, |r| r.contains(e.timestamp)))
        .collect();

    let total = filtered.len() as u64;
    if total == 0 {
        return MetricsSummary::default();
    }

    let sessions: HashSet<Uuid> = filtered.iter().map(|e| e.session_id).collect();
    let total_sessions = sessions.len() as u64;

    // Flow popularity. `initial` is visited by definition in every session
    // and would dominate the ranking, so it is excluded.
    let mut flow_counts: HashMap<&str, u64> = HashMap::new();
    for e in &filtered {
        if e.flow != FlowId::INITIAL {
            *flow_counts.entry(e.flow.as_str()).or_insert(0) += 1;
        }
    }
    let most_common_flows = rank(flow_counts, TOP_FLOWS)
        .into_iter()
        .map(|(flow, count)| FlowCount {
            flow: flow.to_string(),
            count,
        })
        .collect();

    // Option click-through.
    let mut option_counts: HashMap<&str, u64> = HashMap::new();
    for e in &filtered {
        if let Some(option) = &e.selected_option {
            *option_counts.entry(option.as_str()).or_insert(0) += 1;
        }
    }
    let most_clicked_options = rank(option_counts, TOP_OPTIONS)
        .into_iter()
        .map(|(option, count)| OptionCount {
            option: option.to_string(),
            count,
        })
        .collect();

    // Helpfulness over the voted subset only.
    let voted: Vec<bool> = filtered.iter().filter_map(|e| e.was_helpful).collect();
    let helpfulness_rate = if voted.is_empty() {
        0.0
    } else {
        voted.iter().filter(|v| **v).count() as f64 / voted.len() as f64 * 100.0
    };

    let ai_count = filtered.iter().filter(|e| e.ai_generated).count() as u64;
    let ai_usage_rate = ai_count as f64 / total as f64 * 100.0;

    let total_tokens: u64 = filtered.iter().map(|e| u64::from(e.tokens_used)).sum();

    let timed: Vec<u32> = filtered
        .iter()
        .map(|e| e.response_time_ms)
        .filter(|ms| *ms > 0)
        .collect();
    let avg_response_time_ms = if timed.is_empty() {
        0.0
    } else {
        timed.iter().map(|ms| f64::from(*ms)).sum::<f64>() / timed.len() as f64
    };

    let mut user_counts: HashMap<&str, u64> = HashMap::new();
    for e in &filtered {
        *user_counts.entry(e.user_name.as_str()).or_insert(0) += 1;
    }
    let top_users = rank(user_counts, TOP_USERS)
        .into_iter()
        .map(|(user_name, count)| UserCount {
            user_name: user_name.to_string(),
            count,
        })
        .collect();

    MetricsSummary {
        total_interactions: total,
        total_sessions,
        avg_messages_per_session: total as f64 / total_sessions as f64,
        most_common_flows,
        most_clicked_options,
        helpfulness_rate,
        ai_usage_rate,
        total_tokens,
        avg_response_time_ms,
        top_users,
        interactions_by_day: daily_series(&filtered),
        completion_rate_by_flow: completion_rates(&filtered),
    }
}

/// Sort descending by count, ties broken by key, take the first `n`.
fn rank<'a>(counts: HashMap<&'a str, u64>, n: usize) -> Vec<(&'a str, u64)> {
    let mut sorted: Vec<(&str, u64)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    sorted.truncate(n);
    sorted
}

/// Group by UTC calendar day, ascending, capped to the most recent
/// [`DAILY_BUCKETS`] buckets present in the set (not a sliding wall-clock
/// window).
fn daily_series(filtered: &[&ChatMetricEvent]) -> Vec<DayCount> {
    let mut by_day: HashMap<String, u64> = HashMap::new();
    for e in filtered {
        let day = e.timestamp.date_naive().format("%Y-%m-%d").to_string();
        *by_day.entry(day).or_insert(0) += 1;
    }

    let mut days: Vec<DayCount> = by_day
        .into_iter()
        .map(|(date, count)| DayCount { date, count })
        .collect();
    days.sort_by(|a, b| a.date.cmp(&b.date));
    if days.len() > DAILY_BUCKETS {
        days.drain(..days.len() - DAILY_BUCKETS);
    }
    days
}

/// The completion heuristic: a session "completes" a flow if it visited the
/// flow and, at or after the first visit, either cast a helpfulness vote or
/// selected an option labeled exactly "Voltar".
///
/// This is a proxy with no ground truth — it conflates "clicked Back" with
/// "got what they came for" and misses sessions that simply closed the
/// widget. Kept as-is deliberately; revisiting it is a product decision.
fn completion_rates(filtered: &[&ChatMetricEvent]) -> Vec<FlowCompletion> {
    // Events per session, sorted by timestamp: log arrival order is
    // best-effort, so sequence questions must sort.
    let mut by_session: HashMap<Uuid, Vec<&ChatMetricEvent>> = HashMap::new();
    for e in filtered {
        by_session.entry(e.session_id).or_default().push(*e);
    }
    for events in by_session.values_mut() {
        events.sort_by_key(|e| e.timestamp);
    }

    let flows: HashSet<&str> = filtered
        .iter()
        .map(|e| e.flow.as_str())
        .filter(|f| *f != FlowId::INITIAL)
        .collect();

    let mut rates: Vec<FlowCompletion> = flows
        .into_iter()
        .map(|flow| {
            let mut visited = 0u64;
            let mut completed = 0u64;
            for events in by_session.values() {
                let Some(first_visit) = events
                    .iter()
                    .position(|e| e.flow == flow)
                else {
                    continue;
                };
                visited += 1;
                let exited = events[first_visit..].iter().any(|e| {
                    e.was_helpful.is_some()
                        || e.selected_option.as_deref() == Some(BACK_LABEL)
                });
                if exited {
                    completed += 1;
                }
            }
            FlowCompletion {
                flow: flow.to_string(),
                completion_rate: completed as f64 / visited as f64 * 100.0,
            }
        })
        .collect();

    rates.sort_by(|a, b| a.flow.cmp(&b.flow));
    rates
}

// =============================================================================
// Tests
// =============================================================================
