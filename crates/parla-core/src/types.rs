use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Who produced a turn or a logged event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The assistant (rule-based or AI-generated).
    Bot,
    /// The human partner on the other side of the widget.
    User,
}

// =============================================================================
// Newtype Wrappers - Identity
// =============================================================================

/// Stable string identifier of one dialogue node.
///
/// Compared by value, case-sensitive. The reserved id `initial` names the
/// menu root and must exist in every published catalog.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowId(pub String);

impl FlowId {
    /// The reserved root node every conversation starts in.
    pub const INITIAL: &'static str = "initial";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn initial() -> Self {
        Self(Self::INITIAL.to_string())
    }

    pub fn is_initial(&self) -> bool {
        self.0 == Self::INITIAL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FlowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FlowId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// =============================================================================
// Injected context (identity + product catalog)
// =============================================================================

/// Who is talking. Injected once per session at mount; the core never
/// authenticates, it only labels events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub user_name: String,
    pub user_role: String,
}

/// One entry of the read-only product catalog. Feeds both the default flow
/// catalog (pitch targets) and the AI context string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
}

// =============================================================================
// Conversation entities
// =============================================================================

/// An option as shown to the user: id plus display label.
///
/// What the option *does* (redirect or canned response) is catalog-internal;
/// the UI only ever echoes the id back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionRef {
    pub id: String,
    pub label: String,
}

/// One message within a session. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Buttons offered alongside this turn. Only bot turns carry options.
    pub options: Vec<OptionRef>,
    /// True when the content came from the generation service, false for
    /// rule-based text.
    pub generated: bool,
}

impl ChatTurn {
    /// A rule-based bot turn with the given options.
    pub fn bot(content: impl Into<String>, options: Vec<OptionRef>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Bot,
            content: content.into(),
            created_at: Utc::now(),
            options,
            generated: false,
        }
    }

    /// A user turn. Never carries options.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            content: content.into(),
            created_at: Utc::now(),
            options: Vec::new(),
            generated: false,
        }
    }
}

/// One continuous conversation, scoped to one UI activation.
///
/// Not persisted across reloads. The `flow_id` cursor tracks the node whose
/// options are currently on screen.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub flow_id: FlowId,
    pub turns: Vec<ChatTurn>,
    pub ai_mode: bool,
    pub identity: Identity,
    pub started_at: DateTime<Utc>,
}

impl Session {
    /// Start a fresh session at the `initial` node.
    pub fn new(identity: Identity) -> Self {
        Self {
            id: Uuid::new_v4(),
            flow_id: FlowId::initial(),
            turns: Vec::new(),
            ai_mode: false,
            identity,
            started_at: Utc::now(),
        }
    }
}

// =============================================================================
// Interaction log
// =============================================================================

/// The unit of the interaction log. Append-only; never mutated or deleted.
///
/// Serialized camelCase because the remote event store is the pre-existing
/// JS-facing API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMetricEvent {
    pub id: Uuid,
    pub user_id: String,
    pub user_name: String,
    pub user_role: String,
    pub timestamp: DateTime<Utc>,
    pub session_id: Uuid,
    pub message_type: Role,
    pub message: String,
    pub flow: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_option: Option<String>,
    /// Tri-state: not every event carries a vote.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub was_helpful: Option<bool>,
    pub ai_generated: bool,
    pub tokens_used: u32,
    pub response_time_ms: u32,
}

impl ChatMetricEvent {
    /// An event for one turn of the given session, with vote, tokens, and
    /// latency left at their defaults.
    pub fn for_turn(session: &Session, turn: &ChatTurn) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: session.identity.user_id.clone(),
            user_name: session.identity.user_name.clone(),
            user_role: session.identity.user_role.clone(),
            timestamp: turn.created_at,
            session_id: session.id,
            message_type: turn.role,
            message: turn.content.clone(),
            flow: session.flow_id.0.clone(),
            selected_option: None,
            was_helpful: None,
            ai_generated: turn.generated,
            tokens_used: 0,
            response_time_ms: 0,
        }
    }
}

// =============================================================================
// Date ranges
// =============================================================================

/// Inclusive timestamp range. Absent bounds mean unbounded on that side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        if let Some(from) = self.from {
            if ts < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if ts > to {
                return false;
            }
        }
        true
    }
}

// =============================================================================
// Tests
// =============================================================================
