use serde::Deserialize;
use std::collections::HashMap;

// ─── Outer Message enum ───────────────────────────────────────────────────

/// Every message emitted by `claude --output-format stream-json`.
/// Discriminated by the JSON `"type"` field.
///
/// Only the fields used for classification and logging are modelled;
/// everything else in the payload is ignored during deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    System(SubtypedMessage),
    /// `assistant` — the model's response
    Assistant(OpaqueMessage),
    /// `user` — echoed user turns and tool results
    User(OpaqueMessage),
    /// `result` — the terminal message of a query
    Result(SubtypedMessage),
    /// `stream_event` — partial assistant message chunks (--include-partial-messages)
    StreamEvent(OpaqueMessage),
    /// `tool_progress` — progress updates during tool execution
    ToolProgress(OpaqueMessage),
    /// `tool_use_summary` — summary after tool calls complete
    ToolUseSummary(OpaqueMessage),
    /// `auth_status` — authentication status during session init
    AuthStatus(OpaqueMessage),
}

/// Coarse classification of a [`Message`] for callers that only care whether
/// the remote side produced anything beyond session bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Connection/session bookkeeping: `system` and `auth_status`.
    Housekeeping,
    /// Model output: `assistant` turns and the terminal `result`.
    Content,
    /// Anything else the CLI relays (tool traffic, partial chunks, user echoes).
    Other,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::System(_) | Message::AuthStatus(_) => MessageKind::Housekeeping,
            Message::Assistant(_) | Message::Result(_) => MessageKind::Content,
            Message::User(_)
            | Message::StreamEvent(_)
            | Message::ToolProgress(_)
            | Message::ToolUseSummary(_) => MessageKind::Other,
        }
    }

    pub fn is_housekeeping(&self) -> bool {
        self.kind() == MessageKind::Housekeeping
    }

    /// Short label used in logs, e.g. `system/init` or `assistant`.
    pub fn label(&self) -> String {
        match self {
            Message::System(m) => format!("system/{}", m.subtype),
            Message::Assistant(_) => "assistant".into(),
            Message::User(_) => "user".into(),
            Message::Result(m) => format!("result/{}", m.subtype),
            Message::StreamEvent(_) => "stream_event".into(),
            Message::ToolProgress(_) => "tool_progress".into(),
            Message::ToolUseSummary(_) => "tool_use_summary".into(),
            Message::AuthStatus(_) => "auth_status".into(),
        }
    }
}

// ─── Message payloads ─────────────────────────────────────────────────────

/// `type = "system"` (`init`, `status`, compaction boundaries) and
/// `type = "result"` (`success`, `error_during_execution`, `error_max_turns`, …).
/// Only the subtype is kept, for log labels.
#[derive(Debug, Clone, Deserialize)]
pub struct SubtypedMessage {
    #[serde(default)]
    pub subtype: String,
}

/// Payload of messages classified by their `type` alone.
#[derive(Debug, Clone, Deserialize)]
pub struct OpaqueMessage {}

// ─── QueryOptions ─────────────────────────────────────────────────────────

/// Options for driving a Claude subprocess query.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Claude model name (e.g. `"claude-haiku-4-5"`)
    pub model: Option<String>,
    /// Maximum number of agentic turns before stopping with `error_max_turns`
    pub max_turns: Option<u32>,
    /// Additional environment variables for the subprocess
    pub env: HashMap<String, String>,
    /// Inherited environment variables to strip before `env` is applied
    pub env_remove: Vec<String>,
    /// Custom path to the `claude` binary (default: `"claude"`)
    pub path_to_executable: Option<String>,
    /// Disable session persistence (`--no-session-persistence`)
    pub no_session_persistence: bool,
    /// Start the subprocess in its own process group so terminal signals
    /// aimed at the parent do not reach it (unix only)
    pub detach_process_group: bool,
}
