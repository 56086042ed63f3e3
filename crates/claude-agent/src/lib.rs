//! `claude-agent` — native Rust driver for the Claude CLI subprocess.
//!
//! Speaks the `--output-format stream-json` protocol: the prompt goes in as a
//! single stream-json user message on stdin and typed [`Message`] values come
//! back as JSONL on stdout.
//!
//! # Architecture
//!
//! ```text
//! QueryOptions
//!     │
//!     ▼
//! ClaudeProcess   ← spawns `claude --print --output-format stream-json …`
//!     │              owns the child (kill-on-drop), captures stderr
//!     ▼
//! Message enum    ← typed by `"type"`; classified via Message::kind()
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use claude_agent::{spawn, MessageKind, QueryOptions};
//!
//! let mut process = spawn("hi", &QueryOptions::default()).await?;
//! while let Some(msg) = process.next_message().await? {
//!     if msg.kind() != MessageKind::Housekeeping {
//!         println!("got {}", msg.label());
//!         break;
//!     }
//! }
//! process.kill().await;
//! ```

pub mod error;
pub mod process;
pub mod types;


pub use error::ClaudeAgentError;
pub use process::{kill_process_group, ClaudeProcess};
pub use types::{Message, MessageKind, OpaqueMessage, QueryOptions, SubtypedMessage};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, ClaudeAgentError>;

/// Start a single-turn query against the Claude CLI.
///
/// Spawns the subprocess, sends `prompt`, and closes stdin. Read the
/// responses with [`ClaudeProcess::next_message`].
pub async fn spawn(prompt: &str, opts: &QueryOptions) -> Result<ClaudeProcess> {
    ClaudeProcess::spawn(prompt, opts).await
}
