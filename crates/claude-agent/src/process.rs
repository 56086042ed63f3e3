use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;

use crate::types::{Message, QueryOptions};
use crate::{ClaudeAgentError, Result};

/// How long an exited child's stderr may stay open before the exit error is
/// built without the rest of it (a grandchild can hold the pipe).
const STDERR_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

// ─── ClaudeProcess ────────────────────────────────────────────────────────

/// A running `claude --output-format stream-json --input-format stream-json`
/// subprocess.
///
/// The prompt is sent as a JSON message on stdin and responses are read as
/// JSONL from stdout. Stderr is captured in a background task and surfaced
/// on process exit errors. The child is spawned with `kill_on_drop(true)`,
/// so dropping a `ClaudeProcess` never leaves the subprocess running. When
/// it runs in its own process group, dropping or killing it kills the whole
/// group, including anything the CLI started.
pub struct ClaudeProcess {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    stdin: Option<ChildStdin>,
    /// Stderr output collected by a background reader task.
    stderr_buf: Arc<Mutex<String>>,
    stderr_task: Option<JoinHandle<()>>,
    /// Process group led by the child, when it was detached into one.
    group: Option<u32>,
}

impl ClaudeProcess {
    /// Spawn the `claude` binary with the given prompt and options.
    ///
    /// The prompt is sent as a user message on stdin, after which stdin is
    /// closed for single-turn operation.
    ///
    /// Only the child's environment is touched: `opts.env_remove` is stripped
    /// from the inherited environment and `opts.env` is layered on top. The
    /// parent process environment is never modified.
    pub async fn spawn(prompt: &str, opts: &QueryOptions) -> Result<Self> {
        let cmd = build_command(opts);
        let mut process = Self::from_command(cmd)?;
        if cfg!(unix) && opts.detach_process_group {
            process.group = process.id();
        }

        let user_msg = serde_json::json!({
            "type": "user",
            "message": {
                "role": "user",
                "content": [{"type": "text", "text": prompt}]
            }
        });
        process.send_message(&user_msg).await?;
        process.close_stdin();

        Ok(process)
    }

    /// Spawn an arbitrary command as a mock Claude process.
    /// Used in unit tests to inject a command that emits fixed JSON lines.
    #[cfg(test)]
    pub(crate) fn spawn_command(cmd: Command) -> Result<Self> {
        Self::from_command(cmd)
    }

    fn from_command(mut cmd: Command) -> Result<Self> {
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let program = cmd.as_std().get_program().to_string_lossy().into_owned();
        let mut child = cmd
            .spawn()
            .map_err(|source| ClaudeAgentError::Spawn {
                program: program.clone(),
                source,
            })?;
        tracing::debug!(program = %program, pid = ?child.id(), "spawned claude subprocess");

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClaudeAgentError::Process("stdout not captured".into()))?;

        let stdin = child.stdin.take();

        let stderr_buf = Arc::new(Mutex::new(String::new()));
        let stderr_task = child.stderr.take().map(|stderr| {
            let buf = Arc::clone(&stderr_buf);
            tokio::spawn(async move {
                let mut reader = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = reader.next_line().await {
                    if let Ok(mut b) = buf.lock() {
                        if !b.is_empty() {
                            b.push('\n');
                        }
                        b.push_str(&line);
                    }
                }
            })
        });

        let lines = BufReader::new(stdout).lines();
        Ok(Self {
            child,
            lines,
            stdin,
            stderr_buf,
            stderr_task,
            group: None,
        })
    }

    /// OS process id, if the child has not been reaped yet.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Id of the process group the child leads, if it was detached.
    pub fn process_group(&self) -> Option<u32> {
        self.group
    }

    /// Write a JSON message to the subprocess stdin.
    pub async fn send_message(&mut self, msg: &serde_json::Value) -> Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| ClaudeAgentError::Process("stdin already closed".into()))?;

        let mut buf = serde_json::to_vec(msg).map_err(|e| {
            ClaudeAgentError::Process(format!("failed to serialize stdin message: {e}"))
        })?;
        buf.push(b'\n');

        stdin.write_all(&buf).await.map_err(ClaudeAgentError::Io)?;
        stdin.flush().await.map_err(ClaudeAgentError::Io)?;

        Ok(())
    }

    /// Close stdin, signalling no more input (single-turn mode).
    pub fn close_stdin(&mut self) {
        self.stdin.take();
    }

    /// Read the next non-empty JSONL line from stdout and deserialize it.
    ///
    /// Unknown message types (e.g. `rate_limit_event`) are silently skipped.
    ///
    /// Returns `Ok(None)` on EOF.
    pub async fn next_message(&mut self) -> Result<Option<Message>> {
        loop {
            match self.lines.next_line().await {
                Err(e) => return Err(ClaudeAgentError::Io(e)),
                Ok(None) => return Ok(None),
                Ok(Some(line)) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<Message>(trimmed) {
                        Ok(msg) => return Ok(Some(msg)),
                        Err(e) => {
                            if is_unknown_message_type(trimmed) {
                                tracing::debug!(line = %trimmed, "skipping unknown message type");
                                continue;
                            }
                            return Err(ClaudeAgentError::Parse {
                                line: trimmed.to_owned(),
                                source: e,
                            });
                        }
                    }
                }
            }
        }
    }

    /// Wait for the child to exit and return an error if the exit code is
    /// non-zero or the process was killed by a signal. Captured stderr is
    /// included in the error message.
    pub async fn wait_exit_error(&mut self) -> Option<ClaudeAgentError> {
        match self.child.wait().await {
            Ok(status) => {
                if !status.success() {
                    self.drain_stderr().await;
                }
                self.exit_error(status)
            }
            Err(e) => Some(ClaudeAgentError::Io(e)),
        }
    }

    /// Let the stderr reader hit EOF so the exit error carries all of it.
    async fn drain_stderr(&mut self) {
        if let Some(task) = self.stderr_task.take() {
            if tokio::time::timeout(STDERR_DRAIN_TIMEOUT, task).await.is_err() {
                tracing::debug!("stderr still open after exit, reporting what was read");
            }
        }
    }

    /// Give the child up to `grace` to exit on its own.
    ///
    /// Returns `true` once the child has exited, `false` if it is still
    /// running when the grace period ends.
    pub async fn wait_for_exit(&mut self, grace: Duration) -> bool {
        matches!(
            tokio::time::timeout(grace, self.child.wait()).await,
            Ok(Ok(_))
        )
    }

    /// Kill the subprocess (and its process group, if detached) and reap it
    /// (best-effort; errors are ignored).
    pub async fn kill(&mut self) {
        if let Some(pgid) = self.group.take() {
            kill_process_group(pgid);
        }
        let _ = self.child.kill().await;
    }

    fn exit_error(&self, status: ExitStatus) -> Option<ClaudeAgentError> {
        if status.success() {
            return None;
        }

        let stderr = self
            .stderr_buf
            .lock()
            .ok()
            .map(|b| b.clone())
            .unwrap_or_default();

        let head = match status.code() {
            Some(code) => format!("claude exited with code {code}"),
            None => "claude terminated by signal".to_string(),
        };
        let msg = if stderr.is_empty() {
            head
        } else {
            format!("{head}\nstderr: {stderr}")
        };

        Some(ClaudeAgentError::Process(msg))
    }
}

impl Drop for ClaudeProcess {
    fn drop(&mut self) {
        if let Some(pgid) = self.group.take() {
            kill_process_group(pgid);
        }
    }
}

/// SIGKILL every process in group `pgid`. A group that is already gone is
/// not an error.
#[cfg(unix)]
pub fn kill_process_group(pgid: u32) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    // 0 would target our own group, 1 is init.
    let Ok(raw) = i32::try_from(pgid) else {
        return;
    };
    if raw <= 1 {
        return;
    }
    if let Err(e) = killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        tracing::debug!(pgid, error = %e, "killpg failed");
    }
}

#[cfg(not(unix))]
pub fn kill_process_group(_pgid: u32) {}

/// Check if a JSON line has a `"type"` field with a value we don't recognise.
/// Valid JSON with a type field is an unknown message type and is skipped;
/// anything else is a genuine parse error.
fn is_unknown_message_type(line: &str) -> bool {
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(line) {
        v.get("type").is_some()
    } else {
        false
    }
}

// ─── Command builder ──────────────────────────────────────────────────────

fn build_command(opts: &QueryOptions) -> Command {
    let exe = opts.path_to_executable.as_deref().unwrap_or("claude");
    let mut cmd = Command::new(exe);

    cmd.arg("--print")
        .arg("--output-format")
        .arg("stream-json")
        .arg("--verbose")
        .arg("--input-format")
        .arg("stream-json");

    if let Some(model) = &opts.model {
        cmd.arg("--model").arg(model);
    }

    if let Some(max_turns) = opts.max_turns {
        cmd.arg("--max-turns").arg(max_turns.to_string());
    }

    if opts.no_session_persistence {
        cmd.arg("--no-session-persistence");
    }

    // Works both from a terminal and from inside a running Claude session.
    cmd.env_remove("CLAUDECODE");
    for key in &opts.env_remove {
        cmd.env_remove(key);
    }
    for (k, v) in &opts.env {
        cmd.env(k, v);
    }

    #[cfg(unix)]
    if opts.detach_process_group {
        cmd.process_group(0);
    }

    cmd
}

// ─── Tests ────────────────────────────────────────────────────────────────
