use crate::account::{AccountSpec, Placeholders};
use crate::error::{Result, WakerError};
use crate::executor::{ExecutorSettings, TimeoutPolicy};
use crate::orchestrator::RunSettings;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

impl ConfigWarning {
    fn warning(message: String) -> Self {
        Self {
            level: WarnLevel::Warning,
            message,
        }
    }

    fn error(message: String) -> Self {
        Self {
            level: WarnLevel::Error,
            message,
        }
    }
}

// ---------------------------------------------------------------------------
// WakeSettings
// ---------------------------------------------------------------------------

/// The optional `wake:` block. Every field has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WakeSettings {
    #[serde(default = "default_prompt")]
    pub prompt: String,
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_secs: u64,
    #[serde(default = "default_outer_timeout")]
    pub outer_timeout_secs: u64,
    #[serde(default = "default_delay")]
    pub inter_attempt_delay_secs: u64,
    #[serde(default = "default_grace")]
    pub grace_secs: u64,
    #[serde(default)]
    pub timeout_policy: TimeoutPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Extra token values to treat as "not configured".
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub placeholders: Vec<String>,
}

fn default_prompt() -> String {
    "hi".to_string()
}

fn default_attempt_timeout() -> u64 {
    60
}

fn default_outer_timeout() -> u64 {
    70
}

fn default_delay() -> u64 {
    2
}

fn default_grace() -> u64 {
    5
}

impl Default for WakeSettings {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            attempt_timeout_secs: default_attempt_timeout(),
            outer_timeout_secs: default_outer_timeout(),
            inter_attempt_delay_secs: default_delay(),
            grace_secs: default_grace(),
            timeout_policy: TimeoutPolicy::default(),
            claude_path: None,
            model: None,
            placeholders: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub accounts: Vec<AccountSpec>,
    /// Hours of the day (0–23) at which the external scheduler runs `waker`.
    #[serde(default)]
    pub wake_hours: Vec<u32>,
    #[serde(default)]
    pub wake: WakeSettings,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(WakerError::ConfigNotFound(path.to_path_buf()));
        }
        let data = std::fs::read_to_string(path)?;
        Self::parse(&data)
    }

    pub fn parse(data: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(data)?;
        Ok(cfg)
    }

    pub fn placeholders(&self) -> Placeholders {
        Placeholders::with_extra(self.wake.placeholders.iter().cloned())
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            per_attempt_timeout: Duration::from_secs(self.wake.attempt_timeout_secs),
            inter_attempt_delay: Duration::from_secs(self.wake.inter_attempt_delay_secs),
        }
    }

    pub fn executor_settings(&self) -> ExecutorSettings {
        ExecutorSettings {
            prompt: self.wake.prompt.clone(),
            outer_timeout: Duration::from_secs(self.wake.outer_timeout_secs),
            grace: Duration::from_secs(self.wake.grace_secs),
            timeout_policy: self.wake.timeout_policy,
            claude_path: self.wake.claude_path.clone(),
            model: self.wake.model.clone(),
        }
    }

    /// Accounts restricted to `names`, in config order. An empty filter
    /// selects every account; an unknown name is an error.
    pub fn select_accounts(&self, names: &[String]) -> Result<Vec<AccountSpec>> {
        if names.is_empty() {
            return Ok(self.accounts.clone());
        }
        if let Some(missing) = names
            .iter()
            .find(|n| !self.accounts.iter().any(|a| &a.name == *n))
        {
            return Err(WakerError::UnknownAccount(missing.clone()));
        }
        Ok(self
            .accounts
            .iter()
            .filter(|a| names.contains(&a.name))
            .cloned()
            .collect())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        // 1. Required fields
        if self.accounts.is_empty() {
            warnings.push(ConfigWarning::error(
                "config has no accounts (add an 'accounts' list)".into(),
            ));
        }
        if self.wake_hours.is_empty() {
            warnings.push(ConfigWarning::error(
                "config has no wake_hours (add a 'wake_hours' list)".into(),
            ));
        }

        // 2. Accounts
        let placeholders = self.placeholders();
        let mut seen = HashSet::new();
        for (idx, account) in self.accounts.iter().enumerate() {
            if account.name.trim().is_empty() {
                warnings.push(ConfigWarning::error(format!(
                    "account #{} has an empty name",
                    idx + 1
                )));
                continue;
            }
            if !seen.insert(account.name.as_str()) {
                warnings.push(ConfigWarning::warning(format!(
                    "duplicate account name '{}'",
                    account.name
                )));
            }
            if placeholders.is_placeholder(&account.credential) {
                warnings.push(ConfigWarning::warning(format!(
                    "account '{}' has no token configured and will be skipped",
                    account.name
                )));
            }
        }

        // 3. Wake hours
        let mut hours = HashSet::new();
        for hour in &self.wake_hours {
            if *hour > 23 {
                warnings.push(ConfigWarning::error(format!(
                    "wake hour {hour} is out of range (0-23)"
                )));
            } else if !hours.insert(*hour) {
                warnings.push(ConfigWarning::warning(format!(
                    "wake hour {hour} is listed more than once"
                )));
            }
        }

        // 4. Timeouts
        let wake = &self.wake;
        if wake.attempt_timeout_secs == 0 {
            warnings.push(ConfigWarning::error(
                "wake.attempt_timeout_secs must be greater than 0".into(),
            ));
        }
        if wake.outer_timeout_secs <= wake.attempt_timeout_secs {
            warnings.push(ConfigWarning::error(format!(
                "wake.outer_timeout_secs ({}) must be greater than wake.attempt_timeout_secs ({})",
                wake.outer_timeout_secs, wake.attempt_timeout_secs
            )));
        } else if wake.attempt_timeout_secs.saturating_add(wake.grace_secs)
            >= wake.outer_timeout_secs
        {
            warnings.push(ConfigWarning::error(format!(
                "wake.outer_timeout_secs ({}) must be greater than wake.attempt_timeout_secs + wake.grace_secs ({} + {})",
                wake.outer_timeout_secs, wake.attempt_timeout_secs, wake.grace_secs
            )));
        }
        if wake.prompt.trim().is_empty() {
            warnings.push(ConfigWarning::warning(
                "wake.prompt is empty; the wake request may be rejected".into(),
            ));
        }

        warnings
    }

    /// Run [`Config::validate`] and fail on any error-level finding.
    /// Returns the remaining warnings on success.
    pub fn check(&self) -> Result<Vec<ConfigWarning>> {
        let (errors, warnings): (Vec<_>, Vec<_>) = self
            .validate()
            .into_iter()
            .partition(|w| w.level == WarnLevel::Error);
        if errors.is_empty() {
            return Ok(warnings);
        }
        let joined = errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        Err(WakerError::InvalidConfig(joined))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
