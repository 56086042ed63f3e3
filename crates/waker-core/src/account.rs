//! Accounts and their credentials.
//!
//! A credential is either a real OAuth token or a placeholder left over from
//! the sample config. Placeholders must never reach the executor; the
//! orchestrator records them as `NotConfigured` instead.

use serde::{Deserialize, Serialize};

/// Sample values shipped in `config.yaml.example`.
pub const SAMPLE_PLACEHOLDERS: &[&str] = &["your-oauth-token-here-1", "your-oauth-token-here-2"];

/// Any token starting with this prefix is an unedited sample value.
pub const PLACEHOLDER_PREFIX: &str = "your-oauth-token-here";

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// An account's secret token.
///
/// `Debug` and `Display` never print the secret; use [`Credential::expose`]
/// at the single point where the value is handed to a child process.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// `sk-ant-…wxyz` style rendering for diagnostics.
    ///
    /// Short values are fully masked so that nothing useful leaks.
    pub fn masked(&self) -> String {
        let value = self.0.trim();
        let chars: Vec<char> = value.chars().collect();
        if chars.len() <= 12 {
            return "*".repeat(chars.len().max(3));
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}\u{2026}{tail}")
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential({})", self.masked())
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.masked())
    }
}

// ---------------------------------------------------------------------------
// Placeholders
// ---------------------------------------------------------------------------

/// Detects credentials that were never filled in.
#[derive(Debug, Clone, Default)]
pub struct Placeholders {
    extra: Vec<String>,
}

impl Placeholders {
    /// Built-in sentinels plus any extra values from the config.
    pub fn with_extra(extra: impl IntoIterator<Item = String>) -> Self {
        Self {
            extra: extra
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn is_placeholder(&self, credential: &Credential) -> bool {
        if credential.is_blank() {
            return true;
        }
        let value = credential.expose().trim();
        SAMPLE_PLACEHOLDERS.contains(&value)
            || value.starts_with(PLACEHOLDER_PREFIX)
            || self.extra.iter().any(|p| p == value)
    }
}

// ---------------------------------------------------------------------------
// AccountSpec
// ---------------------------------------------------------------------------

/// One account to wake: a display name and its credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSpec {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "token", default)]
    pub credential: Credential,
}

impl AccountSpec {
    pub fn new(name: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            credential: Credential::new(credential),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn cred(s: &str) -> Credential {
        Credential::new(s)
    }

    #[test]
    fn blank_values_are_placeholders() {
        let p = Placeholders::default();
        assert!(p.is_placeholder(&cred("")));
        assert!(p.is_placeholder(&cred("   \t")));
    }

    #[test]
    fn sample_values_are_placeholders() {
        let p = Placeholders::default();
        assert!(p.is_placeholder(&cred("your-oauth-token-here-1")));
        assert!(p.is_placeholder(&cred("your-oauth-token-here-2")));
        assert!(p.is_placeholder(&cred("your-oauth-token-here-3")));
        assert!(p.is_placeholder(&cred(" your-oauth-token-here-1 ")));
    }

    #[test]
    fn extra_placeholders_from_config() {
        let p = Placeholders::with_extra(vec!["CHANGEME".to_string(), "  ".to_string()]);
        assert!(p.is_placeholder(&cred("CHANGEME")));
        assert!(!p.is_placeholder(&cred("sk-ant-oat01-real-token")));
    }

    #[test]
    fn real_tokens_are_not_placeholders() {
        let p = Placeholders::default();
        assert!(!p.is_placeholder(&cred("sk-ant-REDACTED")));
    }

    #[test]
    fn debug_and_display_never_show_the_secret() {
        let c = cred("sk-ant-REDACTED");
        let debug = format!("{c:?}");
        let display = format!("{c}");
        assert!(!debug.contains("supersecret"));
        assert!(!display.contains("supersecret"));
        assert_eq!(display, "sk-ant\u{2026}wxyz");
    }

    #[test]
    fn short_secrets_are_fully_masked() {
        assert_eq!(cred("abc").masked(), "***");
        assert_eq!(cred("").masked(), "***");
        assert_eq!(cred("twelve-chars").masked(), "************");
    }

    #[test]
    fn account_spec_reads_token_field() {
        let yaml = "name: primary\ntoken: sk-ant-oat01-xyz\n";
        let spec: AccountSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.name, "primary");
        assert_eq!(spec.credential.expose(), "sk-ant-oat01-xyz");
    }

    #[test]
    fn account_spec_missing_token_is_blank() {
        let spec: AccountSpec = serde_yaml::from_str("name: primary\n").unwrap();
        assert!(spec.credential.is_blank());
    }
}
