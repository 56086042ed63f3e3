use crate::output::{print_json, print_table};
use anyhow::Context;
use std::path::Path;
use waker_core::config::WarnLevel;
use waker_core::Config;

pub fn run(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let warnings = config.validate();
    let placeholders = config.placeholders();

    let accounts: Vec<_> = config
        .accounts
        .iter()
        .map(|a| {
            let status = if placeholders.is_placeholder(&a.credential) {
                "not configured"
            } else {
                "configured"
            };
            (a.name.as_str(), status, a.credential.masked())
        })
        .collect();

    if json {
        let value = serde_json::json!({
            "config": config_path,
            "warnings": warnings,
            "accounts": accounts
                .iter()
                .map(|(name, status, token)| serde_json::json!({
                    "name": name,
                    "status": status,
                    "token": token,
                }))
                .collect::<Vec<_>>(),
            "wake_hours": config.wake_hours,
        });
        print_json(&value)?;
    } else {
        println!("Config: {}", config_path.display());
        println!();
        if warnings.is_empty() {
            println!("Config is valid. No warnings.");
        } else {
            for w in &warnings {
                let prefix = match w.level {
                    WarnLevel::Warning => "warning",
                    WarnLevel::Error => "error",
                };
                println!("[{prefix}] {}", w.message);
            }
        }
        println!();

        let rows = accounts
            .iter()
            .map(|(name, status, token)| {
                vec![name.to_string(), status.to_string(), token.clone()]
            })
            .collect();
        print_table(&["ACCOUNT", "STATUS", "TOKEN"], rows);
        println!();

        let hours: Vec<String> = config
            .wake_hours
            .iter()
            .map(|h| format!("{h:02}:00"))
            .collect();
        println!("Wake hours: {}", hours.join(", "));
    }

    let has_errors = warnings.iter().any(|w| w.level == WarnLevel::Error);
    if has_errors {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}
