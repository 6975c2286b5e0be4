use crate::output::{print_json, print_kv};
use anyhow::Result;
use clap::Subcommand;
use ogserve_core::config::{RuntimeConfig, WarnLevel};
use serde_json::Value;

#[derive(Subcommand, Debug)]
pub enum ConfigSubcommand {
    /// Print the effective runtime configuration
    Show,
    /// Check the environment for misconfiguration
    Validate,
}

pub fn run(subcommand: ConfigSubcommand, json: bool) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show => show(json),
        ConfigSubcommand::Validate => validate(json),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(json: bool) -> Result<()> {
    let config = RuntimeConfig::from_env()?;
    let mut value = serde_json::to_value(&config)?;

    // Webhook URLs carry the channel secret; never echo them.
    if let Some(url) = value.get_mut("slack_webhook_url") {
        if !url.is_null() {
            *url = Value::String("<redacted>".to_string());
        }
    }

    if json {
        print_json(&value)?;
    } else {
        let rows: Vec<(String, String)> = value
            .as_object()
            .into_iter()
            .flatten()
            .map(|(key, val)| (key.clone(), display_value(val)))
            .collect();
        print_kv(&rows);
    }
    Ok(())
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(json: bool) -> Result<()> {
    let config = RuntimeConfig::from_env()?;
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
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

    let has_errors = warnings.iter().any(|w| w.level == WarnLevel::Error);
    if has_errors {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}
