use std::{collections::HashMap, fs, path::Path};

use agent::AgentOptions;
use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "nbctl.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub agent_id: String,
    pub min_value: String,
    pub propagate_training_events: String,
    pub expected_update_period_in_days: String,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        let options = AgentOptions::default();
        Self {
            database_url: "sqlite://./data/nbctl.db".into(),
            agent_id: "default".into(),
            min_value: options.min_value,
            propagate_training_events: options.propagate_training_events,
            expected_update_period_in_days: options.expected_update_period_in_days,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn agent_options(&self) -> AgentOptions {
        AgentOptions {
            min_value: self.min_value.clone(),
            propagate_training_events: self.propagate_training_events.clone(),
            expected_update_period_in_days: self.expected_update_period_in_days.clone(),
        }
    }
}

/// Defaults, then the TOML file (an explicit path must exist, the default
/// one may be absent), then environment overrides.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match config_path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?;
            apply_file_config(&mut settings, &raw)
                .with_context(|| format!("invalid config file '{}'", path.display()))?;
        }
        None => {
            if let Ok(raw) = fs::read_to_string(DEFAULT_CONFIG_FILE) {
                apply_file_config(&mut settings, &raw)
                    .with_context(|| format!("invalid config file '{DEFAULT_CONFIG_FILE}'"))?;
            }
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file_config(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg = toml::from_str::<HashMap<String, String>>(raw)?;

    if let Some(v) = file_cfg.get("database_url") {
        settings.database_url = v.clone();
    }
    if let Some(v) = file_cfg.get("agent_id") {
        settings.agent_id = v.clone();
    }
    if let Some(v) = file_cfg.get("min_value") {
        settings.min_value = v.clone();
    }
    if let Some(v) = file_cfg.get("propagate_training_events") {
        settings.propagate_training_events = v.clone();
    }
    if let Some(v) = file_cfg.get("expected_update_period_in_days") {
        settings.expected_update_period_in_days = v.clone();
    }
    if let Some(v) = file_cfg.get("log_filter") {
        settings.log_filter = v.clone();
    }

    Ok(())
}

fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = lookup("APP__DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = lookup("NBCTL_DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = lookup("NBCTL_AGENT") {
        settings.agent_id = v;
    }
    if let Some(v) = lookup("NBCTL_MIN_VALUE") {
        settings.min_value = v;
    }
    if let Some(v) = lookup("NBCTL_PROPAGATE_TRAINING_EVENTS") {
        settings.propagate_training_events = v;
    }
    if let Some(v) = lookup("NBCTL_EXPECTED_UPDATE_PERIOD_IN_DAYS") {
        settings.expected_update_period_in_days = v;
    }

    if let Some(v) = lookup("RUST_LOG") {
        settings.log_filter = v;
    }
    if let Some(v) = lookup("NBCTL_LOG") {
        settings.log_filter = v;
    }
}

pub fn prepare_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:") {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite://") {
        return sqlite_url_for_path(path);
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        return sqlite_url_for_path(path);
    }

    if raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    sqlite_url_for_path(raw_database_url)
}

fn sqlite_url_for_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    if has_windows_drive(&path) {
        format!("sqlite:{path}")
    } else {
        format!("sqlite://{path}")
    }
}

fn has_windows_drive(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
