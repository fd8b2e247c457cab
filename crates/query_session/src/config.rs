use std::{fs, path::Path};

use anyhow::Context;
use query_core::ResetPolicy;
use serde::{Deserialize, Serialize};
use shared::domain::{Field, NameLabel};

pub const ENV_PREFIX: &str = "QUERY_BUILDER__";

/// What to do when an operation addresses a node that is not there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressingMode {
    /// Leave the tree alone and report nothing.
    #[default]
    Silent,
    /// Leave the tree alone and return the error.
    Strict,
}

impl AddressingMode {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "silent" => Some(Self::Silent),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }
}

/// Presentation toggles handed through to the rendering layer untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    pub show_combinators_between_rules: bool,
    pub show_not_toggle: bool,
    pub show_add_group: bool,
    pub show_add_rule: bool,
    pub remove_icon_at_start: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_combinators_between_rules: false,
            show_not_toggle: false,
            show_add_group: true,
            show_add_rule: true,
            remove_icon_at_start: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub reset_on_field_change: bool,
    pub reset_on_operator_change: bool,
    pub auto_select_field: bool,
    pub enable_normal_view: bool,
    pub notify_on_mount: bool,
    pub addressing: AddressingMode,
    pub display: DisplayOptions,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            reset_on_field_change: true,
            reset_on_operator_change: false,
            auto_select_field: true,
            enable_normal_view: false,
            notify_on_mount: true,
            addressing: AddressingMode::Silent,
            display: DisplayOptions::default(),
        }
    }
}

impl SessionSettings {
    pub fn resets(&self) -> ResetPolicy {
        ResetPolicy {
            on_field_change: self.reset_on_field_change,
            on_operator_change: self.reset_on_operator_change,
        }
    }
}

/// Everything a host can put in the builder's TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    pub session: SessionSettings,
    pub fields: Vec<Field>,
    pub combinators: Vec<NameLabel>,
    pub operators: Vec<NameLabel>,
    pub default_field: Option<String>,
}

/// Reads `path` when given, then applies `QUERY_BUILDER__*` environment overrides.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<BuilderConfig> {
    let mut config = match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read builder config '{}'", path.display()))?;
            toml::from_str::<BuilderConfig>(&raw)
                .with_context(|| format!("invalid builder config '{}'", path.display()))?
        }
        None => BuilderConfig::default(),
    };
    apply_env_overrides(&mut config.session, |key| std::env::var(key).ok());
    Ok(config)
}

pub fn apply_env_overrides(
    settings: &mut SessionSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

    if let Some(v) = var("RESET_ON_FIELD_CHANGE").and_then(|v| parse_flag(&v)) {
        settings.reset_on_field_change = v;
    }
    if let Some(v) = var("RESET_ON_OPERATOR_CHANGE").and_then(|v| parse_flag(&v)) {
        settings.reset_on_operator_change = v;
    }
    if let Some(v) = var("AUTO_SELECT_FIELD").and_then(|v| parse_flag(&v)) {
        settings.auto_select_field = v;
    }
    if let Some(v) = var("ENABLE_NORMAL_VIEW").and_then(|v| parse_flag(&v)) {
        settings.enable_normal_view = v;
    }
    if let Some(v) = var("NOTIFY_ON_MOUNT").and_then(|v| parse_flag(&v)) {
        settings.notify_on_mount = v;
    }
    if let Some(v) = var("ADDRESSING_MODE").and_then(|v| AddressingMode::parse(&v)) {
        settings.addressing = v;
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
