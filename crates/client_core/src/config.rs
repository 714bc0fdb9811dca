use std::{fs, path::Path, time::Duration};

use anyhow::{anyhow, Context};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_SETTINGS_FILE: &str = "dashboard.toml";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    /// Header that tells the tunnel in front of the API to skip its
    /// interstitial page. `None` disables it.
    pub bypass_header: Option<(String, String)>,
    pub bots: Vec<BotEntry>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:3000".into(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_secs: 10,
            bypass_header: Some(("ngrok-skip-browser-warning".into(), "true".into())),
            bots: vec![
                BotEntry {
                    id: "bot1".into(),
                    name: "Bot 1".into(),
                },
                BotEntry {
                    id: "bot2".into(),
                    name: "Bot 2".into(),
                },
            ],
        }
    }
}

impl ClientSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = Url::parse(&self.api_base_url)
            .with_context(|| format!("invalid api_base_url '{}'", self.api_base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!("api_base_url must start with http:// or https://"));
        }
        if self.poll_interval_secs == 0 {
            return Err(anyhow!("poll_interval_secs must be greater than zero"));
        }
        if self.bots.is_empty() {
            return Err(anyhow!("at least one bot must be configured"));
        }
        let mut seen = std::collections::HashSet::new();
        for bot in &self.bots {
            if bot.id.trim().is_empty() {
                return Err(anyhow!("bot ids must not be blank"));
            }
            if !seen.insert(bot.id.as_str()) {
                return Err(anyhow!("duplicate bot id '{}'", bot.id));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    poll_interval_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
    bypass_header_name: Option<String>,
    bypass_header_value: Option<String>,
    bots: Option<Vec<BotEntry>>,
}

/// Defaults, then the TOML file, then `APP__*` environment overrides.
///
/// An explicitly requested file must exist; the default file is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();

    let raw = match path {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))?,
        ),
        None => fs::read_to_string(DEFAULT_SETTINGS_FILE).ok(),
    };
    if let Some(raw) = raw {
        let file_cfg: FileSettings =
            toml::from_str(&raw).context("failed to parse settings file")?;
        apply_file_settings(&mut settings, file_cfg);
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings.validate()?;
    Ok(settings)
}

fn apply_file_settings(settings: &mut ClientSettings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.poll_interval_secs {
        settings.poll_interval_secs = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    apply_bypass_header(
        settings,
        file_cfg.bypass_header_name,
        file_cfg.bypass_header_value,
    );
    if let Some(v) = file_cfg.bots {
        settings.bots = v;
    }
}

fn apply_env_overrides(settings: &mut ClientSettings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = var("APP__POLL_INTERVAL_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.poll_interval_secs = parsed;
        }
    }
    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
    apply_bypass_header(
        settings,
        var("APP__BYPASS_HEADER_NAME"),
        var("APP__BYPASS_HEADER_VALUE"),
    );
}

fn apply_bypass_header(
    settings: &mut ClientSettings,
    name: Option<String>,
    value: Option<String>,
) {
    match (name, value) {
        (Some(name), _) if name.trim().is_empty() => settings.bypass_header = None,
        (Some(name), value) => {
            let value = value
                .or_else(|| settings.bypass_header.as_ref().map(|(_, v)| v.clone()))
                .unwrap_or_else(|| "true".to_string());
            settings.bypass_header = Some((name.trim().to_string(), value));
        }
        (None, Some(value)) => {
            if let Some((_, current)) = settings.bypass_header.as_mut() {
                *current = value;
            }
        }
        (None, None) => {}
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
