use std::path::{Path, PathBuf};

use anyhow::Context;

use super::types::AppConfig;

pub const ENV_API_URL: &str = "TASKDECK_API_URL";
pub const ENV_API_TIMEOUT_MS: &str = "TASKDECK_API_TIMEOUT_MS";
pub const ENV_TOKEN_PATH: &str = "TASKDECK_TOKEN_PATH";
pub const ENV_LOG_LEVEL: &str = "TASKDECK_LOG_LEVEL";

/// Default taskdeck data directory: ~/.taskdeck
pub fn get_taskdeck_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().context("Cannot determine home directory")?;
    Ok(home.join(".taskdeck"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    let data_dir = get_taskdeck_data_dir()?;
    let mut cfg = load_from(&data_dir, Path::new("taskdeck.toml"))?;
    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok())?;
    Ok(cfg)
}

/// Reads `<data_dir>/config.toml`, falling back to `local` and then to
/// defaults, and fills unset paths under `data_dir`.
pub fn load_from(data_dir: &Path, local: &Path) -> anyhow::Result<AppConfig> {
    let home_config = data_dir.join("config.toml");

    let mut cfg = if home_config.exists() {
        read_config(&home_config)?
    } else if local.exists() {
        read_config(local)?
    } else {
        AppConfig::default()
    };

    if is_blank(cfg.credentials.path.as_deref()) {
        cfg.credentials.path = Some(data_dir.join("token").to_string_lossy().to_string());
    }
    if is_blank(cfg.logging.directory.as_deref()) {
        cfg.logging.directory = Some(data_dir.join("logs").to_string_lossy().to_string());
    }

    Ok(cfg)
}

fn read_config(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str::<AppConfig>(&s).with_context(|| format!("invalid config {}", path.display()))
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(|s| s.trim().is_empty()).unwrap_or(true)
}

/// Environment overrides win over any file. Blank values are ignored.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = var(ENV_API_URL) {
        cfg.api.base_url = v;
    }
    if let Some(v) = var(ENV_API_TIMEOUT_MS) {
        cfg.api.timeout_ms = v
            .trim()
            .parse()
            .with_context(|| format!("{ENV_API_TIMEOUT_MS} must be a number of milliseconds"))?;
    }
    if let Some(v) = var(ENV_TOKEN_PATH) {
        cfg.credentials.path = Some(v);
    }
    if let Some(v) = var(ENV_LOG_LEVEL) {
        cfg.logging.level = v;
    }
    Ok(())
}
