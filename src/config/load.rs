use crate::config::types::{Config, SETTINGS_FILE, UserSettings};
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// 可由 `.env` 或環境變數覆寫的執行檔路徑
pub const FFMPEG_PATH_ENV: &str = "FFMPEG_PATH";
pub const FFPROBE_PATH_ENV: &str = "FFPROBE_PATH";

impl Config {
    /// 讀取工作目錄下的 settings.json（可省略），再套用環境變數
    pub fn load() -> Result<Self> {
        let mut settings = match Self::load_settings(Path::new(SETTINGS_FILE)) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring {SETTINGS_FILE}: {e:#}");
                UserSettings::default()
            }
        };
        apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
        debug!("Effective settings: {settings:?}");

        Ok(Self::from(settings))
    }

    pub fn load_settings(path: &Path) -> Result<UserSettings> {
        if !path.exists() {
            return Ok(UserSettings::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))
    }
}

pub fn apply_env_overrides<F>(settings: &mut UserSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup(FFMPEG_PATH_ENV).filter(|v| !v.trim().is_empty()) {
        settings.ffmpeg_path = PathBuf::from(path.trim());
    }
    if let Some(path) = lookup(FFPROBE_PATH_ENV).filter(|v| !v.trim().is_empty()) {
        settings.ffprobe_path = PathBuf::from(path.trim());
    }
}
