use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const WAIT_MESSAGE: &str = "正在准备游戏！请稍等...";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub video: VideoConfig,
    pub window: WindowConfig,
    pub wait_screen: WaitScreenConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VideoConfig {
    pub directory: String,
    /// 1-based index into the filtered directory listing.
    pub position: usize,
    pub extensions: Vec<String>,
    pub playback_rate: f64,
    pub near_end_margin_ms: u64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            directory: "cdb/animation".to_string(),
            position: 5,
            extensions: vec!["mp4".to_string(), "avi".to_string(), "mkv".to_string()],
            playback_rate: 0.8,
            near_end_margin_ms: 100,
        }
    }
}

impl VideoConfig {
    pub fn near_end_margin(&self) -> Duration {
        Duration::from_millis(self.near_end_margin_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
    pub title_bar_height: f32,
    pub video_fit_width: f32,
    pub video_fit_height: f32,
    pub background_color: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 600.0,
            title_bar_height: 30.0,
            video_fit_width: 600.0,
            video_fit_height: 400.0,
            background_color: "#000000".to_string(),
        }
    }
}

impl WindowConfig {
    pub fn size(&self) -> egui::Vec2 {
        egui::vec2(self.width, self.height)
    }

    pub fn video_fit(&self) -> egui::Vec2 {
        egui::vec2(self.video_fit_width, self.video_fit_height)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WaitScreenConfig {
    pub message: String,
    pub reveal_interval_ms: u64,
    pub font_size: f32,
    pub text_color: String,
}

impl Default for WaitScreenConfig {
    fn default() -> Self {
        Self {
            message: WAIT_MESSAGE.to_string(),
            reveal_interval_ms: 200,
            font_size: 24.0,
            text_color: "#FFFFFF".to_string(),
        }
    }
}

impl WaitScreenConfig {
    pub fn reveal_interval(&self) -> Duration {
        Duration::from_millis(self.reveal_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: String,
    pub max_lines: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: "game_intro_player.log".to_string(),
            max_lines: 10000,
        }
    }
}

impl Config {
    /// `config.toml` next to the executable, falling back to the working directory.
    pub fn default_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join("config.toml")))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Returns `Ok(None)` when there is no file at `path`.
    pub fn load(path: &Path) -> Result<Option<Config>> {
        let config_str = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(anyhow!("Failed to read {}: {}", path.display(), e)),
        };
        let config = Self::from_toml(&config_str)?;
        Ok(Some(config))
    }

    pub fn from_toml(config_str: &str) -> Result<Config> {
        let config: Config =
            toml::from_str(config_str).map_err(|e| anyhow!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.video.position == 0 {
            return Err(anyhow!("video.position is 1-based and must be at least 1"));
        }
        if self.video.extensions.is_empty() {
            return Err(anyhow!("video.extensions must not be empty"));
        }
        if !(self.video.playback_rate.is_finite() && self.video.playback_rate > 0.0) {
            return Err(anyhow!(
                "video.playback_rate must be positive, got {}",
                self.video.playback_rate
            ));
        }
        if self.window.width <= 0.0 || self.window.height <= 0.0 {
            return Err(anyhow!(
                "window size must be positive, got {}x{}",
                self.window.width,
                self.window.height
            ));
        }
        Ok(())
    }
}
