use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::chat::{ApiVariant, Endpoint};
use crate::language::Language;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub api_variant: ApiVariant,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub default_language: Language,
    #[serde(default = "default_speech_enabled")]
    pub speech_enabled: bool,
    #[serde(default = "default_speech_rate")]
    pub speech_rate: f32,
    #[serde(default = "default_speech_pitch")]
    pub speech_pitch: f32,
    #[serde(default = "default_math_rendering")]
    pub math_rendering: bool,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_api_base() -> String {
    "https://sara-ai-backend.onrender.com".to_string()
}
fn default_theme() -> String {
    "catppuccin-mocha".to_string()
}
fn default_speech_enabled() -> bool {
    true
}
fn default_speech_rate() -> f32 {
    0.95
}
fn default_speech_pitch() -> f32 {
    1.0
}
fn default_math_rendering() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_variant: ApiVariant::default(),
            theme: default_theme(),
            default_language: Language::default(),
            speech_enabled: default_speech_enabled(),
            speech_rate: default_speech_rate(),
            speech_pitch: default_speech_pitch(),
            math_rendering: default_math_rendering(),
            request_timeout_secs: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("syllabot")
            .join("config.toml")
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.api_base.clone(), self.api_variant)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }

    /// Repairs values a hand-edited file can get wrong. Call after loading.
    pub fn normalize(&mut self, valid_themes: &[String]) {
        if self.api_base.trim().is_empty() {
            self.api_base = default_api_base();
        }
        if !valid_themes.iter().any(|t| *t == self.theme) {
            self.theme = default_theme();
        }
        if !self.speech_rate.is_finite() || !(0.1..=10.0).contains(&self.speech_rate) {
            self.speech_rate = default_speech_rate();
        }
        if !self.speech_pitch.is_finite() || !(0.0..=2.0).contains(&self.speech_pitch) {
            self.speech_pitch = default_speech_pitch();
        }
    }
}
