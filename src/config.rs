use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::keyframe::{DEFAULT_PHASE_THRESHOLD, DEFAULT_PLANK_INTERVAL_SECS};

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DetectorConfig {
    /// 位相判定の不感帯（正規化座標）
    #[serde(default = "default_phase_threshold")]
    pub phase_threshold: f64,
    /// プランクのキーフレーム間隔（秒）
    #[serde(default = "default_plank_interval_secs")]
    pub plank_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// 指定時、この秒数フレームが来ないセッションを破棄する
    #[serde(default)]
    pub session_idle_secs: Option<u64>,
    #[serde(default = "default_evict_interval_secs")]
    pub evict_interval_secs: u64,
    #[serde(default)]
    pub verbose: bool,
}

fn default_phase_threshold() -> f64 { DEFAULT_PHASE_THRESHOLD }
fn default_plank_interval_secs() -> u64 { DEFAULT_PLANK_INTERVAL_SECS }
fn default_listen_addr() -> String { "127.0.0.1:7878".to_string() }
fn default_evict_interval_secs() -> u64 { 60 }

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            phase_threshold: default_phase_threshold(),
            plank_interval_secs: default_plank_interval_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            session_idle_secs: None,
            evict_interval_secs: default_evict_interval_secs(),
            verbose: false,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 読めなければデフォルト設定
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}: {:#} (using defaults)", path.as_ref().display(), e);
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<()> {
        let t = self.detector.phase_threshold;
        if !t.is_finite() || t < 0.0 {
            anyhow::bail!("detector.phase_threshold must be a non-negative number, got {}", t);
        }
        Ok(())
    }
}
