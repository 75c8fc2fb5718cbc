use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Input device name; the host default when unset
    #[serde(default)]
    pub device: Option<String>,
}

/// Thresholds for the playback detector.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DetectorConfig {
    #[serde(default = "default_rms_start_threshold")]
    pub rms_start_threshold: f32,
    /// Must sit below `rms_start_threshold` for hysteresis
    #[serde(default = "default_rms_stop_threshold")]
    pub rms_stop_threshold: f32,
    #[serde(default = "default_bandwidth_threshold")]
    pub bandwidth_threshold: f32,
    #[serde(default = "default_start_confirm_seconds")]
    pub start_confirm_seconds: f64,
    #[serde(default = "default_stop_confirm_seconds")]
    pub stop_confirm_seconds: f64,
}

#[derive(Debug, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between status refreshes
    #[serde(default = "default_display_interval")]
    pub display_interval: f64,
    #[serde(default = "default_detection_delay_seconds")]
    pub detection_delay_seconds: f64,
    #[serde(default = "default_album_dir")]
    pub album_dir: PathBuf,
    #[serde(default = "default_offset_file")]
    pub offset_file: PathBuf,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            chunk_size: default_chunk_size(),
            device: None,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            rms_start_threshold: default_rms_start_threshold(),
            rms_stop_threshold: default_rms_stop_threshold(),
            bandwidth_threshold: default_bandwidth_threshold(),
            start_confirm_seconds: default_start_confirm_seconds(),
            stop_confirm_seconds: default_stop_confirm_seconds(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            display_interval: default_display_interval(),
            detection_delay_seconds: default_detection_delay_seconds(),
            album_dir: default_album_dir(),
            offset_file: default_offset_file(),
        }
    }
}

fn default_sample_rate() -> u32 { 44_100 }
fn default_chunk_size() -> usize { 4096 }
fn default_rms_start_threshold() -> f32 { 0.001 }
fn default_rms_stop_threshold() -> f32 { 0.0005 }
fn default_bandwidth_threshold() -> f32 { 1000.0 }
fn default_start_confirm_seconds() -> f64 { 2.0 }
fn default_stop_confirm_seconds() -> f64 { 5.0 }
fn default_display_interval() -> f64 { 0.2 }
fn default_detection_delay_seconds() -> f64 { 10.0 }
fn default_album_dir() -> PathBuf { PathBuf::from(".data/albums") }
fn default_offset_file() -> PathBuf { PathBuf::from(".data/debug.json") }

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Explicit path first, then `./platter.toml`, then the per-user config.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("platter.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("platter").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("platter").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}
