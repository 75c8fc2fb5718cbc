use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "platter", about = "Vinyl playback monitor: detects when a record plays and follows its tracks")]
pub struct Cli {
    /// Config file (default: ./platter.toml or ~/.config/platter/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Replay a recording instead of listening to the microphone
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Album id to load at startup
    #[arg(short, long)]
    pub album: Option<String>,

    /// List input devices and exit
    #[arg(long)]
    pub list_devices: bool,

    /// Input device name
    #[arg(long)]
    pub device: Option<String>,

    /// Capture sample rate in Hz
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Samples per analysis frame
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// RMS above which a frame may count as music
    #[arg(long)]
    pub rms_start: Option<f32>,

    /// RMS below which a frame counts as silence
    #[arg(long)]
    pub rms_stop: Option<f32>,

    /// Spectral bandwidth (Hz) above which a frame may count as music
    #[arg(long)]
    pub bandwidth: Option<f32>,

    /// Seconds of continuous music before playback is confirmed
    #[arg(long)]
    pub start_confirm: Option<f64>,

    /// Seconds of continuous silence before a stop is confirmed
    #[arg(long)]
    pub stop_confirm: Option<f64>,

    /// Seconds between status line refreshes
    #[arg(long)]
    pub display_interval: Option<f64>,

    /// Seconds added to elapsed time to cover detection lag
    #[arg(long)]
    pub detection_delay: Option<f64>,

    /// Directory holding <id>.json album files
    #[arg(long)]
    pub album_dir: Option<PathBuf>,

    /// JSON file with a manual playback offset
    #[arg(long)]
    pub offset_file: Option<PathBuf>,
}

impl Cli {
    /// Flags given on the command line override the config file.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(ref device) = self.device { cfg.audio.device = Some(device.clone()); }
        if let Some(v) = self.sample_rate { cfg.audio.sample_rate = v; }
        if let Some(v) = self.chunk_size { cfg.audio.chunk_size = v; }
        if let Some(v) = self.rms_start { cfg.detector.rms_start_threshold = v; }
        if let Some(v) = self.rms_stop { cfg.detector.rms_stop_threshold = v; }
        if let Some(v) = self.bandwidth { cfg.detector.bandwidth_threshold = v; }
        if let Some(v) = self.start_confirm { cfg.detector.start_confirm_seconds = v; }
        if let Some(v) = self.stop_confirm { cfg.detector.stop_confirm_seconds = v; }
        if let Some(v) = self.display_interval { cfg.monitor.display_interval = v; }
        if let Some(v) = self.detection_delay { cfg.monitor.detection_delay_seconds = v; }
        if let Some(ref dir) = self.album_dir { cfg.monitor.album_dir = dir.clone(); }
        if let Some(ref path) = self.offset_file { cfg.monitor.offset_file = path.clone(); }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from(["platter", "--rms-start", "0.02", "--chunk-size", "2048", "-a", "17"]);
        let mut cfg = Config::default();
        cli.apply_overrides(&mut cfg);
        assert_eq!(cfg.detector.rms_start_threshold, 0.02);
        assert_eq!(cfg.audio.chunk_size, 2048);
        assert_eq!(cfg.detector.rms_stop_threshold, 0.0005);
        assert_eq!(cli.album.as_deref(), Some("17"));
    }

    #[test]
    fn no_flags_keep_config() {
        let cli = Cli::parse_from(["platter"]);
        let mut cfg = Config::default();
        cfg.monitor.detection_delay_seconds = 3.0;
        cli.apply_overrides(&mut cfg);
        assert_eq!(cfg.monitor.detection_delay_seconds, 3.0);
        assert!(cli.input.is_none());
    }
}
