mod album;
mod app;
mod audio;
mod cli;
mod config;
mod monitor;
mod offset;
mod playback;
mod tracking;
mod ui;

use anyhow::Result;
use clap::Parser;
use std::io::Write;

use cli::Cli;

fn main() -> Result<()> {
    // Records end in \r\n so they stay aligned while the terminal is in raw mode
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            write!(
                buf,
                "[{} {:<5} {}] {}\r\n",
                buf.timestamp_millis(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let cli = Cli::parse();

    if cli.list_devices {
        return audio::capture::list_input_devices();
    }

    let mut cfg = config::Config::default();
    if let Some(path) = config::find_config(cli.config.as_deref()) {
        if let Some(loaded) = config::load_config(&path) {
            log::info!("Loaded config from {}", path.display());
            cfg = loaded;
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }
    cli.apply_overrides(&mut cfg);

    if cfg.detector.rms_stop_threshold >= cfg.detector.rms_start_threshold {
        log::warn!(
            "RMS stop threshold {} is not below start threshold {}; playback may flicker",
            cfg.detector.rms_stop_threshold,
            cfg.detector.rms_start_threshold
        );
    }
    if cfg.audio.chunk_size == 0 {
        anyhow::bail!("Chunk size must be at least 1 sample");
    }

    log::info!("platter - vinyl playback monitor");
    log::info!("Sample rate: {} Hz, chunk size: {}", cfg.audio.sample_rate, cfg.audio.chunk_size);
    log::info!(
        "RMS start/stop: {}/{}, bandwidth: {} Hz",
        cfg.detector.rms_start_threshold,
        cfg.detector.rms_stop_threshold,
        cfg.detector.bandwidth_threshold
    );
    log::info!(
        "Start confirm: {}s, stop confirm: {}s, detection delay: {}s",
        cfg.detector.start_confirm_seconds,
        cfg.detector.stop_confirm_seconds,
        cfg.monitor.detection_delay_seconds
    );
    log::info!("Albums: {}", cfg.monitor.album_dir.display());

    match cli.input {
        Some(ref input) => {
            if !input.exists() {
                anyhow::bail!("Input file not found: {}", input.display());
            }
            log::info!("Replaying {}", input.display());
            app::run_replay(&cfg, input, cli.album.as_deref())
        }
        None => app::run_interactive(&cfg, cli.album.as_deref()),
    }
}
