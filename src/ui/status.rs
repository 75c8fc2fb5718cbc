use anyhow::Result;
use crossterm::cursor::MoveToColumn;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use std::io::{self, Write};

use crate::audio::features::FeatureSet;
use crate::monitor::Status;
use crate::playback::detector::PlaybackState;

const TRACK_INFO_WIDTH: usize = 40;

/// `HH:MM:SS` from one hour up, `MM:SS` below. Fractions are truncated.
pub fn format_duration(seconds: f64) -> String {
    let total_secs = seconds.max(0.0) as u64;
    let (hours, minutes, secs) = (total_secs / 3600, (total_secs % 3600) / 60, total_secs % 60);
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

fn state_icon(state: PlaybackState) -> &'static str {
    match state {
        PlaybackState::Idle => "⏸",
        PlaybackState::Playing => "▶",
        PlaybackState::Stopped => "⏹",
    }
}

/// Build the single status line.
pub fn render(status: &Status, features: &FeatureSet, input_buffer: &str) -> String {
    let head = format!("{} {:8}", state_icon(status.state), status.state.label());

    if !input_buffer.is_empty() {
        return format!("{} | Enter album ID: {}_", head, input_buffer);
    }

    let side = status.side.as_deref().unwrap_or("");
    if let Some(track) = &status.track {
        let info: String = format!("{} - {}", track.artist, track.title)
            .chars()
            .take(TRACK_INFO_WIDTH)
            .collect();
        return format!(
            "{} | Side {} | {:>8} | {:<width$}",
            head,
            side,
            format_duration(status.session_seconds),
            info,
            width = TRACK_INFO_WIDTH
        );
    }

    if status.album_loaded {
        return format!(
            "{} | Side {} | Session: {:>8} | Total: {:>8}",
            head,
            side,
            format_duration(status.session_seconds),
            format_duration(status.total_seconds)
        );
    }

    let hint = if status.state == PlaybackState::Playing {
        ""
    } else {
        "Type album ID + Enter"
    };
    format!(
        "{} | Session: {:>8} | Total: {:>8} | RMS: {:.4} | BW: {:>7.1} Hz | {}",
        head,
        format_duration(status.session_seconds),
        format_duration(status.total_seconds),
        features.rms,
        features.bandwidth,
        hint
    )
}

/// A status line redrawn in place on stdout.
#[derive(Default)]
pub struct StatusLine {
    shown: bool,
}

impl StatusLine {
    pub fn draw(&mut self, text: &str) -> Result<()> {
        let mut stdout = io::stdout();
        queue!(stdout, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        write!(stdout, "{}", text)?;
        stdout.flush()?;
        self.shown = true;
        Ok(())
    }

    /// Wipe the line so log output starts on a clean row.
    pub fn clear(&mut self) {
        if !self.shown {
            return;
        }
        let mut stdout = io::stdout();
        let _ = queue!(stdout, MoveToColumn(0), Clear(ClearType::CurrentLine));
        let _ = stdout.flush();
        self.shown = false;
    }

    /// Leave the last status on screen and move below it.
    pub fn finish(&mut self) {
        if self.shown {
            print!("\r\n");
            let _ = io::stdout().flush();
            self.shown = false;
        }
    }
}
