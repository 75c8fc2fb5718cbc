use serde::Deserialize;
use std::path::PathBuf;
use std::time::SystemTime;

use crate::album::loader::parse_duration;

#[derive(Debug, Deserialize)]
struct OffsetFileContents {
    #[serde(default)]
    playback: String,
}

/// Manual playback-position correction read from a small JSON file,
/// `{ "playback": "M:SS" }`.
///
/// The value is cached and the file is only re-read when its modification
/// time changes. A missing or malformed file means no offset.
pub struct OffsetFile {
    path: PathBuf,
    modified: Option<SystemTime>,
    seconds: f64,
}

impl OffsetFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            modified: None,
            seconds: 0.0,
        }
    }

    /// Last value read.
    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    /// Re-read the file if it changed, returning the current offset.
    pub fn refresh(&mut self) -> f64 {
        let modified = std::fs::metadata(&self.path).and_then(|m| m.modified()).ok();
        if modified.is_none() {
            self.modified = None;
            self.seconds = 0.0;
            return self.seconds;
        }
        if modified == self.modified {
            return self.seconds;
        }

        self.modified = modified;
        let previous = self.seconds;
        self.seconds = read_offset(&self.path);
        if self.seconds != previous {
            log::info!("Playback offset from {}: {}s", self.path.display(), self.seconds);
        }
        self.seconds
    }
}

fn read_offset(path: &std::path::Path) -> f64 {
    let Ok(content) = std::fs::read_to_string(path) else {
        return 0.0;
    };
    match serde_json::from_str::<OffsetFileContents>(&content) {
        Ok(contents) => parse_duration(&contents.playback) as f64,
        Err(err) => {
            log::debug!("Ignoring offset file {}: {}", path.display(), err);
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_zero() {
        let mut offset = OffsetFile::new("/nonexistent/debug.json");
        assert_eq!(offset.refresh(), 0.0);
    }

    #[test]
    fn reads_minutes_and_seconds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.json");
        std::fs::write(&path, r#"{"playback": "12:30"}"#).unwrap();

        let mut offset = OffsetFile::new(&path);
        assert_eq!(offset.refresh(), 750.0);
        assert_eq!(offset.seconds(), 750.0);
    }

    #[test]
    fn malformed_contents_are_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.json");
        for contents in [
            "not json",
            r#"{"playback": "soon"}"#,
            r#"{"other": 1}"#,
            r#"{"playback": "99999999:00"}"#,
        ] {
            std::fs::write(&path, contents).unwrap();
            assert_eq!(read_offset(&path), 0.0, "{}", contents);
        }
    }

    #[test]
    fn removed_file_resets_offset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.json");
        std::fs::write(&path, r#"{"playback": "1:00"}"#).unwrap();

        let mut offset = OffsetFile::new(&path);
        assert_eq!(offset.refresh(), 60.0);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(offset.refresh(), 0.0);
    }
}
