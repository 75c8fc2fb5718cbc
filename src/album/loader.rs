use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

use super::model::{Album, Side, Track};

#[derive(Debug, Error)]
pub enum AlbumError {
    #[error("Invalid album ID: {0}")]
    InvalidId(String),
    #[error("Album {0} not found")]
    NotFound(u64),
    #[error("Failed to read album file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse album file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct AlbumFile {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    sides: Vec<SideEntry>,
}

#[derive(Debug, Deserialize)]
struct SideEntry {
    #[serde(default)]
    ind: String,
    #[serde(default)]
    tracks: Vec<TrackEntry>,
}

#[derive(Debug, Deserialize)]
struct TrackEntry {
    #[serde(default)]
    position: String,
    #[serde(default)]
    artist: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    duration: String,
}

/// Albums stored as `<dir>/<id>.json`.
pub struct AlbumLibrary {
    dir: PathBuf,
}

impl AlbumLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Look up an album from the id as the listener typed it.
    pub fn load(&self, id_text: &str) -> Result<Album, AlbumError> {
        let id: u64 = id_text
            .trim()
            .parse()
            .map_err(|_| AlbumError::InvalidId(id_text.to_string()))?;

        let path = self.dir.join(format!("{}.json", id));
        if !path.exists() {
            return Err(AlbumError::NotFound(id));
        }

        let content = std::fs::read_to_string(&path).map_err(|source| AlbumError::Read {
            path: path.clone(),
            source,
        })?;
        let file: AlbumFile =
            serde_json::from_str(&content).map_err(|source| AlbumError::Parse { path, source })?;

        Ok(into_album(file, id))
    }
}

fn into_album(file: AlbumFile, requested_id: u64) -> Album {
    let sides = file
        .sides
        .into_iter()
        .map(|side| Side {
            ind: side.ind,
            tracks: side
                .tracks
                .into_iter()
                .map(|t| Track {
                    duration_seconds: parse_duration(&t.duration),
                    position: t.position,
                    artist: t.artist,
                    title: t.title,
                })
                .collect(),
        })
        .collect();

    Album {
        id: file.id.unwrap_or(requested_id),
        sides,
    }
}

/// Convert "M:SS" / "MM:SS" to seconds. Anything else is 0.
pub fn parse_duration(text: &str) -> u32 {
    let mut parts = text.trim().split(':');
    let (Some(minutes), Some(seconds), None) = (parts.next(), parts.next(), parts.next()) else {
        return 0;
    };
    match (minutes.trim().parse::<u32>(), seconds.trim().parse::<u32>()) {
        (Ok(m), Ok(s)) => m.checked_mul(60).and_then(|v| v.checked_add(s)).unwrap_or(0),
        _ => 0,
    }
}
