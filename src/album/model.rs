#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    /// Vinyl position label, e.g. "A1"
    pub position: String,
    pub artist: String,
    pub title: String,
    /// 0 when the duration is unknown
    pub duration_seconds: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Side {
    /// Side label, e.g. "A"
    pub ind: String,
    pub tracks: Vec<Track>,
}

impl Side {
    pub fn duration_seconds(&self) -> f64 {
        self.tracks.iter().map(|t| t.duration_seconds as f64).sum()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Album {
    pub id: u64,
    /// Sides in playback order
    pub sides: Vec<Side>,
}

impl Album {
    pub fn side_labels(&self) -> Vec<&str> {
        self.sides.iter().map(|s| s.ind.as_str()).collect()
    }
}

/// The track under the needle, as shown to the listener.
#[derive(Clone, Debug, PartialEq)]
pub struct CurrentTrack {
    pub artist: String,
    pub title: String,
    pub position: String,
    pub side_ind: String,
}

impl CurrentTrack {
    pub fn new(track: &Track, side: &Side) -> Self {
        Self {
            artist: track.artist.clone(),
            title: track.title.clone(),
            position: track.position.clone(),
            side_ind: side.ind.clone(),
        }
    }
}
