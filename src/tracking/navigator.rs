use crate::album::model::{Album, CurrentTrack, Side};

use super::estimator;

/// Cursor over the sides of the loaded album.
///
/// `completed_sides_duration` only moves on automatic navigation. A manual
/// side change keeps the elapsed-time baseline where it was, so after the
/// listener flips sides by hand the elapsed-on-side value keeps counting from
/// the old baseline until the next automatic advance.
#[derive(Clone, Debug)]
pub struct SideNavigator {
    album: Album,
    current_side_index: usize,
    completed_sides_duration: f64,
}

impl SideNavigator {
    pub fn new(album: Album) -> Self {
        Self {
            album,
            current_side_index: 0,
            completed_sides_duration: 0.0,
        }
    }

    pub fn current_side_index(&self) -> usize {
        self.current_side_index
    }

    pub fn completed_sides_duration(&self) -> f64 {
        self.completed_sides_duration
    }

    pub fn current_side(&self) -> Option<&Side> {
        self.album.sides.get(self.current_side_index)
    }

    /// Label of the current side, empty when the album has no sides.
    pub fn side_ind(&self) -> &str {
        self.current_side().map_or("", |s| s.ind.as_str())
    }

    pub fn current_side_duration(&self) -> f64 {
        self.current_side().map_or(0.0, Side::duration_seconds)
    }

    pub fn elapsed_on_current_side(&self, total_elapsed: f64) -> f64 {
        (total_elapsed - self.completed_sides_duration).max(0.0)
    }

    /// Move to the next side. With `auto`, the side being left is added to
    /// the completed total first.
    pub fn next_side(&mut self, auto: bool) -> bool {
        if self.current_side_index + 1 >= self.album.sides.len() {
            return false;
        }
        if auto {
            self.completed_sides_duration += self.current_side_duration();
        }
        self.current_side_index += 1;
        true
    }

    /// Move to the previous side. With `auto`, the side moved onto is taken
    /// back out of the completed total.
    pub fn prev_side(&mut self, auto: bool) -> bool {
        if self.current_side_index == 0 {
            return false;
        }
        self.current_side_index -= 1;
        if auto {
            self.completed_sides_duration =
                (self.completed_sides_duration - self.current_side_duration()).max(0.0);
        }
        true
    }

    /// Advance past every side that `total_elapsed` has already overrun.
    ///
    /// Idempotent for a given `total_elapsed`. Sides of unknown (zero)
    /// duration are never skipped, and the cursor parks on the last side.
    /// Returns the number of sides advanced.
    pub fn normalize(&mut self, total_elapsed: f64) -> usize {
        let mut advanced = 0;
        loop {
            let side_duration = self.current_side_duration();
            if side_duration <= 0.0 || self.elapsed_on_current_side(total_elapsed) < side_duration {
                break;
            }
            if !self.next_side(true) {
                break;
            }
            advanced += 1;
        }
        advanced
    }

    pub fn current_track(&self, total_elapsed: f64) -> Option<CurrentTrack> {
        let side = self.current_side()?;
        estimator::current_track(side, self.elapsed_on_current_side(total_elapsed))
    }
}
