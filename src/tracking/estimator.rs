use crate::album::model::{CurrentTrack, Side};

/// The track whose cumulative-duration window contains `elapsed_on_side`.
///
/// Past the end of the side the last track is returned; `None` only when the
/// side has no tracks.
pub fn current_track(side: &Side, elapsed_on_side: f64) -> Option<CurrentTrack> {
    let mut cumulative = 0.0;
    for track in &side.tracks {
        cumulative += track.duration_seconds as f64;
        if elapsed_on_side < cumulative {
            return Some(CurrentTrack::new(track, side));
        }
    }
    side.tracks.last().map(|track| CurrentTrack::new(track, side))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::album::model::Track;

    fn side(durations: &[u32]) -> Side {
        Side {
            ind: "A".into(),
            tracks: durations
                .iter()
                .enumerate()
                .map(|(i, &d)| Track {
                    position: format!("A{}", i + 1),
                    artist: "Artist".into(),
                    title: format!("Track {}", i + 1),
                    duration_seconds: d,
                })
                .collect(),
        }
    }

    fn position_at(side: &Side, elapsed: f64) -> String {
        current_track(side, elapsed).unwrap().position
    }

    #[test]
    fn walks_cumulative_windows() {
        let side = side(&[180, 200, 220]);
        for elapsed in [0.0, 90.0, 179.0, 179.9] {
            assert_eq!(position_at(&side, elapsed), "A1", "at {}", elapsed);
        }
        for elapsed in [180.0, 250.0, 379.0] {
            assert_eq!(position_at(&side, elapsed), "A2", "at {}", elapsed);
        }
        for elapsed in [380.0, 599.0] {
            assert_eq!(position_at(&side, elapsed), "A3", "at {}", elapsed);
        }
    }

    #[test]
    fn clamps_to_last_track_past_side_end() {
        let side = side(&[180, 200, 220]);
        assert_eq!(position_at(&side, 600.0), "A3");
        assert_eq!(position_at(&side, 10_000.0), "A3");
    }

    #[test]
    fn empty_side_has_no_track() {
        assert!(current_track(&side(&[]), 0.0).is_none());
    }

    #[test]
    fn unknown_durations_fall_through_to_last_track() {
        let side = side(&[0, 0]);
        assert_eq!(position_at(&side, 0.0), "A2");
    }

    #[test]
    fn reports_side_label() {
        let track = current_track(&side(&[60]), 10.0).unwrap();
        assert_eq!(track.side_ind, "A");
        assert_eq!(track.title, "Track 1");
    }
}
