use crate::album::model::{Album, CurrentTrack};
use crate::audio::features::FeatureSet;
use crate::config::DetectorConfig;
use crate::playback::detector::{ElapsedOffsets, PlaybackDetector, PlaybackState, Transition};
use crate::tracking::navigator::SideNavigator;

/// What the listener sees on each refresh.
#[derive(Clone, Debug, PartialEq)]
pub struct Status {
    pub state: PlaybackState,
    /// Elapsed time of the current session including offsets, 0 when not playing
    pub session_seconds: f64,
    /// Finished sessions plus the live one, without offsets
    pub total_seconds: f64,
    pub album_loaded: bool,
    /// Sides auto-advanced by this refresh
    pub sides_advanced: usize,
    pub side: Option<String>,
    pub track: Option<CurrentTrack>,
}

/// Playback detection plus, once an album is loaded, side and track tracking.
///
/// Owned by the polling loop. Works without an album, in which case only the
/// detector runs.
pub struct Monitor {
    detector: PlaybackDetector,
    navigator: Option<SideNavigator>,
    detection_delay: f64,
}

impl Monitor {
    pub fn new(config: DetectorConfig, detection_delay: f64) -> Self {
        Self {
            detector: PlaybackDetector::new(config),
            navigator: None,
            detection_delay,
        }
    }

    pub fn navigator(&self) -> Option<&SideNavigator> {
        self.navigator.as_ref()
    }

    fn offsets(&self, override_offset: f64) -> ElapsedOffsets {
        ElapsedOffsets {
            detection_delay: self.detection_delay,
            override_offset,
        }
    }

    /// Feed one frame's features. On a confirmed transition the side cursor
    /// is brought in line with the elapsed time at that moment.
    pub fn tick(&mut self, features: &FeatureSet, now: f64, override_offset: f64) -> Option<Transition> {
        let transition = self.detector.update(features, now)?;
        self.normalize(self.transition_elapsed(&transition, override_offset));
        Some(transition)
    }

    /// Elapsed time, offsets included, at the moment of `transition`.
    pub fn transition_elapsed(&self, transition: &Transition, override_offset: f64) -> f64 {
        let offsets = self.offsets(override_offset);
        match *transition {
            Transition::Started { .. } => offsets.apply(0.0),
            Transition::Stopped { session_seconds } => offsets.apply(session_seconds),
        }
    }

    /// Session time with offsets applied, or 0 when not playing.
    pub fn effective_elapsed(&self, now: f64, override_offset: f64) -> f64 {
        if self.detector.state() != PlaybackState::Playing {
            return 0.0;
        }
        self.offsets(override_offset)
            .apply(self.detector.live_session_seconds(now))
    }

    /// Advance sides for `total_elapsed`; a no-op without an album.
    pub fn normalize(&mut self, total_elapsed: f64) -> usize {
        self.navigator
            .as_mut()
            .map_or(0, |nav| nav.normalize(total_elapsed))
    }

    /// Recompute elapsed time, auto-advance while playing, and resolve the track.
    pub fn refresh(&mut self, now: f64, override_offset: f64) -> Status {
        let session_seconds = self.effective_elapsed(now, override_offset);
        let sides_advanced = if self.detector.state() == PlaybackState::Playing {
            self.normalize(session_seconds)
        } else {
            0
        };

        let (side, track) = match &self.navigator {
            Some(nav) => (
                nav.current_side().map(|s| s.ind.clone()),
                nav.current_track(session_seconds),
            ),
            None => (None, None),
        };

        Status {
            state: self.detector.state(),
            session_seconds,
            total_seconds: self.detector.lifetime_seconds(now),
            album_loaded: self.navigator.is_some(),
            sides_advanced,
            side,
            track,
        }
    }

    /// Replace the album and start again from its first side.
    pub fn load_album(&mut self, album: Album) {
        self.navigator = Some(SideNavigator::new(album));
    }

    /// Manual side change; leaves the elapsed-time baseline alone.
    pub fn next_side(&mut self) -> bool {
        self.navigator.as_mut().is_some_and(|nav| nav.next_side(false))
    }

    /// Manual side change; leaves the elapsed-time baseline alone.
    pub fn prev_side(&mut self) -> bool {
        self.navigator.as_mut().is_some_and(|nav| nav.prev_side(false))
    }

    pub fn side_ind(&self) -> Option<&str> {
        self.navigator.as_ref().map(|nav| nav.side_ind())
    }

    pub fn total_playback_seconds(&self) -> f64 {
        self.detector.total_playback_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::album::model::{Side, Track};
    use approx::assert_relative_eq;

    const MUSIC: FeatureSet = FeatureSet { rms: 0.01, bandwidth: 2500.0 };
    const SILENCE: FeatureSet = FeatureSet { rms: 0.0001, bandwidth: 0.0 };
    const DELAY: f64 = 10.0;

    fn album() -> Album {
        let side = |ind: &str, durations: &[u32]| Side {
            ind: ind.to_string(),
            tracks: durations
                .iter()
                .enumerate()
                .map(|(i, &d)| Track {
                    position: format!("{}{}", ind, i + 1),
                    artist: "Artist".into(),
                    title: format!("{} track {}", ind, i + 1),
                    duration_seconds: d,
                })
                .collect(),
        };
        Album {
            id: 5,
            sides: vec![side("A", &[40, 60]), side("B", &[150])],
        }
    }

    fn monitor() -> Monitor {
        let mut monitor = Monitor::new(DetectorConfig::default(), DELAY);
        monitor.load_album(album());
        monitor
    }

    fn feed(monitor: &mut Monitor, features: FeatureSet, from: f64, to: f64, offset: f64) -> Vec<Transition> {
        let mut out = Vec::new();
        let mut t = from;
        while t <= to {
            out.extend(monitor.tick(&features, t, offset));
            t += 0.25;
        }
        out
    }

    #[test]
    fn detector_only_without_album() {
        let mut monitor = Monitor::new(DetectorConfig::default(), DELAY);
        feed(&mut monitor, MUSIC, 0.0, 5.0, 0.0);
        let status = monitor.refresh(5.0, 0.0);
        assert_eq!(status.state, PlaybackState::Playing);
        assert_relative_eq!(status.session_seconds, 15.0);
        assert_relative_eq!(status.total_seconds, 5.0);
        assert!(!status.album_loaded);
        assert!(status.side.is_none());
        assert!(status.track.is_none());
        assert!(!monitor.next_side());
        assert!(!monitor.prev_side());
    }

    #[test]
    fn live_status_includes_detection_delay() {
        let mut monitor = monitor();
        feed(&mut monitor, MUSIC, 0.0, 20.0, 0.0);
        let status = monitor.refresh(20.0, 0.0);
        // 20s since onset + 10s delay lands in the first track's window
        assert_relative_eq!(status.session_seconds, 30.0);
        assert_eq!(status.track.unwrap().position, "A1");

        let status = monitor.refresh(35.0, 0.0);
        assert_eq!(status.track.unwrap().position, "A2");
    }

    #[test]
    fn refresh_advances_side_while_playing() {
        let mut monitor = monitor();
        feed(&mut monitor, MUSIC, 0.0, 95.0, 0.0);
        let status = monitor.refresh(95.0, 0.0);
        assert_eq!(status.sides_advanced, 1);
        assert_eq!(status.side.as_deref(), Some("B"));
        assert_eq!(status.track.unwrap().position, "B1");
        assert_relative_eq!(monitor.navigator().unwrap().completed_sides_duration(), 100.0);
    }

    #[test]
    fn stop_transition_advances_with_effective_duration() {
        let mut monitor = monitor();
        feed(&mut monitor, MUSIC, 0.0, 94.75, 0.0);
        let stops = feed(&mut monitor, SILENCE, 95.0, 100.0, 0.0);
        // 95s audible + 10s delay overruns side A
        assert_eq!(stops, vec![Transition::Stopped { session_seconds: 95.0 }]);
        assert_relative_eq!(monitor.transition_elapsed(&stops[0], 0.0), 105.0);
        assert_eq!(monitor.side_ind(), Some("B"));
        assert_relative_eq!(monitor.total_playback_seconds(), 95.0);

        let status = monitor.refresh(120.0, 0.0);
        assert_eq!(status.state, PlaybackState::Stopped);
        assert_eq!(status.session_seconds, 0.0);
        assert_relative_eq!(status.total_seconds, 95.0);
    }

    #[test]
    fn start_transition_applies_override_offset() {
        let mut monitor = monitor();
        let starts = feed(&mut monitor, MUSIC, 0.0, 2.0, 120.0);
        assert_eq!(starts, vec![Transition::Started { onset: 0.0 }]);
        assert_relative_eq!(monitor.transition_elapsed(&starts[0], 120.0), 130.0);
        // 10s delay + 120s offset is already past side A
        assert_eq!(monitor.side_ind(), Some("B"));
    }

    #[test]
    fn loading_an_album_replaces_the_cursor() {
        let mut monitor = monitor();
        feed(&mut monitor, MUSIC, 0.0, 95.0, 0.0);
        monitor.refresh(95.0, 0.0);
        assert_eq!(monitor.side_ind(), Some("B"));

        monitor.load_album(album());
        let nav = monitor.navigator().unwrap();
        assert_eq!(nav.current_side_index(), 0);
        assert_eq!(nav.completed_sides_duration(), 0.0);
    }

    #[test]
    fn manual_navigation_is_reflected_in_status() {
        let mut monitor = monitor();
        assert!(monitor.next_side());
        let status = monitor.refresh(0.0, 0.0);
        assert_eq!(status.side.as_deref(), Some("B"));
        assert!(!monitor.next_side());
        assert!(monitor.prev_side());
        assert_eq!(monitor.side_ind(), Some("A"));
        assert_eq!(monitor.navigator().unwrap().completed_sides_duration(), 0.0);
    }
}
