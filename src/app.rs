use anyhow::Result;
use std::path::Path;

use crate::album::loader::AlbumLibrary;
use crate::audio::capture::MicrophoneSource;
use crate::audio::decode::ReplaySource;
use crate::audio::features::{FeatureExtractor, FeatureSet};
use crate::audio::{Frame, FrameSource};
use crate::config::Config;
use crate::monitor::{Monitor, Status};
use crate::offset::OffsetFile;
use crate::playback::detector::Transition;
use crate::ui::input::{Intent, KeyboardInput};
use crate::ui::status::{self, format_duration, StatusLine};
use crate::ui::terminal::{self, TerminalGuard};

/// Result of processing one frame.
pub struct Tick {
    pub features: FeatureSet,
    /// Confirmed transition with the elapsed time (offsets included) at that moment
    pub transition: Option<(Transition, f64)>,
    /// Present when the display interval has elapsed
    pub status: Option<Status>,
}

impl Tick {
    /// Whether reporting this tick will write log lines.
    pub fn has_events(&self) -> bool {
        self.transition.is_some() || self.status.as_ref().is_some_and(|s| s.sides_advanced > 0)
    }
}

/// Everything the polling loop owns between frames.
pub struct Session {
    monitor: Monitor,
    extractor: FeatureExtractor,
    library: AlbumLibrary,
    offset: OffsetFile,
    display_interval: f64,
    last_display: Option<f64>,
}

impl Session {
    pub fn new(config: &Config, sample_rate: u32) -> Self {
        Self {
            monitor: Monitor::new(
                config.detector.clone(),
                config.monitor.detection_delay_seconds,
            ),
            extractor: FeatureExtractor::new(sample_rate),
            library: AlbumLibrary::new(&config.monitor.album_dir),
            offset: OffsetFile::new(&config.monitor.offset_file),
            display_interval: config.monitor.display_interval,
            last_display: None,
        }
    }

    pub fn process(&mut self, frame: &Frame) -> Tick {
        let features = self.extractor.extract(&frame.samples);
        let now = frame.timestamp;

        let offset = self.offset.seconds();
        let transition = self
            .monitor
            .tick(&features, now, offset)
            .map(|t| (t, self.monitor.transition_elapsed(&t, offset)));

        let due = self
            .last_display
            .map_or(true, |last| now - last >= self.display_interval);
        let status = if due {
            self.last_display = Some(now);
            let offset = self.offset.refresh();
            Some(self.monitor.refresh(now, offset))
        } else {
            None
        };

        Tick {
            features,
            transition,
            status,
        }
    }

    pub fn report(&self, tick: &Tick) {
        if let Some((transition, elapsed)) = tick.transition {
            self.report_transition(transition, elapsed);
        }
        if let Some(status) = tick.status.as_ref().filter(|s| s.sides_advanced > 0) {
            match &status.track {
                Some(track) => log::info!(
                    "Auto-advanced to side {}, now at {} {}",
                    track.side_ind,
                    track.position,
                    track.title
                ),
                None => log::info!("Auto-advanced to side {}", status.side.as_deref().unwrap_or("")),
            }
        }
    }

    fn report_transition(&self, transition: Transition, elapsed: f64) {
        match transition {
            Transition::Started { onset } => {
                log::info!("Music started at {:.1}s, offset {}", onset, format_duration(elapsed));
            }
            Transition::Stopped { session_seconds } => {
                log::info!(
                    "Music stopped, session {} (effective {}), total {}",
                    format_duration(session_seconds),
                    format_duration(elapsed),
                    format_duration(self.monitor.total_playback_seconds())
                );
            }
        }
        if let Some(nav) = self.monitor.navigator() {
            log::info!(
                "Side {} elapsed {} of {}",
                nav.side_ind(),
                format_duration(nav.elapsed_on_current_side(elapsed)),
                format_duration(nav.current_side_duration())
            );
            log::debug!(
                "Side index {}, completed sides {}",
                nav.current_side_index(),
                format_duration(nav.completed_sides_duration())
            );
        }
    }

    /// Apply a listener request. Returns false when the loop should stop.
    pub fn apply(&mut self, intent: Intent) -> bool {
        match intent {
            Intent::LoadAlbum(id) => {
                self.load_album(&id);
            }
            Intent::NextSide => {
                if self.monitor.next_side() {
                    log::info!(">> Side {}", self.monitor.side_ind().unwrap_or(""));
                }
            }
            Intent::PrevSide => {
                if self.monitor.prev_side() {
                    log::info!("<< Side {}", self.monitor.side_ind().unwrap_or(""));
                }
            }
            Intent::Quit => return false,
        }
        true
    }

    /// A failed load leaves the current album in place.
    pub fn load_album(&mut self, id: &str) -> bool {
        match self.library.load(id) {
            Ok(album) => {
                log::info!("Loaded album {}, sides: {}", album.id, album.side_labels().join(", "));
                self.monitor.load_album(album);
                true
            }
            Err(err) => {
                log::warn!("{:#}", anyhow::Error::new(err));
                false
            }
        }
    }

    pub fn print_summary(&self) {
        let total = self.monitor.total_playback_seconds();
        println!("{}", "=".repeat(50));
        println!("Session Summary");
        println!("{}", "=".repeat(50));
        println!("Total playback time: {}", format_duration(total));
        println!("Total hours: {:.2}h", total / 3600.0);
        println!("{}", "=".repeat(50));
    }
}

/// Listen to the microphone with keyboard control until Ctrl+C.
pub fn run_interactive(config: &Config, preload: Option<&str>) -> Result<()> {
    let mut source = MicrophoneSource::open(
        config.audio.device.as_deref(),
        config.audio.sample_rate,
        config.audio.chunk_size,
    )?;
    let mut session = Session::new(config, source.sample_rate());
    if let Some(id) = preload {
        session.load_album(id);
    }

    log::info!("Controls: [a] prev side  [d] next side  [0-9+Enter] load album  [Ctrl+C] quit");

    let result = match TerminalGuard::acquire() {
        Ok(_terminal) => interactive_loop(&mut session, &mut source),
        Err(e) => Err(e),
    };
    drop(source);

    session.print_summary();
    result
}

fn interactive_loop(session: &mut Session, source: &mut MicrophoneSource) -> Result<()> {
    let mut input = KeyboardInput::default();
    let mut line = StatusLine::default();
    let result = poll(session, source, &mut input, &mut line);
    line.finish();
    result
}

fn poll(
    session: &mut Session,
    source: &mut MicrophoneSource,
    input: &mut KeyboardInput,
    line: &mut StatusLine,
) -> Result<()> {
    while let Some(frame) = source.next_frame()? {
        if let Some(intent) = terminal::poll_key()?.and_then(|key| input.handle(key)) {
            line.clear();
            if !session.apply(intent) {
                break;
            }
        }

        let tick = session.process(&frame);
        if tick.has_events() {
            line.clear();
        }
        session.report(&tick);
        if let Some(status) = &tick.status {
            line.draw(&status::render(status, &tick.features, input.buffer()))?;
        }
    }
    Ok(())
}

/// Run a recording through the monitor as fast as it decodes.
pub fn run_replay(config: &Config, path: &Path, preload: Option<&str>) -> Result<()> {
    let mut source = ReplaySource::open(path, config.audio.chunk_size)?;
    let mut session = Session::new(config, source.sample_rate());
    if let Some(id) = preload {
        session.load_album(id);
    }

    while let Some(frame) = source.next_frame()? {
        let tick = session.process(&frame);
        session.report(&tick);
        if let Some(status) = &tick.status {
            log::debug!(
                "[{:>9.2}s] {}",
                frame.timestamp,
                status::render(status, &tick.features, "")
            );
        }
    }

    session.print_summary();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decode::AudioData;
    use crate::playback::detector::PlaybackState;

    const SR: u32 = 16_000;
    const CHUNK: usize = 1600;

    fn config(album_dir: &Path) -> Config {
        let mut config = Config::default();
        config.audio.sample_rate = SR;
        config.audio.chunk_size = CHUNK;
        config.monitor.album_dir = album_dir.to_path_buf();
        config.monitor.offset_file = album_dir.join("debug.json");
        config
    }

    /// Deterministic broadband signal loud enough to count as music.
    fn hiss(seconds: usize) -> Vec<f32> {
        let mut state: u32 = 0x9e37_79b9;
        (0..seconds * SR as usize)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state as f32 / u32::MAX as f32 * 2.0 - 1.0) * 0.2
            })
            .collect()
    }

    fn write_album(dir: &Path) {
        let json = r#"{"id": 11, "sides": [
            {"ind": "A", "tracks": [{"position": "A1", "artist": "X", "title": "One", "duration": "0:20"}]},
            {"ind": "B", "tracks": [{"position": "B1", "artist": "X", "title": "Two", "duration": "5:00"}]}
        ]}"#;
        std::fs::write(dir.join("11.json"), json).unwrap();
    }

    #[test]
    fn replayed_recording_drives_detection_and_sides() {
        let dir = tempfile::tempdir().unwrap();
        write_album(dir.path());
        let config = config(dir.path());

        let mut samples = hiss(30);
        samples.extend(vec![0.0; 10 * SR as usize]);
        let mut source = ReplaySource::new(AudioData { samples, sample_rate: SR }, CHUNK);

        let mut session = Session::new(&config, SR);
        assert!(session.load_album("11"));

        let mut transitions = Vec::new();
        while let Some(frame) = source.next_frame().unwrap() {
            let tick = session.process(&frame);
            session.report(&tick);
            transitions.extend(tick.transition.map(|(t, _)| t));
        }

        assert_eq!(transitions.len(), 2);
        assert!(matches!(transitions[0], Transition::Started { .. }));
        assert!(matches!(transitions[1], Transition::Stopped { .. }));
        assert_eq!(session.monitor.refresh(40.0, 0.0).state, PlaybackState::Stopped);
        // ~30s of music plus the 10s delay overruns the 20s side A
        assert_eq!(session.monitor.side_ind(), Some("B"));
        let total = session.monitor.total_playback_seconds();
        assert!((total - 30.0).abs() <= 0.5, "total {}", total);
    }

    #[test]
    fn failed_load_keeps_current_album() {
        let dir = tempfile::tempdir().unwrap();
        write_album(dir.path());
        let mut session = Session::new(&config(dir.path()), SR);

        assert!(session.load_album("11"));
        assert!(session.apply(Intent::NextSide));
        assert!(!session.load_album("99"));
        assert!(!session.load_album("abc"));
        assert_eq!(session.monitor.side_ind(), Some("B"));
    }

    #[test]
    fn quit_stops_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(&config(dir.path()), SR);
        assert!(session.apply(Intent::PrevSide));
        assert!(!session.apply(Intent::Quit));
    }

    #[test]
    fn status_is_throttled_to_display_interval() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(&config(dir.path()), SR);
        let frame = |t: f64| Frame { samples: vec![0.0; CHUNK], timestamp: t };

        assert!(session.process(&frame(0.0)).status.is_some());
        assert!(session.process(&frame(0.1)).status.is_none());
        assert!(session.process(&frame(0.25)).status.is_some());
    }
}
