use crate::audio::features::FeatureSet;
use crate::config::DetectorConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Stopped,
}

impl PlaybackState {
    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Idle => "IDLE",
            PlaybackState::Playing => "PLAYING",
            PlaybackState::Stopped => "STOPPED",
        }
    }
}

/// A confirmed state change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Transition {
    /// Playback confirmed; `onset` is the backdated start instant.
    Started { onset: f64 },
    /// Playback ended; `session_seconds` excludes the stop confirm window.
    Stopped { session_seconds: f64 },
}

/// Detector state with the confirm-window timestamps it is counting, if any.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Idle { pending_start: Option<f64> },
    Playing { onset: f64, pending_stop: Option<f64> },
    Stopped { pending_start: Option<f64> },
}

impl DetectorConfig {
    pub fn is_music(&self, features: &FeatureSet) -> bool {
        features.rms > self.rms_start_threshold && features.bandwidth > self.bandwidth_threshold
    }

    pub fn is_silence(&self, features: &FeatureSet) -> bool {
        features.rms < self.rms_stop_threshold
    }
}

/// Debounced playback detection with hysteresis.
///
/// Times are seconds on the caller's monotonic clock.
pub struct PlaybackDetector {
    config: DetectorConfig,
    phase: Phase,
    total_playback_seconds: f64,
}

impl PlaybackDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle { pending_start: None },
            total_playback_seconds: 0.0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        match self.phase {
            Phase::Idle { .. } => PlaybackState::Idle,
            Phase::Playing { .. } => PlaybackState::Playing,
            Phase::Stopped { .. } => PlaybackState::Stopped,
        }
    }

    /// Sum of all finished sessions.
    pub fn total_playback_seconds(&self) -> f64 {
        self.total_playback_seconds
    }

    /// Seconds since the backdated onset while playing, otherwise 0.
    pub fn live_session_seconds(&self, now: f64) -> f64 {
        match self.phase {
            Phase::Playing { onset, .. } => (now - onset).max(0.0),
            _ => 0.0,
        }
    }

    /// Finished sessions plus the one in progress.
    pub fn lifetime_seconds(&self, now: f64) -> f64 {
        self.total_playback_seconds + self.live_session_seconds(now)
    }

    pub fn update(&mut self, features: &FeatureSet, now: f64) -> Option<Transition> {
        let (phase, transition) = self.step(features, now);
        self.phase = phase;
        if let Some(Transition::Stopped { session_seconds }) = transition {
            self.total_playback_seconds += session_seconds;
        }
        transition
    }

    fn step(&self, features: &FeatureSet, now: f64) -> (Phase, Option<Transition>) {
        let cfg = &self.config;
        match self.phase {
            Phase::Idle { pending_start } | Phase::Stopped { pending_start } => {
                if !cfg.is_music(features) {
                    return (self.waiting(None), None);
                }
                match pending_start {
                    None => (self.waiting(Some(now)), None),
                    Some(since) if now - since >= cfg.start_confirm_seconds => {
                        let onset = now - cfg.start_confirm_seconds;
                        (
                            Phase::Playing { onset, pending_stop: None },
                            Some(Transition::Started { onset }),
                        )
                    }
                    Some(since) => (self.waiting(Some(since)), None),
                }
            }
            Phase::Playing { onset, pending_stop } => {
                if !cfg.is_silence(features) {
                    return (Phase::Playing { onset, pending_stop: None }, None);
                }
                match pending_stop {
                    None => (Phase::Playing { onset, pending_stop: Some(now) }, None),
                    Some(since) if now - since >= cfg.stop_confirm_seconds => {
                        let session_seconds = (now - onset - cfg.stop_confirm_seconds).max(0.0);
                        (
                            Phase::Stopped { pending_start: None },
                            Some(Transition::Stopped { session_seconds }),
                        )
                    }
                    Some(since) => (Phase::Playing { onset, pending_stop: Some(since) }, None),
                }
            }
        }
    }

    /// Same not-playing state, with a new pending-start value.
    fn waiting(&self, pending_start: Option<f64>) -> Phase {
        match self.phase {
            Phase::Stopped { .. } => Phase::Stopped { pending_start },
            _ => Phase::Idle { pending_start },
        }
    }
}

/// Compensation applied to detected time before it is matched against an album.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ElapsedOffsets {
    /// Fixed lag between true onset and confirmed onset
    pub detection_delay: f64,
    /// External correction, 0 when no collaborator supplies one
    pub override_offset: f64,
}

impl ElapsedOffsets {
    pub fn apply(&self, seconds: f64) -> f64 {
        seconds + self.detection_delay + self.override_offset
    }
}
