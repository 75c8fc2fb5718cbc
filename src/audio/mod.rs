pub mod capture;
pub mod decode;
pub mod features;

use anyhow::Result;

/// One fixed-size block of mono samples in [-1, 1].
pub struct Frame {
    pub samples: Vec<f32>,
    /// Seconds since the source started, on the source's own clock
    pub timestamp: f64,
}

/// Supplies frames to the polling loop, in arrival order.
pub trait FrameSource {
    fn sample_rate(&self) -> u32;

    /// Blocks until the next frame is ready. `Ok(None)` means the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}
