use rustfft::{num_complex::Complex, FftPlanner};

/// Per-frame features used to classify playback.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FeatureSet {
    /// RMS energy (linear)
    pub rms: f32,
    /// Magnitude-weighted spread of frequency around the spectral centroid (Hz)
    pub bandwidth: f32,
}

/// Computes [`FeatureSet`]s from mono frames.
///
/// Holds only the FFT planner, which caches plans per frame length; every
/// call is independent of the previous one.
pub struct FeatureExtractor {
    planner: FftPlanner<f32>,
    sample_rate: u32,
}

impl FeatureExtractor {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            planner: FftPlanner::new(),
            sample_rate,
        }
    }

    pub fn extract(&mut self, samples: &[f32]) -> FeatureSet {
        FeatureSet {
            rms: rms(samples),
            bandwidth: self.spectral_bandwidth(samples),
        }
    }

    fn spectral_bandwidth(&mut self, samples: &[f32]) -> f32 {
        let n = samples.len();
        if n == 0 {
            return 0.0;
        }

        let fft = self.planner.plan_fft_forward(n);
        let mut buffer: Vec<Complex<f32>> =
            samples.iter().map(|&s| Complex::new(s, 0.0)).collect();
        fft.process(&mut buffer);

        // Real input: bins 0..=n/2 carry the one-sided spectrum
        let half = n / 2 + 1;
        let freq_resolution = self.sample_rate as f64 / n as f64;
        let magnitudes: Vec<f64> = buffer[..half].iter().map(|c| c.norm() as f64).collect();

        let total: f64 = magnitudes.iter().sum();
        if total == 0.0 {
            return 0.0;
        }

        let centroid = magnitudes
            .iter()
            .enumerate()
            .map(|(i, &mag)| i as f64 * freq_resolution * mag)
            .sum::<f64>()
            / total;

        let variance = magnitudes
            .iter()
            .enumerate()
            .map(|(i, &mag)| {
                let delta = i as f64 * freq_resolution - centroid;
                delta * delta * mag
            })
            .sum::<f64>()
            / total;

        variance.sqrt() as f32
    }
}

pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}
