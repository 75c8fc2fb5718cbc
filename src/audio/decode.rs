use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::capture::downmix;
use super::{Frame, FrameSource};

pub struct AudioData {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

pub fn decode_audio(path: &Path) -> Result<AudioData> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Failed to probe audio format")?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .context("No audio tracks found")?;

    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count());
    let sample_rate = track.codec_params.sample_rate.context("Unknown sample rate")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create audio decoder")?;

    let mut all_samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        // Corrupt packets are skipped, same as a capture dropout
        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        let mut sample_buf = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        all_samples.extend(downmix(sample_buf.samples(), channels));
    }

    log::info!(
        "Decoded recording: {} samples, {}Hz, {:.1}s",
        all_samples.len(),
        sample_rate,
        all_samples.len() as f32 / sample_rate as f32
    );

    Ok(AudioData {
        samples: all_samples,
        sample_rate,
    })
}

/// Replays a decoded recording as fixed-size frames.
///
/// Timestamps come from the sample position rather than the wall clock, so a
/// recording replays as fast as it can be analyzed and still yields the same
/// transitions it would live. A trailing partial frame is discarded.
pub struct ReplaySource {
    audio: AudioData,
    chunk_size: usize,
    position: usize,
}

impl ReplaySource {
    pub fn new(audio: AudioData, chunk_size: usize) -> Self {
        Self {
            audio,
            chunk_size: chunk_size.max(1),
            position: 0,
        }
    }

    pub fn open(path: &Path, chunk_size: usize) -> Result<Self> {
        Ok(Self::new(decode_audio(path)?, chunk_size))
    }
}

impl FrameSource for ReplaySource {
    fn sample_rate(&self) -> u32 {
        self.audio.sample_rate
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let end = self.position + self.chunk_size;
        if end > self.audio.samples.len() {
            return Ok(None);
        }
        let samples = self.audio.samples[self.position..end].to_vec();
        self.position = end;
        Ok(Some(Frame {
            samples,
            timestamp: end as f64 / self.audio.sample_rate as f64,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn replay_cuts_fixed_frames_on_a_sample_clock() {
        let audio = AudioData {
            samples: vec![0.0; 2500],
            sample_rate: 1000,
        };
        let mut source = ReplaySource::new(audio, 1000);

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.samples.len(), 1000);
        assert_relative_eq!(first.timestamp, 1.0);

        let second = source.next_frame().unwrap().unwrap();
        assert_relative_eq!(second.timestamp, 2.0);

        // 500 leftover samples do not form a frame
        assert!(source.next_frame().unwrap().is_none());
    }

    /// 16-bit PCM WAV with interleaved `frames` of per-channel samples.
    fn write_wav(path: &Path, sample_rate: u32, channels: u16, frames: &[&[i16]]) {
        let data_len = (frames.len() * channels as usize * 2) as u32;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&channels.to_le_bytes());
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&(sample_rate * channels as u32 * 2).to_le_bytes());
        bytes.extend_from_slice(&(channels * 2).to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        for frame in frames {
            for sample in frame.iter() {
                bytes.extend_from_slice(&sample.to_le_bytes());
            }
        }
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn replays_a_stereo_wav_as_mono_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("side.wav");
        let frame: &[i16] = &[16384, 8192];
        write_wav(&path, 8000, 2, &vec![frame; 8000]);

        let mut source = ReplaySource::open(&path, 800).unwrap();
        assert_eq!(source.sample_rate(), 8000);

        let mut count = 0;
        let mut last_timestamp = 0.0;
        while let Some(frame) = source.next_frame().unwrap() {
            assert_eq!(frame.samples.len(), 800);
            // Left 0.5 and right 0.25 average to 0.375
            for &s in &frame.samples {
                assert_relative_eq!(s, 0.375, epsilon = 1e-4);
            }
            last_timestamp = frame.timestamp;
            count += 1;
        }
        assert_eq!(count, 10);
        assert_relative_eq!(last_timestamp, 1.0);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = decode_audio(Path::new("/nonexistent/recording.wav"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("Failed to open audio file"));
    }
}
