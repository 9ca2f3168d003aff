//! Decoders for the supported container formats

use super::{resample_to_target, AudioFormat};
use anyhow::{Context, Result};
use std::path::Path;

/// Decoded audio data
#[derive(Debug, Clone)]
pub struct AudioData {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
    pub duration_ms: u32,
}

impl AudioData {
    /// Convert to mono by averaging channels
    pub fn to_mono(&self) -> Vec<f32> {
        if self.channels <= 1 {
            return self.samples.clone();
        }

        let mut mono = Vec::with_capacity(self.samples.len() / self.channels as usize);
        for chunk in self.samples.chunks(self.channels as usize) {
            let avg: f32 = chunk.iter().sum::<f32>() / chunk.len() as f32;
            mono.push(avg);
        }
        mono
    }
}

/// Decode an audio file to mono PCM at the target sample rate.
pub fn decode_audio(path: &str, target_sample_rate: u32) -> Result<AudioData> {
    let path = Path::new(path);

    if !path.exists() {
        anyhow::bail!("audio file not found: {}", path.display());
    }

    let decoded = match AudioFormat::from_path(path) {
        AudioFormat::Wav => decode_wav(path)?,
        AudioFormat::Mp3 => decode_mp3(path)?,
        AudioFormat::Flac => decode_flac(path)?,
        AudioFormat::Ogg => decode_ogg(path)?,
        AudioFormat::Unknown => {
            anyhow::bail!("unsupported audio format: {}", path.display());
        }
    };

    normalize(decoded, target_sample_rate)
}

/// Downmix to one channel and resample to the engine rate.
fn normalize(audio: AudioData, target_sample_rate: u32) -> Result<AudioData> {
    let duration_ms = audio.duration_ms;
    let mono = audio.to_mono();

    let samples = if audio.sample_rate != target_sample_rate {
        resample_to_target(&mono, audio.sample_rate, target_sample_rate)?
    } else {
        mono
    };

    Ok(AudioData {
        samples,
        sample_rate: target_sample_rate,
        channels: 1,
        duration_ms,
    })
}

fn frame_duration_ms(total_samples: usize, sample_rate: u32, channels: u16) -> u32 {
    if sample_rate == 0 || channels == 0 {
        return 0;
    }
    (total_samples as f64 / (sample_rate as u64 * channels as u64) as f64 * 1000.0) as u32
}

/// Decode WAV file
fn decode_wav(path: &Path) -> Result<AudioData> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("failed to open WAV file: {}", path.display()))?;

    let spec = reader.spec();
    let sample_rate = spec.sample_rate;
    let channels = spec.channels;

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => {
            reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?
        }
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    let duration_ms = frame_duration_ms(samples.len(), sample_rate, channels);

    Ok(AudioData {
        samples,
        sample_rate,
        channels,
        duration_ms,
    })
}

/// Decode MP3 file
fn decode_mp3(path: &Path) -> Result<AudioData> {
    let data = std::fs::read(path)
        .with_context(|| format!("failed to read MP3 file: {}", path.display()))?;

    let mut decoder = minimp3::Decoder::new(&data[..]);
    let mut samples = Vec::new();
    let mut sample_rate = 0u32;
    let mut channels = 0u16;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if sample_rate == 0 {
                    sample_rate = frame.sample_rate as u32;
                    channels = frame.channels as u16;
                }
                for &sample in &frame.data {
                    samples.push(sample as f32 / 32768.0);
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => anyhow::bail!("MP3 decode error: {}", e),
        }
    }

    if sample_rate == 0 {
        anyhow::bail!("MP3 file contained no decodable frames: {}", path.display());
    }

    let duration_ms = frame_duration_ms(samples.len(), sample_rate, channels);

    Ok(AudioData {
        samples,
        sample_rate,
        channels,
        duration_ms,
    })
}

/// Decode FLAC file
fn decode_flac(path: &Path) -> Result<AudioData> {
    let mut reader = claxon::FlacReader::open(path)
        .with_context(|| format!("failed to open FLAC file: {}", path.display()))?;

    let info = reader.streaminfo();
    let sample_rate = info.sample_rate;
    let channels = info.channels as u16;
    let bits_per_sample = info.bits_per_sample;

    let max_val = (1i64 << (bits_per_sample - 1)) as f32;
    let samples: Vec<f32> = reader
        .samples()
        .map(|s| s.map(|v| v as f32 / max_val))
        .collect::<Result<Vec<_>, _>>()?;

    let duration_ms = frame_duration_ms(samples.len(), sample_rate, channels);

    Ok(AudioData {
        samples,
        sample_rate,
        channels,
        duration_ms,
    })
}

/// Decode OGG Vorbis file
fn decode_ogg(path: &Path) -> Result<AudioData> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open OGG file: {}", path.display()))?;

    let mut reader = lewton::inside_ogg::OggStreamReader::new(file)?;

    let sample_rate = reader.ident_hdr.audio_sample_rate;
    let channels = reader.ident_hdr.audio_channels as u16;

    let mut samples = Vec::new();

    while let Some(packet) = reader.read_dec_packet_itl()? {
        for &sample in &packet {
            samples.push(sample as f32 / 32768.0);
        }
    }

    let duration_ms = frame_duration_ms(samples.len(), sample_rate, channels);

    Ok(AudioData {
        samples,
        sample_rate,
        channels,
        duration_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_downmix_averages_channels() {
        let audio = AudioData {
            samples: vec![1.0, 0.0, 0.5, 0.5, -1.0, 1.0],
            sample_rate: 8000,
            channels: 2,
            duration_ms: 0,
        };
        assert_eq!(audio.to_mono(), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn mono_downmix_is_identity() {
        let audio = AudioData {
            samples: vec![0.1, 0.2, 0.3],
            sample_rate: 8000,
            channels: 1,
            duration_ms: 0,
        };
        assert_eq!(audio.to_mono(), audio.samples);
    }

    #[test]
    fn duration_accounts_for_channel_interleaving() {
        // 16000 interleaved stereo samples at 8kHz = 1 second
        assert_eq!(frame_duration_ms(16000, 8000, 2), 1000);
        assert_eq!(frame_duration_ms(8000, 8000, 1), 1000);
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let result = decode_audio("/nonexistent/clip.wav", 11025);
        assert!(result.is_err());
    }
}
