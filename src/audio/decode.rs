use crossbeam_channel::Receiver;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

use super::AudioTrack;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No audio tracks found")]
    NoTrack,

    #[error("Unknown sample rate")]
    UnknownSampleRate,

    #[error("Failed to decode audio: {0}")]
    Symphonia(#[from] SymphoniaError),

    #[error("Failed to start decoder thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Container formats accepted by the decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
    M4a,
    Ogg,
}

impl AudioFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, DecodeError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| DecodeError::UnsupportedFormat(path.display().to_string()))?;
        ext.parse()
    }

    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
            AudioFormat::Ogg => "ogg",
        }
    }
}

impl FromStr for AudioFormat {
    type Err = DecodeError;

    /// Accepts bare names (`wav`), extensions (`.wav`) and MIME types
    /// (`audio/wav`).
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let normalized = tag.trim().to_ascii_lowercase();
        let name = normalized
            .strip_prefix("audio/")
            .or_else(|| normalized.strip_prefix('.'))
            .unwrap_or(&normalized);

        match name {
            "wav" => Ok(AudioFormat::Wav),
            "mp3" | "mpeg" => Ok(AudioFormat::Mp3),
            "m4a" => Ok(AudioFormat::M4a),
            "ogg" => Ok(AudioFormat::Ogg),
            _ => Err(DecodeError::UnsupportedFormat(tag.to_string())),
        }
    }
}

/// Decode an in-memory file, keeping only the first channel.
pub fn decode_bytes(bytes: Vec<u8>, format: AudioFormat) -> Result<AudioTrack, DecodeError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(format.extension());

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let mut reader = probed.format;

    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoTrack)?;

    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count()).max(1);
    let sample_rate = track.codec_params.sample_rate.ok_or(DecodeError::UnknownSampleRate)?;

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(msg)) => {
                log::debug!("Skipping undecodable packet: {}", msg);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        let mut sample_buf = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        // Channel 0 only
        let stride = spec.channels.count().max(1);
        samples.extend(sample_buf.samples().iter().step_by(stride).copied());
    }

    let track = AudioTrack::new(samples, sample_rate);

    log::info!(
        "Decoded {:?}: {} samples, {}Hz, {:.1}s ({} channel(s), using channel 0)",
        format,
        track.samples.len(),
        sample_rate,
        track.duration,
        channels
    );

    Ok(track)
}

pub fn decode_file(path: &Path, format: AudioFormat) -> Result<AudioTrack, DecodeError> {
    let bytes = std::fs::read(path).map_err(|source| DecodeError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    decode_bytes(bytes, format)
}

/// Read and decode `path` on a worker thread. The returned receiver yields
/// exactly one result, read failures included.
///
/// Taking an [`AudioFormat`] means an unsupported tag has already failed at
/// parse time, before the file is opened or work is started.
pub fn spawn_decode(
    path: PathBuf,
    format: AudioFormat,
) -> Result<Receiver<Result<AudioTrack, DecodeError>>, DecodeError> {
    let (tx, rx) = crossbeam_channel::bounded(1);

    std::thread::Builder::new()
        .name("decode".into())
        .spawn(move || {
            let result = decode_file(&path, format);
            if tx.send(result).is_err() {
                log::debug!("Decode result dropped: receiver went away");
            }
        })?;

    Ok(rx)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::time::Duration;

    /// 16-bit PCM WAV with interleaved `frames`
    pub(crate) fn wav_bytes(frames: &[i16], channels: u16, sample_rate: u32) -> Vec<u8> {
        let data_len = (frames.len() * 2) as u32;
        let mut out = Vec::with_capacity(44 + data_len as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * channels as u32 * 2).to_le_bytes());
        out.extend_from_slice(&(channels * 2).to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for s in frames {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    #[test]
    fn parses_known_tags() {
        assert_eq!("wav".parse::<AudioFormat>().unwrap(), AudioFormat::Wav);
        assert_eq!("audio/wav".parse::<AudioFormat>().unwrap(), AudioFormat::Wav);
        assert_eq!("audio/mp3".parse::<AudioFormat>().unwrap(), AudioFormat::Mp3);
        assert_eq!("audio/mpeg".parse::<AudioFormat>().unwrap(), AudioFormat::Mp3);
        assert_eq!("M4A".parse::<AudioFormat>().unwrap(), AudioFormat::M4a);
        assert_eq!(".ogg".parse::<AudioFormat>().unwrap(), AudioFormat::Ogg);
        assert_eq!(
            AudioFormat::from_path(Path::new("song.mp3")).unwrap(),
            AudioFormat::Mp3
        );
    }

    #[test]
    fn rejects_unknown_tags() {
        for tag in ["audio/flac", "flac", "", "video/mp4"] {
            let err = tag.parse::<AudioFormat>().unwrap_err();
            assert!(matches!(err, DecodeError::UnsupportedFormat(_)));
        }
        assert!(AudioFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn unsupported_tag_message() {
        let err = "audio/flac".parse::<AudioFormat>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file type: audio/flac");
    }

    #[test]
    fn decodes_mono_wav() {
        let frames: Vec<i16> = vec![16384; 800];
        let track = decode_bytes(wav_bytes(&frames, 1, 8000), AudioFormat::Wav).unwrap();
        assert_eq!(track.samples.len(), 800);
        assert_eq!(track.sample_rate, 8000);
        assert!((track.duration - 0.1).abs() < 1e-12);
        assert!(track.samples.iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn keeps_first_channel_of_stereo() {
        let frames: Vec<i16> = (0..400).flat_map(|_| [16384i16, -16384]).collect();
        let track = decode_bytes(wav_bytes(&frames, 2, 4000), AudioFormat::Wav).unwrap();
        assert_eq!(track.samples.len(), 400);
        assert!(track.samples.iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let result = decode_bytes(vec![0u8; 64], AudioFormat::Wav);
        assert!(result.is_err());
    }

    #[test]
    fn spawned_decode_publishes_once() {
        let path = std::env::temp_dir().join(format!("sonoscope-spawn-{}.wav", std::process::id()));
        std::fs::write(&path, wav_bytes(&[0i16; 441], 1, 44100)).unwrap();

        let rx = spawn_decode(path.clone(), AudioFormat::Wav).unwrap();
        let track = rx.recv_timeout(Duration::from_secs(10)).unwrap().unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(track.samples.len(), 441);
        // the worker drops its sender after the single send
        assert!(rx.recv_timeout(Duration::from_secs(10)).is_err());
    }

    #[test]
    fn missing_file_is_reported_by_the_worker() {
        let path = PathBuf::from("/nonexistent/sonoscope/missing.wav");
        let rx = spawn_decode(path.clone(), AudioFormat::Wav).unwrap();
        let err = rx.recv_timeout(Duration::from_secs(10)).unwrap().unwrap_err();
        assert!(matches!(&err, DecodeError::Read { path: p, .. } if *p == path));
        assert!(err.to_string().starts_with("Failed to read /nonexistent/sonoscope/missing.wav"));
    }
}
