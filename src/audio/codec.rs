use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;
use tracing::{debug, warn};

use super::pcm::PcmAudio;

/// Container format used when neither the sender nor the file name says otherwise
pub const DEFAULT_FRAGMENT_EXTENSION: &str = "ogg";

/// Extension of the canonical output container
pub const CANONICAL_EXTENSION: &str = "wav";

#[derive(Debug, Error)]
#[error("{0}")]
pub struct DecodeError(String);

impl DecodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct EncodeError(String);

impl EncodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Which container the raw bytes are expected to be in.
///
/// An empty hint lets the decoder probe the content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatHint {
    extension: Option<String>,
}

impl FormatHint {
    /// No hint; the decoder sniffs the container
    pub fn infer() -> Self {
        Self::default()
    }

    pub fn extension(extension: impl AsRef<str>) -> Self {
        let normalized = extension
            .as_ref()
            .trim()
            .trim_start_matches('.')
            .to_ascii_lowercase();

        Self {
            extension: (!normalized.is_empty()).then_some(normalized),
        }
    }

    /// Voice notes are always delivered in the default container
    pub fn voice() -> Self {
        Self::extension(DEFAULT_FRAGMENT_EXTENSION)
    }

    pub fn wav() -> Self {
        Self::extension(CANONICAL_EXTENSION)
    }

    /// Audio attachments: take the file name's extension, or the default container
    pub fn from_file_name(file_name: Option<&str>) -> Self {
        file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(Self::extension)
            .filter(|hint| hint.extension.is_some())
            .unwrap_or_else(Self::voice)
    }

    pub fn as_extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }
}

/// Result of decoding one blob of audio
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub pcm: PcmAudio,
    /// Playback length rounded to the nearest whole second
    pub duration_seconds: u32,
}

/// Audio codec boundary
///
/// The session core never inspects raw bytes itself; everything goes through here.
/// Implementations are blocking and are driven from `spawn_blocking`.
pub trait AudioCodec: Send + Sync {
    /// Decode raw bytes into interleaved PCM
    fn decode(&self, bytes: &[u8], hint: &FormatHint) -> Result<DecodedAudio, DecodeError>;

    /// Encode PCM into the canonical output container
    fn encode(&self, pcm: &PcmAudio) -> Result<Vec<u8>, EncodeError>;

    /// Get codec name for logging
    fn name(&self) -> &str;
}

/// Decodes anything symphonia understands, encodes 16-bit PCM WAV with hound
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaCodec;

impl SymphoniaCodec {
    pub fn new() -> Self {
        Self
    }
}

impl AudioCodec for SymphoniaCodec {
    fn decode(&self, bytes: &[u8], hint: &FormatHint) -> Result<DecodedAudio, DecodeError> {
        let cursor = Cursor::new(bytes.to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut probe_hint = Hint::new();
        if let Some(extension) = hint.as_extension() {
            probe_hint.with_extension(extension);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &probe_hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| DecodeError::new(format!("Unrecognized audio container: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| DecodeError::new("No audio track found"))?;

        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate;
        let mut channels = track.codec_params.channels.map(|c| c.count() as u16);

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| DecodeError::new(format!("Unsupported codec: {}", e)))?;

        let mut samples: Vec<i16> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => {
                    return Err(DecodeError::new(format!("Packet read error: {}", e)));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Decode error (skipping packet): {}", e);
                    continue;
                }
                Err(e) => {
                    return Err(DecodeError::new(format!("Decoder failed: {}", e)));
                }
            };

            let spec = *decoded.spec();
            if sample_rate.is_none() {
                sample_rate = Some(spec.rate);
            }
            if channels.is_none() {
                channels = Some(spec.channels.count() as u16);
            }

            let mut sample_buf = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(sample_buf.samples());
        }

        let sample_rate = sample_rate.ok_or_else(|| DecodeError::new("Unknown sample rate"))?;
        let channels = channels.ok_or_else(|| DecodeError::new("Unknown channel count"))?;

        let pcm = PcmAudio::new(samples, sample_rate, channels);
        let duration_seconds = pcm.whole_seconds();

        debug!(
            "Decoded {} bytes: {}ms, {}Hz, {} channels",
            bytes.len(),
            pcm.duration_ms(),
            pcm.sample_rate,
            pcm.channels
        );

        Ok(DecodedAudio {
            pcm,
            duration_seconds,
        })
    }

    fn encode(&self, pcm: &PcmAudio) -> Result<Vec<u8>, EncodeError> {
        let spec = hound::WavSpec {
            channels: pcm.channels,
            sample_rate: pcm.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::with_capacity(44 + pcm.samples.len() * 2));
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| EncodeError::new(format!("Failed to start WAV stream: {}", e)))?;

            for &sample in &pcm.samples {
                writer
                    .write_sample(sample)
                    .map_err(|e| EncodeError::new(format!("Failed to write sample: {}", e)))?;
            }

            writer
                .finalize()
                .map_err(|e| EncodeError::new(format!("Failed to finalize WAV: {}", e)))?;
        }

        Ok(cursor.into_inner())
    }

    fn name(&self) -> &str {
        "symphonia+hound"
    }
}
