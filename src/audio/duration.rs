use std::sync::Arc;

use tracing::debug;

use super::codec::{AudioCodec, FormatHint};
use super::pcm::PcmAudio;
use crate::error::SessionError;

/// A decoded fragment, alive for the duration of one ingestion event
#[derive(Debug, Clone)]
pub struct MeasuredFragment {
    /// Playback length in whole seconds
    pub seconds: u32,
    pub audio: PcmAudio,
}

/// The only oracle for "how long is this clip"
pub struct DurationAccountant {
    codec: Arc<dyn AudioCodec>,
}

impl DurationAccountant {
    pub fn new(codec: Arc<dyn AudioCodec>) -> Self {
        Self { codec }
    }

    /// Duration of the clip in whole seconds
    pub fn measure(&self, bytes: &[u8], hint: &FormatHint) -> Result<u32, SessionError> {
        Ok(self.inspect(bytes, hint)?.seconds)
    }

    /// Decode the clip and keep the PCM around for merging
    pub fn inspect(
        &self,
        bytes: &[u8],
        hint: &FormatHint,
    ) -> Result<MeasuredFragment, SessionError> {
        let decoded = self.codec.decode(bytes, hint)?;

        debug!(
            "Measured fragment via {}: {}s (hint: {:?})",
            self.codec.name(),
            decoded.duration_seconds,
            hint.as_extension()
        );

        Ok(MeasuredFragment {
            seconds: decoded.duration_seconds,
            audio: decoded.pcm,
        })
    }
}
