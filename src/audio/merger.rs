use std::sync::Arc;

use tracing::debug;

use super::codec::{AudioCodec, FormatHint};
use super::pcm::PcmAudio;
use crate::error::SessionError;

/// Appends one fragment to the combined recording, in arrival order
///
/// No trimming, overlap or fades. When the two sides disagree on layout, both are
/// brought to the higher sample rate and the higher channel count first.
pub struct FragmentMerger {
    codec: Arc<dyn AudioCodec>,
}

impl FragmentMerger {
    pub fn new(codec: Arc<dyn AudioCodec>) -> Self {
        Self { codec }
    }

    /// Produce the new combined artifact in the canonical container.
    ///
    /// `existing` is the current combined artifact, if any.
    pub fn merge(
        &self,
        existing: Option<&[u8]>,
        fragment: &PcmAudio,
    ) -> Result<Vec<u8>, SessionError> {
        let combined = match existing {
            None => fragment.clone(),
            Some(bytes) => {
                let previous = self
                    .codec
                    .decode(bytes, &FormatHint::wav())
                    .map_err(|e| {
                        SessionError::Merge(format!("Existing recording unreadable: {}", e))
                    })?
                    .pcm;

                Self::concatenate(previous, fragment.clone())
            }
        };

        debug!(
            "Merged recording: {}ms, {}Hz, {} channels",
            combined.duration_ms(),
            combined.sample_rate,
            combined.channels
        );

        self.codec
            .encode(&combined)
            .map_err(|e| SessionError::Merge(format!("Failed to encode recording: {}", e)))
    }

    fn concatenate(first: PcmAudio, second: PcmAudio) -> PcmAudio {
        let sample_rate = first.sample_rate.max(second.sample_rate);
        let channels = first.channels.max(second.channels);

        let mut combined = first.converted(sample_rate, channels);
        combined.append(second.converted(sample_rate, channels));
        combined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concatenate_aligns_layout() {
        let first = PcmAudio::new(vec![10, 20], 1000, 1);
        let second = PcmAudio::new(vec![30, 40, 50, 60], 1000, 2);

        let combined = FragmentMerger::concatenate(first, second);

        assert_eq!(combined.channels, 2);
        assert_eq!(combined.sample_rate, 1000);
        assert_eq!(combined.samples, vec![10, 10, 20, 20, 30, 40, 50, 60]);
    }
}
