//! Audio handling for fragment ingestion
//!
//! - `codec`: the decode/encode boundary (symphonia in, hound WAV out)
//! - `duration`: the Duration Accountant
//! - `merger`: the Fragment Merger
//! - `pcm`: interleaved 16-bit PCM buffers and layout conversion

pub mod codec;
pub mod duration;
pub mod merger;
pub mod pcm;

pub use codec::{AudioCodec, DecodeError, DecodedAudio, EncodeError, FormatHint, SymphoniaCodec};
pub use duration::{DurationAccountant, MeasuredFragment};
pub use merger::FragmentMerger;
pub use pcm::PcmAudio;
