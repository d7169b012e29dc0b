// Shared helpers for integration tests
//
// Audio fixtures are synthesized with hound so no binary files are needed.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use voice_stitch::{
    build_dispatcher, AudioCodec, EventKind, FragmentPayload, FormatHint, InboundEvent, Replies,
    SessionConfig, SessionDispatcher, SymphoniaCodec, UserId,
};

/// Low rate keeps a full minute of audio small
pub const TEST_SAMPLE_RATE: u32 = 4000;

/// Constant-value 16-bit WAV of the given length
pub fn wav_bytes(duration_ms: u64, sample_rate: u32, channels: u16, value: i16) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let frames = duration_ms * sample_rate as u64 / 1000;
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..frames * channels as u64 {
            writer.write_sample(value).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Mono clip of whole seconds at the test rate
pub fn clip(seconds: u64) -> Vec<u8> {
    wav_bytes(seconds * 1000, TEST_SAMPLE_RATE, 1, 1000)
}

pub fn user(id: &str) -> UserId {
    UserId::parse(id).unwrap()
}

pub fn fragment(user_id: &UserId, name: &str, bytes: Vec<u8>) -> InboundEvent {
    InboundEvent::new(
        user_id.clone(),
        EventKind::AudioFragment(FragmentPayload::new(name, bytes, FormatHint::wav())),
    )
}

pub fn event(user_id: &UserId, kind: EventKind) -> InboundEvent {
    InboundEvent::new(user_id.clone(), kind)
}

pub fn config(dir: &TempDir) -> SessionConfig {
    SessionConfig::new(dir.path().join("audio_files"))
}

pub fn dispatcher(dir: &TempDir) -> Arc<SessionDispatcher> {
    dispatcher_with(config(dir))
}

pub fn dispatcher_with(config: SessionConfig) -> Arc<SessionDispatcher> {
    build_dispatcher(
        &config,
        Arc::new(SymphoniaCodec::new()),
        Arc::new(Replies::default()),
    )
    .unwrap()
}

pub fn idle_config(dir: &TempDir, idle: Duration) -> SessionConfig {
    let mut config = config(dir);
    config.idle_timeout = idle;
    config
}

/// Decoded length of a combined artifact in whole seconds
pub fn artifact_seconds(bytes: &[u8]) -> u32 {
    SymphoniaCodec::new()
        .decode(bytes, &FormatHint::wav())
        .unwrap()
        .duration_seconds
}
