// Integration tests for decoding, measuring and merging audio
//
// These tests drive the real symphonia/hound codec with synthesized WAV data.

mod common;

use std::sync::Arc;

use anyhow::Result;
use common::{wav_bytes, TEST_SAMPLE_RATE};
use voice_stitch::audio::{
    AudioCodec, DurationAccountant, FormatHint, FragmentMerger, SymphoniaCodec,
};
use voice_stitch::SessionError;

/// Mono clip at the test rate
fn tone(duration_ms: u64, value: i16) -> Vec<u8> {
    wav_bytes(duration_ms, TEST_SAMPLE_RATE, 1, value)
}

fn codec() -> Arc<dyn AudioCodec> {
    Arc::new(SymphoniaCodec::new())
}

#[test]
fn test_decode_reports_layout_and_duration() -> Result<()> {
    let bytes = wav_bytes(3000, 8000, 2, 500);
    let decoded = SymphoniaCodec::new().decode(&bytes, &FormatHint::wav())?;

    assert_eq!(decoded.pcm.sample_rate, 8000);
    assert_eq!(decoded.pcm.channels, 2);
    assert_eq!(decoded.pcm.frames(), 24000);
    assert_eq!(decoded.duration_seconds, 3);
    assert!(decoded.pcm.samples.iter().all(|&s| s == 500));

    Ok(())
}

#[test]
fn test_decode_probes_without_hint() -> Result<()> {
    let bytes = wav_bytes(2000, TEST_SAMPLE_RATE, 1, 0);
    let decoded = SymphoniaCodec::new().decode(&bytes, &FormatHint::infer())?;

    assert_eq!(decoded.duration_seconds, 2);
    Ok(())
}

#[test]
fn test_decode_garbage_fails() {
    let result = SymphoniaCodec::new().decode(b"definitely not audio", &FormatHint::voice());
    assert!(result.is_err(), "Garbage bytes should not decode");
}

#[test]
fn test_measure_rounds_half_to_even() -> Result<()> {
    let accountant = DurationAccountant::new(codec());

    assert_eq!(accountant.measure(&tone(2500, 0), &FormatHint::wav())?, 2);
    assert_eq!(accountant.measure(&tone(3500, 0), &FormatHint::wav())?, 4);
    assert_eq!(accountant.measure(&tone(2600, 0), &FormatHint::wav())?, 3);
    assert_eq!(accountant.measure(&tone(400, 0), &FormatHint::wav())?, 0);

    Ok(())
}

#[test]
fn test_measure_garbage_is_decode_error() {
    let accountant = DurationAccountant::new(codec());
    let err = accountant
        .measure(b"RIFF....not really", &FormatHint::wav())
        .unwrap_err();

    assert!(matches!(err, SessionError::Decode(_)));
}

#[test]
fn test_merge_without_existing_reencodes_fragment() -> Result<()> {
    let codec = codec();
    let accountant = DurationAccountant::new(Arc::clone(&codec));
    let merger = FragmentMerger::new(Arc::clone(&codec));

    let fragment = accountant.inspect(&tone(4000, 42), &FormatHint::wav())?;
    let merged = merger.merge(None, &fragment.audio)?;

    let decoded = codec.decode(&merged, &FormatHint::wav())?;
    assert_eq!(decoded.duration_seconds, 4);
    assert_eq!(decoded.pcm.samples, fragment.audio.samples);

    Ok(())
}

#[test]
fn test_merge_appends_in_arrival_order() -> Result<()> {
    let codec = codec();
    let accountant = DurationAccountant::new(Arc::clone(&codec));
    let merger = FragmentMerger::new(Arc::clone(&codec));

    let first = accountant.inspect(&tone(1000, 1000), &FormatHint::wav())?;
    let second = accountant.inspect(&tone(2000, -1000), &FormatHint::wav())?;

    let combined = merger.merge(None, &first.audio)?;
    let combined = merger.merge(Some(&combined), &second.audio)?;

    let decoded = codec.decode(&combined, &FormatHint::wav())?;
    let split = TEST_SAMPLE_RATE as usize;

    assert_eq!(decoded.duration_seconds, 3);
    assert!(decoded.pcm.samples[..split].iter().all(|&s| s == 1000));
    assert!(decoded.pcm.samples[split..].iter().all(|&s| s == -1000));

    Ok(())
}

#[test]
fn test_merge_mismatched_layouts() -> Result<()> {
    let codec = codec();
    let accountant = DurationAccountant::new(Arc::clone(&codec));
    let merger = FragmentMerger::new(Arc::clone(&codec));

    let mono = accountant.inspect(&wav_bytes(2000, 4000, 1, 100), &FormatHint::wav())?;
    let stereo = accountant.inspect(&wav_bytes(3000, 8000, 2, 200), &FormatHint::wav())?;

    let combined = merger.merge(None, &mono.audio)?;
    let combined = merger.merge(Some(&combined), &stereo.audio)?;

    let decoded = codec.decode(&combined, &FormatHint::wav())?;
    assert_eq!(decoded.pcm.sample_rate, 8000);
    assert_eq!(decoded.pcm.channels, 2);
    assert_eq!(decoded.duration_seconds, 5);

    Ok(())
}

#[test]
fn test_merge_unreadable_existing_is_merge_error() -> Result<()> {
    let codec = codec();
    let accountant = DurationAccountant::new(Arc::clone(&codec));
    let merger = FragmentMerger::new(codec);

    let fragment = accountant.inspect(&tone(1000, 0), &FormatHint::wav())?;
    let err = merger.merge(Some(b"corrupt"), &fragment.audio).unwrap_err();

    assert!(matches!(err, SessionError::Merge(_)));
    Ok(())
}
