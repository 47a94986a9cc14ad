//! Render-thread capture checks, observed through the written log.

use crate::helpers::*;
use dropwatch::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// 64-sample left block with sample 10 at 40.0 is one ClickLeft carrying 40.0.
#[test]
fn test_single_click_scenario() {
    let fixture = started_logger();
    let capture = fixture.capture();
    let sampler = fixture.components.register("Sampler1");
    let block = block_with_sample(64, 10, 40.0);

    let clean = capture.check_sample_data(Some(sampler), Location::SampleRendering, true, &block, None);
    assert!(!clean);

    let summary = fixture.logger.flush().unwrap();
    assert_eq!(summary.drained, 1);
    assert_eq!(summary.errors, 1);

    let text = fixture.entries_text();
    assert_eq!(fixture.headings(), vec!["ClickLeft"]);
    assert!(text.contains("- Location: `Sampler1::SampleRendering`"));
    assert!(text.contains("- AdditionalInfo: **40.000**"));
}

#[test]
fn test_burst_and_clean_blocks() {
    let fixture = started_logger();
    let capture = fixture.capture();

    let mut burst = vec![0.0f32; 64];
    burst[0] = -33.0;
    burst[1] = 90.0;
    let clean = vec![32.0f32; 64];

    assert!(!capture.check_sample_data(None, Location::MasterEffectRendering, false, &burst, None));
    assert!(capture.check_sample_data(None, Location::MasterEffectRendering, false, &clean, None));

    fixture.logger.flush().unwrap();
    assert_eq!(fixture.headings(), vec!["BurstRight"]);
    assert!(fixture.entries_text().contains("- AdditionalInfo: **90.000**"));
}

#[test]
fn test_first_callback_reports_settings() {
    let fixture = started_logger();
    let capture = fixture.capture();

    capture.check_audio_callback_properties(TEST_SAMPLE_RATE, TEST_BLOCK_SIZE);
    capture.check_audio_callback_properties(TEST_SAMPLE_RATE, TEST_BLOCK_SIZE);
    capture.check_audio_callback_properties(TEST_SAMPLE_RATE, 256);

    let summary = fixture.logger.flush().unwrap();
    assert_eq!(summary.errors, 0);
    assert_eq!(
        fixture.headings(),
        vec!["SampleRateChange", "BufferSizeChange", "BufferSizeChange"]
    );

    let text = fixture.entries_text();
    assert!(text.contains("- Old: **-1**"));
    assert!(text.contains("- New: **48000**"));
    assert!(text.contains("- Old: **512**"));
    assert!(text.contains("- New: **256**"));
    assert!(!fixture.logger.is_currently_failing());
}

/// A held callback lock is reported without waiting for it.
#[test]
fn test_priority_inversion_returns_immediately() {
    let fixture = started_logger();
    let capture = fixture.capture();
    let callback_lock = parking_lot::Mutex::new(());

    capture.publish_call_context("load_sample_map()");
    let _held = callback_lock.lock();

    let started = Instant::now();
    capture.check_priority_inversion(&callback_lock);
    assert!(started.elapsed() < Duration::from_millis(100));

    let summary = fixture.logger.flush().unwrap();
    assert_eq!(summary.errors, 1);
    assert_eq!(fixture.headings(), vec!["PriorityInversion"]);

    let text = fixture.entries_text();
    assert!(text.contains("- Location: `MainRenderCallback`"));
    assert!(text.contains("#### Stack back trace"));
    assert!(text.contains("load_sample_map()"));
}

#[test]
fn test_spin_flag_probe_with_attribution() {
    let fixture = started_logger();
    let capture = fixture.capture();
    let loader = fixture.components.register("StreamingSampler");
    let busy = AtomicBool::new(true);
    let id = Identifier::from("Piano");

    capture.check_priority_inversion_at(&busy, Location::SampleLoaderReadOperation, Some(loader), Some(&id));
    assert!(busy.load(Ordering::SeqCst));

    fixture.logger.flush().unwrap();
    let text = fixture.entries_text();
    assert!(text.contains("- Location: `StreamingSampler::Piano::SampleLoaderReadOperation`"));
    assert!(!text.contains("Stack back trace"));
}

#[test]
fn test_events_skip_aftertouch() {
    let fixture = started_logger();
    let capture = fixture.capture();

    capture.log_events(&[
        HostEvent::note_on(1, 0, 0, 60, 100),
        HostEvent::aftertouch(2, 10, 0, 80),
        HostEvent::control_change(3, 20, 1, 74, 64),
        HostEvent::poly_aftertouch(4, 30, 0, 60, 90),
        HostEvent::note_off(5, 40, 0, 60),
    ]);

    fixture.logger.flush().unwrap();
    assert_eq!(fixture.headings(), vec!["Event", "Event", "Event"]);

    let text = fixture.entries_text();
    assert!(text.contains("**NoteOn** ID: `1` TS: `0` V1: `C3`, V2: `100`, Ch: `1`"));
    assert!(text.contains("**Controller** ID: `3` TS: `20` V1: `74`, V2: `64`, Ch: `2`"));
    assert!(text.contains("**NoteOff** ID: `5`"));
    assert!(!text.contains("Aftertouch"));
}

#[test]
fn test_performance_warning_uses_current_voice_count() {
    let fixture = started_logger();
    fixture.voices.store(37, Ordering::SeqCst);

    fixture.capture().log_performance_warning(&PerformanceSample {
        owner: None,
        location: Location::MainRenderCallback,
        limit: 0.8,
        average_percentage: 62.5,
        peak_percentage: 104.2,
    });
    fixture.voices.store(0, Ordering::SeqCst);

    let summary = fixture.logger.flush().unwrap();
    assert_eq!(summary.errors, 1);

    let text = fixture.entries_text();
    assert!(text.contains("- Voice Amount: **37**"));
    assert!(text.contains("- Limit: `80.0%` Avg: `62.50%`, Peak: `104.2%`"));
    assert!(fixture.logger.is_currently_failing());
}

#[test]
fn test_assertion_and_streaming_failure() {
    let fixture = started_logger();
    let capture = fixture.capture();

    capture.check_assertion(None, Location::NoteOnCallback, true, 1.0);
    capture.check_assertion(None, Location::NoteOnCallback, false, 3.0);
    capture.log_streaming_failure(1.25);

    fixture.logger.flush().unwrap();
    assert_eq!(fixture.headings(), vec!["Assertion", "StreamingFailure"]);
    let text = fixture.entries_text();
    assert!(text.contains("- Location: `SampleRendering`"));
    assert!(text.contains("- AdditionalInfo: **1.250**"));
}

#[test]
fn test_vanished_component_prints_unknown() {
    let fixture = started_logger();
    let fx = fixture.components.register("Reverb");

    fixture
        .capture()
        .check_assertion(Some(fx), Location::MasterEffectRendering, false, 0.0);
    fixture.components.unregister(fx);

    fixture.logger.flush().unwrap();
    assert!(fixture
        .entries_text()
        .contains("- Location: `unknown::MasterEffectRendering`"));
}
