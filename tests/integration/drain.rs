//! Drain-window ordering, coalescing and the error ceiling.

use crate::helpers::*;
use dropwatch::core::{MessageHeader, QueueSet};
use dropwatch::prelude::*;
use dropwatch::{Message, MessageKind, ParameterValue, ERROR_CEILING};

fn text_entry(sequence: u32, text: &str) -> Message {
    Message::new(
        MessageHeader {
            sequence,
            callback_index: 0,
            timestamp: 0.0,
            owner: None,
            id: None,
            location: Location::Empty,
        },
        MessageKind::StringMessage {
            text: text.to_string(),
        },
    )
}

#[test]
fn test_entries_sorted_by_sequence() {
    let mut set = QueueSet::with_capacity(8);
    set.text.push(text_entry(3, "c"));
    set.text.push(text_entry(1, "a"));
    set.text.push(text_entry(2, "b"));

    let mut merged = Vec::new();
    set.merge_sorted_into(&mut merged);

    let order: Vec<u32> = merged.iter().map(Message::sequence).collect();
    assert_eq!(order, vec![1, 2, 3]);
    assert!(set.is_empty());
}

/// Entries of different kinds land in the file in capture order.
#[test]
fn test_window_preserves_capture_order_across_kinds() {
    let fixture = started_logger();
    let capture = fixture.capture();

    capture.log_message("before");
    capture.check_assertion(None, Location::Empty, false, 0.0);
    capture.log_events(&[HostEvent::note_on(1, 0, 0, 64, 90)]);
    capture.check_audio_callback_properties(TEST_SAMPLE_RATE, TEST_BLOCK_SIZE);
    capture.log_message("after");

    fixture.logger.flush().unwrap();
    assert_eq!(
        fixture.headings(),
        vec![
            "Message",
            "Assertion",
            "Event",
            "SampleRateChange",
            "BufferSizeChange",
            "Message"
        ]
    );
}

#[test]
fn test_parameter_changes_coalesce() {
    let fixture = started_logger();
    let capture = fixture.capture();
    let script = fixture.components.register("Interface");
    let volume = TestControl::front("Volume", script);
    let internal = TestControl::hidden("Internal", script);

    capture.log_parameter_change(&volume, 0.1);
    capture.log_parameter_change(&internal, 5);
    capture.log_parameter_change(&volume, 0.9);

    assert_eq!(capture.pending().len(), 1);
    fixture.logger.flush().unwrap();

    assert_eq!(fixture.headings(), vec!["ParameterChange"]);
    let text = fixture.entries_text();
    assert!(text.contains("- Processor: `Interface`"));
    assert!(text.contains("- ID: `Volume` value: `0.9`"));
    assert!(!text.contains("Internal"));
}

#[test]
fn test_parameter_changes_of_different_controls_are_kept() {
    let fixture = started_logger();
    let capture = fixture.capture();
    let script = fixture.components.register("Interface");
    let volume = TestControl::front("Volume", script);
    let bypass = TestControl::front("Bypass", script);

    capture.log_parameter_change(&volume, 0.5);
    capture.log_parameter_change(&bypass, true);
    capture.log_parameter_change(&volume, 0.7);

    let mut set = QueueSet::with_capacity(8);
    capture.pending().swap_out(&mut set);
    let values: Vec<ParameterValue> = set
        .parameter_changes
        .iter()
        .filter_map(|m| parameter_value(&m.kind).cloned())
        .collect();
    assert_eq!(
        values,
        vec![
            ParameterValue::Number(0.5),
            ParameterValue::Bool(true),
            ParameterValue::Number(0.7)
        ]
    );
}

#[test]
fn test_sequence_restarts_every_window() {
    let fixture = started_logger();
    let capture = fixture.capture();

    capture.log_message("one");
    capture.log_message("two");
    fixture.logger.flush().unwrap();

    capture.log_message("three");
    let mut set = QueueSet::with_capacity(8);
    capture.pending().swap_out(&mut set);
    assert_eq!(set.text[0].sequence(), 0);
}

#[test]
fn test_error_ceiling_makes_capture_inert() {
    let fixture = started_logger();
    let capture = fixture.capture();

    for _ in 0..(ERROR_CEILING / 50) {
        for _ in 0..50 {
            capture.check_assertion(None, Location::NoteOnCallback, false, 0.0);
        }
        fixture.logger.flush().unwrap();
    }

    assert_eq!(capture.error_count(), ERROR_CEILING);
    assert!(!fixture.logger.is_logging());
    assert_eq!(fixture.logger.state(), LoggerState::Logging);

    let before = fixture.log_text();
    capture.check_assertion(None, Location::NoteOnCallback, false, 0.0);
    capture.log_message("dropped");
    assert!(capture.pending().is_empty());

    fixture.logger.flush().unwrap();
    assert_eq!(fixture.log_text(), before);
    assert_eq!(
        fixture.logger.last_error_message(),
        format!("# Errors: {}, Last Error Type: Assertion", ERROR_CEILING)
    );
}

#[test]
fn test_error_detected_once_per_window() {
    let fixture = started_logger();
    let listener = std::sync::Arc::new(RecordingListener::default());
    let dyn_listener: std::sync::Arc<dyn LoggerListener> = listener.clone();
    fixture.logger.add_listener(&dyn_listener);

    for _ in 0..5 {
        fixture
            .capture()
            .check_assertion(None, Location::Empty, false, 0.0);
    }
    fixture.logger.flush().unwrap();
    assert_eq!(listener.counts().2, 1);

    fixture.capture().log_message("quiet");
    fixture.logger.flush().unwrap();
    assert_eq!(listener.counts().2, 1);

    fixture.logger.flush().unwrap();
    assert!(!fixture.logger.is_currently_failing());
}
