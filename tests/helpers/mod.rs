//! Test helpers and fixtures for dropwatch integration tests
//!
//! Drains are driven with `DebugLogger::flush()`; the periodic interval is
//! set far in the future so a test never races the timer.

#![allow(dead_code)]

use dropwatch::prelude::*;
use dropwatch::{MessageKind, ParameterValue};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Default test sample rate (matches common hardware)
pub const TEST_SAMPLE_RATE: f64 = 48000.0;

/// Standard block size for deterministic testing
pub const TEST_BLOCK_SIZE: usize = 512;

/// Install a fmt subscriber that writes through the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Logger writing into its own temporary folder.
///
/// Field order matters: the logger stops its worker before the folder is
/// removed.
pub struct TestLogger {
    pub logger: DebugLogger,
    pub voices: Arc<AtomicUsize>,
    pub components: Arc<ComponentRegistry>,
    pub dir: TempDir,
}

impl TestLogger {
    pub fn capture(&self) -> &Arc<Capture> {
        self.logger.capture()
    }

    pub fn folder(&self) -> PathBuf {
        self.dir.path().join("Logs")
    }

    /// Contents of the running session's file.
    pub fn log_text(&self) -> String {
        let path = self
            .logger
            .current_log_file()
            .expect("no running session");
        std::fs::read_to_string(path).expect("log file readable")
    }

    /// Text after the environment block.
    pub fn entries_text(&self) -> String {
        let text = self.log_text();
        match text.find("Process bit architecture") {
            Some(pos) => text[pos..]
                .split_once("\n\n")
                .map(|(_, rest)| rest.to_string())
                .unwrap_or_default(),
            None => text,
        }
    }

    /// Headings of all entries written so far, in file order.
    pub fn headings(&self) -> Vec<String> {
        self.entries_text()
            .lines()
            .filter_map(|line| line.strip_prefix("### "))
            .map(str::to_string)
            .collect()
    }
}

pub fn test_logger() -> TestLogger {
    init_tracing();

    let dir = tempfile::tempdir().expect("tempdir");
    let voices = Arc::new(AtomicUsize::new(0));
    let components = Arc::new(ComponentRegistry::new());

    let logger = DebugLogger::builder()
        .product("TestSampler", "1.0.0")
        .company("Dropwatch Tests")
        .log_folder(dir.path().join("Logs"))
        .drain_interval(Duration::from_secs(3600))
        .voice_counter(voices.clone())
        .component_names(components.clone())
        .build();

    TestLogger {
        logger,
        voices,
        components,
        dir,
    }
}

/// Logger that is already logging.
pub fn started_logger() -> TestLogger {
    let fixture = test_logger();
    fixture.logger.start().expect("start logging");
    fixture
}

/// Silent block with one sample set to `value`.
pub fn block_with_sample(len: usize, index: usize, value: f32) -> Vec<f32> {
    let mut block = vec![0.0f32; len];
    block[index] = value;
    block
}

/// Front-interface (or hidden) scripted control.
pub struct TestControl {
    pub name: Identifier,
    pub owner: ComponentId,
    pub front: bool,
}

impl TestControl {
    pub fn front(name: &str, owner: ComponentId) -> Self {
        Self {
            name: Identifier::from(name),
            owner,
            front: true,
        }
    }

    pub fn hidden(name: &str, owner: ComponentId) -> Self {
        Self {
            name: Identifier::from(name),
            owner,
            front: false,
        }
    }
}

impl ScriptedControl for TestControl {
    fn name(&self) -> &Identifier {
        &self.name
    }

    fn owner(&self) -> ComponentId {
        self.owner
    }

    fn is_on_front_interface(&self) -> bool {
        self.front
    }
}

/// Listener counting every notification.
#[derive(Default)]
pub struct RecordingListener {
    pub started: AtomicUsize,
    pub ended: AtomicUsize,
    pub errors: AtomicUsize,
}

impl RecordingListener {
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.started.load(Ordering::SeqCst),
            self.ended.load(Ordering::SeqCst),
            self.errors.load(Ordering::SeqCst),
        )
    }
}

impl LoggerListener for RecordingListener {
    fn log_started(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn log_ended(&self) {
        self.ended.fetch_add(1, Ordering::SeqCst);
    }

    fn error_detected(&self) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
}

/// Value of a parameter change entry.
pub fn parameter_value(kind: &MessageKind) -> Option<&ParameterValue> {
    match kind {
        MessageKind::ParameterChange { value } => Some(value),
        _ => None,
    }
}
