//! Logging session lifecycle.
//!
//! [`DebugLogger`] owns the capture state shared with the render thread, the
//! drain worker and the current log file. It is owned by the engine and
//! stops its worker when dropped.

use crate::config::{HostContext, LoggerConfig};
use crate::drain::{DrainContext, DrainSummary};
use crate::environment::{self, SystemSpecs};
use crate::error::Result;
use crate::listener::{LoggerEvent, LoggerListener};
use crate::log_file::{self, LogFile};
use crate::worker::DrainThread;
use chrono::Local;
use dropwatch_core::{Capture, ComponentNames, ComponentRegistry, VoiceCounter};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;

/// Session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerState {
    Idle,
    Logging,
}

#[derive(Default)]
struct Session {
    worker: Option<DrainThread>,
    current_file: Option<PathBuf>,
}

/// Diagnostic logger for one engine instance.
///
/// # Example
///
/// ```ignore
/// let logger = DebugLogger::builder()
///     .product("MySampler", "1.2.0")
///     .voice_counter(engine.voice_counter())
///     .build();
///
/// let capture = logger.capture().clone(); // hand to the audio thread
/// logger.start()?;
/// ```
pub struct DebugLogger {
    config: LoggerConfig,
    ctx: Arc<DrainContext>,
    session: Mutex<Session>,
}

impl core::fmt::Debug for DebugLogger {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DebugLogger")
            .field("state", &self.state())
            .field("current_log_file", &self.current_log_file())
            .field("capture", &self.ctx.capture)
            .finish()
    }
}

impl DebugLogger {
    pub fn builder() -> DebugLoggerBuilder {
        DebugLoggerBuilder::default()
    }

    /// Logger with default component registry and no voice counter.
    pub fn new(config: LoggerConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Capture API for the render thread.
    pub fn capture(&self) -> &Arc<Capture> {
        &self.ctx.capture
    }

    pub fn component_names(&self) -> &Arc<dyn ComponentNames> {
        &self.ctx.names
    }

    /// Open a fresh log file and begin capturing.
    ///
    /// Calling this while a session is running finishes that session's
    /// worker and continues in a new file. Returns the new file's path.
    pub fn start(&self) -> Result<PathBuf> {
        // Workers are joined outside the session lock: a listener running on
        // the worker may query the session.
        let previous = self.session.lock().worker.take();
        if let Some(mut worker) = previous {
            worker.stop();
            self.ctx.capture.end_session();
            *self.ctx.log_file.lock() = None;
            self.session.lock().current_file = None;
        }

        let folder = self.log_folder()?;
        let mut file = LogFile::create(&folder, &self.config.file_name)?;
        let path = file.path().to_path_buf();

        let mut preamble = environment::header(&self.config, Local::now());
        preamble.push_str(&environment::system_specs(
            &SystemSpecs::collect(),
            &self.config.host,
        ));
        file.append(&preamble)?;

        self.ctx.capture.begin_session();
        self.ctx.status.reset();
        *self.ctx.log_file.lock() = Some(file);

        let worker = match DrainThread::spawn(
            Arc::clone(&self.ctx),
            self.config.drain_interval(),
            self.config.queue_slots(),
        ) {
            Ok(worker) => worker,
            Err(e) => {
                self.ctx.capture.end_session();
                *self.ctx.log_file.lock() = None;
                return Err(e);
            }
        };

        let displaced = {
            let mut session = self.session.lock();
            session.current_file = Some(path.clone());
            session.worker.replace(worker)
        };
        // A concurrent start won the race; its worker shares our context.
        if let Some(mut worker) = displaced {
            worker.stop();
        }

        tracing::info!("Debug logging started: {}", path.display());
        self.ctx.listeners.notify(LoggerEvent::Started);
        Ok(path)
    }

    /// Stop capturing and discard queued entries. No-op when idle.
    ///
    /// Waits for a drain cycle in progress, without holding the session
    /// lock, so listeners may call back into the logger meanwhile.
    pub fn stop(&self) {
        let Some(mut worker) = self.session.lock().worker.take() else {
            return;
        };

        worker.stop();
        self.ctx.capture.end_session();
        *self.ctx.log_file.lock() = None;
        self.ctx.status.set_currently_failing(false);
        self.session.lock().current_file = None;

        tracing::info!("Debug logging stopped");
        self.ctx.listeners.notify(LoggerEvent::Ended);
    }

    /// `stop` when capture is active, else `start`.
    pub fn toggle(&self) -> Result<()> {
        if self.is_logging() {
            self.stop();
        } else {
            self.start()?;
        }
        Ok(())
    }

    /// Run one drain cycle now and wait for it. `None` when idle.
    pub fn flush(&self) -> Option<DrainSummary> {
        let handle = self.session.lock().worker.as_ref()?.handle();
        handle.drain_now()
    }

    pub fn state(&self) -> LoggerState {
        if self.session.lock().worker.is_some() {
            LoggerState::Logging
        } else {
            LoggerState::Idle
        }
    }

    /// Whether capture calls currently record anything. False once the
    /// error ceiling is reached, even though the session stays open.
    pub fn is_logging(&self) -> bool {
        self.ctx.capture.is_logging()
    }

    pub fn is_currently_failing(&self) -> bool {
        self.ctx.status.is_currently_failing()
    }

    /// `# Errors: N, Last Error Type: <kind>`
    pub fn last_error_message(&self) -> String {
        let last = self.ctx.status.last_error();
        let name = if last == dropwatch_core::FailureKind::Empty {
            ""
        } else {
            last.name()
        };
        format!(
            "# Errors: {}, Last Error Type: {}",
            self.ctx.capture.error_count(),
            name
        )
    }

    /// Folder receiving log files; created if missing.
    pub fn log_folder(&self) -> Result<PathBuf> {
        let folder = self.config.resolved_log_folder()?;
        log_file::ensure_folder(&folder)?;
        Ok(folder)
    }

    /// File of the running session.
    pub fn current_log_file(&self) -> Option<PathBuf> {
        self.session.lock().current_file.clone()
    }

    pub fn add_listener(&self, listener: &Arc<dyn LoggerListener>) {
        self.ctx.listeners.add(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn LoggerListener>) {
        self.ctx.listeners.remove(listener);
    }

    /// Store the warning level and note the change in the log.
    pub fn set_performance_warning_level(&self, level: u8) {
        self.ctx.capture.set_performance_warning_level(level);
    }

    pub fn performance_warning_level(&self) -> u8 {
        self.ctx.capture.performance_warning_level()
    }
}

impl Drop for DebugLogger {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Builder for [`DebugLogger`].
#[derive(Default)]
pub struct DebugLoggerBuilder {
    config: LoggerConfig,
    voices: Option<Arc<dyn VoiceCounter>>,
    names: Option<Arc<dyn ComponentNames>>,
}

impl DebugLoggerBuilder {
    /// Replace the whole configuration.
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn product(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.config.product_name = name.into();
        self.config.product_version = version.into();
        self
    }

    pub fn company(mut self, name: impl Into<String>) -> Self {
        self.config.company_name = Some(name.into());
        self
    }

    pub fn log_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.config.log_folder = Some(folder.into());
        self
    }

    /// Default: 200 ms
    pub fn drain_interval(mut self, interval: Duration) -> Self {
        self.config.drain_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Default: 512
    pub fn queue_capacity(mut self, slots: usize) -> Self {
        self.config.queue_capacity = slots;
        self
    }

    pub fn host(mut self, host: HostContext) -> Self {
        self.config.host = host;
        self
    }

    /// Source of the active voice count attached to performance warnings.
    /// Reports zero voices when not set.
    pub fn voice_counter(mut self, voices: Arc<dyn VoiceCounter>) -> Self {
        self.voices = Some(voices);
        self
    }

    /// Resolver for component names. A fresh [`ComponentRegistry`] when not
    /// set.
    pub fn component_names(mut self, names: Arc<dyn ComponentNames>) -> Self {
        self.names = Some(names);
        self
    }

    pub fn build(self) -> DebugLogger {
        let voices = self
            .voices
            .unwrap_or_else(|| Arc::new(AtomicUsize::new(0)));
        let names = self
            .names
            .unwrap_or_else(|| Arc::new(ComponentRegistry::new()));
        let capture = Arc::new(Capture::with_slots(self.config.queue_slots(), voices));

        DebugLogger {
            config: self.config,
            ctx: Arc::new(DrainContext::new(capture, names)),
            session: Mutex::new(Session::default()),
        }
    }
}
