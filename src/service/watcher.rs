//! S4: the configuration-file watcher. Polls `mtime`, recompiles on
//! change, and installs the result via an atomic pointer swap — or, on a
//! failed recompile, logs the diagnostics and leaves the previous
//! [`crate::ConfigurationSet`] installed (`spec.md` §4.6/§7's all-or-nothing
//! reload guarantee).

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use crate::configset::ConfigurationSet;
use crate::diagnostics::DiagnosticList;
use crate::service::error::ServiceError;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Unchanged,
    Reloaded,
    ReloadFailed(DiagnosticList),
}

/// Holds the single atomically-swappable reference query workers read.
/// Readers take an uncontended `RwLock::read` per query; only a successful
/// reload ever takes the write lock, matching `spec.md` §5's "workers
/// holding a reference during a reload continue to use their snapshot."
pub struct ConfigWatcher {
    path: PathBuf,
    poll_interval: Duration,
    last_mtime: std::sync::Mutex<Option<SystemTime>>,
    current: RwLock<Arc<ConfigurationSet>>,
}

impl ConfigWatcher {
    /// Compiles `path` once at startup. A startup compile failure is fatal
    /// to the embedding process (exit code 2, per `spec.md` §6) — there is
    /// no prior configuration to fall back to.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DiagnosticList> {
        let path = path.as_ref().to_path_buf();
        let source = std::fs::read_to_string(&path).map_err(|err| {
            vec![crate::diagnostics::Diagnostic::new(
                0,
                0,
                crate::diagnostics::DiagnosticKind::Io(format!(
                    "could not read '{}': {err}",
                    path.display()
                )),
            )]
        })?;
        let config = crate::parser::compile(&source)?;
        let mtime = std::fs::metadata(&path).and_then(|m| m.modified()).ok();
        Ok(Self {
            path,
            poll_interval: DEFAULT_POLL_INTERVAL,
            last_mtime: std::sync::Mutex::new(mtime),
            current: RwLock::new(Arc::new(config)),
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The current snapshot. Cheap: an `Arc` clone behind an uncontended
    /// read lock.
    pub fn snapshot(&self) -> Arc<ConfigurationSet> {
        Arc::clone(&self.current.read().expect("config lock poisoned"))
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Checks `mtime`, and on a change, recompiles and swaps in the new
    /// set. Never panics and never touches the installed set on failure.
    pub fn poll_once(&self) -> Result<PollOutcome, ServiceError> {
        let mtime = match std::fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(mtime) => mtime,
            Err(source) => return Err(ServiceError::Io { source }),
        };

        {
            let mut last = self.last_mtime.lock().expect("mtime lock poisoned");
            if *last == Some(mtime) {
                return Ok(PollOutcome::Unchanged);
            }
            *last = Some(mtime);
        }

        let source = std::fs::read_to_string(&self.path)?;
        match crate::parser::compile(&source) {
            Ok(config) => {
                let mut guard = self.current.write().expect("config lock poisoned");
                *guard = Arc::new(config);
                Ok(PollOutcome::Reloaded)
            }
            Err(diags) => {
                log_reload_failure(&diags);
                Ok(PollOutcome::ReloadFailed(diags))
            }
        }
    }

    /// Runs the poll loop forever on the calling thread. The embedding
    /// server spawns this as its own thread (see
    /// [`crate::service::server::Server`]); it is the only other thread in
    /// the process with timing behavior besides the accept loop
    /// (`SPEC_FULL.md` §5).
    pub fn run_forever(&self) -> ! {
        loop {
            std::thread::sleep(self.poll_interval);
            if let Err(err) = self.poll_once() {
                log_poll_error(&err);
            }
        }
    }
}

#[cfg(feature = "with-tracing")]
fn log_reload_failure(diags: &DiagnosticList) {
    tracing::warn!(diagnostics = %crate::diagnostics::render(diags), "configuration reload rejected, keeping prior set");
}

#[cfg(not(feature = "with-tracing"))]
fn log_reload_failure(_diags: &DiagnosticList) {}

#[cfg(feature = "with-tracing")]
fn log_poll_error(err: &ServiceError) {
    tracing::warn!(error = %err, "configuration watcher poll failed");
}

#[cfg(not(feature = "with-tracing"))]
fn log_poll_error(_err: &ServiceError) {}
