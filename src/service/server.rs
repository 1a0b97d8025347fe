//! S6: the blocking TCP server — one `TcpListener`, thread-per-connection,
//! wiring the protocol (S2), statistics (S3), hooks (S5), and watcher (S4)
//! to [`crate::resolve`]. A synchronous, OS-thread design in the style of
//! `mailcheck_lib`'s `smtp_verify::session` rather than an async runtime:
//! the core imposes no concurrency model (`spec.md` §5, §9), and plain
//! blocking I/O is the teacher's idiom.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use crate::configset::Mode;
use crate::resolver::Resolved;
use crate::service::error::ServiceError;
use crate::service::hooks::Hook;
use crate::service::protocol::{self, Reply, Request};
use crate::service::stats::{CounterKind, Stats};
use crate::service::watcher::ConfigWatcher;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub mode: Mode,
}

/// Owns the shared collaborators a connection-handling thread needs:
/// the watcher (for its current [`crate::ConfigurationSet`] snapshot), the
/// statistics counters, and the pre/post-processing hook.
pub struct Server {
    config: ServerConfig,
    watcher: Arc<ConfigWatcher>,
    stats: Arc<Stats>,
    hook: Arc<dyn Hook>,
}

impl Server {
    pub fn new(
        config: ServerConfig,
        watcher: Arc<ConfigWatcher>,
        hook: Arc<dyn Hook>,
    ) -> Self {
        Self {
            config,
            watcher,
            stats: Arc::new(Stats::default()),
            hook,
        }
    }

    pub fn stats(&self) -> Arc<Stats> {
        Arc::clone(&self.stats)
    }

    /// Binds the listener and runs the accept loop forever. Spawns two
    /// housekeeping threads first: the watcher's poll loop and the
    /// statistics bucket-rotation loop, matching `SPEC_FULL.md` §5's "the
    /// accept loop and the watcher's poll loop are the only two threads
    /// with timing behavior" (the rotation thread is the third, and is pure
    /// bookkeeping with no query-path effect).
    pub fn run(&self) -> Result<(), ServiceError> {
        let listener = TcpListener::bind(&self.config.bind_addr)?;

        let watcher = Arc::clone(&self.watcher);
        std::thread::spawn(move || watcher.run_forever());

        let stats = Arc::clone(&self.stats);
        std::thread::spawn(move || loop {
            std::thread::sleep(Duration::from_secs(1));
            stats.rotate_all();
        });

        for incoming in listener.incoming() {
            let stream = match incoming {
                Ok(stream) => stream,
                Err(_) => continue,
            };
            self.stats.record(CounterKind::Connections);
            let watcher = Arc::clone(&self.watcher);
            let stats = Arc::clone(&self.stats);
            let hook = Arc::clone(&self.hook);
            let mode = self.config.mode;
            std::thread::spawn(move || {
                if let Err(err) = handle_connection(stream, &watcher, &stats, hook.as_ref(), mode) {
                    log_connection_error(&err);
                }
            });
        }
        Ok(())
    }
}

fn handle_connection(
    stream: TcpStream,
    watcher: &ConfigWatcher,
    stats: &Stats,
    hook: &dyn Hook,
    mode: Mode,
) -> Result<(), ServiceError> {
    let mut writer = stream.try_clone()?;
    let reader = BufReader::new(stream);

    for line in reader.lines() {
        let line = line?;
        stats.record(CounterKind::Reads);
        let reply = dispatch(&line, watcher, stats, hook, mode);
        writer.write_all(reply.to_line().as_bytes())?;
        stats.record(CounterKind::Writes);
    }
    Ok(())
}

fn dispatch(line: &str, watcher: &ConfigWatcher, stats: &Stats, hook: &dyn Hook, mode: Mode) -> Reply {
    let request = match protocol::parse_request(line) {
        Ok(request) => request,
        Err(err) => {
            stats.record(CounterKind::Bad);
            return Reply::Bad(err.to_string());
        }
    };

    match request {
        Request::Stats => {
            stats.record(CounterKind::Stats);
            Reply::Text(stats.render_text().trim_end().to_string())
        }
        Request::JStats => {
            stats.record(CounterKind::Stats);
            render_jstats(stats)
        }
        Request::Get(key) => resolve_key(&key, watcher, stats, hook, mode),
    }
}

#[cfg(feature = "with-serde")]
fn render_jstats(stats: &Stats) -> Reply {
    Reply::Text(stats.render_json().to_string())
}

#[cfg(not(feature = "with-serde"))]
fn render_jstats(_stats: &Stats) -> Reply {
    Reply::Bad("jstats requires the 'with-serde' feature".to_string())
}

fn resolve_key(key: &str, watcher: &ConfigWatcher, stats: &Stats, hook: &dyn Hook, mode: Mode) -> Reply {
    let (local, domain) = match mode {
        Mode::Account => (key, None),
        Mode::Virtual => match key.rsplit_once('@') {
            Some((local, domain)) => (local, Some(domain)),
            None => (key, None),
        },
    };

    let (local, domain) = hook.apply(local, domain);
    let transformed = match &domain {
        Some(domain) => format!("{local}@{domain}"),
        None => local,
    };

    let snapshot = watcher.snapshot();
    match crate::resolver::resolve(&snapshot, mode, &transformed) {
        Resolved::Match { reply, .. } | Resolved::Debug { reply } => {
            stats.record(CounterKind::Success);
            let (local, domain) = hook.apply(&reply, None);
            let reply = match domain {
                Some(domain) => format!("{local}@{domain}"),
                None => local,
            };
            Reply::Ok(reply)
        }
        Resolved::NotFound => {
            stats.record(CounterKind::NotFound);
            Reply::NotFound("not found".to_string())
        }
    }
}

#[cfg(feature = "with-tracing")]
fn log_connection_error(err: &ServiceError) {
    tracing::warn!(error = %err, "connection handler error");
}

#[cfg(not(feature = "with-tracing"))]
fn log_connection_error(_err: &ServiceError) {}
