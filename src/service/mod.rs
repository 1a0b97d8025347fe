//! Ambient infrastructure around the core compiler/resolver: the Postfix
//! `tcp_table(5)` line protocol, connection/statistics accounting, a
//! polling configuration-file watcher, pre/post-processing hooks, and a
//! blocking TCP server that wires all of it to [`crate::resolve`].
//!
//! None of this module is reachable from `compile`/`resolve`: the core
//! never performs I/O, and nothing here mutates a [`crate::ConfigurationSet`]
//! in place (see [`watcher`]).

pub mod error;
pub mod hooks;
pub mod protocol;
pub mod server;
pub mod stats;
pub mod watcher;

pub use error::ServiceError;
pub use hooks::{ExternalCommandHook, Hook, NoopHook};
pub use protocol::{Reply, Request};
pub use server::{Server, ServerConfig};
pub use stats::{Counter, CounterKind, Stats};
pub use watcher::ConfigWatcher;
