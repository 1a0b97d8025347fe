use thiserror::Error;

use crate::diagnostics::DiagnosticList;

/// Errors raised by the service layer. The core itself never raises on
/// untrusted input (`spec.md` §7); these variants belong strictly to I/O,
/// the TCP-table wire protocol, and configuration reload.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("I/O error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },
    #[error("malformed tcp_table(5) request: {0}")]
    MalformedRequest(String),
    #[error("configuration reload failed: {0:?}")]
    ReloadFailed(DiagnosticList),
    #[error("hook command failed: {0}")]
    HookFailed(String),
}

impl From<std::io::Error> for ServiceError {
    fn from(source: std::io::Error) -> Self {
        Self::Io { source }
    }
}
