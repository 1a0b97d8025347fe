//! S5: the optional pre/post-processing hook named in `spec.md` §6 — a
//! single-level indirection `(local, domain) -> (local', domain')` applied
//! before `resolve` and symmetrically after.

use std::process::Command;

/// Applies a transformation to the local part / domain of a query before
/// (or after) it reaches [`crate::resolve`]. The core only ever sees
/// already-transformed input; it has no knowledge this trait exists.
pub trait Hook: Send + Sync {
    fn apply(&self, local: &str, domain: Option<&str>) -> (String, Option<String>);
}

/// The default: no transformation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHook;

impl Hook for NoopHook {
    fn apply(&self, local: &str, domain: Option<&str>) -> (String, Option<String>) {
        (local.to_string(), domain.map(str::to_string))
    }
}

/// Shells out to the `PROCESSOR` configuration item: an external executable
/// invoked as `<processor> <local> [<domain>]`, expected to print one line
/// of `local' [domain']` on stdout. A non-zero exit or malformed output
/// passes the original input through unchanged — hook failures are counted
/// in the `bad` statistics bucket by the caller, not treated as fatal.
#[derive(Debug, Clone)]
pub struct ExternalCommandHook {
    executable: String,
}

impl ExternalCommandHook {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

impl Hook for ExternalCommandHook {
    fn apply(&self, local: &str, domain: Option<&str>) -> (String, Option<String>) {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(local);
        if let Some(domain) = domain {
            cmd.arg(domain);
        }
        let fallback = (local.to_string(), domain.map(str::to_string));
        let output = match cmd.output() {
            Ok(output) if output.status.success() => output,
            _ => return fallback,
        };
        let Ok(text) = String::from_utf8(output.stdout) else {
            return fallback;
        };
        let Some(line) = text.lines().next() else {
            return fallback;
        };
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some(local), Some(domain)) => (local.to_string(), Some(domain.to_string())),
            (Some(local), None) => (local.to_string(), None),
            _ => fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_passes_through() {
        let hook = NoopHook;
        assert_eq!(
            hook.apply("foo", Some("example.com")),
            ("foo".to_string(), Some("example.com".to_string()))
        );
        assert_eq!(hook.apply("foo", None), ("foo".to_string(), None));
    }

    #[test]
    fn external_hook_falls_back_on_missing_executable() {
        let hook = ExternalCommandHook::new("/nonexistent/path/to/a/hook/binary");
        assert_eq!(
            hook.apply("foo", Some("example.com")),
            ("foo".to_string(), Some("example.com".to_string()))
        );
    }
}
