//! C7: the frozen, atomically-swappable bundle of global options and
//! compiled specifications (§3, §4.6).

use crate::diagnostics::DiagnosticList;
use crate::specification::Specification;

/// Which form of address the caller is resolving: the bare local part
/// (account form) or `local@domain` (virtual form). See the GLOSSARY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Account,
    Virtual,
}

/// Transport/runtime options the core treats as opaque configuration: it
/// only reads `case_sensitive`, `debug_account`, and `alias_domains`
/// itself. `host`/`port`/`statistics_cadence`/`log_level`/
/// `preprocess_hook` are consumed by the service layer (`crate::service`),
/// never by `compile`/`resolve`.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub case_sensitive: bool,
    pub debug_account: Option<String>,
    /// Empty in account-form mode; non-empty in virtual-form mode.
    pub alias_domains: Vec<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub statistics_cadence: Option<String>,
    pub log_level: Option<String>,
    pub preprocess_hook: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            debug_account: None,
            alias_domains: Vec::new(),
            host: None,
            port: None,
            statistics_cadence: None,
            log_level: None,
            preprocess_hook: None,
        }
    }
}

/// A compiled, immutable configuration: built in one shot by
/// [`crate::parser::compile`], then never mutated. Reload replaces the
/// whole value behind an atomic pointer (`crate::service::watcher`); it is
/// never edited in place.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationSet {
    pub options: Options,
    pub specifications: Vec<Specification>,
    /// Non-fatal diagnostics collected while compiling this set (currently
    /// only [`crate::diagnostics::DiagnosticKind::ContextAmbiguousNoAnchor`]).
    /// Always empty unless a specification was actually tagged.
    pub warnings: DiagnosticList,
}

impl ConfigurationSet {
    /// Whether this set is configured for virtual-form (`local@domain`)
    /// lookups, per `spec.md` §3's "Options" record.
    pub fn is_virtual_mode(&self) -> bool {
        !self.options.alias_domains.is_empty()
    }
}
