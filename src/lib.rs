#![forbid(unsafe_code)]
//! trualias — alias-specification compiler and address-resolution engine
//! for MTA TCP-table lookups.
//!
//! The core is the specification compiler (`parser`, `pattern`, `calc`) and
//! the query-time matcher/resolver (`matcher`, `resolver`): together they
//! implement `compile(source) -> Result<ConfigurationSet, DiagnosticList>`
//! and `resolve(&ConfigurationSet, Mode, &str) -> Resolved`, both pure and
//! non-blocking. Everything under [`service`] is ambient infrastructure
//! (TCP-table protocol, statistics, file watcher, hooks, server loop) built
//! on top of that core; it performs the I/O the core deliberately does not.

pub mod calc;
pub mod charclass;
pub mod configset;
pub mod diagnostics;
pub mod matcher;
pub mod parser;
pub mod pattern;
pub mod resolver;
pub mod service;
pub mod specification;
pub mod token;

pub use calc::{CalcOp, Captures, CountFn, FieldCapture, Polarity, Target};
pub use charclass::CharClass;
pub use configset::{ConfigurationSet, Mode, Options};
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticList, Severity};
pub use matcher::MatchOutcome;
pub use parser::compile;
pub use pattern::PatternElement;
pub use resolver::{Resolved, resolve};
pub use specification::{Aliases, Specification};
