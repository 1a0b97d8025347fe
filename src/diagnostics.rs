//! Structured compile-time diagnostics (§7 of the specification).
//!
//! `compile` never panics on malformed input: every rejected source text
//! produces at least one [`Diagnostic`], and a failed compile never touches
//! the currently-installed [`crate::ConfigurationSet`].

use thiserror::Error;

/// Whether a [`Diagnostic`] blocks `compile` from producing a
/// [`crate::ConfigurationSet`], or merely tags a specification that compiled
/// but has a noteworthy property (`spec.md` §4.2's "not rejected, but
/// tagged" context-ambiguity case).
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A single line/column-anchored compile failure or warning.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub line: usize,
    pub column: usize,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    /// An error-severity diagnostic. This is the common case: almost every
    /// `DiagnosticKind` is a hard rejection.
    pub fn new(line: usize, column: usize, kind: DiagnosticKind) -> Self {
        Self {
            severity: Severity::Error,
            line,
            column,
            kind,
        }
    }

    /// A warning-severity diagnostic: reported alongside a successful
    /// compile, never itself a reason to reject the source text.
    pub fn warning(line: usize, column: usize, kind: DiagnosticKind) -> Self {
        Self {
            severity: Severity::Warning,
            line,
            column,
            kind,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}",
            self.line, self.column, self.severity, self.kind
        )
    }
}

/// The full error taxonomy from spec §7, minus the two outcomes
/// (`ResolveNotFound`/`ResolveAmbiguous`) that are runtime return values
/// rather than compile-time errors, and `MalformedQuery`, which belongs to
/// the embedding protocol layer (see [`crate::service::protocol`]).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticKind {
    // --- ConfigSyntaxError ---
    #[error("unexpected end of input while reading {0}")]
    UnexpectedEof(String),
    #[error("unterminated quoted string")]
    UnterminatedString,
    #[error("unterminated alias specification (missing ';')")]
    UnterminatedSpecification,
    #[error("expected keyword '{expected}', found '{found}'")]
    ExpectedKeyword { expected: String, found: String },
    #[error("expected '{0}'")]
    ExpectedToken(String),
    #[error("unrecognized configuration item '{0}'")]
    UnknownConfigItem(String),
    #[error("malformed match expression: {0}")]
    MalformedMatchExpr(String),
    #[error("malformed calc expression: {0}")]
    MalformedCalcExpr(String),
    #[error("unrecognized character class '{0}'")]
    UnknownCharClass(String),
    #[error("unrecognized calc function '{0}'")]
    UnknownCalcFn(String),
    #[error("invalid integer literal '{0}'")]
    InvalidInteger(String),
    #[error("default-char token must be exactly one byte, got '{0}'")]
    InvalidDefaultChar(String),

    // --- ConfigSemanticError ---
    #[error("pattern must contain exactly one %code% field, found {0}")]
    CodeFieldCount(usize),
    #[error("adjacent fields of class '{0}' are ambiguous with no separating literal")]
    AmbiguousAdjacency(String),
    #[error("ALIASED list requires exactly one ACCOUNT, found {0}")]
    AliasListRequiresSingleAccount(usize),
    #[error("multiple accounts require 'aliases = Same' (no explicit ALIASED list)")]
    MultiAccountRequiresSameAlias,
    #[error("account '{0}' is already declared by another specification")]
    DuplicateAccount(String),
    #[error("alias '{0}' is already declared by another specification")]
    DuplicateAlias(String),
    #[error("calc op references field {0} but the pattern has only {1} field(s)")]
    UnresolvableFieldReference(usize, usize),
    #[error("'{0}' is only valid on an %fqdn% field")]
    FqdnOnlyOperation(String),
    #[error("'*' is not a supported label selector")]
    IllegalLabelSelector,
    #[error("'ALIASED *' is not supported; accounts must be enumerated")]
    WildcardAliasNotSupported,
    #[error(
        "specification declares multiple accounts with aliases=Same but no %account% anchor in the pattern; it is context-ambiguous and usable only via single-account fallback"
    )]
    ContextAmbiguousNoAnchor,
    #[error("account name '{0}' is empty")]
    EmptyAccountName(String),
    #[error("ACCOUNT list must declare at least one account")]
    EmptyAccountList,

    // --- service-layer (configuration file I/O, not part of the grammar) ---
    #[error("{0}")]
    Io(String),
}

pub type DiagnosticList = Vec<Diagnostic>;

/// Render a list of diagnostics the way a CLI would: one line per entry.
pub fn render(diags: &[Diagnostic]) -> String {
    diags
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
