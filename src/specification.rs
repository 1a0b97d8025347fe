//! The compiled [`Specification`] entity (§3) and its aliasing mode.

use crate::calc::CalcOp;
use crate::charclass::CharClass;
use crate::pattern::PatternElement;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aliases {
    /// `%alias%` equals `%account%`.
    Same,
    ExplicitList(Vec<String>),
}

/// A compiled alias specification: one `ACCOUNT ... ;` clause.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specification {
    pub accounts: Vec<String>,
    pub aliases: Aliases,
    pub default_class: CharClass,
    pub pattern: Vec<PatternElement>,
    pub calc: Vec<CalcOp>,
    /// Set by C3 when invariant 7 applies: multiple accounts, `aliases =
    /// Same`, and no `%account%` anchor in the pattern.
    pub context_ambiguous: bool,
    /// Canonical rendering of the pattern, used only to detect duplicate/
    /// overlapping declarations during diagnostics; not part of matching.
    pub fingerprint: String,
}

impl Specification {
    /// The primary (first-declared) account; used whenever a Specification
    /// resolves without needing to pick among several accounts.
    pub fn primary_account(&self) -> &str {
        &self.accounts[0]
    }

    pub fn has_account_field(&self) -> bool {
        self.pattern
            .iter()
            .any(|e| matches!(e, PatternElement::AccountField))
    }

    pub fn has_alias_field(&self) -> bool {
        self.pattern
            .iter()
            .any(|e| matches!(e, PatternElement::AliasField))
    }
}
