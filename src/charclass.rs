//! Lexical primitives: the character classes an identifier field can be
//! declared with, and their membership predicates.

use std::fmt;

/// One of the five field classes a pattern identifier can be declared as.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    Alpha,
    Number,
    Alnum,
    Ident,
    Fqdn,
}

impl CharClass {
    pub fn name(self) -> &'static str {
        match self {
            Self::Alpha => "alpha",
            Self::Number => "number",
            Self::Alnum => "alnum",
            Self::Ident => "ident",
            Self::Fqdn => "fqdn",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "alpha" => Some(Self::Alpha),
            "number" => Some(Self::Number),
            "alnum" => Some(Self::Alnum),
            "ident" => Some(Self::Ident),
            "fqdn" => Some(Self::Fqdn),
            _ => None,
        }
    }

    /// Membership test for a single byte, ignoring the `fqdn` label-structure
    /// constraints (those are checked separately by [`is_valid_fqdn`]).
    pub fn contains(self, b: u8) -> bool {
        match self {
            Self::Alpha => is_alpha(b),
            Self::Number => is_number(b),
            Self::Alnum => is_alpha(b) || is_number(b),
            Self::Ident => is_alpha(b) || is_number(b) || b == b'-' || b == b'_',
            Self::Fqdn => is_alpha(b) || is_number(b) || b == b'-' || b == b'.',
        }
    }

    /// Whether two adjacent fields of these two classes are allowed by
    /// invariant 2: only `alpha` directly touching `number` (in either
    /// order), never a class touching itself, never any other pairing.
    pub fn legal_adjacent(a: CharClass, b: CharClass) -> bool {
        matches!(
            (a, b),
            (CharClass::Alpha, CharClass::Number) | (CharClass::Number, CharClass::Alpha)
        )
    }
}

impl fmt::Display for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn is_alpha(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

pub fn is_number(b: u8) -> bool {
    b.is_ascii_digit()
}

pub fn is_vowel(b: u8) -> bool {
    matches!(b.to_ascii_lowercase(), b'a' | b'e' | b'i' | b'o' | b'u')
}

/// Splits an `fqdn` capture into its dot-separated labels, validating that
/// every label is non-empty and built only from `alnum`/`-`.
pub fn fqdn_labels(s: &str) -> Option<Vec<&str>> {
    if s.is_empty() {
        return None;
    }
    let labels: Vec<&str> = s.split('.').collect();
    for label in &labels {
        if label.is_empty() {
            return None;
        }
        if !label
            .bytes()
            .all(|b| is_alpha(b) || is_number(b) || b == b'-')
        {
            return None;
        }
    }
    Some(labels)
}

pub fn is_valid_fqdn(s: &str) -> bool {
    fqdn_labels(s).is_some()
}
