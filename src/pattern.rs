//! Pattern elements: the compiled form of a `match-expr`, and the static
//! adjacency check (invariant 2).

use std::collections::HashMap;

use crate::charclass::CharClass;
use crate::diagnostics::DiagnosticKind;

/// One element of a compiled pattern, in source order.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternElement {
    Literal(u8),
    /// `ordinal` is 1-based, counted left-to-right among fields sharing
    /// `class` within this pattern.
    IdentField { class: CharClass, ordinal: u32 },
    AccountField,
    AliasField,
    CodeField,
}

impl PatternElement {
    pub fn is_ident_field(&self) -> bool {
        matches!(self, Self::IdentField { .. })
    }
}

/// Parses the content of a `match-expr` (quotes already stripped by the
/// caller) into a sequence of [`PatternElement`]s, and assigns per-class
/// ordinals to every `%class%` field encountered.
pub fn parse_match_expr(raw: &str) -> Result<Vec<PatternElement>, DiagnosticKind> {
    let bytes = raw.as_bytes();
    let mut elements = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let close = bytes[i + 1..]
                .iter()
                .position(|&b| b == b'%')
                .map(|p| i + 1 + p);
            let close = close.ok_or_else(|| {
                DiagnosticKind::MalformedMatchExpr(
                    "unterminated '%' field reference".to_string(),
                )
            })?;
            let name = &raw[i + 1..close];
            elements.push(field_element(name)?);
            i = close + 1;
        } else {
            elements.push(PatternElement::Literal(bytes[i]));
            i += 1;
        }
    }
    assign_ordinals(&mut elements);
    Ok(elements)
}

fn field_element(name: &str) -> Result<PatternElement, DiagnosticKind> {
    match name {
        "account" => Ok(PatternElement::AccountField),
        "alias" => Ok(PatternElement::AliasField),
        "code" => Ok(PatternElement::CodeField),
        other => CharClass::from_name(other)
            .map(|class| PatternElement::IdentField { class, ordinal: 0 })
            .ok_or_else(|| DiagnosticKind::UnknownCharClass(other.to_string())),
    }
}

fn assign_ordinals(elements: &mut [PatternElement]) {
    let mut counters: HashMap<CharClass, u32> = HashMap::new();
    for el in elements.iter_mut() {
        if let PatternElement::IdentField { class, ordinal } = el {
            let counter = counters.entry(*class).or_insert(0);
            *counter += 1;
            *ordinal = *counter;
        }
    }
}

/// Invariant 1: exactly one `%code%` field.
pub fn count_code_fields(elements: &[PatternElement]) -> usize {
    elements
        .iter()
        .filter(|e| matches!(e, PatternElement::CodeField))
        .count()
}

/// Invariant 2: no two variable-width fields are adjacent (nothing between
/// them in the pattern) unless they are `alpha` next to `number`; no field
/// class is adjacent to itself. Returns the offending class pair on
/// violation.
pub fn check_no_separator_adjacency(elements: &[PatternElement]) -> Result<(), DiagnosticKind> {
    for pair in elements.windows(2) {
        if let (
            PatternElement::IdentField { class: ca, .. },
            PatternElement::IdentField { class: cb, .. },
        ) = (&pair[0], &pair[1])
        {
            if !CharClass::legal_adjacent(*ca, *cb) {
                return Err(DiagnosticKind::AmbiguousAdjacency(format!(
                    "{}/{}",
                    ca, cb
                )));
            }
        }
    }
    Ok(())
}

/// The identifier fields in pattern order, which is the indexing space for
/// a calc-op's `nth` (see `SPEC_FULL.md` §3).
pub fn ident_field_sequence(elements: &[PatternElement]) -> Vec<(CharClass, u32)> {
    elements
        .iter()
        .filter_map(|e| match e {
            PatternElement::IdentField { class, ordinal } => Some((*class, *ordinal)),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_literals_and_fields() {
        let els = parse_match_expr("%account%-%ident%-%code%").unwrap();
        assert_eq!(
            els,
            vec![
                PatternElement::AccountField,
                PatternElement::Literal(b'-'),
                PatternElement::IdentField {
                    class: CharClass::Ident,
                    ordinal: 1
                },
                PatternElement::Literal(b'-'),
                PatternElement::CodeField,
            ]
        );
    }

    #[test]
    fn assigns_per_class_ordinals() {
        let els = parse_match_expr("%alpha%is%alpha%.%code%").unwrap();
        let ords: Vec<u32> = els
            .iter()
            .filter_map(|e| match e {
                PatternElement::IdentField { ordinal, .. } => Some(*ordinal),
                _ => None,
            })
            .collect();
        assert_eq!(ords, vec![1, 2]);
    }

    #[test]
    fn rejects_double_code() {
        let els = parse_match_expr("%code%-%code%").unwrap();
        assert_eq!(count_code_fields(&els), 2);
    }

    #[test]
    fn rejects_ambiguous_adjacency() {
        let els = parse_match_expr("%ident%%ident%-%code%").unwrap();
        assert!(check_no_separator_adjacency(&els).is_err());
    }

    #[test]
    fn allows_alpha_number_adjacency() {
        let els = parse_match_expr("%alpha%%number%-%code%").unwrap();
        assert!(check_no_separator_adjacency(&els).is_ok());
    }

    #[test]
    fn unknown_field_name_errors() {
        assert!(parse_match_expr("%bogus%-%code%").is_err());
    }
}
