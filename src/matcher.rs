//! C5: the address matcher. Enumerates every way a candidate string can
//! decompose against one [`Specification`]'s pattern, evaluates the calc for
//! each candidate, and keeps the ones whose embedded code verifies.

use std::collections::HashSet;

use regex::Regex;

use crate::calc::{self, CalcOp, Captures, FieldCapture};
use crate::charclass::CharClass;
use crate::pattern::PatternElement;
use crate::specification::{Aliases, Specification};

/// One verified decomposition of an input against a Specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub account: String,
    pub alias: String,
    pub code: String,
}

/// A pattern with `%account%`/`%alias%` already expanded to concrete
/// literal bytes (spec §4.4 step 1).
struct ConcreteCandidate {
    account: String,
    alias: String,
    elements: Vec<ConcreteElement>,
}

enum ConcreteElement {
    Literal(u8),
    IdentField { class: CharClass },
    CodeField,
}

/// Runs C5 for one Specification against `input`, returning every
/// decomposition whose code verifies. `input` and all comparisons are
/// already case-folded by the caller when `case_sensitive` is false (the
/// returned `account`/`alias` are always the canonical-case values declared
/// in the configuration).
pub fn find_matches(spec: &Specification, input: &str, case_sensitive: bool) -> Vec<MatchOutcome> {
    let haystack = if case_sensitive {
        input.to_string()
    } else {
        input.to_ascii_lowercase()
    };

    let charset = code_charset(&spec.calc);
    let candidates = expand_concrete(spec, case_sensitive);

    let mut outcomes = Vec::new();
    for candidate in &candidates {
        if !prefilter_matches(&candidate.elements, &charset, &haystack) {
            continue;
        }
        let mut spans = Vec::new();
        enumerate(
            &candidate.elements,
            haystack.as_bytes(),
            0,
            &charset,
            &mut spans,
            &mut |spans| {
                if let Some(outcome) = verify(spec, candidate, &haystack, spans) {
                    outcomes.push(outcome);
                }
            },
        );
    }

    dedup_by_account(outcomes)
}

/// Collapse verifying decompositions within the same Specification that
/// share a resolved account into one outcome (spec §4.4 "Ordering/tie-breaks").
fn dedup_by_account(outcomes: Vec<MatchOutcome>) -> Vec<MatchOutcome> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for outcome in outcomes {
        if seen.insert(outcome.account.clone()) {
            out.push(outcome);
        }
    }
    out
}

fn expand_concrete(spec: &Specification, case_sensitive: bool) -> Vec<ConcreteCandidate> {
    let fold = |s: &str| -> String {
        if case_sensitive {
            s.to_string()
        } else {
            s.to_ascii_lowercase()
        }
    };

    let mut out = Vec::new();
    match &spec.aliases {
        Aliases::Same => {
            for account in &spec.accounts {
                out.push(ConcreteCandidate {
                    account: account.clone(),
                    alias: account.clone(),
                    elements: substitute(
                        &spec.pattern,
                        &fold(account),
                        &fold(account),
                        case_sensitive,
                    ),
                });
            }
        }
        Aliases::ExplicitList(list) => {
            let account = spec.primary_account();
            for alias in list {
                out.push(ConcreteCandidate {
                    account: account.to_string(),
                    alias: alias.clone(),
                    elements: substitute(&spec.pattern, &fold(account), &fold(alias), case_sensitive),
                });
            }
        }
    }
    out
}

/// Turns a pattern's elements into their concrete, matchable form.
/// `account`/`alias` are already folded by the caller; literal bytes carried
/// by the pattern itself are folded here, per spec §4.1's "the whole input
/// and all literals are lower-cased before comparison" when
/// `case_sensitive` is false.
fn substitute(
    pattern: &[PatternElement],
    account: &str,
    alias: &str,
    case_sensitive: bool,
) -> Vec<ConcreteElement> {
    let fold_byte = |b: u8| if case_sensitive { b } else { b.to_ascii_lowercase() };
    let mut out = Vec::new();
    for el in pattern {
        match el {
            PatternElement::Literal(b) => out.push(ConcreteElement::Literal(fold_byte(*b))),
            PatternElement::AccountField => {
                out.extend(account.bytes().map(ConcreteElement::Literal))
            }
            PatternElement::AliasField => out.extend(alias.bytes().map(ConcreteElement::Literal)),
            PatternElement::IdentField { class, .. } => {
                out.push(ConcreteElement::IdentField { class: *class })
            }
            PatternElement::CodeField => out.push(ConcreteElement::CodeField),
        }
    }
    out
}

/// All bytes that a `%code%` field may legitimately contain: alnum, the
/// separators a calc-expr might embed (`-`, `_`, `.`), and every literal
/// byte the calc-expr itself can produce (`LITERAL` text and `CHAR`
/// defaults) — spec §4.4's "conservatively, printable alnum + any literal
/// bytes appearing as CharAt defaults."
fn code_charset(calc: &[CalcOp]) -> HashSet<u8> {
    let mut set: HashSet<u8> = HashSet::new();
    for b in b'a'..=b'z' {
        set.insert(b);
    }
    for b in b'A'..=b'Z' {
        set.insert(b);
    }
    for b in b'0'..=b'9' {
        set.insert(b);
    }
    set.insert(b'-');
    set.insert(b'_');
    set.insert(b'.');
    for op in calc {
        match op {
            CalcOp::Literal(s) => set.extend(s.bytes()),
            CalcOp::CharAt { default, .. } => {
                set.insert(*default);
            }
            _ => {}
        }
    }
    set
}

fn class_or_code_contains(el: &ConcreteElement, charset: &HashSet<u8>, b: u8) -> bool {
    match el {
        ConcreteElement::Literal(lit) => *lit == b,
        ConcreteElement::IdentField { class } => class.contains(b),
        ConcreteElement::CodeField => charset.contains(&b),
    }
}

/// A cheap structural reject before the exact combinatorial search: builds
/// a single greedy regex for the whole concrete pattern and checks whether
/// it matches at all. This prunes the overwhelming majority of
/// specification/input pairs in O(n) before the (rarer) exponential-ish
/// enumeration below ever runs.
fn prefilter_matches(elements: &[ConcreteElement], charset: &HashSet<u8>, haystack: &str) -> bool {
    let mut pattern = String::from("^");
    for el in elements {
        match el {
            ConcreteElement::Literal(b) => {
                pattern.push_str(&regex::escape(&(*b as char).to_string()))
            }
            ConcreteElement::IdentField { class } => {
                pattern.push_str(class_regex_body(*class));
                pattern.push('+');
            }
            ConcreteElement::CodeField => {
                pattern.push_str(&code_regex_body(charset));
                pattern.push('+');
            }
        }
    }
    pattern.push('$');
    Regex::new(&pattern)
        .map(|re| re.is_match(haystack))
        .unwrap_or(false)
}

fn class_regex_body(class: CharClass) -> &'static str {
    match class {
        CharClass::Alpha => "[A-Za-z]",
        CharClass::Number => "[0-9]",
        CharClass::Alnum => "[A-Za-z0-9]",
        CharClass::Ident => "[A-Za-z0-9_-]",
        CharClass::Fqdn => "[A-Za-z0-9.-]",
    }
}

fn code_regex_body(charset: &HashSet<u8>) -> String {
    let mut body = String::from("[");
    let mut bytes: Vec<u8> = charset.iter().copied().collect();
    bytes.sort_unstable();
    for b in bytes {
        body.push_str(&regex::escape(&(b as char).to_string()));
    }
    body.push(']');
    body
}

/// Recursively enumerates every valid assignment of byte-ranges to fields,
/// invoking `emit` with the completed span list for each one that consumes
/// the whole input exactly. This, not a single regex match, is what
/// satisfies spec §4.4's "collect all matches, not just the first": two
/// adjacent fields separated only by a literal that also occurs inside a
/// field's own charset can have more than one valid split point, and a
/// backtracking automaton (rather than the `regex` crate's single
/// leftmost-greedy result) is the only way to find all of them.
fn enumerate(
    elements: &[ConcreteElement],
    haystack: &[u8],
    pos: usize,
    charset: &HashSet<u8>,
    spans: &mut Vec<(usize, usize)>,
    emit: &mut dyn FnMut(&[(usize, usize)]),
) {
    let Some((el, rest)) = elements.split_first() else {
        if pos == haystack.len() {
            emit(spans);
        }
        return;
    };

    match el {
        ConcreteElement::Literal(b) => {
            if pos < haystack.len() && haystack[pos] == *b {
                spans.push((pos, pos + 1));
                enumerate(rest, haystack, pos + 1, charset, spans, emit);
                spans.pop();
            }
        }
        ConcreteElement::IdentField { .. } | ConcreteElement::CodeField => {
            let mut end = pos;
            while end < haystack.len() && class_or_code_contains(el, charset, haystack[end]) {
                end += 1;
            }
            // Try every non-empty length from the longest run down to 1,
            // so the eventual match set is independent of search order.
            for len in (1..=(end - pos)).rev() {
                spans.push((pos, pos + len));
                enumerate(rest, haystack, pos + len, charset, spans, emit);
                spans.pop();
            }
        }
    }
}

fn verify(
    spec: &Specification,
    candidate: &ConcreteCandidate,
    haystack: &str,
    spans: &[(usize, usize)],
) -> Option<MatchOutcome> {
    let mut fields = Vec::new();
    let mut code_span: Option<(usize, usize)> = None;

    for (el, span) in candidate.elements.iter().zip(spans.iter()) {
        match el {
            ConcreteElement::IdentField { class } => {
                let text = &haystack[span.0..span.1];
                if text.is_empty() {
                    return None;
                }
                fields.push(FieldCapture {
                    class: *class,
                    text,
                });
            }
            ConcreteElement::CodeField => {
                if span.1 == span.0 {
                    return None;
                }
                code_span = Some(*span);
            }
            ConcreteElement::Literal(_) => {}
        }
    }

    let code_span = code_span?;
    let captured_code = &haystack[code_span.0..code_span.1];

    let captures = Captures {
        fields,
        account: &candidate.account,
        alias: &candidate.alias,
    };
    let expected = calc::evaluate(&spec.calc, &captures);
    if expected == captured_code {
        Some(MatchOutcome {
            account: candidate.account.clone(),
            alias: candidate.alias.clone(),
            code: captured_code.to_string(),
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::parse_calc_expr;
    use crate::pattern::parse_match_expr;

    fn spec(pattern: &str, calc_src: &str, accounts: &[&str], aliases: Aliases) -> Specification {
        let elements = parse_match_expr(pattern).unwrap();
        let total = crate::pattern::ident_field_sequence(&elements).len();
        let calc = parse_calc_expr(calc_src, total).unwrap();
        Specification {
            accounts: accounts.iter().map(|s| s.to_string()).collect(),
            aliases,
            default_class: CharClass::Ident,
            pattern: elements,
            calc,
            context_ambiguous: false,
            fingerprint: pattern.to_string(),
        }
    }

    #[test]
    fn worked_example_one() {
        let s = spec(
            "%account%-%ident%-%code%",
            "CHAR(1,-), CHARS()",
            &["foo"],
            Aliases::Same,
        );
        let m = find_matches(&s, "foo-macys-m5", false);
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].account, "foo");

        let m2 = find_matches(&s, "foo-google-g6", false);
        assert_eq!(m2.len(), 1);
        assert_eq!(m2[0].account, "foo");

        let m3 = find_matches(&s, "foo-macys-m6", false);
        assert!(m3.is_empty());
    }

    #[test]
    fn worked_example_aliased() {
        let s = spec(
            "%alias%-%ident%-%code%",
            "CHAR(1,-), CHARS()",
            &["foo"],
            Aliases::ExplicitList(vec!["joe".to_string(), "paul".to_string()]),
        );
        let m = find_matches(&s, "joe-google-g6", false);
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].account, "foo");
    }

    #[test]
    fn worked_example_fqdn() {
        let s = spec(
            "%account%-%fqdn%-%code%",
            "CHAR(1,1,-), CHAR(2,-1,-), CHARS()",
            &["foo"],
            Aliases::Same,
        );
        let m = find_matches(&s, "foo-register.co.uk-ro14", false);
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].account, "foo");
    }

    #[test]
    fn worked_example_two_alphas() {
        let s = spec(
            "%alpha%is%alpha%.%code%",
            "CHARS(1), CHARS(2)",
            &["baz"],
            Aliases::Same,
        );
        let m = find_matches(&s, "samissexy.34", false);
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].account, "baz");
    }

    #[test]
    fn worked_example_alias_and_account_anchor() {
        let s = spec(
            "%account%-%ident%-%alias%-%code%",
            "CHAR(1,-), CHARS()",
            &["foo"],
            Aliases::ExplicitList(vec![
                "18".to_string(),
                "2018".to_string(),
                "19".to_string(),
                "2019".to_string(),
            ]),
        );
        let m = find_matches(&s, "foo-experian-19-e8", false);
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].account, "foo");
    }

    #[test]
    fn rejection_on_flipped_char() {
        let s = spec(
            "%account%-%ident%-%code%",
            "CHAR(1,-), CHARS()",
            &["foo"],
            Aliases::Same,
        );
        assert!(find_matches(&s, "foo-macys-x5", false).is_empty());
    }

    #[test]
    fn case_insensitive_folds_before_matching() {
        let s = spec(
            "%account%-%ident%-%code%",
            "CHAR(1,-), CHARS()",
            &["foo"],
            Aliases::Same,
        );
        let lower = find_matches(&s, "foo-macys-m5", false);
        let upper = find_matches(&s, "FOO-MACYS-M5", false);
        assert_eq!(lower, upper);
    }

    #[test]
    fn uppercase_pattern_literal_folds_when_case_insensitive() {
        let s = spec(
            "%account%X%ident%-%code%",
            "CHAR(1,-), CHARS()",
            &["foo"],
            Aliases::Same,
        );
        let m = find_matches(&s, "foox-macys-m5", false);
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].account, "foo");
    }
}
