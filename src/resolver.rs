//! C6: runs every Specification in a [`crate::ConfigurationSet`] against an
//! input and applies the disambiguation policy (§4.5).

use crate::configset::{ConfigurationSet, Mode};
use crate::matcher;

/// The outcome of one `resolve` call.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Match { account: String, reply: String },
    NotFound,
    Debug { reply: String },
}

/// Runs `resolve(configuration_set, mode, raw_input)` per spec §6.
pub fn resolve(config: &ConfigurationSet, mode: Mode, raw_input: &str) -> Resolved {
    let (local, domain) = match mode {
        Mode::Account => (raw_input, None),
        Mode::Virtual => {
            if config.options.alias_domains.is_empty() {
                (raw_input, None)
            } else {
                match raw_input.rsplit_once('@') {
                    None => return Resolved::NotFound,
                    Some((local, domain)) => {
                        let matches_domain = config.options.alias_domains.iter().any(|d| {
                            if config.options.case_sensitive {
                                d == domain
                            } else {
                                d.eq_ignore_ascii_case(domain)
                            }
                        });
                        if !matches_domain {
                            return Resolved::NotFound;
                        }
                        (local, Some(domain))
                    }
                }
            }
        }
    };

    let case_sensitive = config.options.case_sensitive;
    let mut winning_accounts: Vec<String> = Vec::new();

    for spec in &config.specifications {
        let outcomes = matcher::find_matches(spec, local, case_sensitive);
        for outcome in outcomes {
            if !winning_accounts.contains(&outcome.account) {
                winning_accounts.push(outcome.account);
            }
        }
    }

    match winning_accounts.len() {
        0 => Resolved::NotFound,
        1 => {
            let account = winning_accounts.into_iter().next().unwrap();
            let reply = match domain {
                Some(domain) => format!("{account}@{domain}"),
                None => account.clone(),
            };
            Resolved::Match { account, reply }
        }
        _ => match &config.options.debug_account {
            Some(debug_account) => {
                let reply = match domain {
                    Some(domain) => format!("{debug_account}@{domain}"),
                    None => debug_account.clone(),
                };
                Resolved::Debug { reply }
            }
            None => Resolved::NotFound,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;

    #[test]
    fn account_form_resolves() {
        let src = r#"
ACCOUNT foo MATCHES "%account%-%ident%-%code%" WITH CHAR(1,-), CHARS();
"#;
        let config = compile(src).expect("compiles");
        match resolve(&config, Mode::Account, "foo-macys-m5") {
            Resolved::Match { account, reply } => {
                assert_eq!(account, "foo");
                assert_eq!(reply, "foo");
            }
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn virtual_form_resolves_with_domain() {
        let src = r#"
ALIAS DOMAINS: example.com
ACCOUNT foo MATCHES "%account%-%ident%-%code%" WITH CHAR(1,-), CHARS();
"#;
        let config = compile(src).expect("compiles");
        match resolve(&config, Mode::Virtual, "foo-macys-m5@example.com") {
            Resolved::Match { account, reply } => {
                assert_eq!(account, "foo");
                assert_eq!(reply, "foo@example.com");
            }
            other => panic!("expected match, got {other:?}"),
        }
        assert_eq!(
            resolve(&config, Mode::Virtual, "foo-macys-m5@other.com"),
            Resolved::NotFound
        );
    }

    #[test]
    fn ambiguity_falls_back_to_debug_account() {
        let src = r#"
DEBUG ACCOUNT: debughole
ACCOUNT foo MATCHES "%account%-%code%" WITH LITERAL(x);
ACCOUNT bar ALIASED foo MATCHES "%alias%-%code%" WITH LITERAL(x);
"#;
        let config = compile(src).expect("compiles");
        match resolve(&config, Mode::Account, "foo-x") {
            Resolved::Debug { reply } => assert_eq!(reply, "debughole"),
            other => panic!("expected debug fallback, got {other:?}"),
        }
    }

    #[test]
    fn ambiguity_without_debug_account_is_not_found() {
        let src = r#"
ACCOUNT foo MATCHES "%account%-%code%" WITH LITERAL(x);
ACCOUNT bar ALIASED foo MATCHES "%alias%-%code%" WITH LITERAL(x);
"#;
        let config = compile(src).expect("compiles");
        assert_eq!(
            resolve(&config, Mode::Account, "foo-x"),
            Resolved::NotFound
        );
    }
}
