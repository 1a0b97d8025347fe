//! C3: the specification parser and static validator. Turns comment-
//! stripped source text into a [`ConfigurationSet`], or a non-empty
//! [`DiagnosticList`] on any failure (compile is all-or-nothing: spec §4.2,
//! §4.6, §7).

use std::collections::HashSet;

use crate::calc::{self, CalcOp};
use crate::charclass::CharClass;
use crate::configset::{ConfigurationSet, Options};
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticList};
use crate::pattern::{self, PatternElement};
use crate::specification::{Aliases, Specification};
use crate::token::{self, Statement};

/// Compiles alias-specification source text into a frozen
/// [`ConfigurationSet`]. On failure, every static problem found is
/// reported; the caller's currently-installed configuration (if any) is
/// untouched, since this function only ever builds a new value.
pub fn compile(source: &str) -> Result<ConfigurationSet, DiagnosticList> {
    let stripped = token::strip_comments(source);
    let statements = token::split_statements(&stripped);

    let mut options = Options::default();
    let mut specs: Vec<Specification> = Vec::new();
    let mut diags: DiagnosticList = Vec::new();

    for statement in statements {
        match statement {
            Statement::ConfigItem {
                key,
                value,
                line,
                column,
            } => {
                if let Err(kind) = apply_config_item(&mut options, &key, &value) {
                    diags.push(Diagnostic::new(line, column, kind));
                }
            }
            Statement::AliasSpec { text, line, column } => {
                match parse_alias_spec(&text) {
                    Ok(spec) => {
                        if spec.context_ambiguous {
                            diags.push(Diagnostic::warning(
                                line,
                                column,
                                DiagnosticKind::ContextAmbiguousNoAnchor,
                            ));
                        }
                        specs.push(spec);
                    }
                    Err(kind) => diags.push(Diagnostic::new(line, column, kind)),
                }
            }
        }
    }

    validate_cross_spec(&mut specs, &mut diags);

    if diags.iter().any(Diagnostic::is_error) {
        return Err(diags);
    }

    Ok(ConfigurationSet {
        options,
        specifications: specs,
        warnings: diags,
    })
}

// ---------------------------------------------------------------------
// Config items
// ---------------------------------------------------------------------

fn apply_config_item(options: &mut Options, key: &str, value: &str) -> Result<(), DiagnosticKind> {
    match key {
        "CASE SENSITIVE" => {
            options.case_sensitive = parse_bool(value)?;
        }
        "DEBUG ACCOUNT" => {
            options.debug_account = Some(value.to_string());
        }
        "ALIAS DOMAINS" => {
            options.alias_domains = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        "HOST" => options.host = Some(value.to_string()),
        "PORT" => {
            options.port = Some(
                value
                    .parse::<u16>()
                    .map_err(|_| DiagnosticKind::InvalidInteger(value.to_string()))?,
            );
        }
        "LOGGING" => options.log_level = Some(value.to_string()),
        "STATISTICS" => options.statistics_cadence = Some(value.to_string()),
        "PROCESSOR" => options.preprocess_hook = Some(value.to_string()),
        // Milter-only items: recognized but not consumed by the core.
        "SMTP HOST" | "SMTP PORT" | "LOCAL HOST" | "LOCAL DOMAINS" => {}
        other => return Err(DiagnosticKind::UnknownConfigItem(other.to_string())),
    }
    Ok(())
}

fn parse_bool(value: &str) -> Result<bool, DiagnosticKind> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => Err(DiagnosticKind::MalformedMatchExpr(format!(
            "expected boolean, got '{other}'"
        ))),
    }
}

// ---------------------------------------------------------------------
// Alias specification grammar
// ---------------------------------------------------------------------

struct SpecScanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SpecScanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.bytes.get(self.pos), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn rest(&self) -> &str {
        std::str::from_utf8(&self.bytes[self.pos..]).unwrap_or("")
    }

    fn at_word_boundary(&self, word: &str) -> bool {
        if !self.rest().starts_with(word) {
            return false;
        }
        match self.bytes.get(self.pos + word.len()) {
            None => true,
            Some(b) => !b.is_ascii_alphanumeric() && *b != b'_',
        }
    }

    fn consume_word(&mut self, word: &str) -> bool {
        if self.at_word_boundary(word) {
            self.pos += word.len();
            true
        } else {
            false
        }
    }

    fn read_ident(&mut self) -> Option<String> {
        let start = self.pos;
        while matches!(self.bytes.get(self.pos), Some(b) if is_ident_byte(*b)) {
            self.pos += 1;
        }
        if self.pos == start {
            None
        } else {
            Some(String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned())
        }
    }

    fn read_ident_list(&mut self, stop_words: &[&str]) -> Vec<String> {
        let mut out = Vec::new();
        loop {
            self.skip_ws();
            if stop_words.iter().any(|w| self.at_word_boundary(w)) || self.rest().is_empty() {
                break;
            }
            match self.read_ident() {
                Some(ident) => out.push(ident),
                None => break,
            }
            self.skip_ws();
            if matches!(self.bytes.get(self.pos), Some(b',')) {
                self.pos += 1;
            } else {
                break;
            }
        }
        out
    }

    fn read_match_expr(&mut self) -> Result<String, DiagnosticKind> {
        self.skip_ws();
        if matches!(self.bytes.get(self.pos), Some(b'"')) {
            self.pos += 1;
            let start = self.pos;
            while matches!(self.bytes.get(self.pos), Some(b) if *b != b'"') {
                self.pos += 1;
            }
            if self.bytes.get(self.pos) != Some(&b'"') {
                return Err(DiagnosticKind::UnterminatedString);
            }
            let content = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
            self.pos += 1;
            Ok(content)
        } else {
            let start = self.pos;
            while matches!(self.bytes.get(self.pos), Some(b) if !b.is_ascii_whitespace()) {
                self.pos += 1;
            }
            if self.pos == start {
                return Err(DiagnosticKind::UnexpectedEof("match-expr".to_string()));
            }
            Ok(String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned())
        }
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b'-'
}

fn parse_alias_spec(text: &str) -> Result<Specification, DiagnosticKind> {
    let mut s = SpecScanner::new(text);
    s.skip_ws();
    if !s.consume_word("ACCOUNT") {
        return Err(DiagnosticKind::ExpectedKeyword {
            expected: "ACCOUNT".to_string(),
            found: s.rest().chars().take(16).collect(),
        });
    }

    let accounts = s.read_ident_list(&["USING", "ALIASED", "MATCHES"]);
    if accounts.is_empty() {
        return Err(DiagnosticKind::EmptyAccountList);
    }
    for acc in &accounts {
        if acc.is_empty() {
            return Err(DiagnosticKind::EmptyAccountName(acc.clone()));
        }
    }

    s.skip_ws();
    let default_class = if s.consume_word("USING") {
        s.skip_ws();
        let name = s
            .read_ident()
            .ok_or_else(|| DiagnosticKind::UnexpectedEof("class name".to_string()))?;
        CharClass::from_name(&name).ok_or(DiagnosticKind::UnknownCharClass(name))?
    } else {
        CharClass::Ident
    };

    s.skip_ws();
    let aliases = if s.consume_word("ALIASED") {
        s.skip_ws();
        if matches!(s.bytes.get(s.pos), Some(b'*')) {
            return Err(DiagnosticKind::WildcardAliasNotSupported);
        }
        let list = s.read_ident_list(&["MATCHES"]);
        if list.is_empty() {
            return Err(DiagnosticKind::UnexpectedEof("alias list".to_string()));
        }
        Aliases::ExplicitList(list)
    } else {
        Aliases::Same
    };

    s.skip_ws();
    if !s.consume_word("MATCHES") {
        return Err(DiagnosticKind::ExpectedKeyword {
            expected: "MATCHES".to_string(),
            found: s.rest().chars().take(16).collect(),
        });
    }
    let match_raw = s.read_match_expr()?;
    let pattern = pattern::parse_match_expr(&match_raw)?;

    s.skip_ws();
    if !s.consume_word("WITH") {
        return Err(DiagnosticKind::ExpectedKeyword {
            expected: "WITH".to_string(),
            found: s.rest().chars().take(16).collect(),
        });
    }
    let calc_raw = s.rest().to_string();
    if calc_raw.trim().is_empty() {
        return Err(DiagnosticKind::UnexpectedEof("calc-expr".to_string()));
    }
    let total_ident_fields = pattern::ident_field_sequence(&pattern).len();
    let calc = calc::parse_calc_expr(&calc_raw, total_ident_fields)?;

    validate_specification(&accounts, &aliases, &pattern, &calc)?;

    let context_ambiguous = accounts.len() > 1
        && matches!(aliases, Aliases::Same)
        && !pattern.iter().any(|e| matches!(e, PatternElement::AccountField));

    Ok(Specification {
        accounts,
        aliases,
        default_class,
        fingerprint: match_raw,
        pattern,
        calc,
        context_ambiguous,
    })
}

/// Per-specification invariants (1, 2, 3, 4, 6, 7).
fn validate_specification(
    accounts: &[String],
    aliases: &Aliases,
    pattern: &[PatternElement],
    calc: &[CalcOp],
) -> Result<(), DiagnosticKind> {
    let code_fields = pattern::count_code_fields(pattern);
    if code_fields != 1 {
        return Err(DiagnosticKind::CodeFieldCount(code_fields));
    }

    pattern::check_no_separator_adjacency(pattern)?;

    match aliases {
        Aliases::ExplicitList(_) if accounts.len() != 1 => {
            return Err(DiagnosticKind::AliasListRequiresSingleAccount(
                accounts.len(),
            ));
        }
        _ => {}
    }

    if accounts.len() > 1 && !matches!(aliases, Aliases::Same) {
        return Err(DiagnosticKind::MultiAccountRequiresSameAlias);
    }

    let field_classes: Vec<CharClass> = pattern::ident_field_sequence(pattern)
        .into_iter()
        .map(|(class, _)| class)
        .collect();
    calc::validate_calc_ops(calc, &field_classes)?;

    Ok(())
}

/// Cross-specification invariants (3, 5, 7's reporting) that need the whole
/// set to check: duplicate accounts/aliases, and the context-ambiguous flag
/// (which is informational, not itself an error).
fn validate_cross_spec(specs: &mut [Specification], diags: &mut DiagnosticList) {
    let mut seen_accounts: HashSet<String> = HashSet::new();
    let mut seen_aliases: HashSet<String> = HashSet::new();

    for spec in specs.iter() {
        for account in &spec.accounts {
            if !seen_accounts.insert(account.clone()) {
                diags.push(Diagnostic::new(
                    0,
                    0,
                    DiagnosticKind::DuplicateAccount(account.clone()),
                ));
            }
        }
        let alias_names: Vec<String> = match &spec.aliases {
            Aliases::Same => spec.accounts.clone(),
            Aliases::ExplicitList(list) => list.clone(),
        };
        for alias in alias_names {
            if !seen_aliases.insert(alias.clone()) {
                diags.push(Diagnostic::new(
                    0,
                    0,
                    DiagnosticKind::DuplicateAlias(alias),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_simple_spec() {
        let src = r#"ACCOUNT foo MATCHES "%account%-%ident%-%code%" WITH CHAR(1,-), CHARS();"#;
        let config = compile(src).expect("should compile");
        assert_eq!(config.specifications.len(), 1);
        assert_eq!(config.specifications[0].accounts, vec!["foo".to_string()]);
    }

    #[test]
    fn rejects_missing_code_field() {
        let src = r#"ACCOUNT foo MATCHES "%account%-%ident%" WITH CHARS();"#;
        let err = compile(src).unwrap_err();
        assert!(matches!(
            err[0].kind,
            DiagnosticKind::CodeFieldCount(0)
        ));
    }

    #[test]
    fn rejects_duplicate_account() {
        let src = r#"
ACCOUNT foo MATCHES "%account%-%code%" WITH LITERAL(x);
ACCOUNT foo MATCHES "%account%-%code%-z" WITH LITERAL(xz);
"#;
        let err = compile(src).unwrap_err();
        assert!(
            err.iter()
                .any(|d| matches!(&d.kind, DiagnosticKind::DuplicateAccount(a) if a == "foo"))
        );
    }

    #[test]
    fn rejects_ambiguous_adjacency() {
        let src = r#"ACCOUNT foo MATCHES "%ident%%ident%-%code%" WITH CHARS(1), CHARS(2);"#;
        let err = compile(src).unwrap_err();
        assert!(matches!(
            err[0].kind,
            DiagnosticKind::AmbiguousAdjacency(_)
        ));
    }

    #[test]
    fn flags_context_ambiguous_without_account_anchor() {
        let src = r#"ACCOUNT foo, bar MATCHES "%ident%-%code%" WITH CHAR(1,-), CHARS();"#;
        let config = compile(src).expect("should compile");
        assert!(config.specifications[0].context_ambiguous);
        assert!(config.warnings.iter().any(|d| matches!(
            d.kind,
            DiagnosticKind::ContextAmbiguousNoAnchor
        )));
        assert!(config.warnings.iter().all(|d| !d.is_error()));
    }

    #[test]
    fn aliased_star_is_rejected_with_dedicated_kind() {
        let src = r#"ACCOUNT foo ALIASED * MATCHES "%alias%-%code%" WITH LITERAL(x);"#;
        let err = compile(src).unwrap_err();
        assert!(matches!(
            err[0].kind,
            DiagnosticKind::WildcardAliasNotSupported
        ));
    }

    #[test]
    fn multi_account_with_explicit_alias_is_rejected() {
        let src = r#"ACCOUNT foo, bar ALIASED baz MATCHES "%alias%-%code%" WITH LITERAL(x);"#;
        let err = compile(src).unwrap_err();
        assert!(matches!(
            err[0].kind,
            DiagnosticKind::MultiAccountRequiresSameAlias
        ));
    }

    #[test]
    fn config_items_parse() {
        let src = "CASE SENSITIVE: true\nDEBUG ACCOUNT: postmaster\nALIAS DOMAINS: example.com, example.org\n";
        let config = compile(src).expect("should compile");
        assert!(config.options.case_sensitive);
        assert_eq!(config.options.debug_account.as_deref(), Some("postmaster"));
        assert_eq!(config.options.alias_domains.len(), 2);
    }
}
