//! C2: the line-oriented statement splitter.
//!
//! This stage knows nothing about alias-specification grammar or config-item
//! names; it only knows how to tell a config statement apart from an alias
//! specification, strip comments, and track line/column positions for
//! diagnostics. The real grammar work happens in [`crate::parser`].

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `KEY : value`, single line.
    ConfigItem {
        key: String,
        value: String,
        line: usize,
        column: usize,
    },
    /// Raw text of one `ACCOUNT ... ;` clause, which may span several
    /// physical lines. `line`/`column` point at the `ACCOUNT` keyword.
    AliasSpec {
        text: String,
        line: usize,
        column: usize,
    },
}

/// Strips `#`-to-end-of-line comments, leaving newlines in place so line
/// numbers in later stages stay accurate. A comment cannot start inside a
/// quoted string; the quote state resets at each newline, matching the
/// grammar's assumption that quoted match expressions never span lines.
pub fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut in_quotes = false;
    for line in source.split_inclusive('\n') {
        in_quotes = false;
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '"' => {
                    in_quotes = !in_quotes;
                    out.push(c);
                }
                '#' if !in_quotes => {
                    // drop the rest of the line except a trailing newline
                    if line.ends_with('\n') {
                        out.push('\n');
                    }
                    break;
                }
                _ => out.push(c),
            }
        }
    }
    out
}

struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            bytes: src.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(b)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.advance();
        }
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn rest_starts_with(&self, word: &str) -> bool {
        self.bytes[self.pos..].starts_with(word.as_bytes())
    }
}

/// Splits a comment-stripped source text into a sequence of [`Statement`]s.
pub fn split_statements(source: &str) -> Vec<Statement> {
    let mut scanner = Scanner::new(source);
    let mut out = Vec::new();

    loop {
        scanner.skip_ws();
        if scanner.at_eof() {
            break;
        }
        let (line, column) = (scanner.line, scanner.column);

        if scanner.rest_starts_with("ACCOUNT") {
            let start = scanner.pos;
            let mut in_quotes = false;
            let mut end = None;
            let mut cursor = scanner.pos;
            while cursor < scanner.bytes.len() {
                let b = scanner.bytes[cursor];
                match b {
                    b'"' => in_quotes = !in_quotes,
                    b';' if !in_quotes => {
                        end = Some(cursor);
                        break;
                    }
                    _ => {}
                }
                cursor += 1;
            }
            let stop = end.unwrap_or(scanner.bytes.len());
            let text = String::from_utf8_lossy(&scanner.bytes[start..stop]).into_owned();
            // advance the real scanner (to keep line/col bookkeeping correct)
            while scanner.pos < stop {
                scanner.advance();
            }
            if end.is_some() {
                scanner.advance(); // consume the ';'
            }
            out.push(Statement::AliasSpec { text, line, column });
        } else {
            // config-stmt: rest of the physical line
            let start = scanner.pos;
            let mut cursor = scanner.pos;
            while cursor < scanner.bytes.len() && scanner.bytes[cursor] != b'\n' {
                cursor += 1;
            }
            let raw = String::from_utf8_lossy(&scanner.bytes[start..cursor]).into_owned();
            while scanner.pos < cursor {
                scanner.advance();
            }
            if !scanner.at_eof() {
                scanner.advance(); // consume '\n'
            }
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            match trimmed.split_once(':') {
                Some((key, value)) => out.push(Statement::ConfigItem {
                    key: key.trim().to_string(),
                    value: value.trim().to_string(),
                    line,
                    column,
                }),
                None => out.push(Statement::ConfigItem {
                    key: trimmed.to_string(),
                    value: String::new(),
                    line,
                    column,
                }),
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_line_comments() {
        let src = "HOST: localhost # comment\nPORT: 3047\n";
        let stripped = strip_comments(src);
        assert_eq!(stripped, "HOST: localhost \nPORT: 3047\n");
    }

    #[test]
    fn keeps_hash_inside_quotes() {
        let src = "ACCOUNT foo MATCHES \"%ident%#%code%\" WITH CHARS();\n";
        let stripped = strip_comments(src);
        assert!(stripped.contains("%ident%#%code%"));
    }

    #[test]
    fn splits_config_and_spec() {
        let src = "CASE SENSITIVE: false\nACCOUNT foo MATCHES \"%account%-%code%\" WITH CHARS();\nPORT: 3047\n";
        let stmts = split_statements(src);
        assert_eq!(stmts.len(), 3);
        match &stmts[0] {
            Statement::ConfigItem { key, value, .. } => {
                assert_eq!(key, "CASE SENSITIVE");
                assert_eq!(value, "false");
            }
            _ => panic!("expected config item"),
        }
        match &stmts[1] {
            Statement::AliasSpec { text, .. } => {
                assert!(text.trim_start().starts_with("ACCOUNT foo"));
            }
            _ => panic!("expected alias spec"),
        }
    }

    #[test]
    fn multiline_spec() {
        let src = "ACCOUNT foo\nMATCHES \"%account%-%code%\"\nWITH CHARS();\n";
        let stmts = split_statements(src);
        assert_eq!(stmts.len(), 1);
    }
}
