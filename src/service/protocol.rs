//! S2: the Postfix `tcp_table(5)` line protocol.
//!
//! `get <key>\n` comes in percent-encoded; `200 <value>\n` /
//! `500 <reason>\n` / `400 <reason>\n` go back out, with the value
//! percent-encoded symmetrically. This module only knows the wire format —
//! it has no knowledge of [`crate::resolve`] or the resolver's outcomes;
//! `server` is what bridges the two.

use crate::service::error::ServiceError;

/// Bytes that never need escaping on either side of the wire (`spec.md`
/// §6's outbound-interface contract).
fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#'
                | b'$'
                | b'%'
                | b'&'
                | b'\''
                | b'*'
                | b'+'
                | b'-'
                | b'/'
                | b'='
                | b'?'
                | b'^'
                | b'_'
                | b'`'
                | b'{'
                | b'|'
                | b'}'
                | b'~'
                | b'.'
                | b'@'
        )
}

/// One request line parsed off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `get <key>`, already percent-decoded.
    Get(String),
    /// Administrative `stats` command.
    Stats,
    /// Administrative `jstats` command (JSON counters, `with-serde` only).
    JStats,
}

/// A reply ready to be written back, already percent-encoded where needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ok(String),
    NotFound(String),
    Bad(String),
    Text(String),
}

impl Reply {
    pub fn to_line(&self) -> String {
        match self {
            Reply::Ok(value) => format!("200 {}\n", percent_encode(value)),
            Reply::NotFound(reason) => format!("500 {reason}\n"),
            Reply::Bad(reason) => format!("400 {reason}\n"),
            Reply::Text(text) => format!("{text}\n"),
        }
    }
}

/// Percent-encodes every byte of `s` outside the unreserved set.
pub fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        if is_unreserved(b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

/// Decodes `%HH` escapes; rejects a trailing incomplete escape or
/// non-hexadecimal digits.
pub fn percent_decode(s: &str) -> Result<String, ServiceError> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3).ok_or_else(|| {
                ServiceError::MalformedRequest("truncated '%HH' escape".to_string())
            })?;
            let hex_str = std::str::from_utf8(hex)
                .map_err(|_| ServiceError::MalformedRequest("non-ASCII '%HH' escape".to_string()))?;
            let byte = u8::from_str_radix(hex_str, 16).map_err(|_| {
                ServiceError::MalformedRequest(format!("invalid hex escape '%{hex_str}'"))
            })?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out)
        .map_err(|_| ServiceError::MalformedRequest("decoded request is not valid UTF-8".to_string()))
}

/// Parses one line (trailing `\n` already stripped by the caller) into a
/// [`Request`], or a malformed-request error (`400`, per `spec.md` §6/§7's
/// `MalformedQuery`).
pub fn parse_request(line: &str) -> Result<Request, ServiceError> {
    let trimmed = line.trim_end_matches('\r');
    if trimmed == "stats" {
        return Ok(Request::Stats);
    }
    if trimmed == "jstats" {
        return Ok(Request::JStats);
    }
    let rest = trimmed
        .strip_prefix("get ")
        .ok_or_else(|| ServiceError::MalformedRequest("expected 'get <key>'".to_string()))?;
    if rest.is_empty() {
        return Err(ServiceError::MalformedRequest("empty key".to_string()));
    }
    let key = percent_decode(rest)?;
    if key.is_empty() {
        return Err(ServiceError::MalformedRequest(
            "key decodes to an empty string".to_string(),
        ));
    }
    Ok(Request::Get(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_plain_key() {
        assert_eq!(parse_request("get foo-macys-m5").unwrap(), Request::Get("foo-macys-m5".to_string()));
    }

    #[test]
    fn decodes_percent_escapes() {
        assert_eq!(
            parse_request("get foo%40example.com").unwrap(),
            Request::Get("foo@example.com".to_string())
        );
    }

    #[test]
    fn rejects_missing_get_prefix() {
        assert!(parse_request("foo-macys-m5").is_err());
    }

    #[test]
    fn rejects_truncated_escape() {
        assert!(parse_request("get foo%4").is_err());
    }

    #[test]
    fn encodes_reserved_bytes() {
        assert_eq!(percent_encode("a b"), "a%20b");
        assert_eq!(percent_encode("foo@example.com"), "foo@example.com");
    }

    #[test]
    fn recognizes_administrative_commands() {
        assert_eq!(parse_request("stats").unwrap(), Request::Stats);
        assert_eq!(parse_request("jstats").unwrap(), Request::JStats);
    }

    #[test]
    fn reply_lines_match_contract() {
        assert_eq!(Reply::Ok("foo".to_string()).to_line(), "200 foo\n");
        assert_eq!(Reply::NotFound("not found".to_string()).to_line(), "500 not found\n");
        assert_eq!(Reply::Bad("malformed".to_string()).to_line(), "400 malformed\n");
    }
}
