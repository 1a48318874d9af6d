use std::collections::HashMap;

use crate::error::TransferError;

/// Parsed `HTTP/<ver> <code> <reason>` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub version: String,
    pub status:  u16,
    pub reason:  String,
}

/// Parse a response status line. Trailing CR/LF is ignored.
///
/// A missing `HTTP/` prefix, a missing version, or a status code that is not
/// exactly three digits is a [`TransferError::BadResponse`].
pub fn parse_status_line(line: &str) -> Result<StatusLine, TransferError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let bad = || TransferError::BadResponse(format!("invalid status line {line:?}"));

    let rest = line.strip_prefix("HTTP/").ok_or_else(bad)?;
    let mut parts = rest.splitn(3, ' ');
    let version = parts.next().filter(|v| !v.is_empty()).ok_or_else(bad)?;
    let code = parts.next().ok_or_else(bad)?;
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    let status = code.parse().map_err(|_| bad())?;
    let reason = parts.next().unwrap_or("").trim().to_string();

    Ok(StatusLine {
        version: version.to_string(),
        status,
        reason,
    })
}

/// Response headers keyed case-insensitively. A repeated header keeps its
/// last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: HashMap<String, String>,
}

impl Headers {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.entries.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Add a raw `Name: value` line. Returns `false` for lines without a
    /// colon, which are left out.
    pub fn push_line(&mut self, line: &str) -> bool {
        let line = line.trim_end_matches(['\r', '\n']);
        match line.split_once(':') {
            Some((name, value)) if !name.trim().is_empty() => {
                self.insert(name.trim(), value.trim());
                true
            }
            _ => false,
        }
    }

    /// The declared body length, if any.
    pub fn content_length(&self) -> Result<Option<u64>, TransferError> {
        self.get("content-length")
            .map(|v| {
                v.parse::<u64>()
                    .map_err(|_| TransferError::BadResponse(format!("invalid Content-Length {v:?}")))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_ok() {
        let line = parse_status_line("HTTP/1.0 200 OK\r\n").unwrap();
        assert_eq!(line.version, "1.0");
        assert_eq!(line.status, 200);
        assert_eq!(line.reason, "OK");
    }

    #[test]
    fn status_line_multiword_reason() {
        let line = parse_status_line("HTTP/1.1 500 Internal Server Error").unwrap();
        assert_eq!(line.status, 500);
        assert_eq!(line.reason, "Internal Server Error");
    }

    #[test]
    fn status_line_without_reason() {
        let line = parse_status_line("HTTP/1.1 204").unwrap();
        assert_eq!(line.status, 204);
        assert_eq!(line.reason, "");
    }

    #[test]
    fn status_line_malformed() {
        for raw in ["", "garbage", "HTTP/1.0", "HTTP/1.0 OK 200", "HTTP/1.0 20x OK", "HTTP/ 200 OK", "ICY 200 OK"] {
            assert!(
                matches!(parse_status_line(raw), Err(TransferError::BadResponse(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn headers_are_case_insensitive_and_last_wins() {
        let mut headers = Headers::new();
        assert!(headers.push_line("Content-Length: 5\r\n"));
        assert!(headers.push_line("content-length: 7"));
        assert!(!headers.push_line("no colon here"));
        assert_eq!(headers.get("CONTENT-LENGTH"), Some("7"));
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.content_length().unwrap(), Some(7));
    }

    #[test]
    fn content_length_absent_or_invalid() {
        let mut headers = Headers::new();
        assert_eq!(headers.content_length().unwrap(), None);
        headers.insert("Content-Length", "five");
        assert!(matches!(headers.content_length(), Err(TransferError::BadResponse(_))));
    }
}
