use std::fmt;

use url::Url;

use crate::error::TransferError;

/// HTTP methods used against storage nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Head,
    Get,
    Put,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Head => "HEAD",
            Method::Get => "GET",
            Method::Put => "PUT",
        }
    }

    /// Whether a response to this method carries a body.
    pub fn expects_body(&self) -> bool { !matches!(self, Method::Head) }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// A single request against one replica. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    method:         Method,
    url:            Url,
    content_length: Option<u64>,
}

impl TransferRequest {
    pub fn head(url: Url) -> Self {
        Self {
            method: Method::Head,
            url,
            content_length: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            content_length: None,
        }
    }

    /// A PUT whose body is exactly `content_length` bytes.
    pub fn put(url: Url, content_length: u64) -> Self {
        Self {
            method: Method::Put,
            url,
            content_length: Some(content_length),
        }
    }

    pub fn method(&self) -> Method { self.method }

    pub fn url(&self) -> &Url { &self.url }

    pub fn content_length(&self) -> Option<u64> { self.content_length }
}

/// Parse a tracker-supplied location into an HTTP URL.
///
/// Bare filesystem paths and other schemes point at storage the client
/// cannot reach over this transport.
pub fn parse_replica_url(location: &str) -> Result<Url, TransferError> {
    let url = Url::parse(location).map_err(|_| TransferError::UnsupportedPath(location.to_string()))?;
    if url.scheme() != "http" || url.host_str().is_none() {
        return Err(TransferError::UnsupportedPath(location.to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_http_locations() {
        let url = parse_replica_url("http://127.0.0.1:7500/dev1/0/000/000/0000000062.fid").unwrap();
        assert_eq!(url.port_or_known_default(), Some(7500));
        assert_eq!(url.path(), "/dev1/0/000/000/0000000062.fid");
    }

    #[test]
    fn rejects_filesystem_paths_and_other_schemes() {
        for location in ["/path", "dev1/0/1.fid", "file:///var/mogdata/dev1", "https://a/b", "ftp://a/b"] {
            match parse_replica_url(location) {
                Err(TransferError::UnsupportedPath(p)) => assert_eq!(p, location),
                other => panic!("expected UnsupportedPath for {location}, got {other:?}"),
            }
        }
    }

    #[test]
    fn put_carries_length() {
        let url = parse_replica_url("http://h/p").unwrap();
        let req = TransferRequest::put(url, 0);
        assert_eq!(req.method(), Method::Put);
        assert_eq!(req.content_length(), Some(0));
        assert!(!Method::Head.expects_body());
    }
}
