use crate::data::TransferRequest;

/// Serialize the request line and headers, including the blank line.
///
/// Requests are HTTP/1.0 with no `Host` header; storage nodes route on the
/// path alone. `Content-Length` is sent whenever the request declares a body
/// length, including zero.
pub fn encode_request_head(request: &TransferRequest) -> Vec<u8> {
    let url = request.url();
    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }

    let mut head = format!("{} {} HTTP/1.0\r\n", request.method(), target);
    if let Some(len) = request.content_length() {
        head.push_str(&format!("Content-Length: {len}\r\n"));
    }
    head.push_str("\r\n");
    head.into_bytes()
}
