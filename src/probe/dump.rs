//! Textual request/response dumps for verbose output.

use std::fmt::Write;
use bytes::Bytes;
use http::{HeaderMap, Request};
use http_body_util::Full;
use crate::probe::check::ProbeResponse;

/// Dump an outgoing request: request line and headers.
pub fn dump_request(request: &Request<Full<Bytes>>) -> String {
    let mut out = String::from("\n");
    let _ = write!(out, "{} {} {:?}\r\n", request.method(), request.uri(), request.version());
    write_headers(&mut out, request.headers());
    out.push_str("\r\n");
    out
}

/// Dump a received response: status line, headers and body.
///
/// Binary bodies are rendered lossily.
pub fn dump_response(response: &ProbeResponse) -> String {
    let mut out = String::from("\n");
    let _ = write!(out, "{:?} {}\r\n", response.version, response.status);
    write_headers(&mut out, &response.headers);
    out.push_str("\r\n");
    out.push_str(&String::from_utf8_lossy(&response.body));
    out
}

fn write_headers(out: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        let _ = write!(out, "{}: {}\r\n", name, String::from_utf8_lossy(value.as_bytes()));
    }
}
