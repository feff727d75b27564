use reqwest::Method;
use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

/// A request built for exactly one iteration. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    method: Method,
    url: String,
    body: Vec<u8>,
    headers: Vec<(String, String)>,
}

impl Request {
    pub fn new(method: Method, url: &str, body: Vec<u8>, headers: Vec<(String, String)>) -> Self {
        Self {
            method,
            url: url.to_string(),
            body,
            headers,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
    pub latency: Duration,
}

impl Response {
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportFailureKind {
    Timeout,
    Connect,
    Body,
    Request,
}

impl fmt::Display for TransportFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportFailureKind::Timeout => "timeout",
            TransportFailureKind::Connect => "connect",
            TransportFailureKind::Body => "body",
            TransportFailureKind::Request => "request",
        };
        f.write_str(s)
    }
}

/// No response was obtained. `latency` runs from send to the failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportFailure {
    pub kind: TransportFailureKind,
    pub cause: String,
    pub latency: Duration,
}

/// Result of sending one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Response(Response),
    TransportFailure(TransportFailure),
}

impl Outcome {
    pub fn latency(&self) -> Duration {
        match self {
            Outcome::Response(r) => r.latency,
            Outcome::TransportFailure(f) => f.latency,
        }
    }

    /// `None` for transport failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Outcome::Response(r) => Some(r.status),
            Outcome::TransportFailure(_) => None,
        }
    }

    pub fn response(&self) -> Option<&Response> {
        match self {
            Outcome::Response(r) => Some(r),
            Outcome::TransportFailure(_) => None,
        }
    }
}
