use crate::request::{Outcome, Request, Response, TransportFailure, TransportFailureKind};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Sends one request and reports what happened. Implementations never fail: every error becomes
/// an [`Outcome::TransportFailure`].
#[async_trait]
pub trait Executor: Send + Sync + 'static {
    async fn execute(&self, request: &Request) -> Outcome;
}

/// HTTP executor backed by one pooled [`reqwest::Client`] shared by every virtual user.
#[derive(Clone, Debug)]
pub struct HttpExecutor {
    client: reqwest::Client,
}

impl HttpExecutor {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Executor for HttpExecutor {
    async fn execute(&self, request: &Request) -> Outcome {
        let mut builder = self
            .client
            .request(request.method().clone(), request.url())
            .body(request.body().to_vec());
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }

        // Latency covers the full body, not just the headers.
        let start = Instant::now();
        let res = match builder.send().await {
            Ok(res) => res,
            Err(e) => return failure(e, start.elapsed()),
        };

        let status = res.status().as_u16();
        match res.bytes().await {
            Ok(body) => Outcome::Response(Response {
                status,
                body: body.to_vec(),
                latency: start.elapsed(),
            }),
            Err(e) => failure(e, start.elapsed()),
        }
    }
}

fn failure(e: reqwest::Error, latency: Duration) -> Outcome {
    let kind = if e.is_timeout() {
        TransportFailureKind::Timeout
    } else if e.is_connect() {
        TransportFailureKind::Connect
    } else if e.is_body() || e.is_decode() {
        TransportFailureKind::Body
    } else {
        TransportFailureKind::Request
    };
    trace!("Transport failure ({kind}): {e}");

    Outcome::TransportFailure(TransportFailure {
        kind,
        cause: e.to_string(),
        latency,
    })
}
