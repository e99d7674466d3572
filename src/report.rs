use std::fmt;

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NetworkFailure,
    MalformedResponse,
    InvalidUrl,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::NetworkFailure => f.write_str("network failure"),
            FailureKind::MalformedResponse => f.write_str("malformed response"),
            FailureKind::InvalidUrl => f.write_str("invalid url"),
        }
    }
}

/// Receives every failure the fetchers recover from locally.
pub trait FailureReporter: Send + Sync {
    fn report(&self, kind: FailureKind, context: &str, detail: &str);
}

pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report(&self, kind: FailureKind, context: &str, detail: &str) {
        warn!(%kind, context, detail, "recovered fetch failure");
    }
}
