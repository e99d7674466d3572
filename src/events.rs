use std::sync::Arc;

use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use crate::client::PageSource;
use crate::filter::{events_url, FilterCriteria};
use crate::models::Event;
use crate::report::{FailureKind, FailureReporter};

const CONTEXT: &str = "event list";

pub struct EventListFetcher {
    source: Arc<dyn PageSource>,
    reporter: Arc<dyn FailureReporter>,
    base: Url,
}

impl EventListFetcher {
    pub fn new(source: Arc<dyn PageSource>, reporter: Arc<dyn FailureReporter>, base: Url) -> Self {
        Self {
            source,
            reporter,
            base,
        }
    }

    pub fn url_for(&self, criteria: &FilterCriteria) -> Option<Url> {
        match events_url(&self.base, criteria) {
            Ok(url) => Some(url),
            Err(err) => {
                self.reporter
                    .report(FailureKind::InvalidUrl, CONTEXT, &err.to_string());
                None
            }
        }
    }

    /// Never fails: every problem is reported and yields an empty list.
    pub async fn fetch_events(&self, criteria: &FilterCriteria) -> Vec<Event> {
        let Some(url) = self.url_for(criteria) else {
            return Vec::new();
        };
        debug!(%url, "fetching event list");

        let body = match self.source.fetch_text(&url).await {
            Ok(body) => body,
            Err(err) => {
                self.reporter
                    .report(FailureKind::NetworkFailure, CONTEXT, &err.to_string());
                return Vec::new();
            }
        };

        match parse_events(&body) {
            Ok((events, dropped)) => {
                if dropped > 0 {
                    self.reporter.report(
                        FailureKind::MalformedResponse,
                        CONTEXT,
                        &format!("dropped {dropped} element(s) without a usable id"),
                    );
                }
                events
            }
            Err(err) => {
                self.reporter
                    .report(FailureKind::MalformedResponse, CONTEXT, &err);
                Vec::new()
            }
        }
    }
}

/// Decodes a JSON array of events element by element. Elements without an
/// integer `id` are counted and skipped; other absent fields default.
pub fn parse_events(body: &str) -> Result<(Vec<Event>, usize), String> {
    let payload: Value =
        serde_json::from_str(body).map_err(|err| format!("invalid json: {err}"))?;
    let items = match payload {
        Value::Array(items) => items,
        other => return Err(format!("expected a json array, got {}", kind_of(&other))),
    };

    let mut events = Vec::with_capacity(items.len());
    let mut dropped = 0;
    for item in items {
        if !item.get("id").map(Value::is_i64).unwrap_or(false) {
            dropped += 1;
            continue;
        }
        match serde_json::from_value::<Event>(item) {
            Ok(event) => events.push(event),
            Err(err) => {
                debug!("skipping undecodable event: {err}");
                dropped += 1;
            }
        }
    }
    Ok((events, dropped))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
