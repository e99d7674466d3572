//! Scripted collaborators shared by the async tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Url;
use tokio::sync::Notify;

use crate::client::{FetchError, PageSource};
use crate::report::{FailureKind, FailureReporter};

pub const BASE: &str = "https://polisen.se/";

pub fn base() -> Url {
    Url::parse(BASE).expect("test base url")
}

enum Reply {
    Body(String),
    Status(u16),
}

#[derive(Default)]
pub struct ScriptedSource {
    replies: Mutex<HashMap<String, Reply>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, url: &str, body: &str) {
        self.replies
            .lock()
            .expect("replies")
            .insert(url.to_string(), Reply::Body(body.to_string()));
    }

    pub fn fail(&self, url: &str, status: u16) {
        self.replies
            .lock()
            .expect("replies")
            .insert(url.to_string(), Reply::Status(status));
    }

    /// Holds requests for `url` until the returned handle is notified.
    pub fn gate(&self, url: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .expect("gates")
            .insert(url.to_string(), notify.clone());
        notify
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls
            .lock()
            .expect("calls")
            .iter()
            .filter(|called| called.as_str() == url)
            .count()
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch_text(&self, url: &Url) -> Result<String, FetchError> {
        let key = url.to_string();
        self.calls.lock().expect("calls").push(key.clone());

        let gate = self.gates.lock().expect("gates").get(&key).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        match self.replies.lock().expect("replies").get(&key) {
            Some(Reply::Body(body)) => Ok(body.clone()),
            Some(Reply::Status(status)) => Err(FetchError::Status {
                url: key,
                status: *status,
            }),
            None => Err(FetchError::Request {
                url: key,
                reason: "connection refused".to_string(),
            }),
        }
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<FailureKind>>,
}

impl RecordingReporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn kinds(&self) -> Vec<FailureKind> {
        self.reports.lock().expect("reports").clone()
    }
}

impl FailureReporter for RecordingReporter {
    fn report(&self, kind: FailureKind, _context: &str, _detail: &str) {
        self.reports.lock().expect("reports").push(kind);
    }
}
