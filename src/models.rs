use serde::{Deserialize, Serialize};

use crate::region::{derive_region, Region};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Event {
    pub id: i64,
    #[serde(default)]
    pub datetime: String,
    #[serde(default)]
    pub name: String, // "when, what, where"
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub location: EventLocation,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct EventLocation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gps: String,
}

impl Event {
    /// Second segment of the comma separated name, which is the incident
    /// description on the list endpoint.
    pub fn headline(&self) -> String {
        let segments = self.name_segments();
        match segments.get(1) {
            Some(segment) => segment.to_string(),
            None => self.name.trim().to_string(),
        }
    }

    /// "<place>, <when>" built from the last and first name segments.
    pub fn subtitle(&self) -> String {
        let segments = self.name_segments();
        match (segments.first(), segments.last()) {
            (Some(first), Some(last)) if segments.len() > 1 => format!("{last}, {first}"),
            _ => self.name.trim().to_string(),
        }
    }

    /// Map region for this event, `None` when the gps string is unusable.
    pub fn region(&self) -> Option<Region> {
        derive_region(&self.location.gps).ok()
    }

    fn name_segments(&self) -> Vec<&str> {
        self.name
            .split(',')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .collect()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct DetailContent {
    pub preamble: String,
    pub body: String,
}

impl DetailContent {
    pub fn new(preamble: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            preamble: preamble.into(),
            body: body.into(),
        }
    }

    /// True only when neither fragment was found; renderers show a
    /// placeholder in that case.
    pub fn is_empty(&self) -> bool {
        self.preamble.is_empty() && self.body.is_empty()
    }
}
