use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use url::{form_urlencoded, Url};

const EVENTS_PATH: &str = "api/events";
const SET_SEPARATOR: &str = ";";
const TIMEZONE: Tz = chrono_tz::Europe::Stockholm;

pub const DATE_KEY: &str = "DateTime";
pub const LOCATION_KEY: &str = "locationname";
pub const TYPE_KEY: &str = "type";

pub const KNOWN_LOCATIONS: [&str; 3] = ["Stockholm", "Göteborg", "Malmö"];
pub const KNOWN_TYPES: [&str; 3] = ["Brand", "Inbrott", "Detonation"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub date: Option<NaiveDate>,
    pub locations: BTreeSet<String>,
    pub types: BTreeSet<String>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.locations.is_empty() && self.types.is_empty()
    }

    /// Dates after today (Stockholm time) are clamped to today.
    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = Some(date.min(latest_selectable_date()));
    }

    /// Accepts an ISO `YYYY-MM-DD` date; anything else clears the date.
    pub fn set_date_str(&mut self, text: &str) {
        match NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d") {
            Ok(date) => self.set_date(date),
            Err(_) => self.date = None,
        }
    }

    pub fn clear_date(&mut self) {
        self.date = None;
    }

    pub fn toggle_location(&mut self, location: &str) {
        toggle_member(&mut self.locations, location);
    }

    pub fn set_locations<I, S>(&mut self, locations: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locations = collect_members(locations);
    }

    pub fn toggle_type(&mut self, kind: &str) {
        toggle_member(&mut self.types, kind);
    }

    pub fn set_types<I, S>(&mut self, types: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = collect_members(types);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Unencoded parameters in wire order, omitting empty fields.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(date) = self.date {
            pairs.push((DATE_KEY, date.format("%Y-%m-%d").to_string()));
        }
        if !self.locations.is_empty() {
            pairs.push((LOCATION_KEY, join_members(&self.locations)));
        }
        if !self.types.is_empty() {
            pairs.push((TYPE_KEY, join_members(&self.types)));
        }
        pairs
    }

    /// Percent-encoded query string, `None` when no field constrains the list.
    pub fn build_query(&self) -> Option<String> {
        let pairs = self.query_pairs();
        if pairs.is_empty() {
            return None;
        }
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &pairs {
            serializer.append_pair(key, value);
        }
        Some(serializer.finish())
    }
}

/// List endpoint for the given criteria. No `?` is appended when the
/// criteria are empty.
pub fn events_url(base: &Url, criteria: &FilterCriteria) -> Result<Url, url::ParseError> {
    let mut url = base.join(EVENTS_PATH)?;
    url.set_query(criteria.build_query().as_deref());
    Ok(url)
}

pub fn latest_selectable_date() -> NaiveDate {
    Utc::now().with_timezone(&TIMEZONE).date_naive()
}

fn toggle_member(set: &mut BTreeSet<String>, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    if !set.remove(value) {
        set.insert(value.to_string());
    }
}

fn collect_members<I, S>(values: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values
        .into_iter()
        .map(|value| value.into().trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

fn join_members(set: &BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join(SET_SEPARATOR)
}
