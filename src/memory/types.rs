//! Core data model.
//!
//! Defines [`LogItem`] (one captured browser event), [`EventType`] (the closed
//! set of event kinds a client may post), [`SearchResult`] (one similarity hit)
//! and the waitlist records.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Kind of event captured by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A page finished loading in a tab.
    UrlVisit,
    /// The user copied text on a page.
    CopyEvent,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UrlVisit => "url_visit",
            Self::CopyEvent => "copy_event",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "url_visit" => Ok(Self::UrlVisit),
            "copy_event" => Ok(Self::CopyEvent),
            _ => Err(format!("unknown event type: {s}")),
        }
    }
}

/// One captured user event, as posted to `POST /log`.
///
/// The whole item is stored as the vector payload, optional fields included
/// (as `null`), so search results carry the same five keys the client sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogItem {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub url: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl LogItem {
    /// Serialize into the opaque JSON payload stored alongside the vector.
    pub fn to_payload(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// ISO 8601 timestamp. Values without an offset are taken as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

/// One hit from a similarity query. `payload` is kept opaque so records written
/// with an event type this build does not know still come back intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub score: f32,
    pub payload: serde_json::Value,
}

/// Waitlist signup as posted by the landing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistSignup {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
}

/// A stored waitlist record. `joined_at` is assigned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntry {
    pub full_name: String,
    pub email: String,
    pub company: Option<String>,
    pub joined_at: DateTime<Utc>,
}

impl WaitlistEntry {
    /// Stamp a signup with the time it was accepted.
    pub fn from_signup(signup: WaitlistSignup, joined_at: DateTime<Utc>) -> Self {
        Self {
            full_name: signup.full_name,
            email: signup.email,
            company: signup.company,
            joined_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_item_parses_client_payload() {
        let item: LogItem = serde_json::from_str(
            r#"{"type":"url_visit","title":"Docs","url":"https://docs.x","timestamp":"2025-06-01T12:30:00.000Z"}"#,
        )
        .unwrap();
        assert_eq!(item.event_type, EventType::UrlVisit);
        assert_eq!(item.title.as_deref(), Some("Docs"));
        assert_eq!(item.text, None);
    }

    #[test]
    fn log_item_rejects_unknown_type() {
        let result: Result<LogItem, _> = serde_json::from_str(
            r#"{"type":"tab_close","url":"https://a.com","timestamp":"2025-06-01T12:30:00Z"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn log_item_requires_url_and_timestamp() {
        let missing_url: Result<LogItem, _> =
            serde_json::from_str(r#"{"type":"copy_event","timestamp":"2025-06-01T12:30:00Z"}"#);
        assert!(missing_url.is_err());

        let bad_timestamp: Result<LogItem, _> =
            serde_json::from_str(r#"{"type":"copy_event","url":"https://a.com","timestamp":"yesterday"}"#);
        assert!(bad_timestamp.is_err());
    }

    #[test]
    fn naive_timestamp_is_read_as_utc() {
        let item: LogItem = serde_json::from_str(
            r#"{"type":"url_visit","url":"https://a.com","timestamp":"2025-06-01T12:30:00"}"#,
        )
        .unwrap();
        let expected: DateTime<Utc> = "2025-06-01T12:30:00Z".parse().unwrap();
        assert_eq!(item.timestamp, expected);

        let fractional: LogItem = serde_json::from_str(
            r#"{"type":"url_visit","url":"https://a.com","timestamp":"2025-06-01T12:30:00.250"}"#,
        )
        .unwrap();
        assert_eq!(fractional.timestamp.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn offset_timestamp_is_converted_to_utc() {
        let item: LogItem = serde_json::from_str(
            r#"{"type":"url_visit","url":"https://a.com","timestamp":"2025-06-01T14:30:00+02:00"}"#,
        )
        .unwrap();
        let expected: DateTime<Utc> = "2025-06-01T12:30:00Z".parse().unwrap();
        assert_eq!(item.timestamp, expected);
    }

    #[test]
    fn payload_keeps_null_optionals() {
        let item: LogItem = serde_json::from_str(
            r#"{"type":"copy_event","url":"https://a.com","timestamp":"2025-06-01T12:30:00Z","text":"hello"}"#,
        )
        .unwrap();
        let payload = item.to_payload().unwrap();
        assert_eq!(payload["type"], "copy_event");
        assert_eq!(payload["text"], "hello");
        assert!(payload["title"].is_null());
        assert!(payload.as_object().unwrap().contains_key("title"));
    }

    #[test]
    fn waitlist_signup_uses_camel_case() {
        let signup: WaitlistSignup =
            serde_json::from_str(r#"{"fullName":"Ada Lovelace","email":"ada@example.com"}"#).unwrap();
        assert_eq!(signup.full_name, "Ada Lovelace");
        assert_eq!(signup.company, None);

        let entry = WaitlistEntry::from_signup(signup, Utc::now());
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("joinedAt").is_some());
        assert!(json.get("fullName").is_some());
    }

    #[test]
    fn event_type_round_trips_through_str() {
        assert_eq!("copy_event".parse::<EventType>().unwrap(), EventType::CopyEvent);
        assert_eq!(EventType::UrlVisit.to_string(), "url_visit");
        assert!("other".parse::<EventType>().is_err());
    }
}
