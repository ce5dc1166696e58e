//! History events: one immutable record per entry in a workflow history.
//!
//! Raw records arrive as JSON objects shaped like
//! `{"eventType": "...", "eventTimestamp": ..., "<lowerCamelType>EventAttributes": {...}}`.
//! They are parsed exactly once into [`Event`]; timestamps become
//! `DateTime<Utc>` so later comparisons never re-parse strings.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::HistoryError;

/// History event tags the decision engine interprets.
///
/// Anything else is kept verbatim as `Other` so a history is never rejected
/// just because it contains events this crate does not care about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    ActivityTaskScheduled,
    ScheduleActivityTaskFailed,
    ActivityTaskStarted,
    ActivityTaskCompleted,
    ActivityTaskFailed,
    ActivityTaskTimedOut,
    ActivityTaskCanceled,
    TimerStarted,
    StartTimerFailed,
    TimerFired,
    TimerCanceled,
    Other(String),
}

impl EventType {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "ActivityTaskScheduled" => Self::ActivityTaskScheduled,
            "ScheduleActivityTaskFailed" => Self::ScheduleActivityTaskFailed,
            "ActivityTaskStarted" => Self::ActivityTaskStarted,
            "ActivityTaskCompleted" => Self::ActivityTaskCompleted,
            "ActivityTaskFailed" => Self::ActivityTaskFailed,
            "ActivityTaskTimedOut" => Self::ActivityTaskTimedOut,
            "ActivityTaskCanceled" => Self::ActivityTaskCanceled,
            "TimerStarted" => Self::TimerStarted,
            "StartTimerFailed" => Self::StartTimerFailed,
            "TimerFired" => Self::TimerFired,
            "TimerCanceled" => Self::TimerCanceled,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::ActivityTaskScheduled => "ActivityTaskScheduled",
            Self::ScheduleActivityTaskFailed => "ScheduleActivityTaskFailed",
            Self::ActivityTaskStarted => "ActivityTaskStarted",
            Self::ActivityTaskCompleted => "ActivityTaskCompleted",
            Self::ActivityTaskFailed => "ActivityTaskFailed",
            Self::ActivityTaskTimedOut => "ActivityTaskTimedOut",
            Self::ActivityTaskCanceled => "ActivityTaskCanceled",
            Self::TimerStarted => "TimerStarted",
            Self::StartTimerFailed => "StartTimerFailed",
            Self::TimerFired => "TimerFired",
            Self::TimerCanceled => "TimerCanceled",
            Self::Other(tag) => tag,
        }
    }

    /// Attribute fields that carry the correlating task identifier, in lookup order.
    fn id_fields(&self) -> &'static [&'static str] {
        match self {
            Self::ActivityTaskScheduled
            | Self::ScheduleActivityTaskFailed
            | Self::ActivityTaskStarted
            | Self::ActivityTaskCompleted
            | Self::ActivityTaskFailed
            | Self::ActivityTaskTimedOut
            | Self::ActivityTaskCanceled => &["activityId"],
            Self::TimerStarted | Self::TimerFired | Self::TimerCanceled => &["control"],
            Self::StartTimerFailed => &["timerId"],
            Self::Other(_) => &["activityId", "control"],
        }
    }

    /// Key of the attribute bag in a raw record, e.g. `timerFiredEventAttributes`.
    pub fn attributes_key(&self) -> String {
        let tag = self.as_str();
        let mut chars = tag.chars();
        match chars.next() {
            Some(first) => format!(
                "{}{}EventAttributes",
                first.to_ascii_lowercase(),
                chars.as_str()
            ),
            None => "eventAttributes".to_string(),
        }
    }
}

impl From<String> for EventType {
    fn from(tag: String) -> Self {
        Self::parse(&tag)
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        event_type.as_str().to_string()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

/// One immutable history record.
///
/// `position` is the record's index in the history it was loaded from.
/// `effective_timestamp` is the record's own timestamp, or the nearest earlier
/// one in that history when the record has none; it is assigned by
/// `EventList` and, with `position`, gives every event one ordering key.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    position: usize,
    effective_timestamp: Option<DateTime<Utc>>,
    event_id: Option<i64>,
    event_type: EventType,
    timestamp: Option<DateTime<Utc>>,
    attributes: Map<String, Value>,
}

impl Event {
    pub fn new(event_type: EventType) -> Self {
        Self {
            position: 0,
            effective_timestamp: None,
            event_id: None,
            event_type,
            timestamp: None,
            attributes: Map::new(),
        }
    }

    pub fn with_event_id(mut self, event_id: i64) -> Self {
        self.event_id = Some(event_id);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Place the event in a history. `carried` is the latest timestamp seen
    /// before it.
    pub(crate) fn sequenced(mut self, position: usize, carried: Option<DateTime<Utc>>) -> Self {
        self.position = position;
        self.effective_timestamp = self.timestamp.or(carried);
        self
    }

    /// Parse one raw history record.
    ///
    /// Only a missing/non-string `eventType`, a bad timestamp, or a non-object
    /// attribute bag are errors. A missing bag is an empty bag.
    pub fn from_record(index: usize, record: &Value) -> Result<Self, HistoryError> {
        let object = record
            .as_object()
            .ok_or(HistoryError::NotAnObject { index })?;

        let event_type = object
            .get("eventType")
            .and_then(Value::as_str)
            .map(EventType::parse)
            .ok_or(HistoryError::MissingEventType { index })?;

        let timestamp = match object.get("eventTimestamp") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(parse_timestamp(raw).ok_or_else(|| {
                HistoryError::InvalidTimestamp {
                    index,
                    value: raw.to_string(),
                }
            })?),
        };

        let key = event_type.attributes_key();
        let attributes = match object.get(&key) {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(bag)) => bag.clone(),
            Some(_) => return Err(HistoryError::InvalidAttributes { index, key }),
        };

        Ok(Self {
            position: index,
            effective_timestamp: timestamp,
            event_id: object.get("eventId").and_then(Value::as_i64),
            event_type,
            timestamp,
            attributes,
        })
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn effective_timestamp(&self) -> Option<DateTime<Utc>> {
        self.effective_timestamp
    }

    /// Ordering key within one history.
    pub(crate) fn order_key(&self) -> (Option<DateTime<Utc>>, usize) {
        (self.effective_timestamp, self.position)
    }

    pub fn event_id(&self) -> Option<i64> {
        self.event_id
    }

    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attribute(key).and_then(Value::as_str)
    }

    /// The task identifier this event correlates to (activity id or timer control).
    pub fn id(&self) -> Option<&str> {
        self.event_type
            .id_fields()
            .iter()
            .find_map(|field| self.attribute_str(field))
    }

    pub fn cause(&self) -> Option<&str> {
        self.attribute_str("cause")
    }

    pub fn reason(&self) -> Option<&str> {
        self.attribute_str("reason")
    }

    pub fn details(&self) -> Option<&str> {
        self.attribute_str("details")
    }

    /// Completion payload.
    ///
    /// Results travel as serialized JSON strings; an already-structured value
    /// is returned as is.
    pub fn result(&self) -> Option<Result<Value, serde_json::Error>> {
        match self.attribute("result")? {
            Value::String(raw) => Some(serde_json::from_str(raw)),
            other => Some(Ok(other.clone())),
        }
    }
}

fn parse_timestamp(raw: &Value) -> Option<DateTime<Utc>> {
    match raw {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => {
            if let Some(secs) = n.as_i64() {
                return DateTime::from_timestamp(secs, 0);
            }
            // fractional epoch seconds
            let secs = n.as_f64()?;
            if !secs.is_finite() {
                return None;
            }
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1_000_000_000.0).round() as u32;
            DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn parses_record_with_attribute_bag() {
        let record = json!({
            "eventId": 7,
            "eventType": "ActivityTaskFailed",
            "eventTimestamp": "2015-07-14T02:38:17.767Z",
            "activityTaskFailedEventAttributes": {
                "activityId": "charge",
                "reason": "card declined",
                "details": "{\"code\":51}"
            }
        });

        let event = Event::from_record(3, &record).expect("parse");
        assert_eq!(event.position(), 3);
        assert_eq!(event.event_id(), Some(7));
        assert_eq!(event.event_type(), &EventType::ActivityTaskFailed);
        assert_eq!(event.id(), Some("charge"));
        assert_eq!(event.reason(), Some("card declined"));
        assert_eq!(event.details(), Some("{\"code\":51}"));
        assert!(event.timestamp().is_some());
    }

    #[rstest]
    #[case::activity(EventType::ActivityTaskStarted, "activityTaskStartedEventAttributes")]
    #[case::timer(EventType::TimerFired, "timerFiredEventAttributes")]
    #[case::schedule_failed(
        EventType::ScheduleActivityTaskFailed,
        "scheduleActivityTaskFailedEventAttributes"
    )]
    #[case::unknown(
        EventType::Other("WorkflowExecutionStarted".to_string()),
        "workflowExecutionStartedEventAttributes"
    )]
    fn attribute_bag_key_is_lower_camel(#[case] event_type: EventType, #[case] key: &str) {
        assert_eq!(event_type.attributes_key(), key);
    }

    #[rstest]
    #[case::activity_id("ActivityTaskCompleted", "activityId")]
    #[case::timer_control("TimerStarted", "control")]
    #[case::timer_failed("StartTimerFailed", "timerId")]
    fn identifier_field_depends_on_type(#[case] tag: &str, #[case] field: &str) {
        let event = Event::new(EventType::parse(tag)).with_attribute(field, "task-a");
        assert_eq!(event.id(), Some("task-a"));
    }

    #[test]
    fn timer_events_ignore_activity_id() {
        let event = Event::new(EventType::TimerFired).with_attribute("activityId", "x");
        assert_eq!(event.id(), None);
    }

    #[test]
    fn missing_event_type_is_rejected() {
        let err = Event::from_record(2, &json!({"eventTimestamp": 10})).unwrap_err();
        assert_eq!(err, HistoryError::MissingEventType { index: 2 });
    }

    #[test]
    fn non_object_record_is_rejected() {
        let err = Event::from_record(0, &json!("TimerFired")).unwrap_err();
        assert_eq!(err, HistoryError::NotAnObject { index: 0 });
    }

    #[test]
    fn non_object_attribute_bag_is_rejected() {
        let record = json!({"eventType": "TimerFired", "timerFiredEventAttributes": "oops"});
        let err = Event::from_record(1, &record).unwrap_err();
        assert_eq!(
            err,
            HistoryError::InvalidAttributes {
                index: 1,
                key: "timerFiredEventAttributes".to_string()
            }
        );
    }

    #[test]
    fn missing_attribute_bag_is_empty() {
        let event = Event::from_record(0, &json!({"eventType": "TimerFired"})).expect("parse");
        assert!(event.attributes().is_empty());
        assert_eq!(event.id(), None);
    }

    #[rstest]
    #[case::rfc3339(json!("2015-07-14T02:38:17Z"), 1436841497)]
    #[case::epoch_int(json!(1436841497), 1436841497)]
    #[case::epoch_float(json!(1436841497.5), 1436841497)]
    fn timestamps_accept_strings_and_epoch_seconds(#[case] raw: Value, #[case] secs: i64) {
        let record = json!({"eventType": "TimerFired", "eventTimestamp": raw});
        let event = Event::from_record(0, &record).expect("parse");
        assert_eq!(event.timestamp().map(|t| t.timestamp()), Some(secs));
    }

    #[test]
    fn garbage_timestamp_is_rejected() {
        let record = json!({"eventType": "TimerFired", "eventTimestamp": "yesterday"});
        let err = Event::from_record(4, &record).unwrap_err();
        assert!(matches!(err, HistoryError::InvalidTimestamp { index: 4, .. }));
    }

    #[test]
    fn result_is_deserialized_from_string() {
        let event = Event::new(EventType::ActivityTaskCompleted)
            .with_attribute("result", "{\"someResult\":30}");
        let result = event.result().expect("present").expect("valid json");
        assert_eq!(result["someResult"], 30);
    }

    #[test]
    fn event_type_serializes_as_tag() {
        let s = serde_json::to_string(&EventType::TimerStarted).unwrap();
        assert_eq!(s, "\"TimerStarted\"");
        let back: EventType = serde_json::from_str("\"Custom\"").unwrap();
        assert_eq!(back, EventType::Other("Custom".to_string()));
    }
}
