//! EventList: read-only, order-preserving queries over a workflow history.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::errors::HistoryError;
use super::event::{Event, EventType};

/// Ordered, immutable workflow history.
///
/// Invariant: events keep the order they were supplied in, each event's
/// `position` equals its index here, and an event without a timestamp
/// carries the nearest earlier timestamp as its effective one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventList {
    events: Vec<Event>,
}

impl EventList {
    pub fn new(events: Vec<Event>) -> Self {
        let mut carried: Option<DateTime<Utc>> = None;
        let events = events
            .into_iter()
            .enumerate()
            .map(|(position, event)| {
                let event = event.sequenced(position, carried);
                carried = event.effective_timestamp();
                event
            })
            .collect();
        Self { events }
    }

    /// Build from raw history records, failing on the first malformed one.
    pub fn from_records(records: &[Value]) -> Result<Self, HistoryError> {
        let events = records
            .iter()
            .enumerate()
            .map(|(index, record)| Event::from_record(index, record))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(events))
    }

    /// Build from a JSON array of raw history records.
    pub fn from_json(history: &Value) -> Result<Self, HistoryError> {
        let records = history.as_array().ok_or(HistoryError::NotAnArray)?;
        Self::from_records(records)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// All events for `id` whose type is one of `event_types`, in history order.
    pub fn events_for<'s: 'q, 'q>(
        &'s self,
        id: &'q str,
        event_types: &'q [EventType],
    ) -> impl Iterator<Item = &'s Event> + 'q {
        self.events
            .iter()
            .filter(move |e| e.id() == Some(id) && event_types.contains(e.event_type()))
    }

    pub fn has_event(&self, id: &str, event_type: EventType) -> bool {
        self.events_for(id, &[event_type]).next().is_some()
    }

    pub fn count(&self, id: &str, event_type: EventType) -> usize {
        self.events_for(id, &[event_type]).count()
    }

    pub fn latest(&self, id: &str, event_type: EventType) -> Option<&Event> {
        self.latest_of(id, &[event_type])
    }

    /// Most recent event for `id` among `event_types`.
    ///
    /// Ordered by effective timestamp, then history position.
    pub fn latest_of(&self, id: &str, event_types: &[EventType]) -> Option<&Event> {
        self.events_for(id, event_types).max_by_key(|e| e.order_key())
    }

    /// Did `a` happen strictly after `b`?
    ///
    /// Uses the same key as `latest_of`, except that two events carrying
    /// their own equal timestamps are simultaneous.
    pub fn occurs_after(a: &Event, b: &Event) -> bool {
        if let (Some(ta), Some(tb)) = (a.timestamp(), b.timestamp()) {
            if ta == tb {
                return false;
            }
        }
        a.order_key() > b.order_key()
    }

    /// Any event for `id` among `event_types` that happened strictly after `than`.
    pub fn any_after(&self, id: &str, event_types: &[EventType], than: &Event) -> bool {
        self.events_for(id, event_types)
            .any(|e| Self::occurs_after(e, than))
    }
}

impl<'a> IntoIterator for &'a EventList {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
