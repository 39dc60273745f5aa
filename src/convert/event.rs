use super::{parse_time, time_string};
use crate::models::{Event, EventList};
use k8s_openapi::api::core::v1 as corev1;

/// `component` or `component, host`
pub fn format_event_source(source: Option<&corev1::EventSource>) -> String {
    let component = source.and_then(|s| s.component.clone()).unwrap_or_default();
    match source.and_then(|s| s.host.as_deref()).filter(|h| !h.is_empty()) {
        Some(host) => format!("{}, {}", component, host),
        None => component,
    }
}

pub fn event(event: &corev1::Event) -> Event {
    Event {
        event_type: event.type_.clone().unwrap_or_default(),
        reason: event.reason.clone().unwrap_or_default(),
        message: event.message.clone().unwrap_or_default(),
        from: format_event_source(event.source.as_ref()),
        count: event.count.unwrap_or(0),
        first_timestamp: time_string(event.first_timestamp.as_ref()),
        last_timestamp: time_string(event.last_timestamp.as_ref()),
    }
}

/// Oldest first by last timestamp; events without one sort first
pub(crate) fn event_list(mut events: Vec<corev1::Event>) -> EventList {
    events.sort_by_key(|e| parse_time(e.last_timestamp.as_ref()));
    EventList {
        events: events.iter().map(event).collect(),
    }
}
