//! Kubernetes event summaries

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,
    pub reason: String,
    pub message: String,
    /// Reporting component, followed by the host when one is known
    pub from: String,
    pub count: i32,
    pub first_timestamp: String,
    pub last_timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventList {
    pub events: Vec<Event>,
}
