//! Config delta events for downstream consumers

use crate::error::PublishError;
use crate::models::ReleaseConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeltaEventType {
    CreateOrUpdate,
    Delete,
}

/// A ReleaseConfig as it now exists, or the coordinates of one that is gone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseConfigDeltaEvent {
    #[serde(rename = "type")]
    pub event_type: DeltaEventType,
    pub data: ReleaseConfig,
}

/// Sink for config delta events, such as a message topic
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleaseConfigPublisher: Send + Sync {
    async fn publish(&self, event: &ReleaseConfigDeltaEvent) -> Result<(), PublishError>;
}
