//! Client status check pings.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A client status check ping.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatusCheck {
    /// Unique check ID
    pub id: String,
    /// Name reported by the client
    pub client_name: String,
    /// When the ping was recorded
    pub timestamp: DateTime<Utc>,
}

impl StatusCheck {
    /// Create a new status check for a client.
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            client_name: client_name.into(),
            timestamp: Utc::now(),
        }
    }
}
