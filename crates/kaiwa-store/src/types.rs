use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted inbound/outbound message pair.
///
/// Created once a reply has been obtained; never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub id: i64,
    pub user_id: String,
    /// Platform event time of the inbound message.
    pub timestamp: DateTime<Utc>,
    pub inbound_text: String,
    pub outbound_text: String,
}
