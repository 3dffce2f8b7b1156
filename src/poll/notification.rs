//! Change notification request entries.

use serde::{Deserialize, Serialize};

/// One entry of a long-poll request. Echoed back verbatim when a change is
/// reported; neither field is checked against the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotificationRequest {
    #[serde(rename = "notificationId")]
    pub notification_id: i64,

    #[serde(rename = "namespaceName")]
    pub namespace_name: String,
}

impl ChangeNotificationRequest {
    pub fn new(notification_id: i64, namespace_name: impl Into<String>) -> Self {
        Self {
            notification_id,
            namespace_name: namespace_name.into(),
        }
    }
}

/// Parse the `notifications` query parameter of a long-poll request.
pub fn parse_notifications(raw: &str) -> Result<Vec<ChangeNotificationRequest>, serde_json::Error> {
    serde_json::from_str(raw)
}
