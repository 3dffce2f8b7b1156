//! Response bodies and status mapping.
//!
//! # Design Decisions
//! - Field order of the JSON bodies is fixed by struct order
//! - A poll that saw no change answers 304 with an empty body, whatever the reason
//! - Lookup failures answer 404 with an empty body

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::poll::PollOutcome;
use crate::snapshot::NamespaceConfig;

/// Body of `GET /configs/{appId}/{cluster}/{namespace}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub app_id: String,
    pub cluster: String,
    /// Namespace name as requested, suffix included.
    pub namespace_name: String,
    pub release_key: String,
    pub configurations: BTreeMap<String, String>,
}

impl ConfigResponse {
    pub fn new(app_id: String, cluster: String, namespace_name: String, config: NamespaceConfig) -> Self {
        Self {
            app_id,
            cluster,
            namespace_name,
            release_key: config.release_key,
            configurations: config.configurations,
        }
    }
}

/// One entry of `GET /services/config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInstance {
    pub app_name: String,
    pub instance_id: String,
    pub homepage_url: String,
}

impl ServiceInstance {
    /// The config service itself, advertised on `port`.
    pub fn config_service(port: u16) -> Self {
        Self {
            app_name: "APOLLO-CONFIGSERVICE".to_string(),
            instance_id: format!("localhost:apollo-configservice:{port}"),
            homepage_url: format!("http://localhost:{port}/"),
        }
    }
}

impl IntoResponse for PollOutcome {
    fn into_response(self) -> Response {
        match self {
            PollOutcome::Changed(notifications) => (StatusCode::OK, Json(notifications)).into_response(),
            PollOutcome::NoChange(_) => StatusCode::NOT_MODIFIED.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::{ChangeNotificationRequest, NoChangeReason};

    #[test]
    fn test_config_response_json() {
        let config = NamespaceConfig {
            release_key: "abc".to_string(),
            configurations: BTreeMap::from([("mysql".to_string(), "mysql://root@localhost/mysql".to_string())]),
        };
        let body = ConfigResponse::new("app".into(), "cluster".into(), "ns".into(), config);
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"appId":"app","cluster":"cluster","namespaceName":"ns","releaseKey":"abc","configurations":{"mysql":"mysql://root@localhost/mysql"}}"#
        );
    }

    #[test]
    fn test_service_instance_json() {
        assert_eq!(
            serde_json::to_string(&ServiceInstance::config_service(8070)).unwrap(),
            r#"{"appName":"APOLLO-CONFIGSERVICE","instanceId":"localhost:apollo-configservice:8070","homepageUrl":"http://localhost:8070/"}"#
        );
    }

    #[test]
    fn test_poll_outcome_status() {
        let changed = PollOutcome::Changed(vec![ChangeNotificationRequest::new(1, "ns")]).into_response();
        assert_eq!(changed.status(), StatusCode::OK);

        for reason in [NoChangeReason::TimedOut, NoChangeReason::Cancelled] {
            assert_eq!(PollOutcome::NoChange(reason).into_response().status(), StatusCode::NOT_MODIFIED);
        }
    }
}
