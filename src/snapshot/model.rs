//! Snapshot data model.
//!
//! A published [`ConfigSnapshot`] is immutable. The only way to build one is
//! through [`crate::snapshot::validation::validate`], so every snapshot a
//! reader can observe has passed the structural checks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Configuration of a single namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceConfig {
    /// Opaque version token.
    #[serde(rename = "releaseKey")]
    pub release_key: String,

    /// Flat key/value configuration.
    pub configurations: BTreeMap<String, String>,
}

/// Namespaces of one cluster, keyed by namespace name.
pub type ClusterConfig = BTreeMap<String, NamespaceConfig>;

/// Clusters of one application, keyed by cluster name.
pub type AppConfig = BTreeMap<String, ClusterConfig>;

/// Validated `appId → cluster → namespace → NamespaceConfig` mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConfigSnapshot {
    apps: BTreeMap<String, AppConfig>,
}

impl ConfigSnapshot {
    pub(crate) fn from_validated(apps: BTreeMap<String, AppConfig>) -> Self {
        Self { apps }
    }

    /// Look up a namespace by its exact path.
    pub fn namespace(&self, app_id: &str, cluster: &str, namespace: &str) -> Option<&NamespaceConfig> {
        self.apps.get(app_id)?.get(cluster)?.get(namespace)
    }

    /// Total number of namespaces across all apps and clusters.
    pub fn namespace_count(&self) -> usize {
        self.apps
            .values()
            .flat_map(|app| app.values())
            .map(|cluster| cluster.len())
            .sum()
    }
}

/// Namespace as it appears in a snapshot file, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNamespace {
    #[serde(rename = "releaseKey", default)]
    pub release_key: Option<String>,

    /// A null value (`key: ~` or `key:`) reads as an empty string.
    #[serde(default)]
    pub configurations: Option<BTreeMap<String, Option<String>>>,
}

/// Snapshot document as deserialized from disk. A `null` namespace body is
/// kept as `None` so validation can report it precisely.
pub type RawSnapshot = BTreeMap<String, BTreeMap<String, BTreeMap<String, Option<RawNamespace>>>>;
