//! Structural validation of snapshot documents.
//!
//! # Rules
//! Applied top-down, the first violation wins:
//! - the document holds at least one application
//! - every application has at least one non-empty-named cluster
//! - every cluster has at least one non-empty-named namespace
//! - every namespace has a configuration mapping
//! - every configuration key is non-empty
//!
//! Maps are ordered, so "first" is the lexicographically smallest path.

use std::collections::BTreeMap;

use crate::snapshot::model::{AppConfig, ClusterConfig, ConfigSnapshot, NamespaceConfig, RawNamespace, RawSnapshot};

/// A structural violation, naming the offending path segment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid config file")]
    Empty,

    #[error("invalid app name '{app}'")]
    AppName { app: String },

    #[error("invalid app '{app}'")]
    App { app: String },

    #[error("invalid cluster name '{cluster}' in {app}")]
    ClusterName { app: String, cluster: String },

    #[error("invalid cluster '{cluster}' in {app}")]
    Cluster { app: String, cluster: String },

    #[error("invalid namespace name '{namespace}' in {app}/{cluster}")]
    NamespaceName { app: String, cluster: String, namespace: String },

    #[error("invalid namespace '{namespace}' in {app}/{cluster}")]
    Namespace { app: String, cluster: String, namespace: String },

    #[error("invalid releaseKey '{release_key}' in {app}/{cluster}/{namespace}")]
    ReleaseKey {
        app: String,
        cluster: String,
        namespace: String,
        release_key: String,
    },

    #[error("invalid config key '{key}' in {app}/{cluster}/{namespace}")]
    ConfigKey {
        app: String,
        cluster: String,
        namespace: String,
        key: String,
    },
}

/// Optional strictness on top of the structural rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Reject namespaces whose `releaseKey` is missing or empty.
    pub require_release_key: bool,
}

/// Validate a raw document and turn it into a publishable snapshot.
pub fn validate(raw: RawSnapshot, options: ValidationOptions) -> Result<ConfigSnapshot, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::Empty);
    }

    let mut apps = BTreeMap::new();
    for (app, clusters) in raw {
        if app.is_empty() {
            return Err(ValidationError::AppName { app });
        }
        if clusters.is_empty() {
            return Err(ValidationError::App { app });
        }

        let mut app_config = AppConfig::new();
        for (cluster, namespaces) in clusters {
            if cluster.is_empty() {
                return Err(ValidationError::ClusterName { app, cluster });
            }
            if namespaces.is_empty() {
                return Err(ValidationError::Cluster { app, cluster });
            }

            let mut cluster_config = ClusterConfig::new();
            for (namespace, body) in namespaces {
                if namespace.is_empty() {
                    return Err(ValidationError::NamespaceName { app, cluster, namespace });
                }
                let Some(RawNamespace {
                    release_key,
                    configurations: Some(configurations),
                }) = body
                else {
                    return Err(ValidationError::Namespace { app, cluster, namespace });
                };
                let release_key = release_key.unwrap_or_default();
                if options.require_release_key && release_key.is_empty() {
                    return Err(ValidationError::ReleaseKey {
                        app,
                        cluster,
                        namespace,
                        release_key,
                    });
                }
                if let Some(key) = configurations.keys().find(|key| key.is_empty()) {
                    return Err(ValidationError::ConfigKey {
                        key: key.clone(),
                        app,
                        cluster,
                        namespace,
                    });
                }

                let configurations = configurations
                    .into_iter()
                    .map(|(key, value)| (key, value.unwrap_or_default()))
                    .collect();
                cluster_config.insert(
                    namespace,
                    NamespaceConfig {
                        release_key,
                        configurations,
                    },
                );
            }
            app_config.insert(cluster, cluster_config);
        }
        apps.insert(app, app_config);
    }

    Ok(ConfigSnapshot::from_validated(apps))
}
