//! Resource client for the status subresource
//!
//! Provides a trait-based abstraction over the three remote operations the
//! reconciliation needs, allowing tests to mock Kubernetes interactions while
//! production code uses real API calls.

use std::fmt;

use async_trait::async_trait;
use kube::api::{Api, DynamicObject, Patch, PatchParams, PostParams};
use kube::discovery::Scope;
use kube::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

#[cfg(test)]
use mockall::automock;

use kstatus_common::{Error, StatusDocument, STATUS_FIELD};

use crate::kube_utils::{discover_status_resource, remote_error};

/// Field manager recorded on status writes
pub const FIELD_MANAGER: &str = "kstatus";

/// Default apiVersion when none is given
pub const DEFAULT_API_VERSION: &str = "v1";

/// Coordinates of the resource whose status is managed
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    /// API version, e.g. `apps.example.com/v1alpha1`
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Kind, plural or lowercase singular name
    pub kind: String,
    /// Object name
    pub name: String,
    /// Namespace, for namespaced kinds; the client default is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

impl ResourceRef {
    /// Create a reference to a namespaced object
    pub fn namespaced(
        api_version: impl Into<String>,
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            name: name.into(),
            namespace: Some(namespace.into()),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}.{} {}/{}", self.api_version, self.kind, ns, self.name),
            None => write!(f, "{}.{} {}", self.api_version, self.kind, self.name),
        }
    }
}

/// Remote operations on one resource's status subresource
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Fetch the current object
    async fn fetch(&self) -> Result<Value, Error>;

    /// Merge-patch `{"status": status}` onto the status subresource
    async fn apply_merge_patch(&self, status: &StatusDocument) -> Result<Value, Error>;

    /// Replace the status subresource with the status of `instance`
    async fn apply_replace(&self, instance: &Value) -> Result<Value, Error>;
}

/// Real resource client using DynamicObject for untyped resources
pub struct KubeResourceClient {
    api: Api<DynamicObject>,
    target: ResourceRef,
}

impl KubeResourceClient {
    /// Resolve the target's kind via discovery and bind a client to it
    ///
    /// Fails before any object is read if the kind is unknown or has no
    /// status subresource.
    pub async fn discover(client: Client, target: ResourceRef) -> Result<Self, Error> {
        let (ar, caps) = discover_status_resource(&client, &target.api_version, &target.kind).await?;

        let api = match (&caps.scope, &target.namespace) {
            (Scope::Namespaced, Some(ns)) => Api::namespaced_with(client, ns, &ar),
            (Scope::Namespaced, None) => Api::default_namespaced_with(client, &ar),
            (Scope::Cluster, _) => Api::all_with(client, &ar),
        };

        Ok(Self { api, target })
    }

    /// The resource this client is bound to
    pub fn target(&self) -> &ResourceRef {
        &self.target
    }

    fn to_value(&self, obj: DynamicObject) -> Result<Value, Error> {
        serde_json::to_value(obj).map_err(Error::from)
    }
}

#[async_trait]
impl ResourceClient for KubeResourceClient {
    async fn fetch(&self) -> Result<Value, Error> {
        debug!(resource = %self.target, "fetching resource");
        match self.api.get(&self.target.name).await {
            Ok(obj) => self.to_value(obj),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Err(Error::not_found(
                &self.target.api_version,
                &self.target.kind,
                &self.target.name,
                "failed to retrieve requested object",
            )),
            Err(e) => Err(remote_error("fetch", e)),
        }
    }

    async fn apply_merge_patch(&self, status: &StatusDocument) -> Result<Value, Error> {
        let patch = serde_json::json!({ STATUS_FIELD: status });
        let params = PatchParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..PatchParams::default()
        };
        let obj = self
            .api
            .patch_status(&self.target.name, &params, &Patch::Merge(&patch))
            .await
            .map_err(|e| remote_error("patch", e))?;
        info!(resource = %self.target, "patched status");
        self.to_value(obj)
    }

    async fn apply_replace(&self, instance: &Value) -> Result<Value, Error> {
        let body = serde_json::to_vec(instance)?;
        let params = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..PostParams::default()
        };
        let obj = self
            .api
            .replace_status(&self.target.name, &params, body)
            .await
            .map_err(|e| remote_error("replace", e))?;
        info!(resource = %self.target, "replaced status");
        self.to_value(obj)
    }
}
