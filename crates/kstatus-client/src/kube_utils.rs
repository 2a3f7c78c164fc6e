//! Shared Kubernetes utilities using kube-rs
//!
//! Client construction, resource-kind discovery and conversion of kube
//! errors into the status error taxonomy.

use kstatus_common::Error;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::discovery::{ApiCapabilities, ApiResource, Discovery};
use kube::{Client, Config};
use tracing::{debug, warn};

use crate::config::ClientConfig;

/// Name of the status subresource as reported by discovery
pub const STATUS_SUBRESOURCE: &str = "status";

/// Create a kube client from the resolved configuration
pub async fn create_client(config: &ClientConfig) -> Result<Client, Error> {
    let options = KubeConfigOptions {
        context: config.context.clone(),
        ..KubeConfigOptions::default()
    };

    let mut kube_config = match (&config.kubeconfig, &config.context) {
        (Some(path), _) => {
            let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                Error::client(
                    "kubeconfig",
                    format!("failed to read kubeconfig {}: {}", path.display(), e),
                )
            })?;
            Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .map_err(|e| {
                    Error::client("kubeconfig", format!("failed to load kubeconfig: {}", e))
                })?
        }
        (None, Some(_)) => Config::from_kubeconfig(&options).await.map_err(|e| {
            Error::client("kubeconfig", format!("failed to load kubeconfig: {}", e))
        })?,
        (None, None) => Config::infer()
            .await
            .map_err(|e| Error::client("infer", format!("failed to infer config: {}", e)))?,
    };

    kube_config.connect_timeout = Some(config.connect_timeout);
    kube_config.read_timeout = Some(config.read_timeout);
    Client::try_from(kube_config)
        .map_err(|e| Error::client("connect", format!("failed to create client: {}", e)))
}

/// Parse an apiVersion string into (group, version)
///
/// The core group (`v1`) has an empty group name.
pub fn parse_api_version(api_version: &str) -> (String, String) {
    match api_version.split_once('/') {
        Some((group, version)) => (group.to_string(), version.to_string()),
        None => (String::new(), api_version.to_string()),
    }
}

/// Pick the resource matching `kind` from one group/version's resources
///
/// Matches by kind, then by plural name, then by lowercase singular name.
pub fn find_resource(
    resources: &[(ApiResource, ApiCapabilities)],
    kind: &str,
) -> Option<(ApiResource, ApiCapabilities)> {
    let by_kind = |(ar, _): &&(ApiResource, ApiCapabilities)| ar.kind == kind;
    let by_plural = |(ar, _): &&(ApiResource, ApiCapabilities)| ar.plural == kind;
    let by_singular =
        |(ar, _): &&(ApiResource, ApiCapabilities)| ar.kind.to_lowercase() == kind;

    resources
        .iter()
        .find(by_kind)
        .or_else(|| resources.iter().find(by_plural))
        .or_else(|| resources.iter().find(by_singular))
        .cloned()
}

/// Whether the resource exposes a `status` subresource
pub fn has_status_subresource(caps: &ApiCapabilities) -> bool {
    caps.subresources
        .iter()
        .any(|(ar, _)| ar.plural == STATUS_SUBRESOURCE)
}

/// Resolve `api_version`/`kind` against the API server
///
/// Fails with `RemoteNotFound` when no resource matches and with
/// `SubresourceUnsupported` when the match has no status subresource.
pub async fn discover_status_resource(
    client: &Client,
    api_version: &str,
    kind: &str,
) -> Result<(ApiResource, ApiCapabilities), Error> {
    let (group, version) = parse_api_version(api_version);

    let discovery = Discovery::new(client.clone())
        .filter(&[group.as_str()])
        .run()
        .await
        .map_err(|e| remote_error("discovery", e))?;

    let resources = discovery
        .groups()
        .find(|g| g.name() == group)
        .map(|g| g.versioned_resources(&version))
        .unwrap_or_default();

    let Some((ar, caps)) = find_resource(&resources, kind) else {
        warn!(api_version = %api_version, kind = %kind, "resource not found in API discovery");
        return Err(Error::kind_not_found(api_version, kind));
    };

    if !has_status_subresource(&caps) {
        return Err(Error::subresource_unsupported(&ar.api_version, &ar.kind));
    }

    debug!(
        api_version = %ar.api_version,
        kind = %ar.kind,
        plural = %ar.plural,
        "discovered status resource"
    );
    Ok((ar, caps))
}

/// Convert a kube error into a remote request failure for `operation`
///
/// API responses keep their status code, reason and message; transport
/// failures report status 0.
pub fn remote_error(operation: &str, err: kube::Error) -> Error {
    match err {
        kube::Error::Api(ae) => Error::remote(operation, ae.code, ae.reason, ae.message),
        other => Error::remote(operation, 0, "", other.to_string()),
    }
}
