//! CLI commands

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use kstatus_client::{ClientConfig, ResourceRef};
use kstatus_common::{DesiredState, StatusOptions, StatusUpdate};

use crate::input::{read_conditions, read_status};
use crate::Result;

pub mod apply;
pub mod plan;
pub mod validate;

/// Desired status and how to apply it
#[derive(Args, Debug, Clone, Default)]
pub struct DesiredArgs {
    /// Status fields to set, as YAML/JSON or @file
    #[arg(long)]
    pub status: Option<String>,

    /// Conditions to set on status.conditions, as a YAML/JSON list or @file
    #[arg(long)]
    pub conditions: Option<String>,

    /// Replace the whole status object instead of merging into it
    #[arg(long, visible_alias = "force")]
    pub replace: bool,

    /// Treat any difference in a top-level list field as a change
    #[arg(long)]
    pub replace_lists: bool,
}

impl DesiredArgs {
    /// Parse and validate the desired state
    pub fn to_update(&self) -> Result<StatusUpdate> {
        let desired = DesiredState {
            status: self.status.as_deref().map(read_status).transpose()?,
            conditions: self.conditions.as_deref().map(read_conditions).transpose()?,
        };
        let options = StatusOptions {
            replace: self.replace,
            replace_lists: self.replace_lists,
        };
        Ok(StatusUpdate::new(desired, options)?)
    }
}

/// Which resource to act on
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// API version of the resource
    #[arg(long, visible_alias = "api", default_value = "v1")]
    pub api_version: String,

    /// Kind, plural or singular name of the resource
    #[arg(long)]
    pub kind: String,

    /// Name of the object
    #[arg(long)]
    pub name: String,

    /// Namespace of the object (defaults to the kubeconfig namespace)
    #[arg(long, short = 'n')]
    pub namespace: Option<String>,
}

impl TargetArgs {
    pub fn to_ref(&self) -> ResourceRef {
        ResourceRef {
            api_version: self.api_version.clone(),
            kind: self.kind.clone(),
            name: self.name.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

/// How to reach the cluster
#[derive(Args, Debug, Clone, Default)]
pub struct ClusterArgs {
    /// Path to a kubeconfig file
    #[arg(long, env = "K8S_AUTH_KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long, env = "K8S_AUTH_CONTEXT")]
    pub context: Option<String>,
}

impl ClusterArgs {
    pub fn to_config(&self) -> ClientConfig {
        ClientConfig::new(self.kubeconfig.clone(), self.context.clone())
    }
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
