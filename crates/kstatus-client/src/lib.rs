//! Kubernetes resource client for status subresource reconciliation
//!
//! Wraps kube-rs behind the [`ResourceClient`] trait and drives a validated
//! [`kstatus_common::StatusUpdate`] through fetch, decide and write.

pub mod client;
pub mod config;
pub mod kube_utils;
pub mod reconcile;

pub use client::{KubeResourceClient, ResourceClient, ResourceRef};

#[cfg(test)]
pub use client::MockResourceClient;

pub use config::ClientConfig;
pub use kube_utils::create_client;
pub use reconcile::{apply_status, StatusOutcome};
