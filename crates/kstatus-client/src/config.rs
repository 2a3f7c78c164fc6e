//! Client configuration
//!
//! Unset settings fall through to kube's own inference (in-cluster, then
//! `KUBECONFIG` / `~/.kube/config`).

use std::path::PathBuf;
use std::time::Duration;

/// Default connection timeout for kube clients
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default read timeout for kube clients
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings used to build a kube client
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Kubeconfig file to load instead of inferring one
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context to use
    pub context: Option<String>,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Per-request read timeout
    pub read_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            context: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Settings for an explicit kubeconfig and context
    ///
    /// Empty values count as unset.
    pub fn new(kubeconfig: Option<PathBuf>, context: Option<String>) -> Self {
        Self {
            kubeconfig: kubeconfig.filter(|p| !p.as_os_str().is_empty()),
            context: context.filter(|c| !c.is_empty()),
            ..Self::default()
        }
    }

    /// Override the timeouts
    pub fn with_timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self
    }
}
