//! Status reconciliation driver
//!
//! One pass: fetch the instance, decide against it, then perform at most one
//! write. The update is validated before this runs, so no remote call ever
//! happens for invalid input.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use kstatus_common::decision::{instance_with_status, observed_status};
use kstatus_common::{Decision, Error, StatusUpdate};

use crate::client::ResourceClient;

/// Result of a reconciliation pass
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusOutcome {
    /// Whether a write was made
    pub changed: bool,
    /// The unmodified instance when nothing changed, else the object
    /// returned by the API server
    pub result: Value,
}

/// Apply `update` to the resource behind `client`
pub async fn apply_status<C>(client: &C, update: &StatusUpdate) -> Result<StatusOutcome, Error>
where
    C: ResourceClient + ?Sized,
{
    let mut instance = client.fetch().await?;

    // Status is always at least an empty object
    let status = observed_status(&instance);
    instance = instance_with_status(instance, status);

    let decision = update.decide(instance.clone());
    debug!(action = decision.action(), "status decision");

    match decision {
        Decision::NoChange(instance) => {
            info!("status unchanged");
            Ok(StatusOutcome {
                changed: false,
                result: instance,
            })
        }
        Decision::Patch(status) => {
            let result = client.apply_merge_patch(&status).await?;
            Ok(StatusOutcome {
                changed: true,
                result,
            })
        }
        Decision::Replace(status) => {
            let body = instance_with_status(instance, status);
            let result = client.apply_replace(&body).await?;
            Ok(StatusOutcome {
                changed: true,
                result,
            })
        }
    }
}
