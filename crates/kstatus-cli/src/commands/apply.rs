//! Apply command

use clap::Args;
use tracing::info;

use kstatus_client::{apply_status, create_client, KubeResourceClient};

use super::{print_json, ClusterArgs, DesiredArgs, TargetArgs};
use crate::Result;

#[derive(Args, Debug)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub desired: DesiredArgs,

    #[command(flatten)]
    pub cluster: ClusterArgs,
}

pub async fn run(args: ApplyArgs) -> Result<()> {
    // Validate before touching the cluster
    let update = args.desired.to_update()?;

    let client = create_client(&args.cluster.to_config()).await?;
    let target = args.target.to_ref();
    info!(resource = %target, replace = args.desired.replace, "applying status");

    let resource = KubeResourceClient::discover(client, target).await?;
    let outcome = apply_status(&resource, &update).await?;
    print_json(&outcome)
}
