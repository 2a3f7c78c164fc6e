//! Plan command: decide against an instance document without a cluster

use clap::Args;
use serde::Serialize;
use serde_json::Value;

use kstatus_common::Decision;

use super::{print_json, DesiredArgs};
use crate::input::read_value;
use crate::{Error, Result};

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// The current object, as YAML/JSON or @file
    #[arg(long)]
    pub instance: String,

    #[command(flatten)]
    pub desired: DesiredArgs,
}

/// What `apply` would do
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanOutput {
    /// `none`, `patch` or `replace`
    pub action: &'static str,
    /// Whether the resource would be written
    pub changed: bool,
    /// The status document that would be sent
    pub status: Option<Value>,
}

impl From<Decision> for PlanOutput {
    fn from(decision: Decision) -> Self {
        Self {
            action: decision.action(),
            changed: decision.is_change(),
            status: decision.status().cloned().map(Value::Object),
        }
    }
}

pub fn plan(args: &PlanArgs) -> Result<PlanOutput> {
    let update = args.desired.to_update()?;
    let instance = read_value("instance", &args.instance)?;
    if !instance.is_object() {
        return Err(Error::invalid_input("instance", "expected an object"));
    }
    Ok(update.decide(instance).into())
}

pub fn run(args: PlanArgs) -> Result<()> {
    print_json(&plan(&args)?)
}
