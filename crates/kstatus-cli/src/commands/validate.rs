//! Validate command

use clap::Args;

use kstatus_common::{validate_conditions, Condition};

use super::print_json;
use crate::input::read_conditions;
use crate::Result;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Conditions to validate, as a YAML/JSON list or @file
    #[arg(long)]
    pub conditions: String,
}

/// Validate and normalize the conditions
pub fn validate(args: &ValidateArgs) -> Result<Vec<Condition>> {
    let raw = read_conditions(&args.conditions)?;
    Ok(validate_conditions(&raw)?)
}

pub fn run(args: ValidateArgs) -> Result<()> {
    print_json(&validate(&args)?)
}
