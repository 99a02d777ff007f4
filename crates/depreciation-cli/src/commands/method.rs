use clap::Args;
use serde_json::{json, Value};

use depreciation_core::depreciation::DepreciationMethod;
use depreciation_core::DepreciationEngine;

/// Arguments for method validation
#[derive(Args)]
pub struct ValidateMethodArgs {
    /// Method name to check
    pub method: String,

    /// Apply the configured method policy instead of the strict check
    #[arg(long)]
    pub lenient: bool,
}

pub fn run_validate_method(
    engine: &DepreciationEngine,
    args: ValidateMethodArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let supported: Vec<&str> = DepreciationMethod::ALL.iter().map(|m| m.as_str()).collect();

    if args.lenient {
        let resolution = engine.resolve_method(Some(&args.method))?;
        return Ok(json!({
            "input": args.method,
            "method": resolution.method,
            "defaulted": resolution.defaulted,
            "warning": resolution.warning,
            "supported": supported,
        }));
    }

    let method = engine.validate_method(&args.method)?;
    Ok(json!({
        "input": args.method,
        "method": method,
        "supported": supported,
    }))
}
