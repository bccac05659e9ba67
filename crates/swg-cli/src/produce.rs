//! # Produce Subcommand
//!
//! Produces a typed value from raw JSON against one schema of a document
//! and prints its JSON rendering.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use swg_core::SwgError;
use swg_primitive::Direction;
use swg_scan::{ScanConfig, SwaggerApp};

/// Arguments for the `swg produce` subcommand.
#[derive(Args, Debug)]
pub struct ProduceArgs {
    /// Swagger 2.0 document (JSON or YAML).
    #[arg(value_name = "DOC")]
    pub doc: PathBuf,

    /// Reference to the schema, relative to the document
    /// (e.g. `#/definitions/Pet`).
    #[arg(value_name = "SCHEMA-REF")]
    pub schema_ref: String,

    /// Raw input as JSON. Omitted means absent, so defaults apply.
    #[arg(long)]
    pub value: Option<String>,

    /// Produce for a request body, rejecting readOnly properties.
    #[arg(long)]
    pub write: bool,
}

impl ProduceArgs {
    fn direction(&self) -> Direction {
        if self.write {
            Direction::Write
        } else {
            Direction::Read
        }
    }

    fn raw(&self) -> Result<Option<Value>> {
        self.value
            .as_deref()
            .map(|text| serde_json::from_str(text).context("--value is not valid JSON"))
            .transpose()
    }
}

/// The produced value as JSON, `None` when the input is absent and no
/// default applies.
///
/// Validation failures come back as the inner [`SwgError`] so callers can
/// tell bad input apart from a bad document.
pub fn produce_value(args: &ProduceArgs, config: ScanConfig) -> Result<Result<Option<Value>, SwgError>> {
    let path = crate::resolve_path(&args.doc);
    let raw = args.raw()?;
    let mut app = SwaggerApp::load_path(&path, config)
        .with_context(|| format!("failed to load {}", path.display()))?;
    let schema = app
        .resolve(&args.schema_ref)
        .with_context(|| format!("failed to resolve {}", args.schema_ref))?;

    match app.produce(schema, raw.as_ref(), args.direction()) {
        Ok(value) => Ok(Ok(value.map(|v| v.to_json()))),
        Err(err @ SwgError::Validation(_)) => Ok(Err(err)),
        Err(err) => Err(err).context("production failed"),
    }
}

/// Execute the produce subcommand.
///
/// Returns exit code: 0 with the value printed, 1 when the input does not
/// satisfy the schema.
pub fn run_produce(args: &ProduceArgs, config: ScanConfig) -> Result<u8> {
    match produce_value(args, config)? {
        Ok(value) => {
            let rendered = serde_json::to_string_pretty(&value.unwrap_or(Value::Null))
                .context("failed to render value")?;
            println!("{rendered}");
            Ok(0)
        }
        Err(err) => {
            println!("INVALID: {err}");
            Ok(1)
        }
    }
}
