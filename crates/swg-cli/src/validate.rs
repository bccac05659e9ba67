//! # Validate Subcommand
//!
//! Loads one document through the full scan pipeline and prints what the
//! diagnostic passes found.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use swg_scan::{ScanConfig, SwaggerApp};

/// Arguments for the `swg validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Swagger 2.0 document (JSON or YAML).
    #[arg(value_name = "DOC")]
    pub path: PathBuf,

    /// Treat diagnostics as a load error instead of listing them.
    #[arg(long)]
    pub strict: bool,

    /// Skip the structural validation pass.
    #[arg(long)]
    pub no_validate: bool,

    /// Skip schema cycle detection.
    #[arg(long)]
    pub no_cycles: bool,
}

impl ValidateArgs {
    /// `config` with this invocation's flags applied on top.
    pub fn effective_config(&self, mut config: ScanConfig) -> ScanConfig {
        config.strict |= self.strict;
        if self.no_validate {
            config.validate = false;
        }
        if self.no_cycles {
            config.detect_cycles = false;
        }
        config
    }
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 when the document has no diagnostics, 1 otherwise.
/// Cycles are listed but do not fail the document.
pub fn run_validate(args: &ValidateArgs, config: ScanConfig) -> Result<u8> {
    let path = crate::resolve_path(&args.path);
    let config = args.effective_config(config);
    let app = SwaggerApp::load_path(&path, config)
        .with_context(|| format!("failed to load {}", path.display()))?;

    let report = app.report();
    tracing::info!(
        nodes = app.graph().len(),
        diagnostics = report.diagnostics.len(),
        cycles = report.cycles.len(),
        "scan finished"
    );

    println!("{}: {} node(s)", args.path.display(), app.graph().len());
    for diagnostic in &report.diagnostics {
        println!("  FAIL: {diagnostic}");
    }
    for cycle in report.cycle_strings() {
        println!("  CYCLE: {cycle}");
    }

    if report.is_clean() {
        println!("OK");
        Ok(0)
    } else {
        println!("\n{} diagnostic(s).", report.diagnostics.len());
        Ok(1)
    }
}
