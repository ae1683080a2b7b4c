//! SSB - Security Baseline audit CLI
//!
//! The `ssb` command runs the baseline checks against a recorded account
//! snapshot and prints or saves the resulting report.
//!
//! ## Commands
//!
//! - `audit`: Run the checks and render the report
//! - `checks`: List the available checks

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

use ssb_core::{AccountSnapshot, AuditReport, CheckId, CloudApi};
use ssb_engine::{AuditEngine, CheckRegistry, EngineConfig, METRICS};

#[derive(Parser)]
#[command(name = "ssb")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Security baseline audit for cloud accounts", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run baseline checks against an account snapshot
    Audit(AuditArgs),

    /// List the available checks
    Checks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Markdown,
    Json,
}

#[derive(Debug, Args)]
struct AuditArgs {
    /// Account snapshot file (JSON)
    #[arg(short, long)]
    snapshot: PathBuf,

    /// Comma-separated check ids to run (default: all)
    #[arg(short, long, value_delimiter = ',')]
    checks: Vec<CheckId>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "markdown")]
    format: ReportFormat,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Check units running at once
    #[arg(long, env = "SSB_OUTER_WORKERS", default_value_t = 10)]
    outer_workers: usize,

    /// Sub-operations running at once inside each fan-out check
    #[arg(long, env = "SSB_INNER_WORKERS", default_value_t = 20)]
    inner_workers: usize,

    /// Give up on a check after this many seconds
    #[arg(long, env = "SSB_UNIT_TIMEOUT_SECS")]
    unit_timeout_secs: Option<u64>,

    /// Region for region-pinned checks
    #[arg(long, env = "SSB_HOME_REGION", default_value = "ap-northeast-2")]
    home_region: String,

    /// Region hosting the support API
    #[arg(long, env = "SSB_SUPPORT_REGION", default_value = "us-east-1")]
    support_region: String,

    /// Skip the credential report warm-up call
    #[arg(long, env = "SSB_NO_PRIME")]
    no_prime: bool,
}

impl AuditArgs {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            outer_workers: self.outer_workers,
            inner_workers: self.inner_workers,
            prime_credential_report: !self.no_prime,
            unit_timeout: self.unit_timeout_secs.map(Duration::from_secs),
            home_region: self.home_region.clone(),
            support_region: self.support_region.clone(),
        }
    }

    fn selected(&self) -> Vec<CheckId> {
        if self.checks.is_empty() {
            CheckId::ALL.to_vec()
        } else {
            self.checks.clone()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    ssb_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Audit(args) => {
            let report = cmd_audit(&args).await?;
            emit_report(&report, args.format, args.output.as_deref())?;
            METRICS.flush();
            Ok(())
        }
        Commands::Checks => {
            print!("{}", cmd_checks());
            Ok(())
        }
    }
}

async fn cmd_audit(args: &AuditArgs) -> Result<AuditReport> {
    let snapshot = AccountSnapshot::load(&args.snapshot)
        .with_context(|| format!("Failed to load snapshot {}", args.snapshot.display()))?;
    let api: Arc<dyn CloudApi> = Arc::new(snapshot);

    let engine = AuditEngine::new(Arc::clone(&api), args.engine_config())
        .context("Invalid engine configuration")?;

    let selected = args.selected();
    info!(snapshot = %args.snapshot.display(), checks = selected.len(), "starting audit");
    let run = engine.audit(selected).await;

    let account_id = api
        .get_caller_identity()
        .unwrap_or_else(|_| "unknown".to_string());

    AuditReport::new(run.run_id, account_id, Utc::now(), run.results)
        .context("Failed to assemble report")
}

fn emit_report(report: &AuditReport, format: ReportFormat, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            match format {
                ReportFormat::Json => report.write_json(path),
                ReportFormat::Markdown => std::fs::write(path, report.render_markdown())
                    .map_err(ssb_core::CoreError::from),
            }
            .with_context(|| format!("Failed to write {}", path.display()))?;

            let summary = report.summary();
            println!("✓ Report written to {}", path.display());
            println!(
                "  {} alerts: {} danger, {} warning, {} error",
                summary.total(),
                summary.danger,
                summary.warning,
                summary.error
            );
        }
        None => {
            let rendered = match format {
                ReportFormat::Markdown => report.render_markdown(),
                ReportFormat::Json => report.to_json_pretty().context("Failed to serialize report")?,
            };
            println!("{rendered}");
        }
    }
    Ok(())
}

fn cmd_checks() -> String {
    let mut out = String::new();
    for unit in CheckRegistry::builtin().descriptors() {
        out.push_str(&format!(
            "{:>2}  {:<8} {}\n",
            unit.id.number(),
            unit.kind.as_str(),
            unit.title()
        ));
    }
    out
}
