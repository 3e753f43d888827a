//! Command-line interface for the Veridict engine

use crate::config::{load_config, EngineConfig};
use crate::engine::TrustCycleEngine;
use crate::errors::VeridictError;
use crate::governance::EXIT_STRUCTURAL_FAILURE;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level CLI interface for Veridict
#[derive(Parser)]
#[command(
    name = "veridict",
    version = "0.1.0",
    about = "Adaptive trust scoring and governance gating for compliance evidence"
)]
pub struct Cli {
    /// Configuration file (defaults to veridict.toml)
    #[arg(short, long)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one monitoring cycle (scan + score + decide + ledger append)
    Run {
        /// Evidence directory override
        #[arg(long)]
        evidence_dir: Option<String>,

        /// Write the cycle report to this path instead of stdout
        #[arg(short, long)]
        report: Option<String>,
    },

    /// Verify the WORM decision ledger end to end
    VerifyChain,

    /// Print the effective configuration
    Status,

    /// Write a starter configuration file
    InitConfig {
        #[arg(short, long, default_value = "veridict.toml")]
        output: String,
    },
}

/// Execute a parsed CLI invocation; returns the process exit code.
pub fn execute(cli: Cli) -> anyhow::Result<i32> {
    let config = load_config(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Run {
            evidence_dir,
            report,
        } => run_cycle(config, evidence_dir, report),
        Commands::VerifyChain => verify_chain(config),
        Commands::Status => status(config),
        Commands::InitConfig { output } => init_config(config, &output),
    }
}

fn run_cycle(
    mut config: EngineConfig,
    evidence_dir: Option<String>,
    report: Option<String>,
) -> anyhow::Result<i32> {
    if let Some(dir) = evidence_dir {
        config.evidence_dir = dir;
    }
    let engine = TrustCycleEngine::new(config);
    let report_path = report.map(PathBuf::from);

    match engine.run_cycle(report_path.as_deref()) {
        Ok(outcome) => {
            eprintln!(
                "🔐 Governance decision: {} (exit {}) | score {:.4} | grade {}",
                outcome.report.governance_action,
                outcome.report.exit_code,
                outcome.report.master_score,
                outcome.report.grade,
            );
            eprintln!(
                "📜 Ledger receipt {} (prev: {})",
                outcome.receipt.uuid,
                outcome.receipt.chain_prev.as_deref().unwrap_or("genesis"),
            );
            Ok(outcome.report.exit_code)
        }
        Err(err) if err.is_structural() => {
            eprintln!("❌ Cycle aborted: {err}");
            Ok(EXIT_STRUCTURAL_FAILURE)
        }
        Err(err) => Err(err.into()),
    }
}

fn verify_chain(config: EngineConfig) -> anyhow::Result<i32> {
    let engine = TrustCycleEngine::new(config);
    if engine.verify_ledger()? {
        eprintln!("✅ WORM ledger chain verified");
        Ok(0)
    } else {
        eprintln!("❌ WORM ledger chain verification FAILED");
        Ok(EXIT_STRUCTURAL_FAILURE)
    }
}

fn status(config: EngineConfig) -> anyhow::Result<i32> {
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "dataDir": config.data_dir,
            "evidenceDir": config.evidence_dir,
            "windowCapacity": config.window_capacity,
            "baseThresholds": {
                "improve": config.thresholds.improve,
                "stable": config.thresholds.stable,
                "critical": config.thresholds.critical,
            },
            "gradeTiers": config.grade_tiers.len(),
        }))?
    );
    Ok(0)
}

fn init_config(config: EngineConfig, output: &str) -> anyhow::Result<i32> {
    let path = Path::new(output);
    if path.exists() {
        return Err(VeridictError::config(format!("{output} already exists")).into());
    }
    let rendered = config
        .to_toml()
        .map_err(|e| VeridictError::config(e.to_string()))?;
    fs::write(path, rendered)?;
    eprintln!("✅ Wrote starter configuration to {output}");
    Ok(0)
}
