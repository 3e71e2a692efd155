//! Reslice CLI - Feature-slice migration for flat client codebases

use clap::{Parser, Subcommand};
use indicatif::HumanDuration;
use owo_colors::OwoColorize;
use reslice::config::{self, ResliceConfig};
use reslice::contract::ApiContract;
use reslice::report::MigrationReport;
use reslice::ui::{self, theme, Icons};
use reslice::{MigrationEngine, RunStatus};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "reslice")]
#[command(version = "0.1.0")]
#[command(about = "Feature-slice migration engine for flat client codebases")]
#[command(long_about = r#"
Reslice reorganizes a flat client codebase into a feature-sliced layout
and rebinds its local persistence layer to a remote API contract:
  • Entry-point reachability decides which feature owns each file
  • Files reached by several features land in shared folders
  • Import specifiers are rewritten to the path-alias convention
  • localStore-style calls become contract-bound remote calls
  • Invariants are checked before anything is written; commits are
    all-or-nothing

Example usage:
  reslice init
  reslice plan --path ./legacy/src
  reslice migrate --path ./legacy/src --out ./migrated/src
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a scaffold reslice.toml to fill in
    Init {
        /// Where to write the config
        #[arg(short, long, default_value = "reslice.toml")]
        config: PathBuf,

        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Classify, plan and validate without writing anything
    Plan {
        /// Source tree to migrate
        #[arg(short, long)]
        path: PathBuf,

        /// Config file
        #[arg(short, long, default_value = "reslice.toml")]
        config: PathBuf,

        /// Write the JSON report to this file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Migrate the tree into a feature-sliced destination
    Migrate {
        /// Source tree to migrate
        #[arg(short, long)]
        path: PathBuf,

        /// Destination for the migrated tree (must not exist or be empty)
        #[arg(short, long, default_value = "migrated")]
        out: PathBuf,

        /// Config file
        #[arg(short, long, default_value = "reslice.toml")]
        config: PathBuf,

        /// Write the JSON report to this file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Init { config, force } => {
            let scaffold = ResliceConfig::scaffold();
            config::write_config(&config, &scaffold, force)?;
            ui::success(&format!("Wrote {}", config.display()));
            ui::info(
                "Next",
                "enumerate your features, then point persistence.contract at the backend contract JSON",
            );
            Ok(())
        }
        Commands::Plan {
            path,
            config,
            report,
            format,
        } => run_pipeline(
            &path,
            Path::new("migrated"),
            &config,
            true,
            report.as_deref(),
            &format,
            cli.verbose,
        ),
        Commands::Migrate {
            path,
            out,
            config,
            report,
            format,
        } => run_pipeline(
            &path,
            &out,
            &config,
            false,
            report.as_deref(),
            &format,
            cli.verbose,
        ),
    }
}

fn run_pipeline(
    src: &Path,
    out: &Path,
    config_path: &Path,
    dry_run: bool,
    report_path: Option<&Path>,
    format: &str,
    verbose: bool,
) -> anyhow::Result<()> {
    let started = Instant::now();

    let config = config::load_config(Some(config_path))?.ok_or_else(|| {
        anyhow::anyhow!(
            "no config at {} (run `reslice init` first)",
            config_path.display()
        )
    })?;
    let (scope, layout, persistence) = config.build()?;
    let config_dir = config_path.parent().unwrap_or(Path::new("."));
    let contract = ApiContract::load(&config.contract_path(config_dir))?;

    if format != "json" {
        ui::header(if dry_run {
            "Planning migration"
        } else {
            "Migrating"
        });
        ui::status(Icons::FOLDER, "Source", &src.display().to_string());
        if !dry_run {
            ui::status(Icons::FOLDER, "Destination", &out.display().to_string());
        }
        ui::status(Icons::PLUG, "Contract entries", &contract.len().to_string());
    }

    let engine = MigrationEngine::new(scope, layout, persistence, contract);
    let pm = ui::ProgressManager::new();
    let outcome = engine.run(src, out, dry_run, Some(pm.indexing()))?;
    pm.clear();

    if let Some(path) = report_path {
        std::fs::write(path, outcome.report.to_json()?)?;
    }

    if format == "json" {
        println!("{}", outcome.report.to_json()?);
    } else {
        render_report(&outcome.report, verbose);
        if let Some(path) = report_path {
            ui::info("Report", &path.display().to_string());
        }
    }

    if outcome.report.status == RunStatus::Failed {
        if format != "json" {
            ui::error("Validation failed; nothing was written");
        }
        anyhow::bail!("{} violation(s)", outcome.report.violations.len());
    }
    if format != "json" {
        if !outcome.report.warnings.is_empty() {
            ui::warn(&format!(
                "{} warning(s) to review",
                outcome.report.warnings.len()
            ));
        }
        if outcome.committed {
            ui::success(&format!(
                "Committed {} files to {} in {}",
                outcome.report.planned_count(),
                out.display(),
                HumanDuration(started.elapsed())
            ));
        } else {
            ui::success(&format!(
                "Plan is valid; {} files would move",
                outcome.report.planned_count()
            ));
        }
    }
    Ok(())
}

fn render_report(report: &MigrationReport, verbose: bool) {
    ui::section("Features");
    for tally in &report.features {
        println!(
            "  {} {} ({} files)  entry: {}",
            Icons::FOLDER,
            tally.feature.as_str().style(theme().feature.clone()),
            tally.moved.len(),
            ui::dim(&tally.entry)
        );
        if verbose {
            for mv in &tally.moved {
                ui::move_line(&mv.from, &mv.to);
            }
        }
    }

    if !report.shared.is_empty() {
        ui::section("Shared");
        println!("{}", ui::moves_table(&report.shared));
    }

    if !report.cycles.is_empty() {
        ui::section("Cycles kept intact");
        for cycle in &report.cycles {
            println!("  {} {}", Icons::CYCLE, cycle.join(" <-> "));
        }
    }

    if !report.substitutions.is_empty() {
        ui::section("Persistence substitutions");
        println!("{}", ui::substitutions_table(&report.substitutions));
    }

    if !report.violations.is_empty() || !report.warnings.is_empty() {
        ui::section("Findings");
        for v in &report.violations {
            ui::violation_line(v);
        }
        for w in &report.warnings {
            ui::warning_line(w);
        }
    }

    ui::section("Summary");
    println!("{}", ui::summary_table(report));
}
