use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use planos_tsol::{run_company, AppConfig, RunSummary};

#[derive(Parser)]
#[command(name = "planos-tsol", version, about = "Monthly sales → TSOL flat files")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process one company
    Run {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        company: String,
        /// Inventory date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Process every configured company
    RunAll {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// List configured companies
    Companies {
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    match cli.command {
        Command::Run { config, company, as_of } => run_one(&config, &company, as_of),
        Command::RunAll { config, as_of } => run_all(&config, as_of),
        Command::Companies { config } => list_companies(&config),
    }
}

/// PLANOS_TSOL_LOG controls the filter (default: info); logs go to stderr
fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_env("PLANOS_TSOL_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(path: &Path) -> Result<AppConfig> {
    AppConfig::load(path).with_context(|| format!("Failed to load config {}", path.display()))
}

fn run_one(config_path: &Path, company: &str, as_of: Option<NaiveDate>) -> Result<()> {
    let config = load_config(config_path)?;
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());

    println!("📊 Planos TSOL - {}", company);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let summary = run_company(&config, company, as_of)
        .with_context(|| format!("Run failed for company '{}'", company))?;
    print_summary(&summary);

    Ok(())
}

fn run_all(config_path: &Path, as_of: Option<NaiveDate>) -> Result<()> {
    let config = load_config(config_path)?;
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());

    let mut failed = Vec::new();
    for key in config.company_keys() {
        println!("\n📊 Planos TSOL - {}", key);
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        match run_company(&config, &key, as_of) {
            Ok(summary) => print_summary(&summary),
            Err(e) => {
                eprintln!("❌ {}: {}", key, e);
                failed.push(key);
            }
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    let total = config.companies.len();
    if failed.is_empty() {
        println!("🎉 {} / {} companies processed", total, total);
        Ok(())
    } else {
        anyhow::bail!("{} of {} companies failed: {}", failed.len(), total, failed.join(", "))
    }
}

fn list_companies(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;

    println!("🏢 Configured companies ({})", config.companies.len());
    for (key, profile) in &config.companies {
        println!("  • {} (code {}, output {})", key, profile.code, profile.output_subfolder);
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!(
        "📅 Period: {:02}/{} (last sale {})",
        summary.period.month, summary.period.year, summary.period.last_date
    );
    for extract in &summary.extracts {
        println!("✓ {} ({} rows)", extract.file, extract.rows);
    }
    match &summary.inconsistencies {
        Some(path) => println!("⚠️  Inconsistencies written to {}", path.display()),
        None => println!("✓ No inconsistencies"),
    }
    println!("📦 Archive name: {}", summary.archive);
    println!("✅ Output in {}", summary.folder.display());
}
