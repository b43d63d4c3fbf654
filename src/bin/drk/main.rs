mod driver;
mod monitor;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use drk::configuration::Drk;
use drk::database::Database;
use drk::runner::Runner;
use tracing::info;
use tracing_subscriber::EnvFilter;

use driver::mock::MockDatabase;
use driver::postgres::PostgresDatabase;

/// Declarative database workload simulator.
#[derive(Parser, Debug)]
#[command(name = "drk", version, about)]
struct Args {
    /// Absolute or relative path to the YAML config file.
    #[arg(long, default_value = "drk.yaml")]
    config: PathBuf,

    /// Database connection string.
    #[arg(long, required = true)]
    url: String,

    /// Database driver to use [postgres, mock].
    #[arg(long, default_value = "postgres")]
    driver: String,

    /// Total duration of the simulation.
    #[arg(long, value_parser = humantime::parse_duration, default_value = "10m")]
    duration: Duration,

    /// Print config summary and exit without connecting to a database.
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging; disables the live monitor.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(if args.debug { "debug" } else { "warn" })
        }))
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let cfg = Drk::load(&args.config).with_context(|| "loading config")?;

    print_config(&cfg);

    if args.dry_run {
        return Ok(());
    }

    let db: Arc<dyn Database> = build_database(&args.driver, &args.url)
        .await
        .with_context(|| format!("connecting to database via driver {:?}", args.driver))?;

    let (runner, events) = Runner::new(cfg, db, args.duration);

    if !args.debug {
        tokio::spawn(monitor::run(events));
    } else {
        // Drain the channel so schedulers never back-pressure when the
        // monitor is disabled.
        tokio::spawn(async move {
            let mut events = events;
            while events.recv().await.is_some() {}
        });
    }

    runner.run().await.context("running simulation")
}

async fn build_database(driver: &str, url: &str) -> Result<Arc<dyn Database>> {
    match driver {
        "postgres" => Ok(Arc::new(PostgresDatabase::connect(url).await?)),
        "mock" => Ok(Arc::new(MockDatabase::new())),
        other => anyhow::bail!("unknown driver {other:?} (supported: postgres, mock)"),
    }
}

fn print_config(cfg: &Drk) {
    for (name, workflow) in &cfg.workflows {
        info!("workflow: {name}...");
        info!("\tvus: {}", workflow.vus);

        info!("\tsetup queries:");
        for query in &workflow.setup_queries {
            info!("\t\t- {query}");
        }

        info!("\tworkflow queries:");
        for query in &workflow.queries {
            info!("\t\t- {} ({})", query.name, query.rate);
        }
    }
}
