//! churn - database helpers and synthetic revenue data for the churn project.

mod cli;

use churn_revenue::config::{FileConfig, Settings};
use churn_revenue::connection::ConnectionProvider;
use churn_revenue::error::{ChurnError, Result};
use churn_revenue::logging;
use churn_revenue::query::QueryExecutor;
use churn_revenue::revenue::{self, RevenueGenerator};
use cli::{Cli, Command};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info};

/// Query run by `churn check`.
const CHECK_QUERY: &str = "SELECT COUNT(*) AS n FROM customers;";

fn main() {
    // .env first so it can set RUST_LOG and the DB_* variables
    let dotenv = dotenvy::dotenv();
    logging::init_stderr_logging();
    if let Ok(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }

    if let Err(e) = run() {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let file = FileConfig::load(cli.config.as_deref())?;
    let settings = Settings::from_env(&file);
    info!("Database: {}", settings.redacted_connection_string());

    let provider = ConnectionProvider::from_settings(&settings)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| ChurnError::internal(format!("Failed to start runtime: {e}")))?;

    let outcome = runtime.block_on(execute(&cli.command, &provider));
    provider.shutdown();
    outcome
}

async fn execute(command: &Command, provider: &ConnectionProvider) -> Result<()> {
    let executor = QueryExecutor::new(provider);

    match command {
        Command::Check { json } => {
            let table = executor.query_to_table(CHECK_QUERY).await?;
            if *json {
                let rendered = serde_json::to_string_pretty(&table)
                    .map_err(|e| ChurnError::internal(format!("Failed to encode result: {e}")))?;
                println!("{rendered}");
            } else {
                println!("Successful.");
                println!("{table}");
            }
        }
        Command::GenerateRevenue { seed, dry_run } => {
            let rng = match seed {
                Some(seed) => StdRng::seed_from_u64(*seed),
                None => StdRng::from_entropy(),
            };
            let mut generator = RevenueGenerator::new(rng)?;

            let summary = revenue::generate_revenue(&executor, &mut generator, *dry_run).await?;
            info!(
                "Generated {} rows for {} customers",
                summary.rows_generated, summary.customers
            );

            if *dry_run {
                println!("Revenue rows generated: {}", summary.rows_generated);
            } else {
                println!("Revenue rows written: {}", summary.rows_written);
            }
        }
    }

    Ok(())
}
