//! FitPal
//!
//! An MCP server for fitness calculators, user profiles and food lookups.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use fitpal::build_info;
use fitpal::config::Config;
use fitpal::db;
use fitpal::mcp::FitpalService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (output to stderr to not interfere with MCP stdio)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("fitpal=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let config = Config::from_env()?;
    eprintln!("Database path: {}", config.database_path.display());

    // A broken MET table is an operator error; refuse to start
    let met_table = config.load_met_table()?;
    if let Some(path) = &config.met_table_path {
        tracing::info!(path = %path.display(), "Loaded MET table");
    }

    let services = config.configured_services();
    if services.is_empty() {
        tracing::warn!("No upstream credentials set; food lookup tools will report not configured");
    } else {
        tracing::info!(services = ?services, "Upstream services configured");
    }

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    eprintln!("Initializing database...");
    let database = db::Database::new(&config.database_path)?;

    database.with_conn(|conn| {
        if db::migrations::needs_migration(conn)? {
            eprintln!("Applying database migrations...");
        }
        db::migrations::run_migrations(conn)?;
        let version = db::migrations::get_schema_version(conn)?;
        eprintln!("Database schema version: {}", version);
        Ok(())
    })?;

    let service = FitpalService::new(&config, database, met_table);

    let transport = (stdin(), stdout());
    let server = service.serve(transport).await?;
    server.waiting().await?;

    Ok(())
}
