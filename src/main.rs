use cashflow_tracker::{
    config::{database, defaults},
    errors::Result,
};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load and check the defaults seeded into new ledgers
    let ledger_defaults = defaults::load_configured_defaults()
        .inspect_err(|e| error!("Invalid ledger defaults: {}", e))?;
    info!(
        categories = ledger_defaults.categories.len(),
        settings = ledger_defaults.settings.len(),
        "Ledger defaults loaded."
    );

    // 4. Connect and run the idempotent schema migration
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    Ok(())
}
