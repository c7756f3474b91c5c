use clap::Parser;

use kudos_backend::cli::{self, Cli};
use kudos_backend::config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    config::logging::init_logging()?;

    let args = Cli::parse();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://kudos.db?mode=rwc".to_string());

    let db = config::database::connect(&database_url).await?;

    cli::run(args, db).await
}
