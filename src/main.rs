use anyhow::Result;
use tracing_subscriber::EnvFilter;

use forum::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "forum=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    // `forum cleanup` runs the maintenance sweeps once and exits
    if std::env::args().nth(1).as_deref() == Some("cleanup") {
        let db = forum::connect(&config).await?;
        let report = forum::cleanup::trigger_cleanup(&db).await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    forum::run(config).await
}
