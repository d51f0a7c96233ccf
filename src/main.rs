use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use shoe_shop::config::AppConfig;
use shoe_shop::mail::build_mailer;
use shoe_shop::{build_app, connect};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        error!(error = %err, "Server stopped");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    let db = connect(&config.database_url).await?;
    let mailer = build_mailer(&config.mail)?;

    let bind_addr = config.bind_addr.clone();
    let app = build_app(config, db, mailer).await?;

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %listener.local_addr()?, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
