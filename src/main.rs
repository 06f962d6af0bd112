use tracing_subscriber::EnvFilter;

use annwire::client::AnnClient;
use annwire::config::Config;

#[tokio::main]
async fn main() {
    // Load .env
    let _ = dotenvy::dotenv();

    // Load config first (needed for logging setup)
    let config = Config::load(None).expect("failed to load config");

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .init();
        }
    }

    annwire::metrics::init();

    tracing::info!(
        socket = %config.connection.socket_path.display(),
        "annwire probe starting"
    );

    let mut client = match AnnClient::connect(&config).await {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "connect failed");
            std::process::exit(1);
        }
    };

    match client.memory_usage().await {
        Ok(kb) => tracing::info!(memory_kb = kb, "server memory usage"),
        Err(e) => {
            tracing::error!(error = %e, kind = ?e.kind(), "memory query failed");
            std::process::exit(1);
        }
    }
}
