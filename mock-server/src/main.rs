use std::net::IpAddr;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// In-memory payment API for local development and tests.
#[derive(Parser, Debug)]
#[command(name = "mock-server")]
struct Args {
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: IpAddr,
    #[arg(long, short, env = "PORT", default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let listener = TcpListener::bind((args.host, args.port)).await?;
    info!(addr = %listener.local_addr()?, key = mock_server::TEST_API_KEY, "listening");
    mock_server::run(listener).await
}
