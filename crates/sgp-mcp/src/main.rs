//! SGP tool server - Entry Point

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use sgp_mcp::config::{Config, env};
use sgp_mcp::server::SgpServer;

#[derive(Parser, Debug)]
#[command(name = "sgp-mcp")]
#[command(about = "Tool server for the SGP ISP-management API")]
#[command(version)]
struct Cli {
    /// SGP base URL (e.g., https://provedor.sgp.net.br/api)
    #[arg(long, env = "SGP_URL")]
    url: String,

    /// HTTP server port
    #[arg(long, default_value = "8000", env = "PORT")]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Print the registered tools and exit
    #[arg(long)]
    list_tools: bool,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    let config = Config::from_lookup(|name| {
        if name == env::URL { Some(cli.url.clone()) } else { std::env::var(name).ok() }
    })?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.base_url,
        auth = %config.preferred_auth(),
        "Starting SGP tool server"
    );

    let server = SgpServer::new(config)?;

    if cli.list_tools {
        for tool in server.tools().list() {
            println!("{:<24} {}", tool.name, tool.description);
        }
        return Ok(());
    }

    server.run_http(cli.port).await
}
