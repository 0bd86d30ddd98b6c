use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use utility_mcp::transport::serve_stdio;
use utility_mcp::{default_registry, Dispatcher, Session};
use utility_server::config::ServerConfig;
use utility_server::sse::{self, SseState};

#[derive(Parser, Debug)]
#[command(name = "utility-server")]
#[command(about = "Utility MCP server - local (stdio) and remote (SSE) modes", long_about = None)]
struct Args {
    /// Serve remote clients over SSE instead of local stdio
    #[arg(long)]
    remote: bool,

    /// Host to bind to in remote mode
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on in remote mode
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Path to configuration file
    #[arg(short, long, default_value = "utility-server.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr: in stdio mode stdout carries protocol messages
    // and must stay clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = ServerConfig::load(&args.config)?;

    let registry = Arc::new(default_registry()?);
    tracing::info!("Registered {} tools", registry.len());

    if args.remote {
        let addr = format!("{}:{}", args.host, args.port);
        let state = SseState::new(registry, config.server_info(), config.instructions());
        sse::serve(&addr, state).await?;
    } else {
        tracing::info!("Starting local MCP server on stdio");
        let session = Session::new(
            Dispatcher::new(registry),
            config.server_info(),
            config.instructions(),
        );
        serve_stdio(session).await?;
    }

    Ok(())
}
