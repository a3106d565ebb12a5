//! Kaula MCP Server - Main entrypoint.
//!
//! Loads configuration, initializes logging and serves the MCP surface over TCP
//! or, with `--stdio`, over stdin and stdout.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use kaula_mcp_lib::config::{self, ConfigLoader, KaulaConfig, TransportType, ENV_PREFIX};
use kaula_mcp_lib::logging::init_logging;
use kaula_mcp_lib::protocol::mcp::McpServer;
use tracing::info;

/// Command line arguments for the Kaula MCP Server.
#[derive(Parser, Debug)]
#[command(name = "kaula_mcp", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Start the server (the default)
    Serve {
        /// Port to listen on, overriding the configured address
        #[arg(short, long)]
        port: Option<u16>,

        /// Serve a single session over stdin and stdout
        #[arg(long)]
        stdio: bool,
    },

    /// Validate the configuration file
    Validate,

    /// Generate a default configuration file
    GenConfig {
        /// Path to output configuration file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let loader = ConfigLoader::new(args.config.as_deref(), ENV_PREFIX);

    match args.command.unwrap_or(Command::Serve {
        port: None,
        stdio: false,
    }) {
        Command::Serve { port, stdio } => {
            let mut config = loader.load().context("Failed to load configuration")?;
            if let Some(port) = port {
                config.server.address.set_port(port);
            }
            if stdio {
                config.server.transport = TransportType::Stdio;
            }
            init_logging(&config.log)?;
            serve(config)
        }
        Command::Validate => {
            let config = loader.load().context("Configuration validation failed")?;
            init_logging(&config.log)?;
            info!("Configuration validated successfully");
            Ok(())
        }
        Command::GenConfig { output } => {
            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let toml = config::to_toml(&KaulaConfig::default())?;
            std::fs::write(&output, toml)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            eprintln!("Default configuration written to {}", output.display());
            Ok(())
        }
    }
}

fn serve(config: KaulaConfig) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.worker_threads)
        .thread_name("kaula-worker")
        .enable_all()
        .build()
        .context("Failed to build the async runtime")?;

    info!(
        name = %config.server.name,
        transport = ?config.server.transport,
        address = %config.server.address,
        "Starting Kaula MCP Server"
    );
    let server = McpServer::new(&config);

    match config.server.transport {
        TransportType::Tcp => runtime.block_on(server.run())?,
        TransportType::Stdio => {
            runtime.block_on(server.serve_stdio())?;
            // A blocking stdin read may still be parked on a runtime thread.
            runtime.shutdown_timeout(Duration::from_secs(1));
        }
    }

    info!("Server stopped");
    Ok(())
}
