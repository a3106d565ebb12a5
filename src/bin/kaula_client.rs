//! Reference MCP client.
//!
//! Connects to a server over TCP (or spawns one when a command follows `--`),
//! performs the handshake and walks through the MCP surface, printing each
//! result.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Parser};
use kaula_mcp_lib::config::{ConfigLoader, KaulaConfig, ENV_PREFIX};
use kaula_mcp_lib::logging::init_logging;
use kaula_mcp_lib::protocol::mcp::McpClient;
use serde_json::{json, Value};

/// Command line arguments for the reference client.
#[derive(Parser, Debug)]
#[command(name = "kaula_client", version, about, disable_help_flag = true)]
struct Args {
    /// Server host (default: localhost)
    #[arg(short = 'h', long)]
    host: Option<String>,

    /// Server port (default: 8080)
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Show this help message
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,

    /// Spawn this server command and talk to it over stdio instead of TCP
    #[arg(last = true)]
    command: Vec<String>,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut config = ConfigLoader::new(args.config.as_deref(), ENV_PREFIX)
        .load()
        .context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.client.host = host;
    }
    if let Some(port) = args.port {
        config.client.port = port;
    }
    init_logging(&config.log)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build the async runtime")?;
    runtime.block_on(drive(&config, &args.command))
}

async fn drive(config: &KaulaConfig, command: &[String]) -> anyhow::Result<()> {
    println!("MCP Network Client");
    let client = if command.is_empty() {
        println!("Connecting to: {}:{}", config.client.host, config.client.port);
        McpClient::connect_tcp(&config.client, &config.session)
            .await
            .context("Failed to connect")?
    } else {
        println!("Spawning server: {}", command.join(" "));
        McpClient::spawn_process(command, &config.session).context("Failed to spawn server")?
    };

    println!("Initializing client...");
    client
        .initialize(&config.client.client_name, &config.client.client_version)
        .await
        .context("Failed to initialize client")?;
    println!("✓ Client initialized successfully");

    println!("\nTesting ping...");
    match client.ping().await {
        Ok(true) => println!("✓ Ping successful"),
        Ok(false) => println!("✗ Ping failed"),
        Err(err) => println!("✗ Ping failed: {err}"),
    }

    println!("\nGetting server capabilities...");
    match client.server_capabilities() {
        Ok(capabilities) => println!("✓ Server capabilities: {}", pretty(&capabilities)),
        Err(err) => println!("✗ Failed to get server capabilities: {err}"),
    }

    println!("\nListing available tools...");
    match client.list_tools().await {
        Ok(tools) => {
            println!("✓ Found {} tools:", tools.len());
            for tool in &tools {
                println!("  - {}: {}", tool.name, tool.description);
            }
            if let Some(tool) = tools.first() {
                println!("\nCalling tool '{}'...", tool.name);
                match client.call_tool(&tool.name, sample_arguments(&tool.name)).await {
                    Ok(result) => println!("✓ Tool result: {}", pretty(&result)),
                    Err(err) => println!("✗ Tool call failed: {err}"),
                }
            }
        }
        Err(err) => println!("✗ Failed to list tools: {err}"),
    }

    println!("\nListing available resources...");
    match client.list_resources().await {
        Ok(resources) => {
            println!("✓ Resources: {}", pretty(&resources));
            let first_uri = resources
                .get("resources")
                .and_then(|r| r.get(0))
                .and_then(|r| r.get("uri"))
                .and_then(Value::as_str);
            if let Some(uri) = first_uri {
                println!("\nReading resource: {uri}");
                match client.read_resource(uri).await {
                    Ok(contents) => println!("✓ Resource content: {}", pretty(&contents)),
                    Err(err) => println!("✗ Failed to read resource: {err}"),
                }
            }
        }
        Err(err) => println!("✗ Failed to list resources: {err}"),
    }

    client.close().await;
    println!("\n✓ All operations completed successfully!");
    Ok(())
}

/// Example arguments for well-known tools.
fn sample_arguments(tool: &str) -> Value {
    match tool {
        "echo" => json!({"text": "Hello from network client!"}),
        "greeting" => json!({"name": "NetworkClient"}),
        _ => json!({}),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
