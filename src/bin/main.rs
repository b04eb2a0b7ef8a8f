use std::path::PathBuf;

use agent_gateway::{GatewayConfig, create_gateway, load_gateway_config, load_gateway_config_from};
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agent-gateway")]
#[command(about = "Conversational agents over remote MCP tool servers")]
struct Cli {
    /// Path to gateway.json (defaults to GATEWAY_CONFIG / XDG lookup)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build all agents and keep their tool-server connections open until
    /// interrupted
    Run,
    /// Connect to every configured tool server and list the discovered tools
    DiscoverTools,
    /// List the configured agents and their tool counts
    ListAgents,
    /// Show one agent's full configuration
    ShowAgent { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("agent_gateway=info".parse()?)
                .add_directive("rmcp=warn".parse()?),
        )
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run => {
            let gateway = create_gateway(config).await?;
            info!(
                "Gateway ready with {} agent(s): {}",
                gateway.agents().len(),
                gateway.agents().names().join(", ")
            );

            // The binary owns the signal path; the core exposes shutdown()
            // but registers no OS-level handlers itself.
            tokio::signal::ctrl_c().await?;
            info!("Interrupt received, shutting down");
            gateway.shutdown().await;
        }
        Commands::DiscoverTools => {
            let manager = agent_gateway::ToolConnectionManager::new(config.servers);
            let tools = manager.get_tools(None).await?;

            println!("Discovered {} tool(s):", tools.len());
            for handle in tools.iter() {
                println!("  {} (server: {})", handle.name(), handle.server());
                if let Some(description) = handle.description() {
                    println!("    {}", description);
                }
            }
            for (server, error) in tools.errors() {
                println!("  [unavailable] {}: {}", server, error);
            }

            manager.shutdown().await;
        }
        Commands::ListAgents => {
            let gateway = create_gateway(config).await?;

            for name in gateway.agents().names() {
                let agent = gateway.agents().lookup(&name)?;
                println!(
                    "{:<12} model={}/{} tools={}",
                    agent.name(),
                    agent.model().provider,
                    agent.model().model,
                    agent.tools().len()
                );
            }

            gateway.shutdown().await;
        }
        Commands::ShowAgent { name } => {
            let gateway = create_gateway(config).await?;
            let agent = gateway.agents().lookup(&name)?;

            println!("Agent: {}", agent.name());
            println!("Model: {}/{}", agent.model().provider, agent.model().model);
            println!("Memory: {:?}", agent.memory());
            println!("Tools ({}):", agent.tools().len());
            for handle in agent.tools().iter() {
                println!("  {} (server: {})", handle.name(), handle.server());
            }
            for (server, error) in agent.tools().errors() {
                println!("  [unavailable] {}: {}", server, error);
            }
            println!();
            println!("{}", agent.instructions());

            gateway.shutdown().await;
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<GatewayConfig> {
    let config = match path {
        Some(p) => load_gateway_config_from(p)?,
        None => load_gateway_config()?,
    };
    Ok(config)
}
