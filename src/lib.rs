//! agent-gateway: conversational agents over remote MCP tool servers.
//!
//! Each agent binds prompt instructions, a model reference, a memory
//! handle, and a tool set discovered from hosted tool servers. The
//! orchestration run loop lives in the external agent runtime; this crate
//! owns the tool-server connection lifecycle and the agent table.

// Core modules
mod agent;
mod config;
mod error;
mod manager;
mod mcp_client;
mod registry;
mod runtime;

pub mod prompts;

#[cfg(test)]
mod integration_tests;

// Re-export key types and functions
pub use agent::{AgentConfig, AgentDescriptor, MemoryConfig, ModelRef, build_agent};
pub use config::{
    GatewayConfig, GatewayJsonConfig, ToolServerEntry, load_gateway_config,
    load_gateway_config_from, resolve_gateway_json_path,
};
pub use error::{GatewayError, GatewayResult};
pub use manager::{ToolConnectionManager, ToolHandle, ToolSet};
pub use mcp_client::{ClientService, HttpConnector, ServerConnector, ServerPeer};
pub use registry::{ToolServerDescriptor, ToolServerRegistry};
pub use runtime::{AgentRegistry, Gateway};

use std::sync::Arc;

/// Convenience function to assemble a fully configured gateway.
///
/// Builds the connection manager over the configured servers, constructs
/// every agent in the table (opening connections lazily as their tool
/// selectors demand), and registers them. Configuration and registration
/// errors fail fast; the caller owns the single `shutdown()` call.
pub async fn create_gateway(config: GatewayConfig) -> GatewayResult<Gateway> {
    let manager = Arc::new(ToolConnectionManager::new(config.servers));

    let mut agents = AgentRegistry::new();
    for agent_config in config.agents {
        let descriptor = build_agent(&manager, agent_config).await?;
        agents.register(descriptor)?;
    }

    Ok(Gateway::new(manager, agents))
}
