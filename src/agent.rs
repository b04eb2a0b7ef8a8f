//! Agent descriptors: one addressable bundle of instructions, model,
//! memory, and tools.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, GatewayResult};
use crate::manager::{ToolConnectionManager, ToolSet};

/// Opaque reference to a hosted model, forwarded untouched to the external
/// agent-execution runtime (e.g. provider "openai", model "gpt-4o").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRef {
    pub provider: String,
    pub model: String,
}

impl ModelRef {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }
}

/// Opaque memory-store handle. Persistence semantics are delegated to the
/// external runtime; this core only carries the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum MemoryConfig {
    Disabled,
    #[default]
    InMemory,
    Sqlite {
        path: PathBuf,
    },
}

/// One row of the agent configuration table: everything needed to build an
/// [`AgentDescriptor`] except the live tool set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    pub instructions: String,
    pub model: Option<ModelRef>,
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Logical names of the tool servers this agent draws tools from.
    #[serde(default)]
    pub servers: Vec<String>,
}

/// A fully bound agent configuration. Constructed once at startup and
/// immutable thereafter; the tool set is a snapshot taken at build time,
/// so later cache refreshes in the manager never alter a built agent.
#[derive(Debug, Clone)]
pub struct AgentDescriptor {
    name: String,
    instructions: String,
    model: ModelRef,
    memory: MemoryConfig,
    tools: ToolSet,
}

impl AgentDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn model(&self) -> &ModelRef {
        &self.model
    }

    pub fn memory(&self) -> &MemoryConfig {
        &self.memory
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }
}

/// Resolve an agent's tool set through the manager and bind it into an
/// immutable descriptor.
///
/// Fails with `Configuration` if the instruction text is blank or the
/// model reference is unset; both are required for the agent to be usable.
pub async fn build_agent(
    manager: &ToolConnectionManager,
    config: AgentConfig,
) -> GatewayResult<AgentDescriptor> {
    if config.instructions.trim().is_empty() {
        return Err(GatewayError::configuration(format!(
            "agent `{}` has empty instructions",
            config.name
        )));
    }

    let model = config.model.ok_or_else(|| {
        GatewayError::configuration(format!("agent `{}` has no model reference", config.name))
    })?;
    if model.provider.trim().is_empty() || model.model.trim().is_empty() {
        return Err(GatewayError::configuration(format!(
            "agent `{}` has an incomplete model reference",
            config.name
        )));
    }

    // Captured by value: the descriptor keeps this exact mapping even if
    // the manager's cache is refreshed afterwards.
    let tools = if config.servers.is_empty() {
        ToolSet::default()
    } else {
        manager.get_tools(Some(&config.servers)).await?
    };

    Ok(AgentDescriptor {
        name: config.name,
        instructions: config.instructions,
        model,
        memory: config.memory,
        tools,
    })
}
