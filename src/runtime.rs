//! Process-wide agent table and the gateway that ties it to the
//! connection manager.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use crate::agent::AgentDescriptor;
use crate::error::{GatewayError, GatewayResult};
use crate::manager::ToolConnectionManager;

/// Read-only table mapping agent names to descriptors. Built once at
/// process start; no mutation is exposed after that.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: BTreeMap<String, Arc<AgentDescriptor>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor. Fails with `DuplicateAgent` if the name is taken;
    /// the registry keeps the first registration.
    pub fn register(&mut self, descriptor: AgentDescriptor) -> GatewayResult<()> {
        if self.agents.contains_key(descriptor.name()) {
            return Err(GatewayError::DuplicateAgent(descriptor.name().to_string()));
        }

        info!(
            "Registered agent `{}` with {} tool(s)",
            descriptor.name(),
            descriptor.tools().len()
        );
        self.agents
            .insert(descriptor.name().to_string(), Arc::new(descriptor));
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> GatewayResult<Arc<AgentDescriptor>> {
        self.agents
            .get(name)
            .cloned()
            .ok_or_else(|| GatewayError::UnknownAgent(name.to_string()))
    }

    /// Agent names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.agents.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// The assembled runtime: a connection manager plus the agents built on
/// top of it. The surrounding application calls [`Gateway::shutdown`]
/// exactly once from its own termination path; the core registers no
/// OS-level handlers itself.
pub struct Gateway {
    manager: Arc<ToolConnectionManager>,
    agents: AgentRegistry,
}

impl Gateway {
    pub fn new(manager: Arc<ToolConnectionManager>, agents: AgentRegistry) -> Self {
        Self { manager, agents }
    }

    pub fn manager(&self) -> &Arc<ToolConnectionManager> {
        &self.manager
    }

    pub fn agents(&self) -> &AgentRegistry {
        &self.agents
    }

    /// Close every tool-server connection. Idempotent and never raises.
    pub async fn shutdown(&self) {
        self.manager.shutdown().await;
    }
}
