//! Static registry of remote tool servers.
//!
//! The registry is populated once at startup from `gateway.json` and is
//! read-only afterward; the connection manager is the only component that
//! opens sessions against the endpoints recorded here.

use std::collections::BTreeMap;
use tracing::warn;
use url::Url;

/// Descriptor of one remote tool server. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolServerDescriptor {
    /// Logical name, unique within a registry (e.g. "gmail").
    pub name: String,
    /// Endpoint of the remote tool-invocation service. Treated as opaque
    /// and handed unmodified to the transport layer.
    pub endpoint: Url,
}

impl ToolServerDescriptor {
    pub fn new(name: impl Into<String>, endpoint: Url) -> Self {
        Self {
            name: name.into(),
            endpoint,
        }
    }
}

/// Mapping from logical name to descriptor. Duplicate registration
/// overwrites the previous entry.
#[derive(Debug, Clone, Default)]
pub struct ToolServerRegistry {
    servers: BTreeMap<String, ToolServerDescriptor>,
}

impl ToolServerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a static list of descriptors.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ToolServerDescriptor>) -> Self {
        let mut registry = Self::new();
        for descriptor in descriptors {
            registry.insert(descriptor);
        }
        registry
    }

    /// Register a descriptor, replacing any previous entry with the same
    /// logical name.
    pub fn insert(&mut self, descriptor: ToolServerDescriptor) {
        if let Some(previous) = self.servers.insert(descriptor.name.clone(), descriptor) {
            warn!(
                "Tool server `{}` registered twice; keeping the later endpoint",
                previous.name
            );
        }
    }

    pub fn get(&self, name: &str) -> Option<&ToolServerDescriptor> {
        self.servers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.servers.contains_key(name)
    }

    /// Logical names of every registered server, sorted.
    pub fn names(&self) -> Vec<String> {
        self.servers.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolServerDescriptor> {
        self.servers.values()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}
