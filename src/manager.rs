//! Connection lifecycle for remote tool servers.
//!
//! The `ToolConnectionManager` owns every live session: connections open
//! lazily on the first tool request, discovery results are cached per
//! server, and one `shutdown()` closes everything exactly once. A failed
//! server never blocks tool sets for the healthy ones; its error travels
//! in the merged [`ToolSet`] instead.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rmcp::model::{Content, JsonObject, Tool as McpTool};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{GatewayError, GatewayResult};
use crate::mcp_client::{self, ClientService, HttpConnector, ServerConnector, ServerPeer};
use crate::registry::ToolServerRegistry;

/// Invocation handle for one discovered tool.
///
/// Carries the declared capability (name, description, input schema) from
/// the server's `list_tools` response plus a peer for calling it. Handles
/// stay valid until the owning connection is closed.
#[derive(Clone)]
pub struct ToolHandle {
    server: String,
    tool: McpTool,
    peer: ServerPeer,
}

impl ToolHandle {
    pub fn name(&self) -> &str {
        self.tool.name.as_ref()
    }

    /// Logical name of the server that exposes this tool.
    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn description(&self) -> Option<&str> {
        self.tool.description.as_deref()
    }

    pub fn input_schema(&self) -> &JsonObject {
        self.tool.input_schema.as_ref()
    }

    /// Call the tool on its remote server.
    pub async fn invoke(&self, args: JsonObject) -> GatewayResult<Vec<Content>> {
        mcp_client::call_tool(&self.peer, self.name(), args)
            .await
            .map_err(|e| GatewayError::connection(&self.server, e))
    }
}

impl fmt::Debug for ToolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolHandle")
            .field("server", &self.server)
            .field("name", &self.tool.name)
            .finish()
    }
}

/// Merged view of the tools exposed by one or more connected servers.
///
/// Servers that failed discovery contribute no tools; their errors are
/// recorded per logical name so the caller can decide whether the missing
/// capability is fatal.
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
    tools: BTreeMap<String, ToolHandle>,
    errors: BTreeMap<String, GatewayError>,
}

impl ToolSet {
    pub fn get(&self, tool_name: &str) -> Option<&ToolHandle> {
        self.tools.get(tool_name)
    }

    /// Tool names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolHandle> {
        self.tools.values()
    }

    /// Per-server discovery failures, keyed by logical server name.
    pub fn errors(&self) -> &BTreeMap<String, GatewayError> {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    fn insert(&mut self, handle: ToolHandle) {
        if let Some(existing) = self.tools.get(handle.name()) {
            warn!(
                "Tool `{}` from server `{}` shadowed by server `{}`; keeping the first",
                handle.name(),
                handle.server(),
                existing.server()
            );
            return;
        }
        self.tools.insert(handle.name().to_string(), handle);
    }

    fn record_error(&mut self, server: impl Into<String>, error: GatewayError) {
        self.errors.insert(server.into(), error);
    }
}

/// Per-server connection and discovery state. The mutex serializes the
/// first callers so a server is never connected twice.
#[derive(Default)]
struct ServerSlot {
    state: Mutex<SlotState>,
}

#[derive(Default)]
struct SlotState {
    peer: Option<ServerPeer>,
    tools: Option<Vec<McpTool>>,
}

/// Owns the set of remote tool-server connections and hands out tool sets
/// to agents without duplicating connections.
pub struct ToolConnectionManager {
    registry: ToolServerRegistry,
    connector: Arc<dyn ServerConnector>,
    slots: Mutex<HashMap<String, Arc<ServerSlot>>>,
    /// Live session handles, drained once by `shutdown()`.
    connections: Mutex<HashMap<String, ClientService>>,
    closed: AtomicBool,
}

impl ToolConnectionManager {
    pub fn new(registry: ToolServerRegistry) -> Self {
        Self::with_connector(registry, Arc::new(HttpConnector))
    }

    /// Build a manager with a custom transport seam. Tests use this to
    /// substitute in-process servers.
    pub fn with_connector(registry: ToolServerRegistry, connector: Arc<dyn ServerConnector>) -> Self {
        Self {
            registry,
            connector,
            slots: Mutex::new(HashMap::new()),
            connections: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn registry(&self) -> &ToolServerRegistry {
        &self.registry
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Merged tool set for the named servers, or for every registered
    /// server when `selector` is `None`.
    ///
    /// Unknown selector entries fail with `Configuration` before any
    /// connection is opened. Connections open lazily and are reused across
    /// calls; a server that fails discovery is excluded from the merged set
    /// and recorded in [`ToolSet::errors`].
    pub async fn get_tools(&self, selector: Option<&[String]>) -> GatewayResult<ToolSet> {
        if self.is_closed() {
            return Err(GatewayError::Closed);
        }

        let names: Vec<String> = match selector {
            Some(selected) => {
                let mut unknown = Vec::new();
                for name in selected {
                    if !self.registry.contains(name) {
                        unknown.push(name.as_str());
                    }
                }
                if !unknown.is_empty() {
                    return Err(GatewayError::configuration(format!(
                        "selector names unregistered tool server(s): {}",
                        unknown.join(", ")
                    )));
                }
                // Dedup; a selector is a set of logical names.
                selected.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect()
            }
            None => self.registry.names(),
        };

        let mut set = ToolSet::default();
        for name in names {
            match self.server_tools(&name).await {
                Ok(handles) => {
                    for handle in handles {
                        set.insert(handle);
                    }
                }
                Err(GatewayError::Closed) => return Err(GatewayError::Closed),
                Err(err) => {
                    warn!("Excluding tool server `{}` from merged tool set: {}", name, err);
                    set.record_error(name, err);
                }
            }
        }

        Ok(set)
    }

    /// Tools of a single named server. Fails with `UnknownServer` if the
    /// name is not registered, and propagates that server's connection
    /// error directly (no aggregation boundary to hide behind).
    pub async fn get_tools_for(&self, logical_name: &str) -> GatewayResult<ToolSet> {
        if !self.registry.contains(logical_name) {
            return Err(GatewayError::UnknownServer(logical_name.to_string()));
        }
        if self.is_closed() {
            return Err(GatewayError::Closed);
        }

        let mut set = ToolSet::default();
        for handle in self.server_tools(logical_name).await? {
            set.insert(handle);
        }
        Ok(set)
    }

    /// Drop the cached discovery result for one server. The connection
    /// stays open; the next tool request lists tools again.
    pub async fn refresh(&self, logical_name: &str) -> GatewayResult<()> {
        if !self.registry.contains(logical_name) {
            return Err(GatewayError::UnknownServer(logical_name.to_string()));
        }

        let slot = {
            let slots = self.slots.lock().await;
            slots.get(logical_name).cloned()
        };

        if let Some(slot) = slot {
            slot.state.lock().await.tools = None;
            debug!("Invalidated cached tools for server `{}`", logical_name);
        }

        Ok(())
    }

    /// Close every open connection. Idempotent: a second call, or a call
    /// when nothing is open, observes "already closed" and returns
    /// immediately. Never raises; close failures are logged.
    ///
    /// In-flight discovery is abandoned rather than awaited: a connect that
    /// completes after the flag flips cancels its own fresh session.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("Shutdown already performed; nothing to do");
            return;
        }

        let drained: Vec<(String, ClientService)> = {
            let mut connections = self.connections.lock().await;
            connections.drain().collect()
        };

        for (name, service) in drained {
            info!("Closing connection to tool server `{}`", name);
            if let Err(e) = service.cancel().await {
                warn!("Error while closing connection to `{}`: {}", name, e);
            }
        }

        self.slots.lock().await.clear();
        info!("Tool connection manager shut down");
    }

    /// Connect (once) and discover (cached) for one server, returning a
    /// handle per tool. Serialized per logical name by the slot mutex.
    async fn server_tools(&self, name: &str) -> GatewayResult<Vec<ToolHandle>> {
        let slot = self.slot(name).await;
        let mut state = slot.state.lock().await;

        let peer = match state.peer.clone() {
            Some(peer) => peer,
            None => {
                if self.is_closed() {
                    return Err(GatewayError::Closed);
                }

                let descriptor = self
                    .registry
                    .get(name)
                    .cloned()
                    .ok_or_else(|| GatewayError::UnknownServer(name.to_string()))?;

                let service = self
                    .connector
                    .connect(&descriptor)
                    .await
                    .map_err(|e| GatewayError::connection(name, e))?;
                let peer = service.peer().clone();

                // The closed flag is re-checked under the connections lock:
                // shutdown flips it before draining, so either we see the
                // flag and close our fresh session ourselves, or shutdown
                // drains the entry we insert.
                {
                    let mut connections = self.connections.lock().await;
                    if self.is_closed() {
                        drop(connections);
                        if let Err(e) = service.cancel().await {
                            debug!("Error discarding connection to `{}`: {}", name, e);
                        }
                        return Err(GatewayError::Closed);
                    }
                    connections.insert(name.to_string(), service);
                }

                state.peer = Some(peer.clone());
                peer
            }
        };

        if state.tools.is_none() {
            let tools = mcp_client::list_server_tools(name, &peer)
                .await
                .map_err(|e| GatewayError::connection(name, e))?;
            debug!("Discovered {} tool(s) on server `{}`", tools.len(), name);
            state.tools = Some(tools);
        }

        let handles = state
            .tools
            .iter()
            .flatten()
            .map(|tool| ToolHandle {
                server: name.to_string(),
                tool: tool.clone(),
                peer: peer.clone(),
            })
            .collect();

        Ok(handles)
    }

    async fn slot(&self, name: &str) -> Arc<ServerSlot> {
        let mut slots = self.slots.lock().await;
        slots
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(ServerSlot::default()))
            .clone()
    }
}
