// MCP client plumbing backed by rmcp

use std::borrow::Cow;

use anyhow::Result;
use async_trait::async_trait;
use rmcp::model::{CallToolRequestParam, Content, JsonObject, Tool as McpTool};
use rmcp::service::{Peer, RoleClient, RunningService};
use rmcp::transport::StreamableHttpClientTransport;
use rmcp::ServiceExt;
use tracing::{info, warn};

use crate::registry::ToolServerDescriptor;

/// A live rmcp client session with one tool server.
///
/// Owned exclusively by the `ToolConnectionManager`; everything else talks
/// to the server through a cloned [`ServerPeer`].
pub type ClientService = RunningService<RoleClient, ()>;

/// Request side of a client session. Cheap to clone into tool handles;
/// calls through it fail once the owning session is cancelled.
pub type ServerPeer = Peer<RoleClient>;

/// Seam between the connection manager and the transport layer.
///
/// Production code uses [`HttpConnector`]; tests substitute in-process
/// servers over duplex streams.
#[async_trait]
pub trait ServerConnector: Send + Sync {
    async fn connect(&self, descriptor: &ToolServerDescriptor) -> Result<ClientService>;
}

/// Connects over rmcp streamable HTTP, the transport the hosted tool
/// providers (Composio-style endpoints) speak.
pub struct HttpConnector;

#[async_trait]
impl ServerConnector for HttpConnector {
    async fn connect(&self, descriptor: &ToolServerDescriptor) -> Result<ClientService> {
        info!(
            "Connecting to tool server `{}` at `{}` via rmcp streamable HTTP",
            descriptor.name, descriptor.endpoint
        );

        let transport = StreamableHttpClientTransport::from_uri(descriptor.endpoint.as_str());
        let client = ().serve(transport).await?;

        Ok(client)
    }
}

/// List the tools a connected server exposes.
pub async fn list_server_tools(server: &str, peer: &ServerPeer) -> Result<Vec<McpTool>> {
    let tools = peer.list_tools(Default::default()).await?.tools;

    if tools.is_empty() {
        warn!("Tool server `{}` reported no tools", server);
    }

    Ok(tools)
}

/// Invoke one tool on a connected server.
pub async fn call_tool(peer: &ServerPeer, tool_name: &str, args: JsonObject) -> Result<Vec<Content>> {
    let request = CallToolRequestParam {
        name: Cow::from(tool_name.to_string()),
        arguments: Some(args),
        meta: None,
        task: None,
    };

    let resp = peer.call_tool(request).await?;
    Ok(resp.content)
}
