//! Integration tests for the connection manager and agent construction.
//!
//! These run real rmcp sessions over duplex streams: each mock tool server
//! is an in-process `ServerHandler`, and the manager connects through a
//! test `ServerConnector` instead of the HTTP transport.

#![cfg(test)]

use std::borrow::Cow;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::*,
    service::{RequestContext, RoleServer, ServiceExt},
};

use crate::agent::{AgentConfig, ModelRef, build_agent};
use crate::error::GatewayError;
use crate::manager::ToolConnectionManager;
use crate::mcp_client::{ClientService, ServerConnector};
use crate::registry::{ToolServerDescriptor, ToolServerRegistry};

/// Mock tool server exposing a configurable tool list.
struct MockToolServer {
    name: String,
    tools: Arc<RwLock<Vec<String>>>,
    list_calls: Arc<AtomicUsize>,
}

fn mock_tool(name: &str) -> Tool {
    Tool {
        name: Cow::Owned(name.to_string()),
        title: None,
        description: Some(Cow::Owned(format!("Mock tool {}", name))),
        input_schema: Arc::new(JsonObject::default()),
        output_schema: None,
        annotations: None,
        icons: None,
        meta: None,
    }
}

impl ServerHandler for MockToolServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.name.clone(),
                version: "1.0.0".into(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: None,
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let tools = self
            .tools
            .read()
            .unwrap()
            .iter()
            .map(|name| mock_tool(name))
            .collect();
        std::future::ready(Ok(ListToolsResult {
            tools,
            next_cursor: None,
            ..Default::default()
        }))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        let text = format!("{} handled {}", self.name, request.name);
        std::future::ready(Ok(CallToolResult {
            content: vec![Content::text(text)],
            structured_content: None,
            is_error: Some(false),
            meta: None,
        }))
    }
}

#[derive(Clone)]
struct ServerFixture {
    tools: Arc<RwLock<Vec<String>>>,
    fail: bool,
    connects: Arc<AtomicUsize>,
    list_calls: Arc<AtomicUsize>,
}

/// Test connector that serves each logical name from an in-process mock
/// server over a duplex stream, counting connection attempts.
struct DuplexConnector {
    fixtures: HashMap<String, ServerFixture>,
}

impl DuplexConnector {
    fn new() -> Self {
        Self {
            fixtures: HashMap::new(),
        }
    }

    fn with_server(mut self, name: &str, tools: &[&str]) -> Self {
        self.fixtures.insert(
            name.to_string(),
            ServerFixture {
                tools: Arc::new(RwLock::new(
                    tools.iter().map(|t| t.to_string()).collect(),
                )),
                fail: false,
                connects: Arc::new(AtomicUsize::new(0)),
                list_calls: Arc::new(AtomicUsize::new(0)),
            },
        );
        self
    }

    fn with_failing_server(mut self, name: &str) -> Self {
        self.fixtures.insert(
            name.to_string(),
            ServerFixture {
                tools: Arc::new(RwLock::new(Vec::new())),
                fail: true,
                connects: Arc::new(AtomicUsize::new(0)),
                list_calls: Arc::new(AtomicUsize::new(0)),
            },
        );
        self
    }

    fn connects(&self, name: &str) -> usize {
        self.fixtures[name].connects.load(Ordering::SeqCst)
    }

    fn list_calls(&self, name: &str) -> usize {
        self.fixtures[name].list_calls.load(Ordering::SeqCst)
    }

    fn set_tools(&self, name: &str, tools: &[&str]) {
        *self.fixtures[name].tools.write().unwrap() =
            tools.iter().map(|t| t.to_string()).collect();
    }

    fn registry(&self) -> ToolServerRegistry {
        ToolServerRegistry::from_descriptors(self.fixtures.keys().map(|name| {
            ToolServerDescriptor::new(
                name.clone(),
                url::Url::parse(&format!("https://mcp.example.com/{name}")).unwrap(),
            )
        }))
    }
}

#[async_trait::async_trait]
impl ServerConnector for DuplexConnector {
    async fn connect(&self, descriptor: &ToolServerDescriptor) -> anyhow::Result<ClientService> {
        let fixture = self
            .fixtures
            .get(&descriptor.name)
            .ok_or_else(|| anyhow::anyhow!("no fixture for `{}`", descriptor.name))?;

        fixture.connects.fetch_add(1, Ordering::SeqCst);

        if fixture.fail {
            anyhow::bail!("simulated transport failure for `{}`", descriptor.name);
        }

        let (client_stream, server_stream) = tokio::io::duplex(4096);
        let (server_read, server_write) = tokio::io::split(server_stream);
        let (client_read, client_write) = tokio::io::split(client_stream);

        let server = MockToolServer {
            name: descriptor.name.clone(),
            tools: fixture.tools.clone(),
            list_calls: fixture.list_calls.clone(),
        };

        tokio::spawn(async move {
            if let Ok(running) = server.serve((server_read, server_write)).await {
                let _ = running.waiting().await;
            }
        });

        let client = ().serve((client_read, client_write)).await?;
        Ok(client)
    }
}

/// Connector that parks every connect on a gate, signalling entry, then
/// delegates to the duplex connector once released.
struct GatedConnector {
    inner: DuplexConnector,
    entered: Arc<tokio::sync::Notify>,
    release: Arc<tokio::sync::Notify>,
}

#[async_trait::async_trait]
impl ServerConnector for GatedConnector {
    async fn connect(&self, descriptor: &ToolServerDescriptor) -> anyhow::Result<ClientService> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.connect(descriptor).await
    }
}

fn agent_config(name: &str, servers: &[&str]) -> AgentConfig {
    AgentConfig {
        name: name.to_string(),
        instructions: format!("You are the {} assistant.", name),
        model: Some(ModelRef::new("openai", "gpt-4o")),
        memory: Default::default(),
        servers: servers.iter().map(|s| s.to_string()).collect(),
    }
}

#[tokio::test]
async fn test_merged_tool_set_across_servers() {
    let connector = Arc::new(
        DuplexConnector::new()
            .with_server("gmail", &["GMAIL_SEND_EMAIL", "GMAIL_FETCH_EMAILS"])
            .with_server("sheets", &["GOOGLESHEETS_BATCH_UPDATE"]),
    );
    let manager = ToolConnectionManager::with_connector(connector.registry(), connector.clone());

    let tools = manager.get_tools(None).await.unwrap();

    assert_eq!(
        tools.names(),
        vec![
            "GMAIL_FETCH_EMAILS",
            "GMAIL_SEND_EMAIL",
            "GOOGLESHEETS_BATCH_UPDATE"
        ]
    );
    assert!(tools.errors().is_empty());

    // No cross-contamination: each tool is attributed to its own server.
    assert_eq!(tools.get("GMAIL_SEND_EMAIL").unwrap().server(), "gmail");
    assert_eq!(
        tools.get("GOOGLESHEETS_BATCH_UPDATE").unwrap().server(),
        "sheets"
    );

    // Handles are live: invoking round-trips through the mock server.
    let content = tools
        .get("GMAIL_SEND_EMAIL")
        .unwrap()
        .invoke(JsonObject::default())
        .await
        .unwrap();
    assert!(!content.is_empty());

    manager.shutdown().await;
}

#[tokio::test]
async fn test_concurrent_first_callers_open_one_connection() {
    let connector = Arc::new(DuplexConnector::new().with_server("gmail", &["GMAIL_SEND_EMAIL"]));
    let manager = Arc::new(ToolConnectionManager::with_connector(
        connector.registry(),
        connector.clone(),
    ));

    let selector = vec!["gmail".to_string()];
    let mut handles = Vec::new();
    for _ in 0..8 {
        let manager = manager.clone();
        let selector = selector.clone();
        handles.push(tokio::spawn(async move {
            manager.get_tools(Some(&selector)).await
        }));
    }

    for handle in handles {
        let tools = handle.await.unwrap().unwrap();
        assert_eq!(tools.names(), vec!["GMAIL_SEND_EMAIL"]);
    }

    assert_eq!(connector.connects("gmail"), 1);
    manager.shutdown().await;
}

#[tokio::test]
async fn test_partial_failure_isolation() {
    let connector = Arc::new(
        DuplexConnector::new()
            .with_server("gmail", &["GMAIL_SEND_EMAIL"])
            .with_server("sheets", &["GOOGLESHEETS_BATCH_UPDATE"])
            .with_failing_server("calendar"),
    );
    let manager = ToolConnectionManager::with_connector(connector.registry(), connector.clone());

    let tools = manager.get_tools(None).await.unwrap();

    assert_eq!(
        tools.names(),
        vec!["GMAIL_SEND_EMAIL", "GOOGLESHEETS_BATCH_UPDATE"]
    );
    assert_eq!(tools.errors().len(), 1);
    assert!(matches!(
        tools.errors().get("calendar"),
        Some(GatewayError::Connection { server, .. }) if server == "calendar"
    ));

    manager.shutdown().await;
}

#[tokio::test]
async fn test_discovery_cached_until_refresh() {
    let connector = Arc::new(DuplexConnector::new().with_server("gmail", &["GMAIL_SEND_EMAIL"]));
    let manager = ToolConnectionManager::with_connector(connector.registry(), connector.clone());

    manager.get_tools(None).await.unwrap();
    manager.get_tools(None).await.unwrap();
    assert_eq!(connector.connects("gmail"), 1);
    assert_eq!(connector.list_calls("gmail"), 1);

    manager.refresh("gmail").await.unwrap();
    manager.get_tools(None).await.unwrap();
    assert_eq!(connector.connects("gmail"), 1);
    assert_eq!(connector.list_calls("gmail"), 2);

    manager.shutdown().await;
}

#[tokio::test]
async fn test_agent_snapshot_survives_refresh() {
    let connector = Arc::new(DuplexConnector::new().with_server("gmail", &["GMAIL_SEND_EMAIL"]));
    let manager = ToolConnectionManager::with_connector(connector.registry(), connector.clone());

    let agent = build_agent(&manager, agent_config("gmail", &["gmail"]))
        .await
        .unwrap();
    assert_eq!(agent.tools().names(), vec!["GMAIL_SEND_EMAIL"]);

    // The server's tool list changes and the cache is refreshed; the
    // already-built agent keeps its snapshot.
    connector.set_tools("gmail", &["GMAIL_SEND_EMAIL", "GMAIL_LIST_LABELS"]);
    manager.refresh("gmail").await.unwrap();

    let refreshed = manager.get_tools(None).await.unwrap();
    assert_eq!(
        refreshed.names(),
        vec!["GMAIL_LIST_LABELS", "GMAIL_SEND_EMAIL"]
    );
    assert_eq!(agent.tools().names(), vec!["GMAIL_SEND_EMAIL"]);

    manager.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_closes_connections_and_is_idempotent() {
    let connector = Arc::new(DuplexConnector::new().with_server("gmail", &["GMAIL_SEND_EMAIL"]));
    let manager = ToolConnectionManager::with_connector(connector.registry(), connector.clone());

    let tools = manager.get_tools(None).await.unwrap();
    let handle = tools.get("GMAIL_SEND_EMAIL").unwrap().clone();

    manager.shutdown().await;
    manager.shutdown().await;
    assert!(manager.is_closed());

    // The session behind the handle is gone.
    assert!(handle.invoke(JsonObject::default()).await.is_err());
    assert!(matches!(
        manager.get_tools(None).await.unwrap_err(),
        GatewayError::Closed
    ));
}

#[tokio::test]
async fn test_shutdown_abandons_inflight_connect() {
    let inner = DuplexConnector::new().with_server("gmail", &["GMAIL_SEND_EMAIL"]);
    let registry = inner.registry();
    let entered = Arc::new(tokio::sync::Notify::new());
    let release = Arc::new(tokio::sync::Notify::new());
    let connector = Arc::new(GatedConnector {
        inner,
        entered: entered.clone(),
        release: release.clone(),
    });
    let manager = Arc::new(ToolConnectionManager::with_connector(registry, connector));

    let pending = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.get_tools(None).await })
    };
    entered.notified().await;

    // The connect is parked on the gate; shutdown must not wait for it.
    tokio::time::timeout(std::time::Duration::from_secs(1), manager.shutdown())
        .await
        .expect("shutdown blocked on an in-flight connect");
    assert!(manager.is_closed());

    // The released connect observes the closed manager and cancels its
    // fresh session instead of leaking it.
    release.notify_one();
    let result = pending.await.unwrap();
    assert!(matches!(result, Err(GatewayError::Closed)));
}

#[tokio::test]
async fn test_gateway_end_to_end() {
    let connector = Arc::new(
        DuplexConnector::new()
            .with_server("gmail", &["GMAIL_SEND_EMAIL"])
            .with_server("sheets", &["GOOGLESHEETS_BATCH_UPDATE"]),
    );
    let manager = Arc::new(ToolConnectionManager::with_connector(
        connector.registry(),
        connector.clone(),
    ));

    let mut agents = crate::runtime::AgentRegistry::new();
    agents
        .register(
            build_agent(&manager, agent_config("gmail", &["gmail"]))
                .await
                .unwrap(),
        )
        .unwrap();
    agents
        .register(
            build_agent(&manager, agent_config("sheets", &["sheets"]))
                .await
                .unwrap(),
        )
        .unwrap();

    let gateway = crate::runtime::Gateway::new(manager, agents);

    let gmail = gateway.agents().lookup("gmail").unwrap();
    assert_eq!(gmail.tools().names(), vec!["GMAIL_SEND_EMAIL"]);
    assert!(
        gateway
            .agents()
            .lookup("calendar")
            .is_err_and(|e| matches!(e, GatewayError::UnknownAgent(_)))
    );

    gateway.shutdown().await;
}
