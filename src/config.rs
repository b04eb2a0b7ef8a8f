//! Static configuration loading.
//!
//! `gateway.json` carries the tool-server endpoints and, optionally, an
//! agent table. `${VAR}` references in endpoint URLs are expanded from the
//! environment so per-user provider slugs stay out of the file.

use std::collections::BTreeMap;
use std::{env, fs, path::Path, path::PathBuf};

use serde::Deserialize;
use url::Url;

use crate::agent::AgentConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::prompts;
use crate::registry::{ToolServerDescriptor, ToolServerRegistry};

#[derive(Debug, Deserialize)]
pub struct GatewayJsonConfig {
    #[serde(rename = "toolServers")]
    pub tool_servers: BTreeMap<String, ToolServerEntry>,
    #[serde(default)]
    pub agents: Option<Vec<AgentConfig>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ToolServerEntry {
    pub url: String,
    #[serde(default)]
    pub disabled: bool,
}

/// Fully resolved configuration: a populated server registry plus the
/// agent table (from the file, or the built-in defaults).
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub servers: ToolServerRegistry,
    pub agents: Vec<AgentConfig>,
}

pub fn resolve_gateway_json_path() -> GatewayResult<PathBuf> {
    if let Ok(p) = env::var("GATEWAY_CONFIG") {
        return Ok(PathBuf::from(p));
    }

    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let candidate = PathBuf::from(xdg).join("agent-gateway").join("gateway.json");
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    let candidate = PathBuf::from("gateway.json");
    if candidate.exists() {
        return Ok(candidate);
    }

    Err(GatewayError::configuration(
        "could not find gateway.json (set GATEWAY_CONFIG or create ./gateway.json)",
    ))
}

/// Expand `${VAR}` references in an endpoint URL. Unset variables and
/// unterminated references are left verbatim so the failure shows up in
/// the resulting URL instead of silently blanking out.
fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            out.push_str("${");
            out.push_str(after);
            rest = "";
            break;
        };

        let name = &after[..end];
        match env::var(name) {
            Ok(val) => out.push_str(&val),
            Err(_) => {
                out.push_str("${");
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);

    out
}

/// Load and resolve configuration from an explicit path.
pub fn load_gateway_config_from(path: &Path) -> GatewayResult<GatewayConfig> {
    let raw = fs::read_to_string(path).map_err(|e| {
        GatewayError::configuration(format!("could not read {}: {}", path.display(), e))
    })?;
    let cfg: GatewayJsonConfig = serde_json::from_str(&raw).map_err(|e| {
        GatewayError::configuration(format!("could not parse {}: {}", path.display(), e))
    })?;

    resolve(cfg)
}

/// Load configuration from the resolved default location.
pub fn load_gateway_config() -> GatewayResult<GatewayConfig> {
    let path = resolve_gateway_json_path()?;
    load_gateway_config_from(&path)
}

fn resolve(cfg: GatewayJsonConfig) -> GatewayResult<GatewayConfig> {
    let mut servers = ToolServerRegistry::new();

    for (name, entry) in cfg.tool_servers {
        if entry.disabled {
            tracing::info!("Skipping disabled tool server `{}`", name);
            continue;
        }

        let expanded = expand_env_vars(&entry.url);
        let endpoint = Url::parse(&expanded).map_err(|e| {
            GatewayError::configuration(format!(
                "tool server `{}` has an invalid endpoint `{}`: {}",
                name, expanded, e
            ))
        })?;

        servers.insert(ToolServerDescriptor::new(name, endpoint));
    }

    let agents = cfg.agents.unwrap_or_else(prompts::default_agents);

    Ok(GatewayConfig { servers, agents })
}
