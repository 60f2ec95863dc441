use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

/// `~/.claude.json`, where Claude Code keeps its `mcpServers` map.
pub fn default_mcp_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".claude.json"))
}

/// Load the `mcpServers` object from a Claude config file.
/// Missing, unreadable, or malformed files yield an empty map.
pub fn load_mcp_servers(path: &Path) -> Map<String, Value> {
    if !path.exists() {
        tracing::warn!("{} not found; no MCP servers loaded", path.display());
        return Map::new();
    }
    let parsed = std::fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|content| serde_json::from_str::<Value>(&content).map_err(Into::into));
    match parsed {
        Ok(config) => {
            let servers = config
                .get("mcpServers")
                .and_then(|v| v.as_object())
                .cloned()
                .unwrap_or_default();
            tracing::info!(
                servers = ?servers.keys().collect::<Vec<_>>(),
                "MCP servers loaded"
            );
            servers
        }
        Err(e) => {
            tracing::warn!("failed to load {}: {e}", path.display());
            Map::new()
        }
    }
}

/// One-line description per server: `name: command arg1 arg2`.
pub fn describe_servers(servers: &Map<String, Value>) -> Vec<String> {
    servers
        .iter()
        .map(|(name, cfg)| {
            let command = cfg.get("command").and_then(|c| c.as_str()).unwrap_or("N/A");
            let args: Vec<&str> = cfg
                .get("args")
                .and_then(|a| a.as_array())
                .map(|a| a.iter().filter_map(|x| x.as_str()).collect())
                .unwrap_or_default();
            if args.is_empty() {
                format!("{name}: {command}")
            } else {
                format!("{name}: {command} {}", args.join(" "))
            }
        })
        .collect()
}
