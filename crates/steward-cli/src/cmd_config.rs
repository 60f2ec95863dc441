use std::path::Path;

use steward_agent::{datetime, mcp, settings};

pub fn show_settings(explicit: Option<&Path>, project_path: Option<&Path>) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let project_path = project_path.unwrap_or(cwd.as_path());
    let home = dirs::home_dir();
    let path = settings::resolve_settings_path(explicit, project_path, home.as_deref());

    println!("Settings: {}", path.display());
    if !path.exists() {
        println!("  (file not found)");
        return Ok(());
    }
    let env = settings::mask_env(&settings::load_env(&path));
    if env.is_empty() {
        println!("  (no env vars)");
    }
    for (k, v) in &env {
        println!("  {k}={v}");
    }
    Ok(())
}

pub fn mcp_list(config_path: Option<&Path>) -> anyhow::Result<()> {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => mcp::default_mcp_config_path()
            .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?,
    };
    let servers = mcp::load_mcp_servers(&path);
    if servers.is_empty() {
        println!("No MCP servers in {}", path.display());
        return Ok(());
    }
    println!("MCP servers ({}):", servers.len());
    for line in mcp::describe_servers(&servers) {
        println!("  {line}");
    }
    Ok(())
}

pub fn show_datetime(format: &str) -> anyhow::Result<()> {
    if datetime::DatetimeFormat::parse(format).is_none() {
        tracing::warn!("unknown format {format:?}, using iso");
    }
    let input = serde_json::json!({ "format": format });
    println!("{}", datetime::execute_current_datetime(Some(&input)));
    Ok(())
}
