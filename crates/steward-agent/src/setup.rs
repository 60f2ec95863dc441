use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use steward_audit::AuditLog;
use steward_store::StewardConfig;
use steward_supervisor::SupervisorHook;

use crate::{datetime, mcp, settings};

pub const PERMISSION_MODE: &str = "bypassPermissions";
pub const PREVIOUS_CONTEXT_HEADING: &str = "# PREVIOUS SESSION CONTEXT";

const APPROVED_TOOLS: &[&str] = &[
    "Read",
    "Write",
    "Bash",
    "Edit",
    "Glob",
    "Grep",
    datetime::TOOL_NAME,
];

pub fn approved_tools() -> Vec<String> {
    APPROVED_TOOLS.iter().map(|t| t.to_string()).collect()
}

/// `<slug>-<8 hex>` with the hex taken from a fresh v4 UUID.
pub fn new_session_id(project_name: &str) -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", steward_store::project_slug(project_name), &hex[..8])
}

/// Read a prompt file, trimmed. Missing, unreadable, or blank files are `None`.
pub fn load_prompt_file(path: &Path) -> Option<String> {
    if !path.exists() {
        tracing::debug!("no prompt file at {}", path.display());
        return None;
    }
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let trimmed = content.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Err(e) => {
            tracing::warn!("could not read {}: {e}", path.display());
            None
        }
    }
}

/// Join a condensed previous-session context and a prompt with a blank line.
pub fn combine_prompts(condensed: Option<&str>, prompt: Option<&str>) -> Option<String> {
    match (condensed, prompt) {
        (Some(c), Some(p)) => Some(format!("{c}\n\n{p}")),
        (Some(c), None) => Some(c.to_string()),
        (None, Some(p)) => Some(p.to_string()),
        (None, None) => None,
    }
}

/// Options handed to the agent runtime.
#[derive(Debug, Clone, Serialize)]
pub struct AgentOptions {
    pub system_prompt: String,
    pub cwd: String,
    pub allowed_tools: Vec<String>,
    pub permission_mode: String,
    pub mcp_servers: Map<String, Value>,
    pub hooks: Vec<String>,
    pub continue_conversation: bool,
    pub session_id: String,
    pub settings: Option<String>,
    pub env: BTreeMap<String, String>,
    pub tools: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub project_name: String,
    pub project_path: String,
    pub session_path: String,
    pub tools_count: usize,
    pub mcps_count: usize,
}

/// One agent session for a project.
#[derive(Debug, Clone)]
pub struct AgentSetup {
    config: StewardConfig,
    project_name: String,
    project_path: PathBuf,
    session_id: String,
}

impl AgentSetup {
    /// New session with a generated id; its directories are created eagerly.
    pub fn new(config: &StewardConfig, project_name: &str, project_path: &Path) -> Self {
        Self::with_session_id(config, project_name, project_path, &new_session_id(project_name))
    }

    pub fn with_session_id(
        config: &StewardConfig,
        project_name: &str,
        project_path: &Path,
        session_id: &str,
    ) -> Self {
        if let Err(e) = steward_store::ensure_session_dirs(config, session_id) {
            tracing::warn!(session_id, "failed to create session dirs: {e}");
        }
        tracing::info!(session_id, "session created");
        Self {
            config: config.clone(),
            project_name: project_name.to_string(),
            project_path: project_path.to_path_buf(),
            session_id: session_id.to_string(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn session_path(&self) -> PathBuf {
        self.config.session_dir(&self.session_id)
    }

    pub fn audit_log(&self) -> AuditLog {
        AuditLog::open(
            &self.config,
            &self.session_id,
            &self.project_path.display().to_string(),
        )
    }

    pub fn supervisor(&self) -> SupervisorHook {
        SupervisorHook::new(&self.config, &self.session_id)
    }

    pub fn default_system_prompt(&self) -> String {
        format!(
            "You are a development agent working on: {name}\n\
             \n\
             Project: {path}\n\
             Session: {sid}\n\
             \n\
             This session has:\n\
             - Tools enabled without restrictions\n\
             - MCP servers loaded automatically\n\
             - Automatic tracking of every action\n\
             - A supervisor that keeps context across compactions\n\
             \n\
             Work efficiently and keep a clear record of your actions.\n",
            name = self.project_name,
            path = self.project_path.display(),
            sid = self.session_id,
        )
    }

    /// Previous supervisor block (if any) followed by `base` or the default prompt.
    pub fn build_system_prompt(&self, base: Option<&str>, supervisor: Option<&str>) -> String {
        let mut parts = Vec::new();
        if let Some(sup) = supervisor {
            parts.push(format!("{PREVIOUS_CONTEXT_HEADING}\n{sup}\n"));
        }
        match base {
            Some(prompt) => parts.push(prompt.to_string()),
            None => parts.push(self.default_system_prompt()),
        }
        parts.join("\n")
    }

    pub fn agent_options(
        &self,
        base_prompt: Option<&str>,
        settings_path: Option<&Path>,
        mcp_servers: Map<String, Value>,
        hooks_enabled: bool,
    ) -> AgentOptions {
        let supervisor = self.supervisor().load_supervisor_context();
        let env = settings_path.map(settings::load_env).unwrap_or_default();
        let hooks = if hooks_enabled {
            vec!["PreCompact".to_string(), "PostToolUse".to_string()]
        } else {
            Vec::new()
        };
        AgentOptions {
            system_prompt: self.build_system_prompt(base_prompt, supervisor.as_deref()),
            cwd: self.project_path.display().to_string(),
            allowed_tools: approved_tools(),
            permission_mode: PERMISSION_MODE.to_string(),
            mcp_servers,
            hooks,
            continue_conversation: true,
            session_id: self.session_id.clone(),
            settings: settings_path.map(|p| p.display().to_string()),
            env,
            tools: vec![datetime::tool_definition()],
        }
    }

    pub fn session_info(&self, mcps_count: usize) -> SessionInfo {
        SessionInfo {
            session_id: self.session_id.clone(),
            project_name: self.project_name.clone(),
            project_path: self.project_path.display().to_string(),
            session_path: self.session_path().display().to_string(),
            tools_count: APPROVED_TOOLS.len(),
            mcps_count,
        }
    }
}

/// Inputs for starting a session.
#[derive(Debug, Clone, Default)]
pub struct StartRequest {
    pub project_name: String,
    pub project_path: PathBuf,
    pub prompt_file: Option<PathBuf>,
    pub condense_previous: bool,
    pub new_session: bool,
    pub settings: Option<PathBuf>,
    pub mcp_config: Option<PathBuf>,
    pub home: Option<PathBuf>,
    pub hooks_enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartedSession {
    pub info: SessionInfo,
    pub purged_sessions: usize,
    pub condensed_from: Option<String>,
    pub options: AgentOptions,
}

/// Condense the latest prior session (if asked), purge old sessions (if
/// asked), then create a fresh session and build its agent options.
pub fn start_session(config: &StewardConfig, req: &StartRequest) -> StartedSession {
    let condensed = if req.condense_previous {
        steward_supervisor::condense_latest(config, &req.project_name)
    } else {
        None
    };
    if let Some(ctx) = &condensed {
        tracing::info!(from = %ctx.session_id, "condensed previous session");
    }

    let purged_sessions = if req.new_session {
        steward_store::purge_project_sessions(config, &req.project_name)
    } else {
        0
    };

    let prompt = req.prompt_file.as_deref().and_then(load_prompt_file);
    let base_prompt = combine_prompts(
        condensed.as_ref().map(|c| c.text.as_str()),
        prompt.as_deref(),
    );

    let setup = AgentSetup::new(config, &req.project_name, &req.project_path);
    // materialize audit.json so status works before the first tool call
    let _audit = setup.audit_log();

    let settings_path = settings::resolve_settings_path(
        req.settings.as_deref(),
        &req.project_path,
        req.home.as_deref(),
    );
    let mcp_servers = req
        .mcp_config
        .clone()
        .or_else(mcp::default_mcp_config_path)
        .map(|p| mcp::load_mcp_servers(&p))
        .unwrap_or_default();
    let mcps_count = mcp_servers.len();

    let options = setup.agent_options(
        base_prompt.as_deref(),
        Some(&settings_path),
        mcp_servers,
        req.hooks_enabled,
    );

    StartedSession {
        info: setup.session_info(mcps_count),
        purged_sessions,
        condensed_from: condensed.map(|c| c.session_id),
        options,
    }
}
