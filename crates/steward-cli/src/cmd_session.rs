use std::path::PathBuf;

use steward_agent::{SessionHooks, SessionStatus, StartRequest};
use steward_store::StewardConfig;

pub struct StartArgs {
    pub project_name: String,
    pub path: Option<PathBuf>,
    pub prompt_file: PathBuf,
    pub condense: bool,
    pub new_session: bool,
    pub settings: Option<PathBuf>,
    pub mcp_config: Option<PathBuf>,
    pub no_hooks: bool,
}

pub fn start(config: &StewardConfig, args: StartArgs) -> anyhow::Result<()> {
    let project_path = match args.path {
        Some(p) => p,
        None => std::env::current_dir()?,
    };
    let prompt_file = if args.prompt_file.is_relative() {
        project_path.join(&args.prompt_file)
    } else {
        args.prompt_file
    };
    let req = StartRequest {
        project_name: args.project_name,
        project_path,
        prompt_file: Some(prompt_file),
        condense_previous: args.condense,
        new_session: args.new_session,
        settings: args.settings,
        mcp_config: args.mcp_config,
        home: dirs::home_dir(),
        hooks_enabled: !args.no_hooks,
    };
    let started = steward_agent::start_session(config, &req);

    eprintln!("Session: {}", started.info.session_id);
    eprintln!("Path:    {}", started.info.session_path);
    if let Some(from) = &started.condensed_from {
        eprintln!("Condensed previous session {from}");
    }
    if started.purged_sessions > 0 {
        eprintln!("Removed {} previous session(s)", started.purged_sessions);
    }
    println!("{}", serde_json::to_string_pretty(&started.options)?);
    Ok(())
}

/// Open an existing session; unknown ids are an error rather than a new session.
fn open_existing(config: &StewardConfig, session_id: &str) -> anyhow::Result<SessionHooks> {
    if !config.session_dir(session_id).is_dir() {
        anyhow::bail!(
            "session {session_id} not found under {}",
            config.sessions_root.display()
        );
    }
    Ok(SessionHooks::open(config, session_id, ""))
}

pub fn status(config: &StewardConfig, session_id: &str, json: bool) -> anyhow::Result<()> {
    let hooks = open_existing(config, session_id)?;
    let status = hooks.status();
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print!("{}", format_status(&status));
    }
    Ok(())
}

fn format_status(status: &SessionStatus) -> String {
    let a = &status.audit;
    let s = &status.supervisor;
    let mut out = String::new();
    out.push_str(&format!("Session {}\n", a.session_id));
    out.push_str(&format!(
        "Messages: {} ({} user, {} agent)\n",
        a.total_messages, a.user_messages, a.agent_messages
    ));
    out.push_str(&format!(
        "Files: {} created, {} modified, {} viewed\n",
        a.total_files_created, a.total_files_modified, a.total_files_viewed
    ));
    out.push_str(&format!("Commands: {}\n", a.total_commands));
    out.push_str(&format!("Tools used: {}\n", a.total_tools_used));
    for (tool, count) in &a.tools_breakdown {
        out.push_str(&format!("  {tool}: {count}\n"));
    }
    if s.has_current_supervisor {
        out.push_str(&format!(
            "Supervisor: {} bytes, updated {}\n",
            s.supervisor_size,
            s.last_updated.as_deref().unwrap_or("unknown")
        ));
    } else {
        out.push_str("Supervisor: (none)\n");
    }
    out.push_str(&format!("Supervisor logs: {}\n", s.total_supervisor_logs));
    out
}

pub fn save(config: &StewardConfig, session_id: &str) -> anyhow::Result<()> {
    let hooks = open_existing(config, session_id)?;
    hooks.save_from_audit();
    println!(
        "Saved {}",
        config.latest_supervisor_path(session_id).display()
    );
    Ok(())
}

pub fn condense(config: &StewardConfig, project_name: &str) -> anyhow::Result<()> {
    match steward_supervisor::condense_latest(config, project_name) {
        Some(ctx) => {
            eprintln!("Condensed session {}", ctx.session_id);
            println!("{}", ctx.text);
        }
        None => eprintln!("No sessions found for {project_name}"),
    }
    Ok(())
}

pub fn supervisor(config: &StewardConfig, session_id: &str) -> anyhow::Result<()> {
    let hooks = open_existing(config, session_id)?;
    match hooks.supervisor().load_supervisor_context() {
        Some(text) => println!("{text}"),
        None => eprintln!("No supervisor context for {session_id}"),
    }
    Ok(())
}

pub fn purge(config: &StewardConfig, project_name: &str) -> anyhow::Result<()> {
    let removed = steward_store::purge_project_sessions(config, project_name);
    println!("Removed {removed} session(s) for {project_name}");
    Ok(())
}
