mod cmd_config;
mod cmd_hook;
mod cmd_session;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use steward_store::StewardConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "steward",
    version,
    about = "Session audit and supervisor context for coding agents"
)]
struct Cli {
    /// Sessions root (overrides STEWARD_SESSIONS_DIR)
    #[arg(long, global = true)]
    sessions_dir: Option<PathBuf>,
    /// Debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new session and print its agent options as JSON
    Start {
        /// Project name (session ids are prefixed with its slug)
        project_name: String,
        /// Project directory (default: current directory)
        #[arg(long)]
        path: Option<PathBuf>,
        /// System prompt file
        #[arg(long, default_value = "prompt.txt")]
        prompt_file: PathBuf,
        /// Condense the latest previous session into the system prompt
        #[arg(long)]
        condense: bool,
        /// Delete previous sessions of this project first
        #[arg(long)]
        new_session: bool,
        /// Agent settings file
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Claude config holding `mcpServers` (default: ~/.claude.json)
        #[arg(long)]
        mcp_config: Option<PathBuf>,
        /// Do not register PreCompact/PostToolUse hooks
        #[arg(long)]
        no_hooks: bool,
    },
    /// Handle one Claude Code hook event from stdin
    Hook,
    /// Show audit and supervisor stats for a session
    Status {
        session_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a supervisor context from a session's audit record
    Save { session_id: String },
    /// Condense the latest session of a project into a supervisor context
    Condense { project_name: String },
    /// Print a session's latest supervisor context
    Supervisor { session_id: String },
    /// Delete every session whose id starts with the project's slug
    ///
    /// Matching is by prefix, so purging `my` also removes `my-app` sessions.
    Purge { project_name: String },
    /// Show the resolved settings file and its env (credentials masked)
    Settings {
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Project directory (default: current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// MCP server configuration
    Mcp {
        #[command(subcommand)]
        cmd: McpCmd,
    },
    /// Print the current date/time as the current_datetime tool would
    Datetime {
        /// iso, iso_utc, unix, or human
        #[arg(long, default_value = "iso")]
        format: String,
    },
}

#[derive(Subcommand)]
enum McpCmd {
    /// List configured MCP servers
    List {
        /// Claude config file (default: ~/.claude.json)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("STEWARD_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init()
        .ok();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match cli.sessions_dir {
        Some(dir) => StewardConfig::new(dir),
        None => StewardConfig::from_env(),
    };

    match cli.cmd {
        Command::Start {
            project_name,
            path,
            prompt_file,
            condense,
            new_session,
            settings,
            mcp_config,
            no_hooks,
        } => cmd_session::start(
            &config,
            cmd_session::StartArgs {
                project_name,
                path,
                prompt_file,
                condense,
                new_session,
                settings,
                mcp_config,
                no_hooks,
            },
        ),
        Command::Hook => cmd_hook::execute(&config),
        Command::Status { session_id, json } => cmd_session::status(&config, &session_id, json),
        Command::Save { session_id } => cmd_session::save(&config, &session_id),
        Command::Condense { project_name } => cmd_session::condense(&config, &project_name),
        Command::Supervisor { session_id } => cmd_session::supervisor(&config, &session_id),
        Command::Purge { project_name } => cmd_session::purge(&config, &project_name),
        Command::Settings { settings, path } => {
            cmd_config::show_settings(settings.as_deref(), path.as_deref())
        }
        Command::Mcp { cmd } => match cmd {
            McpCmd::List { config: path } => cmd_config::mcp_list(path.as_deref()),
        },
        Command::Datetime { format } => cmd_config::show_datetime(&format),
    }
}
