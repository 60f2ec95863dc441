pub mod datetime;
pub mod dispatch;
mod hooks;
pub mod mcp;
pub mod settings;
mod setup;

pub use dispatch::{hook_entrypoint_from_stdin, HookResult};
pub use hooks::{SessionHooks, SessionStatus};
pub use setup::{
    approved_tools, combine_prompts, load_prompt_file, new_session_id, start_session,
    AgentOptions, AgentSetup, SessionInfo, StartRequest, StartedSession, PERMISSION_MODE,
    PREVIOUS_CONTEXT_HEADING,
};
