use serde::Serialize;
use serde_json::Value;
use steward_audit::{AuditLog, AuditSummary};
use steward_store::StewardConfig;
use steward_supervisor::{SupervisorContext, SupervisorHook, SupervisorStats};

/// Audit log and supervisor for one session, driven by agent lifecycle events.
#[derive(Debug)]
pub struct SessionHooks {
    audit: AuditLog,
    supervisor: SupervisorHook,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub audit: AuditSummary,
    pub supervisor: SupervisorStats,
}

impl SessionHooks {
    pub fn open(config: &StewardConfig, session_id: &str, working_directory: &str) -> Self {
        Self {
            audit: AuditLog::open(config, session_id, working_directory),
            supervisor: SupervisorHook::new(config, session_id),
        }
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn supervisor(&self) -> &SupervisorHook {
        &self.supervisor
    }

    /// PostToolUse.
    pub fn on_tool_use(&mut self, tool_name: &str, input: &Value, response: &Value) {
        self.audit.record_tool_use(tool_name, input, response);
    }

    pub fn on_user_prompt(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        self.audit.record_user_message(text);
    }

    pub fn on_agent_message(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        self.audit.record_agent_message(text);
    }

    /// PreCompact. Uses `transcript` when it has content, otherwise rebuilds
    /// one from the audit record.
    pub fn on_pre_compact(&self, transcript: Option<&str>) -> String {
        match transcript.filter(|t| !t.trim().is_empty()) {
            Some(t) => self.supervisor.pre_compact(t),
            None => self.save_from_audit().text,
        }
    }

    /// Generate and persist a supervisor context from the audit record alone.
    pub fn save_from_audit(&self) -> SupervisorContext {
        let transcript = steward_supervisor::transcript_from_record(self.audit.record());
        self.supervisor.generate(&transcript)
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            audit: self.audit.summarize(),
            supervisor: self.supervisor.stats(),
        }
    }
}
