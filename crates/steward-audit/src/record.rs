use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Characters kept from each side of an edit diff.
pub const EDIT_PREVIEW_CHARS: usize = 100;

/// Characters kept from written file content.
pub const WRITE_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntry {
    pub text: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEntry {
    pub command: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditPreview {
    pub path: String,
    pub old_preview: String,
    pub new_preview: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WritePreview {
    pub path: String,
    pub content_preview: String,
}

/// Everything one session's agent did. Append-only apart from the tool
/// counters, which only ever increase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub session_id: String,
    #[serde(default)]
    pub working_directory: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub user_messages: Vec<MessageEntry>,
    #[serde(default)]
    pub agent_messages: Vec<MessageEntry>,
    #[serde(default)]
    pub files_created: Vec<FileEntry>,
    #[serde(default)]
    pub files_modified: Vec<FileEntry>,
    #[serde(default)]
    pub files_viewed: Vec<FileEntry>,
    #[serde(default)]
    pub tool_use_counts: BTreeMap<String, u64>,
    #[serde(default)]
    pub terminal_commands: Vec<CommandEntry>,
    #[serde(default)]
    pub recent_edits: Vec<EditPreview>,
    #[serde(default)]
    pub recent_writes: Vec<WritePreview>,
}

impl AuditRecord {
    pub fn new(session_id: &str, working_directory: &str, created_at: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            working_directory: working_directory.to_string(),
            created_at: created_at.to_string(),
            user_messages: Vec::new(),
            agent_messages: Vec::new(),
            files_created: Vec::new(),
            files_modified: Vec::new(),
            files_viewed: Vec::new(),
            tool_use_counts: BTreeMap::new(),
            terminal_commands: Vec::new(),
            recent_edits: Vec::new(),
            recent_writes: Vec::new(),
        }
    }

    pub fn total_tools_used(&self) -> u64 {
        self.tool_use_counts.values().sum()
    }

    pub fn summarize(&self) -> AuditSummary {
        AuditSummary {
            session_id: self.session_id.clone(),
            total_messages: self.user_messages.len() + self.agent_messages.len(),
            user_messages: self.user_messages.len(),
            agent_messages: self.agent_messages.len(),
            total_files_created: self.files_created.len(),
            total_files_modified: self.files_modified.len(),
            total_files_viewed: self.files_viewed.len(),
            total_commands: self.terminal_commands.len(),
            total_tools_used: self.total_tools_used(),
            tools_breakdown: self.tool_use_counts.clone(),
        }
    }
}

/// Aggregate counts over an [`AuditRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    pub session_id: String,
    pub total_messages: usize,
    pub user_messages: usize,
    pub agent_messages: usize,
    pub total_files_created: usize,
    pub total_files_modified: usize,
    pub total_files_viewed: usize,
    pub total_commands: usize,
    pub total_tools_used: u64,
    pub tools_breakdown: BTreeMap<String, u64>,
}
