use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use steward_store::{now_rfc3339, truncate_chars, StewardConfig};

use crate::error::AuditError;
use crate::record::{
    AuditRecord, AuditSummary, CommandEntry, EditPreview, FileEntry, MessageEntry, WritePreview,
    EDIT_PREVIEW_CHARS, WRITE_PREVIEW_CHARS,
};
use crate::tool::ToolUse;

/// Live audit log for one session, backed by `<session>/audit.json`.
///
/// Every mutation rewrites the whole file with a plain (non-atomic) write.
/// Failures are logged and swallowed: callers sit inside the agent's tool
/// loop and must never see an error from here.
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    record: AuditRecord,
}

impl AuditLog {
    /// Start a fresh record for `session_id` and persist it immediately.
    pub fn create(config: &StewardConfig, session_id: &str, working_directory: &str) -> Self {
        if let Err(e) = steward_store::ensure_session_dirs(config, session_id) {
            tracing::warn!(session_id, "failed to create session dir: {e}");
        }
        let log = Self {
            path: config.audit_path(session_id),
            record: AuditRecord::new(session_id, working_directory, &now_rfc3339()),
        };
        log.persist();
        log
    }

    /// Re-open the session's existing record, or create a fresh one when the
    /// file is missing or unreadable. An unreadable file is moved aside to
    /// `audit.json.corrupt-<stamp>` first.
    pub fn open(config: &StewardConfig, session_id: &str, working_directory: &str) -> Self {
        let path = config.audit_path(session_id);
        if path.exists() {
            match Self::load(&path) {
                Ok(record) => {
                    tracing::debug!(
                        session_id,
                        user_messages = record.user_messages.len(),
                        "loaded existing audit"
                    );
                    return Self { path, record };
                }
                Err(e) => match steward_store::move_aside(&path) {
                    Ok(kept) => tracing::warn!(
                        session_id,
                        "unreadable audit moved to {}: {e}",
                        kept.display()
                    ),
                    Err(mv) => tracing::warn!(
                        session_id,
                        "unreadable audit could not be moved aside ({mv}): {e}"
                    ),
                },
            }
        }
        Self::create(config, session_id, working_directory)
    }

    /// Read an `audit.json` document.
    pub fn load(path: &Path) -> Result<AuditRecord, AuditError> {
        let content = fs::read_to_string(path).map_err(|e| AuditError::io(path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn session_id(&self) -> &str {
        &self.record.session_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self) -> &AuditRecord {
        &self.record
    }

    /// Tool-use hook. Bumps the tool counter, captures file/command details
    /// for recognized tools, then persists. The tool result is not stored.
    pub fn record_tool_use(&mut self, tool_name: &str, arguments: &Value, _result: &Value) {
        *self
            .record
            .tool_use_counts
            .entry(tool_name.to_string())
            .or_insert(0) += 1;

        let timestamp = now_rfc3339();
        match ToolUse::classify(tool_name, arguments) {
            ToolUse::Write { file_path, content } => {
                self.record.files_created.push(FileEntry {
                    path: file_path.clone(),
                    timestamp,
                });
                self.record.recent_writes.push(WritePreview {
                    path: file_path,
                    content_preview: truncate_chars(&content, WRITE_PREVIEW_CHARS).to_string(),
                });
            }
            ToolUse::Edit {
                file_path,
                old_string,
                new_string,
            } => {
                self.record.files_modified.push(FileEntry {
                    path: file_path.clone(),
                    timestamp,
                });
                self.record.recent_edits.push(EditPreview {
                    path: file_path,
                    old_preview: truncate_chars(&old_string, EDIT_PREVIEW_CHARS).to_string(),
                    new_preview: truncate_chars(&new_string, EDIT_PREVIEW_CHARS).to_string(),
                });
            }
            ToolUse::Read { file_path } => {
                self.record.files_viewed.push(FileEntry {
                    path: file_path,
                    timestamp,
                });
            }
            ToolUse::RunCommand { command } => {
                self.record
                    .terminal_commands
                    .push(CommandEntry { command, timestamp });
            }
            ToolUse::Other { .. } => {}
        }

        self.persist();
        tracing::info!(
            tool = tool_name,
            total = self.record.total_tools_used(),
            "tracked tool use"
        );
    }

    pub fn record_user_message(&mut self, text: &str) {
        self.record.user_messages.push(MessageEntry {
            text: text.to_string(),
            timestamp: now_rfc3339(),
        });
        self.persist();
    }

    pub fn record_agent_message(&mut self, text: &str) {
        self.record.agent_messages.push(MessageEntry {
            text: text.to_string(),
            timestamp: now_rfc3339(),
        });
        self.persist();
    }

    pub fn summarize(&self) -> AuditSummary {
        self.record.summarize()
    }

    fn persist(&self) {
        if let Err(e) = self.try_persist() {
            tracing::warn!(session_id = %self.record.session_id, "failed to save audit: {e}");
        }
    }

    fn try_persist(&self) -> Result<(), AuditError> {
        let json = serde_json::to_string_pretty(&self.record)?;
        fs::write(&self.path, json).map_err(|e| AuditError::io(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn setup() -> (tempfile::TempDir, StewardConfig) {
        let tmp = tempfile::tempdir().unwrap();
        let config = StewardConfig::new(tmp.path().join("sessions"));
        (tmp, config)
    }

    #[test]
    fn create_persists_empty_record() {
        let (_tmp, config) = setup();
        let log = AuditLog::create(&config, "demo-0001", "/work/demo");
        assert!(log.path().exists());
        assert!(config.supervisor_logs_dir("demo-0001").is_dir());

        let on_disk = AuditLog::load(log.path()).unwrap();
        assert_eq!(on_disk.session_id, "demo-0001");
        assert_eq!(on_disk.working_directory, "/work/demo");
        assert!(!on_disk.created_at.is_empty());
    }

    #[test]
    fn two_writes_of_same_file() {
        let (_tmp, config) = setup();
        let mut log = AuditLog::create(&config, "demo-0001", "/work");
        let args = json!({ "file_path": "a.txt", "content": "hello" });
        log.record_tool_use("write-file", &args, &json!("ok"));
        log.record_tool_use("write-file", &args, &json!("ok"));

        let record = AuditLog::load(log.path()).unwrap();
        assert_eq!(record.tool_use_counts["write-file"], 2);
        assert_eq!(record.files_created.len(), 2);
        assert!(record.files_created.iter().all(|f| f.path == "a.txt"));
        assert_eq!(record.recent_writes[0].content_preview, "hello");
    }

    #[test]
    fn total_tools_matches_call_count() {
        let (_tmp, config) = setup();
        let mut log = AuditLog::create(&config, "demo-0001", "/work");
        let calls = [
            ("Read", json!({ "file_path": "src/main.rs" })),
            ("Bash", json!({ "command": "cargo build" })),
            ("Glob", json!({ "pattern": "**/*.rs" })),
            ("Edit", json!({ "file_path": "src/lib.rs", "old_string": "a", "new_string": "b" })),
            ("Grep", json!({})),
            ("Bash", json!({ "command": "cargo test" })),
        ];
        for (name, args) in &calls {
            log.record_tool_use(name, args, &Value::Null);
        }
        let summary = log.summarize();
        assert_eq!(summary.total_tools_used, calls.len() as u64);
        assert_eq!(summary.tools_breakdown["Bash"], 2);
        assert_eq!(summary.total_files_modified, 1);
        assert_eq!(summary.total_files_viewed, 1);
        assert_eq!(summary.total_commands, 2);
    }

    #[test]
    fn unrecognized_tools_only_touch_counters() {
        let (_tmp, config) = setup();
        let mut log = AuditLog::create(&config, "demo-0001", "/work");
        log.record_tool_use("Glob", &json!({ "file_path": "x.py" }), &Value::Null);
        log.record_tool_use("mcp__git__status", &json!({ "command": "ls" }), &Value::Null);

        let record = log.record();
        assert!(record.files_created.is_empty());
        assert!(record.files_modified.is_empty());
        assert!(record.files_viewed.is_empty());
        assert!(record.terminal_commands.is_empty());
        assert!(record.recent_edits.is_empty());
        assert!(record.recent_writes.is_empty());
        assert_eq!(record.total_tools_used(), 2);
    }

    #[test]
    fn previews_are_truncated() {
        let (_tmp, config) = setup();
        let mut log = AuditLog::create(&config, "demo-0001", "/work");
        let long = "é".repeat(500);
        log.record_tool_use(
            "Edit",
            &json!({ "file_path": "f.rs", "old_string": long, "new_string": "short" }),
            &Value::Null,
        );
        log.record_tool_use(
            "Write",
            &json!({ "file_path": "g.rs", "content": long }),
            &Value::Null,
        );
        let record = log.record();
        assert_eq!(record.recent_edits[0].old_preview.chars().count(), EDIT_PREVIEW_CHARS);
        assert_eq!(record.recent_edits[0].new_preview, "short");
        assert_eq!(
            record.recent_writes[0].content_preview.chars().count(),
            WRITE_PREVIEW_CHARS
        );
    }

    #[test]
    fn malformed_arguments_default_to_empty() {
        let (_tmp, config) = setup();
        let mut log = AuditLog::create(&config, "demo-0001", "/work");
        log.record_tool_use("Bash", &json!("not an object"), &Value::Null);
        assert_eq!(log.record().terminal_commands[0].command, "");
    }

    #[test]
    fn messages_append_in_order() {
        let (_tmp, config) = setup();
        let mut log = AuditLog::create(&config, "demo-0001", "/work");
        log.record_user_message("first");
        log.record_agent_message("reply");
        log.record_user_message("second");

        let record = AuditLog::load(log.path()).unwrap();
        let texts: Vec<&str> = record.user_messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(record.agent_messages.len(), 1);
        assert_eq!(log.summarize().total_messages, 3);
    }

    #[test]
    fn open_reloads_existing_record() {
        let (_tmp, config) = setup();
        {
            let mut log = AuditLog::create(&config, "demo-0001", "/work");
            log.record_user_message("hello");
        }
        let mut reopened = AuditLog::open(&config, "demo-0001", "/elsewhere");
        assert_eq!(reopened.record().working_directory, "/work");
        reopened.record_user_message("again");
        assert_eq!(reopened.record().user_messages.len(), 2);
    }

    #[test]
    fn open_replaces_corrupt_record() {
        let (_tmp, config) = setup();
        steward_store::ensure_session_dirs(&config, "demo-0001").unwrap();
        fs::write(config.audit_path("demo-0001"), "{ truncated").unwrap();

        let log = AuditLog::open(&config, "demo-0001", "/work");
        assert!(log.record().user_messages.is_empty());
        assert!(AuditLog::load(log.path()).is_ok());
    }

    #[test]
    fn open_keeps_truncated_audit_beside_fresh_one() {
        let (_tmp, config) = setup();
        {
            let mut log = AuditLog::create(&config, "demo-0001", "/work");
            for i in 0..50 {
                log.record_user_message(&format!("message {i}"));
            }
        }
        let path = config.audit_path("demo-0001");
        let full = fs::read(&path).unwrap();
        let half = &full[..full.len() / 2];
        fs::write(&path, half).unwrap();

        let log = AuditLog::open(&config, "demo-0001", "/work");
        assert!(log.record().user_messages.is_empty());

        let kept: Vec<_> = fs::read_dir(config.session_dir("demo-0001"))
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with("audit.json.corrupt-"))
            .collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(fs::read(kept[0].path()).unwrap(), half);
    }

    #[test]
    fn persist_failure_is_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        // sessions root is a regular file, so nothing below it can be created
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let config = StewardConfig::new(&blocker);

        let mut log = AuditLog::create(&config, "demo-0001", "/work");
        log.record_tool_use("Bash", &json!({ "command": "ls" }), &Value::Null);
        log.record_user_message("still works");
        assert_eq!(log.summarize().total_tools_used, 1);
        assert!(!log.path().exists());
    }
}
