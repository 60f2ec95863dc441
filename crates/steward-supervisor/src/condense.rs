//! Rebuild a transcript from a stored audit record when no live transcript
//! is available, and condense the latest session of a project.

use std::fs;
use std::time::SystemTime;

use steward_audit::{AuditLog, AuditRecord, MessageEntry};
use steward_store::StewardConfig;
use time::OffsetDateTime;

use crate::analyze::{ASSISTANT_MARKER, USER_MARKER};
use crate::hook::{SupervisorContext, SupervisorHook};

/// Merge user and agent messages by timestamp into `Human:` / `Assistant:`
/// lines. Each message becomes exactly one line; ties keep users first.
pub fn transcript_from_record(record: &AuditRecord) -> String {
    let mut turns: Vec<(SortKey, String)> = Vec::new();
    for m in &record.user_messages {
        turns.push((SortKey::of(m), format!("{USER_MARKER} {}", one_line(&m.text))));
    }
    for m in &record.agent_messages {
        turns.push((
            SortKey::of(m),
            format!("{ASSISTANT_MARKER} {}", one_line(&m.text)),
        ));
    }
    // stable: equal keys keep insertion order
    turns.sort_by(|a, b| a.0.cmp(&b.0));
    turns
        .into_iter()
        .map(|(_, line)| line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parsed timestamps order before unparsable ones, which order by raw text.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Parsed(OffsetDateTime),
    Raw(String),
}

impl SortKey {
    fn of(m: &MessageEntry) -> Self {
        match OffsetDateTime::parse(
            &m.timestamp,
            &time::format_description::well_known::Rfc3339,
        ) {
            Ok(ts) => SortKey::Parsed(ts),
            Err(_) => SortKey::Raw(m.timestamp.clone()),
        }
    }
}

fn one_line(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join(" ")
}

/// Most recently modified readable `audit.json` among the project's sessions.
pub fn latest_audit_for_project(config: &StewardConfig, project_name: &str) -> Option<AuditRecord> {
    let mut latest: Option<(SystemTime, AuditRecord)> = None;
    for dir in steward_store::project_sessions(config, project_name) {
        let path = dir.join("audit.json");
        let Some(mtime) = fs::metadata(&path).ok().and_then(|m| m.modified().ok()) else {
            continue;
        };
        if latest.as_ref().is_some_and(|(best, _)| mtime <= *best) {
            continue;
        }
        match AuditLog::load(&path) {
            Ok(record) => latest = Some((mtime, record)),
            Err(e) => tracing::warn!("skipping unreadable {}: {e}", path.display()),
        }
    }
    latest.map(|(_, record)| record)
}

/// Condense the project's latest session into a supervisor context, persisted
/// under that session. `None` when the project has no readable audit.
pub fn condense_latest(config: &StewardConfig, project_name: &str) -> Option<SupervisorContext> {
    let record = latest_audit_for_project(config, project_name)?;
    let transcript = transcript_from_record(&record);
    let session_id = if record.session_id.is_empty() {
        project_name
    } else {
        record.session_id.as_str()
    };
    let hook = SupervisorHook::new(config, session_id);
    Some(hook.generate(&transcript))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn msg(text: &str, ts: &str) -> MessageEntry {
        MessageEntry {
            text: text.into(),
            timestamp: ts.into(),
        }
    }

    fn write_record(config: &StewardConfig, record: &AuditRecord) {
        steward_store::ensure_session_dirs(config, &record.session_id).unwrap();
        fs::write(
            config.audit_path(&record.session_id),
            serde_json::to_string_pretty(record).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn transcript_orders_by_timestamp() {
        let mut record = AuditRecord::new("demo-1", "/w", "");
        record.user_messages = vec![
            msg("first question", "2026-02-14T10:00:00Z"),
            msg("second question", "2026-02-14T10:00:02Z"),
        ];
        record.agent_messages = vec![
            msg("first answer", "2026-02-14T10:00:01.5Z"),
            msg("second answer", "2026-02-14T10:00:03Z"),
        ];
        assert_eq!(
            transcript_from_record(&record),
            "Human: first question\nAssistant: first answer\nHuman: second question\nAssistant: second answer"
        );
    }

    #[test]
    fn transcript_flattens_multiline_messages() {
        let mut record = AuditRecord::new("demo-1", "/w", "");
        record.user_messages = vec![msg("line one\nHuman: injected", "2026-02-14T10:00:00Z")];
        record.agent_messages = vec![msg("a\nb", "2026-02-14T10:00:01Z")];
        let transcript = transcript_from_record(&record);
        assert_eq!(
            transcript,
            "Human: line one Human: injected\nAssistant: a b"
        );
    }

    #[test]
    fn transcript_user_count_round_trips() {
        let mut record = AuditRecord::new("demo-1", "/w", "");
        for i in 0..7 {
            record
                .user_messages
                .push(msg(&format!("q{i}\nmore"), &format!("2026-02-14T10:00:{:02}Z", i * 2)));
            record
                .agent_messages
                .push(msg(&format!("a{i}"), &format!("2026-02-14T10:00:{:02}Z", i * 2 + 1)));
        }
        let analysis = crate::analyze(&transcript_from_record(&record));
        assert_eq!(analysis.user_lines.len(), record.user_messages.len());
        assert_eq!(analysis.assistant_lines, record.agent_messages.len());
    }

    #[test]
    fn empty_record_gives_empty_transcript() {
        let record = AuditRecord::new("demo-1", "/w", "");
        assert_eq!(transcript_from_record(&record), "");
    }

    #[test]
    fn latest_audit_picks_newest_mtime() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StewardConfig::new(tmp.path());

        let mut old = AuditRecord::new("demo-aaaa", "/w", "");
        old.user_messages.push(msg("old", "2026-02-14T10:00:00Z"));
        write_record(&config, &old);

        std::thread::sleep(Duration::from_millis(20));
        let mut new = AuditRecord::new("demo-bbbb", "/w", "");
        new.user_messages.push(msg("new", "2026-02-14T11:00:00Z"));
        write_record(&config, &new);

        let other = AuditRecord::new("other-cccc", "/w", "");
        write_record(&config, &other);

        let found = latest_audit_for_project(&config, "demo").unwrap();
        assert_eq!(found.session_id, "demo-bbbb");
    }

    #[test]
    fn latest_audit_skips_corrupt_files() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StewardConfig::new(tmp.path());
        let good = AuditRecord::new("demo-aaaa", "/w", "");
        write_record(&config, &good);

        std::thread::sleep(Duration::from_millis(20));
        steward_store::ensure_session_dirs(&config, "demo-bbbb").unwrap();
        fs::write(config.audit_path("demo-bbbb"), "not json").unwrap();

        let found = latest_audit_for_project(&config, "demo").unwrap();
        assert_eq!(found.session_id, "demo-aaaa");
    }

    #[test]
    fn no_matching_session_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StewardConfig::new(tmp.path());
        assert!(latest_audit_for_project(&config, "demo").is_none());
        assert!(condense_latest(&config, "demo").is_none());
    }

    #[test]
    fn condense_latest_persists_under_that_session() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StewardConfig::new(tmp.path());
        let mut record = AuditRecord::new("demo-aaaa", "/w", "");
        record.user_messages.push(msg("run app.py", "2026-02-14T10:00:00Z"));
        record.agent_messages.push(msg("Error: failed", "2026-02-14T10:00:01Z"));
        write_record(&config, &record);

        let ctx = condense_latest(&config, "demo").unwrap();
        assert_eq!(ctx.session_id, "demo-aaaa");
        assert_eq!(ctx.analysis.user_lines.len(), 1);
        assert_eq!(ctx.analysis.errors, vec!["Assistant: Error: failed"]);
        assert!(config.latest_supervisor_path("demo-aaaa").exists());
    }
}
