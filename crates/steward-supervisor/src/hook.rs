use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

use serde::Serialize;
use steward_store::{file_stamp, format_rfc3339, StewardConfig};
use time::OffsetDateTime;

use crate::analyze::{analyze, TranscriptAnalysis};
use crate::error::SupervisorError;
use crate::render::render_context;

/// A rendered supervisor block plus the features it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupervisorContext {
    pub session_id: String,
    pub generated_at: String,
    pub analysis: TranscriptAnalysis,
    pub text: String,
}

/// Snapshot of a session's persisted supervisor files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupervisorStats {
    pub session_id: String,
    pub has_current_supervisor: bool,
    pub supervisor_size: u64,
    pub total_supervisor_logs: usize,
    pub last_updated: Option<String>,
}

/// Compaction hook for one session. Owns the session's `last_supervisor.txt`
/// slot and its `supervisor_logs/` history.
#[derive(Debug, Clone)]
pub struct SupervisorHook {
    config: StewardConfig,
    session_id: String,
}

impl SupervisorHook {
    pub fn new(config: &StewardConfig, session_id: &str) -> Self {
        if let Err(e) = steward_store::ensure_session_dirs(config, session_id) {
            tracing::warn!(session_id, "failed to create supervisor dirs: {e}");
        }
        Self {
            config: config.clone(),
            session_id: session_id.to_string(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Build the context for `transcript` at a fixed instant. No I/O.
    pub fn generate_at(&self, transcript: &str, now: OffsetDateTime) -> SupervisorContext {
        let analysis = analyze(transcript);
        let generated_at = format_rfc3339(now);
        let text = render_context(&self.session_id, &analysis, &generated_at);
        SupervisorContext {
            session_id: self.session_id.clone(),
            generated_at,
            analysis,
            text,
        }
    }

    /// Generate and persist a supervisor context for `transcript`.
    /// Persistence failures are logged; the context is returned regardless.
    pub fn generate(&self, transcript: &str) -> SupervisorContext {
        let now = OffsetDateTime::now_utc();
        let context = self.generate_at(transcript, now);
        if let Err(e) = self.persist(&context.text, now) {
            tracing::warn!(session_id = %self.session_id, "failed to persist supervisor: {e}");
        }
        tracing::info!(
            session_id = %self.session_id,
            chars = context.text.len(),
            "supervisor generated"
        );
        context
    }

    /// Compaction hook: returns the rendered text for prompt injection.
    pub fn pre_compact(&self, transcript: &str) -> String {
        self.generate(transcript).text
    }

    /// Latest persisted supervisor text, if any.
    pub fn load_supervisor_context(&self) -> Option<String> {
        let path = self.latest_path();
        if !path.exists() {
            return None;
        }
        match fs::read_to_string(&path) {
            Ok(content) => {
                tracing::debug!(chars = content.len(), "loaded previous supervisor");
                Some(content)
            }
            Err(e) => {
                tracing::warn!("failed to read {}: {e}", path.display());
                None
            }
        }
    }

    /// Overwrite the latest slot with `context` without touching the history.
    pub fn save_supervisor_context(&self, context: &str) {
        let path = self.latest_path();
        match steward_store::write_atomic(&path, context.as_bytes()) {
            Ok(()) => tracing::info!(chars = context.len(), "supervisor saved"),
            Err(e) => tracing::warn!("failed to save supervisor: {e}"),
        }
    }

    pub fn stats(&self) -> SupervisorStats {
        let meta = fs::metadata(self.latest_path()).ok().filter(|m| m.is_file());
        let total_supervisor_logs = fs::read_dir(self.config.supervisor_logs_dir(&self.session_id))
            .map(|entries| {
                entries
                    .flatten()
                    .filter(|e| e.path().extension().is_some_and(|ext| ext == "txt"))
                    .count()
            })
            .unwrap_or(0);

        SupervisorStats {
            session_id: self.session_id.clone(),
            has_current_supervisor: meta.is_some(),
            supervisor_size: meta.as_ref().map(|m| m.len()).unwrap_or(0),
            total_supervisor_logs,
            last_updated: meta
                .and_then(|m| m.modified().ok())
                .map(|t: SystemTime| format_rfc3339(OffsetDateTime::from(t))),
        }
    }

    fn latest_path(&self) -> PathBuf {
        self.config.latest_supervisor_path(&self.session_id)
    }

    fn persist(&self, text: &str, now: OffsetDateTime) -> Result<(), SupervisorError> {
        let latest = self.latest_path();
        fs::write(&latest, text).map_err(|e| SupervisorError::io(&latest, e))?;

        let logs_dir = self.config.supervisor_logs_dir(&self.session_id);
        let stem = format!("supervisor_{}", file_stamp(now));
        steward_store::write_new(&logs_dir, &stem, "txt", text.as_bytes())
            .map_err(|e| SupervisorError::io(&logs_dir, e))?;
        Ok(())
    }
}
