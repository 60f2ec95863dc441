use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;

/// Default sessions root, relative to the process working directory.
pub const DEFAULT_SESSIONS_DIR: &str = "sessions";

/// Env var overriding the sessions root.
pub const SESSIONS_DIR_ENV: &str = "STEWARD_SESSIONS_DIR";

const AUDIT_FILE: &str = "audit.json";
const LATEST_SUPERVISOR_FILE: &str = "last_supervisor.txt";
const SUPERVISOR_LOGS_DIR: &str = "supervisor_logs";

// ── Config ──

/// Process-wide configuration, built once at startup and handed to every
/// component that touches the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StewardConfig {
    pub sessions_root: PathBuf,
}

impl Default for StewardConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SESSIONS_DIR)
    }
}

impl StewardConfig {
    pub fn new(sessions_root: impl Into<PathBuf>) -> Self {
        Self {
            sessions_root: sessions_root.into(),
        }
    }

    /// Read `STEWARD_SESSIONS_DIR`, falling back to `./sessions`.
    pub fn from_env() -> Self {
        match std::env::var(SESSIONS_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => Self::new(dir),
            _ => Self::default(),
        }
    }

    /// `<sessions_root>/<session_id>/`
    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.sessions_root.join(session_id)
    }

    /// `<sessions_root>/<session_id>/audit.json`
    pub fn audit_path(&self, session_id: &str) -> PathBuf {
        self.session_dir(session_id).join(AUDIT_FILE)
    }

    /// `<sessions_root>/<session_id>/last_supervisor.txt`
    pub fn latest_supervisor_path(&self, session_id: &str) -> PathBuf {
        self.session_dir(session_id).join(LATEST_SUPERVISOR_FILE)
    }

    /// `<sessions_root>/<session_id>/supervisor_logs/`
    pub fn supervisor_logs_dir(&self, session_id: &str) -> PathBuf {
        self.session_dir(session_id).join(SUPERVISOR_LOGS_DIR)
    }
}

/// Ensure the session directory and its `supervisor_logs/` subdirectory exist.
pub fn ensure_session_dirs(config: &StewardConfig, session_id: &str) -> anyhow::Result<()> {
    fs::create_dir_all(config.supervisor_logs_dir(session_id))?;
    Ok(())
}

// ── Project sessions ──

/// Session-id prefix for a project: lowercase, spaces replaced by `-`.
pub fn project_slug(project_name: &str) -> String {
    project_name.to_lowercase().replace(' ', "-")
}

/// Session directories whose name starts with `<slug>-`.
///
/// This is a plain prefix match: project `my` also picks up the sessions of
/// `my-app`, since `my-app-1234` starts with `my-`. A missing sessions root
/// yields an empty list.
pub fn project_sessions(config: &StewardConfig, project_name: &str) -> Vec<PathBuf> {
    let prefix = format!("{}-", project_slug(project_name));
    let entries = match fs::read_dir(&config.sessions_root) {
        Ok(e) => e,
        Err(_) => return Vec::new(),
    };
    let mut dirs: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    dirs
}

/// Delete every directory [`project_sessions`] matches, including those of
/// other projects whose slug extends this one. Returns how many were removed.
pub fn purge_project_sessions(config: &StewardConfig, project_name: &str) -> usize {
    let mut removed = 0;
    for dir in project_sessions(config, project_name) {
        match fs::remove_dir_all(&dir) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!("failed to remove {}: {e}", dir.display()),
        }
    }
    removed
}

// ── Writes ──

/// Atomic write: write to temp file in same dir, then rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("no parent dir for {}", path.display()))?;
    fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}

/// Create `dir/<stem>.<ext>`, or `dir/<stem>_<n>.<ext>` when the name is
/// taken. Never truncates an existing file.
pub fn write_new(dir: &Path, stem: &str, ext: &str, data: &[u8]) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            format!("{stem}.{ext}")
        } else {
            format!("{stem}_{attempt}.{ext}")
        };
        let path = dir.join(name);
        match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(data)?;
                return Ok(path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e),
        }
    }
}

/// Rename `path` to `<name>.corrupt-<stamp>` beside it so a replacement can
/// be written without losing the old bytes. Returns the new location.
pub fn move_aside(path: &Path) -> std::io::Result<PathBuf> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stamp = file_stamp(OffsetDateTime::now_utc());
    let mut attempt = 0u32;
    loop {
        let candidate = if attempt == 0 {
            path.with_file_name(format!("{name}.corrupt-{stamp}"))
        } else {
            path.with_file_name(format!("{name}.corrupt-{stamp}_{attempt}"))
        };
        if !candidate.exists() {
            fs::rename(path, &candidate)?;
            return Ok(candidate);
        }
        attempt += 1;
    }
}

// ── Time & text ──

pub fn now_rfc3339() -> String {
    format_rfc3339(OffsetDateTime::now_utc())
}

pub fn format_rfc3339(ts: OffsetDateTime) -> String {
    ts.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| ts.unix_timestamp().to_string())
}

/// `YYYYmmdd_HHMMSS`, used in generated file names.
pub fn file_stamp(ts: OffsetDateTime) -> String {
    let fmt = time::macros::format_description!("[year][month][day]_[hour][minute][second]");
    ts.format(&fmt)
        .unwrap_or_else(|_| ts.unix_timestamp().to_string())
}

/// First `max_chars` characters of `s` (char-boundary safe).
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
