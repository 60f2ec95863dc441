mod error;
mod log;
mod record;
mod tool;

pub use error::AuditError;
pub use log::AuditLog;
pub use record::{
    AuditRecord, AuditSummary, CommandEntry, EditPreview, FileEntry, MessageEntry, WritePreview,
    EDIT_PREVIEW_CHARS, WRITE_PREVIEW_CHARS,
};
pub use tool::ToolUse;
