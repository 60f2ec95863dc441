pub mod analyze;
pub mod render;

mod condense;
mod error;
mod hook;
mod transcript;

pub use analyze::{analyze, TranscriptAnalysis};
pub use condense::{condense_latest, latest_audit_for_project, transcript_from_record};
pub use error::SupervisorError;
pub use hook::{SupervisorContext, SupervisorHook, SupervisorStats};
pub use render::render_context;
pub use transcript::{last_assistant_reply, transcript_from_jsonl};
