//! Single-pass line classification of a plain-text transcript.
//!
//! The heuristics are literal substring tests. A line can land in several
//! buckets at once, and words that merely contain an indicator (`"rerun"`,
//! `"errors"`) still match.

use serde::Serialize;
use steward_store::truncate_chars;

pub const USER_MARKER: &str = "Human:";
pub const ASSISTANT_MARKER: &str = "Assistant:";

/// Case-sensitive substrings marking a file-related line.
pub const FILE_INDICATORS: &[&str] = &[
    ".py", ".js", ".json", ".md", ".txt", ".yml", ".yaml", "file_path",
];

/// Lowercase substrings marking a command-related line.
pub const COMMAND_INDICATORS: &[&str] = &["bash", "command", "run", "execute"];

/// Lowercase substrings marking an error-related line.
pub const ERROR_INDICATORS: &[&str] = &["error", "failed", "exception", "traceback"];

/// Max characters kept from a file, command, or error line.
pub const FEATURE_LINE_CHARS: usize = 100;

/// Features extracted from a transcript. Feature lines are already trimmed
/// and truncated to [`FEATURE_LINE_CHARS`]; user lines are kept whole and
/// cut at render time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TranscriptAnalysis {
    pub total_lines: usize,
    pub user_lines: Vec<String>,
    pub assistant_lines: usize,
    pub files: Vec<String>,
    pub commands: Vec<String>,
    pub errors: Vec<String>,
}

impl TranscriptAnalysis {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

pub fn is_user_line(line: &str) -> bool {
    line.starts_with(USER_MARKER)
}

pub fn is_assistant_line(line: &str) -> bool {
    line.starts_with(ASSISTANT_MARKER)
}

pub fn is_file_line(line: &str) -> bool {
    FILE_INDICATORS.iter().any(|ind| line.contains(ind))
}

pub fn is_command_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    COMMAND_INDICATORS.iter().any(|ind| lower.contains(ind))
}

pub fn is_error_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    ERROR_INDICATORS.iter().any(|ind| lower.contains(ind))
}

pub fn analyze(transcript: &str) -> TranscriptAnalysis {
    let mut analysis = TranscriptAnalysis::default();

    for line in transcript.lines() {
        analysis.total_lines += 1;

        if is_user_line(line) {
            analysis.user_lines.push(line.to_string());
        } else if is_assistant_line(line) {
            analysis.assistant_lines += 1;
        }

        let captured = || truncate_chars(line.trim(), FEATURE_LINE_CHARS).to_string();
        if is_file_line(line) {
            analysis.files.push(captured());
        }
        if is_command_line(line) {
            analysis.commands.push(captured());
        }
        if is_error_line(line) {
            analysis.errors.push(captured());
        }
    }

    analysis
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_transcript_is_all_zero() {
        let a = analyze("");
        assert_eq!(a, TranscriptAnalysis::default());
        assert!(!a.has_errors());
    }

    #[test]
    fn example_conversation() {
        let a = analyze(
            "Human: fix bug in app.py\nAssistant: Fixed it.\nHuman: run tests\nAssistant: Error: test failed",
        );
        assert_eq!(a.total_lines, 4);
        assert_eq!(a.user_lines.len(), 2);
        assert_eq!(a.assistant_lines, 2);
        assert_eq!(a.files, vec!["Human: fix bug in app.py"]);
        assert_eq!(a.commands, vec!["Human: run tests"]);
        assert_eq!(a.errors, vec!["Assistant: Error: test failed"]);
    }

    #[test]
    fn markers_must_prefix_the_line() {
        assert!(is_user_line("Human: hi"));
        assert!(!is_user_line("  Human: hi"));
        assert!(!is_user_line("human: hi"));
        assert!(is_assistant_line("Assistant: ok"));
        assert!(!is_assistant_line("The Assistant: ok"));
    }

    #[test]
    fn file_indicators_are_case_sensitive() {
        assert!(is_file_line("open config.yaml"));
        assert!(is_file_line("{\"file_path\": \"x\"}"));
        assert!(!is_file_line("README.MD"));
        assert!(!is_file_line("main.rs"));
    }

    #[test]
    fn substring_matches_inside_words() {
        assert!(is_command_line("Please RERUN it"));
        assert!(is_command_line("Truncated output"));
        assert!(is_error_line("no ERRORS here"));
        assert!(is_error_line("Traceback (most recent call last):"));
        assert!(!is_command_line("nothing to see"));
    }

    #[test]
    fn line_can_match_several_buckets() {
        let a = analyze("Assistant: bash run.py failed");
        assert_eq!(a.files.len(), 1);
        assert_eq!(a.commands.len(), 1);
        assert_eq!(a.errors.len(), 1);
    }

    #[test]
    fn feature_lines_are_trimmed_and_truncated() {
        let long = format!("   error {}   ", "x".repeat(300));
        let a = analyze(&long);
        assert_eq!(a.errors.len(), 1);
        assert_eq!(a.errors[0].chars().count(), FEATURE_LINE_CHARS);
        assert!(a.errors[0].starts_with("error"));
    }
}
