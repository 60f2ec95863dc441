use steward_store::truncate_chars;

use crate::analyze::TranscriptAnalysis;

/// Max characters of a user activity line, including the `...` cut marker.
pub const USER_LINE_CHARS: usize = 150;

pub const MAX_USER_ACTIVITIES: usize = 5;
pub const MAX_FILES: usize = 10;
pub const MAX_COMMANDS: usize = 5;
pub const MAX_ERRORS: usize = 3;

pub const ERRORS_SECTION: &str = "<ERRORS_ENCOUNTERED>";

/// Render the supervisor block. Pure: the same analysis and timestamp always
/// produce the same text.
pub fn render_context(session_id: &str, analysis: &TranscriptAnalysis, generated_at: &str) -> String {
    let mut out = Vec::new();

    out.push(format!(
        "<SUPERVISOR_CONTEXT session=\"{session_id}\" generated=\"{generated_at}\">"
    ));
    out.push(String::new());

    out.push("<SESSION_SUMMARY>".to_string());
    out.push(format!("- Lines analyzed: {}", analysis.total_lines));
    out.push(format!("- User messages: {}", analysis.user_lines.len()));
    out.push(format!("- Assistant replies: {}", analysis.assistant_lines));
    out.push(format!("- Files mentioned: {}", analysis.files.len()));
    out.push(format!("- Commands run: {}", analysis.commands.len()));
    out.push(format!("- Errors detected: {}", analysis.errors.len()));
    out.push("</SESSION_SUMMARY>".to_string());
    out.push(String::new());

    let activities: Vec<String> = last_n(&analysis.user_lines, MAX_USER_ACTIVITIES)
        .iter()
        .map(|line| clip_with_marker(line, USER_LINE_CHARS))
        .collect();
    push_section(&mut out, "KEY_USER_ACTIVITIES", &activities);
    push_section(&mut out, "FILES_WORKED_ON", last_n(&analysis.files, MAX_FILES));
    push_section(&mut out, "RECENT_COMMANDS", last_n(&analysis.commands, MAX_COMMANDS));

    if analysis.has_errors() {
        push_section(&mut out, "ERRORS_ENCOUNTERED", last_n(&analysis.errors, MAX_ERRORS));
    }

    out.push("<CONTEXT_INSTRUCTION>".to_string());
    out.push("This continues an earlier session. The user has been working on:".to_string());
    out.push(String::new());
    out.push(format!(
        "1. FILES: {} files mentioned or modified",
        analysis.files.len()
    ));
    out.push(format!("2. COMMANDS: {} commands run", analysis.commands.len()));
    out.push(format!(
        "3. CONVERSATION: {} exchanges with the user",
        analysis.user_lines.len()
    ));
    if analysis.has_errors() {
        out.push(format!(
            "4. ERRORS: {} errors found that may need follow-up",
            analysis.errors.len()
        ));
    }
    out.push(String::new());
    out.push(
        "Stay consistent with the earlier work and refer to these files and commands when relevant."
            .to_string(),
    );
    out.push(
        "The user expects you to remember this session and pick up where it left off.".to_string(),
    );
    out.push("</CONTEXT_INSTRUCTION>".to_string());
    out.push(String::new());
    out.push("</SUPERVISOR_CONTEXT>".to_string());

    out.join("\n")
}

fn push_section(out: &mut Vec<String>, tag: &str, items: &[String]) {
    out.push(format!("<{tag}>"));
    for item in items.iter().filter(|i| !i.trim().is_empty()) {
        out.push(format!("- {item}"));
    }
    out.push(format!("</{tag}>"));
    out.push(String::new());
}

fn last_n(items: &[String], n: usize) -> &[String] {
    &items[items.len().saturating_sub(n)..]
}

/// Cut `s` to at most `max_chars`, ending in `...` when something was dropped.
fn clip_with_marker(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    format!("{}...", truncate_chars(s, max_chars.saturating_sub(3)))
}
