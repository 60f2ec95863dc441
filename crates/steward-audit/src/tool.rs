use serde_json::Value;

/// A tool invocation, narrowed to the shapes the audit log understands.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolUse {
    Write {
        file_path: String,
        content: String,
    },
    Edit {
        file_path: String,
        old_string: String,
        new_string: String,
    },
    Read {
        file_path: String,
    },
    RunCommand {
        command: String,
    },
    /// Any tool outside the recognized set. Only its counter is tracked.
    Other { arguments: Value },
}

impl ToolUse {
    /// Classify a tool call by name. Accepts both the Claude Code names
    /// (`Write`, `Edit`, `Read`, `Bash`) and the generic ones
    /// (`write-file`, `edit-file`, `read-file`, `run-command`).
    /// Missing or non-string arguments become empty strings.
    pub fn classify(tool_name: &str, arguments: &Value) -> Self {
        match tool_name {
            "Write" | "write-file" => ToolUse::Write {
                file_path: arg_str(arguments, "file_path"),
                content: arg_str(arguments, "content"),
            },
            "Edit" | "edit-file" => ToolUse::Edit {
                file_path: arg_str(arguments, "file_path"),
                old_string: arg_str(arguments, "old_string"),
                new_string: arg_str(arguments, "new_string"),
            },
            "Read" | "read-file" => ToolUse::Read {
                file_path: arg_str(arguments, "file_path"),
            },
            "Bash" | "run-command" => ToolUse::RunCommand {
                command: arg_str(arguments, "command"),
            },
            _ => ToolUse::Other {
                arguments: arguments.clone(),
            },
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, ToolUse::Other { .. })
    }
}

fn arg_str(arguments: &Value, key: &str) -> String {
    arguments
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}
