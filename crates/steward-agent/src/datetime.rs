//! `current_datetime`: a plain (non-MCP) tool returning the current time.

use serde_json::{json, Value};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

pub const TOOL_NAME: &str = "current_datetime";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatetimeFormat {
    /// RFC 3339 in the local offset.
    #[default]
    Iso,
    /// RFC 3339 in UTC with a `Z` suffix.
    IsoUtc,
    /// Whole seconds since the epoch.
    Unix,
    /// `YYYY-MM-DD HH:MM:SS +HH:MM`.
    Human,
}

impl DatetimeFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Iso => "iso",
            Self::IsoUtc => "iso_utc",
            Self::Unix => "unix",
            Self::Human => "human",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "iso" => Some(Self::Iso),
            "iso_utc" => Some(Self::IsoUtc),
            "unix" => Some(Self::Unix),
            "human" => Some(Self::Human),
            _ => None,
        }
    }

    /// Format from tool input; anything missing or unknown is `Iso`.
    pub fn from_input(input: Option<&Value>) -> Self {
        input
            .and_then(|v| v.get("format"))
            .and_then(|v| v.as_str())
            .and_then(Self::parse)
            .unwrap_or_default()
    }

    pub fn render(self, now: OffsetDateTime) -> Result<String, time::error::Format> {
        match self {
            Self::Iso => now.format(&Rfc3339),
            Self::IsoUtc => now.to_offset(UtcOffset::UTC).format(&Rfc3339),
            Self::Unix => Ok(now.unix_timestamp().to_string()),
            Self::Human => now.format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second] [offset_hour sign:mandatory]:[offset_minute]"
            )),
        }
    }
}

/// Tool definition in Anthropic tools API shape.
pub fn tool_definition() -> Value {
    json!({
        "name": TOOL_NAME,
        "description": "Returns the current date and time. Takes no required parameters; \
            accepts an optional 'format': 'iso' (local, default), 'iso_utc', 'unix', 'human'.",
        "input_schema": {
            "type": "object",
            "properties": {
                "format": {
                    "type": "string",
                    "enum": ["iso", "iso_utc", "unix", "human"],
                    "description": "Optional output format"
                }
            }
        }
    })
}

/// Run the tool. Always returns a JSON string.
pub fn execute_current_datetime(input: Option<&Value>) -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    execute_at(input, now)
}

pub(crate) fn execute_at(input: Option<&Value>, now: OffsetDateTime) -> String {
    let format = DatetimeFormat::from_input(input);
    let body = match format.render(now) {
        Ok(value) => json!({ "success": true, "now": value, "format": format.as_str() }),
        Err(e) => json!({ "success": false, "error": e.to_string() }),
    };
    body.to_string()
}
