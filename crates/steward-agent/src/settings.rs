//! Agent credential settings (`settings.json`).
//!
//! Two layouts are accepted:
//! - `{"env": {"ANTHROPIC_API_KEY": "...", "ANTHROPIC_BASE_URL": "..."}}`
//! - `{"ANTHROPIC_API_KEY": "...", "ANTHROPIC_BASE_URL": "..."}`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

/// Top-level keys picked up when they are not already in the `env` block.
pub const KNOWN_ENV_KEYS: &[&str] = &[
    "ANTHROPIC_API_KEY",
    "ANTHROPIC_AUTH_TOKEN",
    "ANTHROPIC_BASE_URL",
    "API_TIMEOUT_MS",
    "ANTHROPIC_DEFAULT_HAIKU_MODEL",
    "ANTHROPIC_DEFAULT_SONNET_MODEL",
    "ANTHROPIC_DEFAULT_OPUS_MODEL",
];

/// Pick the settings file: explicit path, then the project's
/// `.claude-sdk/settings.json`, then `~/.claude-sdk/settings.json`, then
/// `~/.claude/settings.json` (returned even if missing). Without a home
/// directory the home candidates are skipped and the missing project path is
/// returned.
pub fn resolve_settings_path(
    explicit: Option<&Path>,
    project_path: &Path,
    home: Option<&Path>,
) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let project_sdk = project_path.join(".claude-sdk").join("settings.json");
    if project_sdk.exists() {
        return project_sdk;
    }
    let Some(home) = home else {
        tracing::debug!("no home directory, settings default to {}", project_sdk.display());
        return project_sdk;
    };
    let home_sdk = home.join(".claude-sdk").join("settings.json");
    if home_sdk.exists() {
        return home_sdk;
    }
    home.join(".claude").join("settings.json")
}

/// Load agent env vars from a settings file. Missing or unreadable files
/// yield an empty map.
pub fn load_env(path: &Path) -> BTreeMap<String, String> {
    if !path.exists() {
        return BTreeMap::new();
    }
    match read_env(path) {
        Ok(env) => env,
        Err(e) => {
            tracing::warn!("could not load env from {}: {e}", path.display());
            BTreeMap::new()
        }
    }
}

fn read_env(path: &Path) -> anyhow::Result<BTreeMap<String, String>> {
    let content = std::fs::read_to_string(path)?;
    let data: Value = serde_json::from_str(&content)?;
    Ok(env_from_value(&data))
}

/// Extract the env map from parsed settings JSON.
pub fn env_from_value(data: &Value) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();

    if let Some(block) = data.get("env").and_then(|v| v.as_object()) {
        for (k, v) in block {
            if let Some(s) = scalar_to_string(v) {
                env.insert(k.clone(), s);
            }
        }
    }

    for key in KNOWN_ENV_KEYS {
        if env.contains_key(*key) {
            continue;
        }
        if let Some(s) = data.get(*key).and_then(scalar_to_string) {
            env.insert(key.to_string(), s);
        }
    }

    if !env.contains_key("ANTHROPIC_API_KEY") {
        if let Some(token) = env.get("ANTHROPIC_AUTH_TOKEN").cloned() {
            env.insert("ANTHROPIC_API_KEY".to_string(), token);
        }
    }

    env
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Copy of `env` with credential values replaced by `***`.
pub fn mask_env(env: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    env.iter()
        .map(|(k, v)| {
            let shown = if k.contains("KEY") || k.contains("TOKEN") {
                "***".to_string()
            } else {
                v.clone()
            };
            (k.clone(), shown)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn env_block_scalars_are_stringified() {
        let env = env_from_value(&json!({
            "env": {
                "ANTHROPIC_BASE_URL": "https://proxy.local",
                "API_TIMEOUT_MS": 60000,
                "DEBUG": true,
                "NESTED": { "x": 1 }
            }
        }));
        assert_eq!(env["ANTHROPIC_BASE_URL"], "https://proxy.local");
        assert_eq!(env["API_TIMEOUT_MS"], "60000");
        assert_eq!(env["DEBUG"], "true");
        assert!(!env.contains_key("NESTED"));
    }

    #[test]
    fn top_level_known_keys_do_not_override_env_block() {
        let env = env_from_value(&json!({
            "env": { "ANTHROPIC_BASE_URL": "from-env" },
            "ANTHROPIC_BASE_URL": "from-top",
            "ANTHROPIC_DEFAULT_SONNET_MODEL": "sonnet-x",
            "UNRELATED": "ignored"
        }));
        assert_eq!(env["ANTHROPIC_BASE_URL"], "from-env");
        assert_eq!(env["ANTHROPIC_DEFAULT_SONNET_MODEL"], "sonnet-x");
        assert!(!env.contains_key("UNRELATED"));
    }

    #[test]
    fn auth_token_mirrors_to_api_key() {
        let env = env_from_value(&json!({ "env": { "ANTHROPIC_AUTH_TOKEN": "tok" } }));
        assert_eq!(env["ANTHROPIC_API_KEY"], "tok");

        let env = env_from_value(&json!({
            "ANTHROPIC_API_KEY": "key",
            "ANTHROPIC_AUTH_TOKEN": "tok"
        }));
        assert_eq!(env["ANTHROPIC_API_KEY"], "key");
    }

    #[test]
    fn non_object_settings_are_empty() {
        assert!(env_from_value(&json!([1, 2, 3])).is_empty());
    }

    #[test]
    fn load_env_missing_or_corrupt_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(load_env(&tmp.path().join("missing.json")).is_empty());

        let bad = tmp.path().join("bad.json");
        std::fs::write(&bad, "{ nope").unwrap();
        assert!(load_env(&bad).is_empty());
    }

    #[test]
    fn load_env_reads_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.json");
        std::fs::write(&path, r#"{"env":{"ANTHROPIC_AUTH_TOKEN":"abc"}}"#).unwrap();
        let env = load_env(&path);
        assert_eq!(env.len(), 2);
        assert_eq!(env["ANTHROPIC_API_KEY"], "abc");
    }

    #[test]
    fn resolve_prefers_explicit_then_project_then_home() {
        let tmp = tempfile::tempdir().unwrap();
        let project = tmp.path().join("proj");
        let home = tmp.path().join("home");
        std::fs::create_dir_all(&project).unwrap();

        let explicit = tmp.path().join("custom.json");
        assert_eq!(
            resolve_settings_path(Some(&explicit), &project, Some(&home)),
            explicit
        );

        // nothing exists → ~/.claude/settings.json
        assert_eq!(
            resolve_settings_path(None, &project, Some(&home)),
            home.join(".claude").join("settings.json")
        );

        let home_sdk = home.join(".claude-sdk").join("settings.json");
        std::fs::create_dir_all(home_sdk.parent().unwrap()).unwrap();
        std::fs::write(&home_sdk, "{}").unwrap();
        assert_eq!(resolve_settings_path(None, &project, Some(&home)), home_sdk);

        let project_sdk = project.join(".claude-sdk").join("settings.json");
        std::fs::create_dir_all(project_sdk.parent().unwrap()).unwrap();
        std::fs::write(&project_sdk, "{}").unwrap();
        assert_eq!(resolve_settings_path(None, &project, Some(&home)), project_sdk);
    }

    #[test]
    fn resolve_without_home_stays_in_project() {
        let tmp = tempfile::tempdir().unwrap();
        let project = tmp.path().join("proj");
        let project_sdk = project.join(".claude-sdk").join("settings.json");

        let resolved = resolve_settings_path(None, &project, None);
        assert_eq!(resolved, project_sdk);
        assert!(!resolved.starts_with("~"));
        assert!(load_env(&resolved).is_empty());
    }

    #[test]
    fn mask_hides_keys_and_tokens() {
        let mut env = BTreeMap::new();
        env.insert("ANTHROPIC_API_KEY".to_string(), "secret".to_string());
        env.insert("ANTHROPIC_AUTH_TOKEN".to_string(), "secret".to_string());
        env.insert("ANTHROPIC_BASE_URL".to_string(), "https://x".to_string());
        let masked = mask_env(&env);
        assert_eq!(masked["ANTHROPIC_API_KEY"], "***");
        assert_eq!(masked["ANTHROPIC_AUTH_TOKEN"], "***");
        assert_eq!(masked["ANTHROPIC_BASE_URL"], "https://x");
    }
}
