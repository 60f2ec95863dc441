use std::io::Read;

use steward_store::StewardConfig;

/// Read one hook payload from stdin and dispatch it. Never fails the host:
/// errors are logged and the process still exits 0.
pub fn execute(config: &StewardConfig) -> anyhow::Result<()> {
    let mut stdin_buf = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut stdin_buf) {
        tracing::warn!("stdin read error: {e}");
        return Ok(());
    }
    tracing::debug!(bytes = stdin_buf.len(), "hook stdin");

    match steward_agent::hook_entrypoint_from_stdin(config, &stdin_buf) {
        Ok(result) => {
            if let Some(output) = &result.stdout {
                print!("{output}");
            }
        }
        Err(e) => tracing::warn!("hook failed: {e:#}"),
    }
    Ok(())
}
