use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum AuditError {
    #[error("audit I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("audit JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl AuditError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_io_names_path() {
        let err = AuditError::io(
            "/tmp/x/audit.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.to_string(), "audit I/O on /tmp/x/audit.json: gone");
    }
}
