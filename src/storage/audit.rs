use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;
use tracing::warn;

/// Append-only audit trail: one `YYYY-MM-DD - description` line per event.
///
/// Auditing is best-effort: a write failure is logged and swallowed so it can
/// never fail the operation being audited.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn log(&self, action: &str) {
        let line = format!("{} - {}\n", Local::now().format("%Y-%m-%d"), action);
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(err) = result {
            warn!(path = %self.path.display(), %err, "failed to write audit entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_entries_are_appended() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.log");
        let audit = AuditLog::new(&path);

        audit.log("first event");
        audit.log("second event");

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" - first event"));
        assert!(lines[1].ends_with(" - second event"));
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        // path points at a directory, so the open fails
        let dir = TempDir::new().unwrap();
        let audit = AuditLog::new(dir.path());
        audit.log("goes nowhere");
    }
}
