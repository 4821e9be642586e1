// src/audit.rs
// Plain-text audit trail: one timestamped line per event, append-only.
//
// Example line:
// 2025-10-22T12:34:56.789123 | CREATE | id=5 ; model=gpt-4o-mini ; chars=42
//
// Writes are best-effort and must never block or fail the main response
// path; failures are logged and dropped.

use chrono::Utc;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Longest value rendered into an audit line; anything longer is truncated.
const MAX_FIELD_LEN: usize = 200;

#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append a one-line entry. Fire-and-forget: errors are warned, not returned.
    pub async fn record(&self, event: &str, fields: &[(&str, String)]) {
        let line = format_line(event, fields);
        let result = async {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            file.write_all(line.as_bytes()).await?;
            Ok::<_, std::io::Error>(())
        }
        .await;

        if let Err(e) = result {
            warn!("audit write failed ({}): {}", self.path.display(), e);
        }
    }

    /// Full contents of the audit file, or None when missing/empty.
    pub async fn read_all(&self) -> Option<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) if !text.is_empty() => Some(text),
            _ => None,
        }
    }

    /// Truncate the audit file.
    pub async fn clear(&self) {
        if let Err(e) = tokio::fs::write(&self.path, b"").await {
            warn!("audit clear failed ({}): {}", self.path.display(), e);
        }
    }
}

fn format_line(event: &str, fields: &[(&str, String)]) -> String {
    let ts = Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f");
    let parts: Vec<String> = fields
        .iter()
        .map(|(k, v)| {
            let mut val = v.as_str();
            if val.len() > MAX_FIELD_LEN {
                let mut end = MAX_FIELD_LEN;
                while !val.is_char_boundary(end) {
                    end -= 1;
                }
                val = &val[..end];
            }
            format!("{k}={val}")
        })
        .collect();
    format!("{ts} | {event} | {}\n", parts.join(" ; "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_has_timestamp_event_and_fields() {
        let line = format_line(
            "CREATE",
            &[("id", "5".to_string()), ("model", "gpt-4o-mini".to_string())],
        );
        assert!(line.ends_with("\n"));
        let sections: Vec<&str> = line.trim_end().splitn(3, " | ").collect();
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[1], "CREATE");
        assert_eq!(sections[2], "id=5 ; model=gpt-4o-mini");
    }

    #[test]
    fn long_values_are_truncated() {
        let long = "x".repeat(500);
        let line = format_line("EVENT", &[("v", long)]);
        let value = line.trim_end().rsplit("v=").next().unwrap();
        assert_eq!(value.len(), MAX_FIELD_LEN);
    }

    #[tokio::test]
    async fn record_appends_and_clear_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let audit = AuditLog::new(dir.path().join("audit.txt"));

        assert!(audit.read_all().await.is_none());

        audit.record("CREATE", &[("id", "1".to_string())]).await;
        audit.record("DELETE", &[("id", "1".to_string())]).await;

        let text = audit.read_all().await.expect("audit file should have content");
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().next().unwrap().contains("CREATE"));

        audit.clear().await;
        assert!(audit.read_all().await.is_none());
    }
}
