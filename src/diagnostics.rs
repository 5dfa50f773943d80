//! Human readable snapshot rendering and the append-only diagnostic log
//!
//! The rendering lines keys up on a common width:
//!
//! ```text
//! {
//!   m1_msg_counter  : 3
//!   m2_msg_counter  : 0
//!   m3_msg_counter  : 0
//!   m1_lights       : ">>>R1G0W0w0<<<"
//! }
//! ```
//!
//! Byte-window values are wrapped in `>>>`/`<<<` so padding spaces inside the
//! fixed-width fields are visible.

use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::types::Snapshot;
use crate::{BridgeError, Result};

/// Render key/value pairs with keys padded to the longest key.
///
/// Values are expected to be already formatted (JSON literals).
pub fn render_aligned<K, V>(entries: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if entries.is_empty() {
        return "{\n\n}".to_string();
    }

    let width = entries.iter().map(|(k, _)| k.as_ref().chars().count()).max().unwrap_or(0);
    let mut out = String::from("{\n");
    for (key, value) in entries {
        out.push_str(&format!("  {:<width$} : {}\n", key.as_ref(), value.as_ref(), width = width));
    }
    out.push_str("}\n");
    out
}

/// Diagnostic rendering of a whole snapshot, counters first
pub fn render_snapshot(snapshot: &Snapshot) -> String {
    let mut entries: Vec<(&str, String)> = snapshot
        .counters
        .entries()
        .iter()
        .map(|(key, count)| (*key, count.to_string()))
        .collect();

    for field in snapshot.iter_fields() {
        entries.push((field.name, json_string(&field.value.diagnostic())));
    }

    render_aligned(&entries)
}

fn json_string(text: &str) -> String {
    serde_json::Value::String(text.to_owned()).to_string()
}

/// Append-only text log of merged snapshots
#[derive(Debug)]
pub struct DiagnosticLog {
    path: PathBuf,
    file: File,
}

impl DiagnosticLog {
    /// Open (or create) the log for appending
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| BridgeError::file_error(path.clone(), e))?;
        debug!("Diagnostic log opened at {}", path.display());
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one rendered snapshot followed by blank separator lines
    pub async fn append(&mut self, snapshot: &Snapshot) -> Result<()> {
        let mut entry = render_snapshot(snapshot);
        entry.push_str("\n\n\n");
        self.file
            .write_all(entry.as_bytes())
            .await
            .map_err(|e| BridgeError::file_error(self.path.clone(), e))?;
        self.file.flush().await.map_err(|e| BridgeError::file_error(self.path.clone(), e))
    }
}
