//! Append-only message log: one JSON line per message, ciphertext only.
//! Plaintext is never written to disk — the whole point of the log is to
//! give an embedder a durable record without weakening confidentiality.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use serde::Serialize;

#[derive(Serialize)]
struct LogRecord<'a> {
    timestamp: String,
    from: &'a str,
    to: &'a str,
    nonce: &'a str,
    entry: &'a str,
}

pub struct MessageLog {
    file: File,
}

impl MessageLog {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }

    /// Append one record. `nonce` and `ct` are already base64-encoded, as
    /// they appear on the wire — the log never sees plaintext.
    pub fn append(&mut self, from: &str, to: &str, nonce: &str, ct: &str) -> std::io::Result<()> {
        let record = LogRecord {
            timestamp: chrono::Utc::now().to_rfc3339(),
            from,
            to,
            nonce,
            entry: ct,
        };
        let mut line = serde_json::to_string(&record).expect("log record always serializes");
        line.push('\n');
        self.file.write_all(line.as_bytes())
    }
}
