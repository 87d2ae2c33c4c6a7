//! Event egress - writes tracker output events to file
//!
//! Events are written in JSONL format (one JSON object per line)
//! to the file specified in config. The file is an audit trail only;
//! nothing reads it back into tracker state.

use crate::io::egress_channel::EgressMessage;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Egress writer for tracker events
pub struct Egress {
    file_path: String,
}

impl Egress {
    pub fn new(file_path: &str) -> Self {
        info!(file_path = %file_path, "egress_initialized");
        Self { file_path: file_path.to_string() }
    }

    /// Consume messages until every sender is dropped
    ///
    /// Returns the number of events written.
    pub async fn run(self, mut rx: mpsc::Receiver<EgressMessage>) -> usize {
        let mut written = 0;
        while let Some(message) = rx.recv().await {
            if self.write_event(&message) {
                written += 1;
            }
        }
        info!(written = %written, "egress_closed");
        written
    }

    /// Write an event to the egress file
    /// Returns true if successful, false otherwise
    pub fn write_event(&self, message: &EgressMessage) -> bool {
        let json = match serde_json::to_string(message) {
            Ok(json) => json,
            Err(e) => {
                error!(t = %message.as_str(), error = %e, "egress_serialize_failed");
                return false;
            }
        };

        match self.append_line(&json) {
            Ok(()) => true,
            Err(e) => {
                error!(t = %message.as_str(), error = %e, "egress_write_failed");
                false
            }
        }
    }

    /// Append a line to the egress file
    fn append_line(&self, line: &str) -> std::io::Result<()> {
        let path = Path::new(&self.file_path);

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        writeln!(file, "{}", line)?;
        debug!(file = %self.file_path, bytes = %line.len(), "egress_written");

        Ok(())
    }
}
