//! Occupancy log - appends the current count to a local file
//!
//! One formatted line per flush interval:
//! `<DD-MM-YYYY> <HH:MM:SS> | people: <count>`
//!
//! Storage rotation and retention are the host system's concern; this
//! module only appends.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::{debug, error, info};

/// Append-only occupancy log writer
pub struct OccupancyLog {
    file_path: String,
}

impl OccupancyLog {
    pub fn new(file_path: &str) -> Self {
        info!(file_path = %file_path, "occupancy_log_initialized");
        Self { file_path: file_path.to_string() }
    }

    /// Append one occupancy entry.
    /// Returns true if successful, false otherwise.
    pub fn append(&self, timestamp: &str, people: u32) -> bool {
        let line = format!("{} | people: {}", timestamp, people);

        match self.append_line(&line) {
            Ok(()) => {
                debug!(people = %people, "occupancy_logged");
                true
            }
            Err(e) => {
                error!(file = %self.file_path, error = %e, "occupancy_log_failed");
                false
            }
        }
    }

    /// Report on an existing log from a previous run, if any.
    /// Returns the number of retained entries.
    pub fn log_existing(&self) -> usize {
        match std::fs::read_to_string(&self.file_path) {
            Ok(content) => {
                let entries = content.lines().count();
                if entries > 0 {
                    info!(
                        file = %self.file_path,
                        entries = %entries,
                        last = %content.lines().last().unwrap_or(""),
                        "occupancy_log_existing"
                    );
                }
                entries
            }
            Err(_) => {
                debug!(file = %self.file_path, "occupancy_log_fresh");
                0
            }
        }
    }

    /// Append a line to the log file
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

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_append_creates_file_and_formats_line() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("people_log.txt");
        let log = OccupancyLog::new(file_path.to_str().unwrap());

        assert!(log.append("06-08-2026 14:22:09", 3));

        let content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "06-08-2026 14:22:09 | people: 3\n");
    }

    #[test]
    fn test_append_mode_preserves_existing_lines() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("people_log.txt");
        fs::write(&file_path, "05-08-2026 23:59:01 | people: 1\n").unwrap();

        let log = OccupancyLog::new(file_path.to_str().unwrap());
        log.append("06-08-2026 00:00:02", 0);

        let content = fs::read_to_string(&file_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("people: 1"));
        assert!(lines[1].contains("people: 0"));
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let nested_path = dir.path().join("logs").join("room").join("people_log.txt");
        let log = OccupancyLog::new(nested_path.to_str().unwrap());

        assert!(log.append("06-08-2026 10:00:00", 5));
        assert!(nested_path.exists());
    }

    #[test]
    fn test_log_existing_counts_entries() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("people_log.txt");
        let log = OccupancyLog::new(file_path.to_str().unwrap());

        assert_eq!(log.log_existing(), 0);

        log.append("06-08-2026 10:00:00", 1);
        log.append("06-08-2026 10:01:00", 2);
        assert_eq!(log.log_existing(), 2);
    }
}
