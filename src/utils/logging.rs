//! Optional transcript logging
//!
//! When enabled via `-l/--log`, completed turns are appended to a plain text
//! file with a blank separator line, mirroring what the screen shows.

use std::fs::OpenOptions;
use std::io::Write;

pub struct LoggingState {
    file_path: Option<String>,
    is_active: bool,
}

impl LoggingState {
    /// A path provided at startup enables logging immediately; write access
    /// is verified up front so failures surface before the TUI starts.
    pub fn new(log_file: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(path) = &log_file {
            test_file_access(path)?;
        }
        let is_active = log_file.is_some();
        Ok(LoggingState {
            file_path: log_file,
            is_active,
        })
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn log_message(&self, content: &str) -> Result<(), Box<dyn std::error::Error>> {
        let Some(file_path) = self.file_path.as_ref().filter(|_| self.is_active) else {
            return Ok(());
        };

        let mut file = OpenOptions::new().create(true).append(true).open(file_path)?;

        for line in content.lines() {
            writeln!(file, "{}", line)?;
        }
        // Blank line between turns, matching the on-screen spacing.
        writeln!(file)?;

        file.flush()?;
        Ok(())
    }
}

fn test_file_access(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn inactive_without_path() {
        let logging = LoggingState::new(None).unwrap();
        assert!(!logging.is_active());
        assert!(logging.log_message("dropped").is_ok());
    }

    #[test]
    fn messages_append_with_separator() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chat.log");
        let logging = LoggingState::new(Some(path.to_string_lossy().into_owned())).unwrap();
        assert!(logging.is_active());

        logging.log_message("You: hello").unwrap();
        logging.log_message("first line\nsecond line").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "You: hello\n\nfirst line\nsecond line\n\n");
    }

    #[test]
    fn unwritable_path_fails_at_startup() {
        let result = LoggingState::new(Some("/nonexistent-dir/chat.log".to_string()));
        assert!(result.is_err());
    }
}
