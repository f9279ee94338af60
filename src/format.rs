use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use tracing::warn;

use crate::error::SnapfixError;
use crate::policy::FormatterConfig;

const FILE_PLACEHOLDER: &str = "{file}";

/// Post-processes patched text; must be idempotent on formatted input.
pub trait Formatter {
    fn format(&self, text: &str, path: &Path) -> Result<String, SnapfixError>;
}

/// Pipes the text through an external command such as
/// `prettier --stdin-filepath {file}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFormatter {
    command: String,
    args: Vec<String>,
}

impl CommandFormatter {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn from_config(config: &FormatterConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }

    fn failure(&self, message: impl Into<String>) -> SnapfixError {
        SnapfixError::Formatter {
            command: self.command.clone(),
            message: message.into(),
        }
    }
}

impl Formatter for CommandFormatter {
    fn format(&self, text: &str, path: &Path) -> Result<String, SnapfixError> {
        let file = path.display().to_string();
        let mut child = Command::new(&self.command)
            .args(self.args.iter().map(|arg| arg.replace(FILE_PLACEHOLDER, &file)))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| self.failure(error.to_string()))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.failure("stdin was not captured"))?;
        let input = text.to_string();
        let writer = thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child
            .wait_with_output()
            .map_err(|error| self.failure(error.to_string()))?;
        let written = writer
            .join()
            .map_err(|_| self.failure("stdin writer panicked"))?;

        if !output.status.success() {
            return Err(self.failure(format!(
                "exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        written.map_err(|error| self.failure(error.to_string()))?;

        String::from_utf8(output.stdout).map_err(|error| self.failure(error.to_string()))
    }
}

/// Runs the formatter when one is configured, keeping the unformatted text
/// if it fails.
pub fn format_or_keep(formatter: Option<&dyn Formatter>, text: String, path: &Path) -> String {
    let Some(formatter) = formatter else {
        return text;
    };

    match formatter.format(&text, path) {
        Ok(formatted) => formatted,
        Err(error) => {
            warn!(file = %path.display(), %error, "formatter failed; keeping unformatted output");
            text
        }
    }
}
