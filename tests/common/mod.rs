#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use serde_json::{Value, json};
use tempfile::TempDir;

pub fn run_snapfix(args: &[&str], current_dir: &Path) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_snapfix"));
    command.args(args);
    command.current_dir(current_dir);
    command.output().expect("failed to run snapfix binary")
}

pub fn run_snapfix_with_stdin(args: &[&str], current_dir: &Path, input: &str) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_snapfix"));
    command.args(args);
    command.current_dir(current_dir);
    command.stdin(Stdio::piped());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    let mut child = command.spawn().expect("failed to spawn snapfix binary");
    let stdin = child.stdin.as_mut().expect("stdin should be available");
    stdin
        .write_all(input.as_bytes())
        .expect("stdin write should succeed");
    child
        .wait_with_output()
        .expect("failed to read process output")
}

pub fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|error| {
        panic!(
            "stdout should be JSON ({error}); stdout={}, stderr={}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

/// A scratch project directory holding test files and a request batch.
pub struct Project {
    pub root: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("temp project should be created"),
        }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("fixture directory should be created");
        }
        fs::write(&path, contents).expect("fixture write should succeed");
        path
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.root.path().join(relative)).expect("fixture should be readable")
    }
}

pub fn fix_json(file: &str, line: usize, column: usize, status: &str, label: &str, subject: Value) -> Value {
    json!({
        "file": file,
        "line": line,
        "column": column,
        "status": status,
        "label": label,
        "subject": subject,
    })
}
