//! Shared helpers for CLI specs

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::TempDir;

/// Table config that keeps live runs short
pub const FAST_TABLE: &str = r#"
agents = 3
tick_interval = "50ms"
starvation_threshold = "2s"

[think]
min = "1ms"
max = "2ms"

[eat]
min = "1ms"
max = "2ms"
"#;

/// Path to the mensa binary, building it on first use
fn binary() -> &'static Path {
    static BINARY: OnceLock<PathBuf> = OnceLock::new();
    BINARY.get_or_init(|| {
        if let Ok(path) = assert_cmd::cargo::cargo_bin("mensa").canonicalize() {
            return path;
        }
        let status = std::process::Command::new(env!("CARGO"))
            .args(["build", "--quiet", "-p", "mensa", "--bin", "mensa"])
            .status()
            .unwrap();
        assert!(status.success(), "building mensa failed");
        assert_cmd::cargo::cargo_bin("mensa")
    })
}

/// A command that runs outside any project directory
pub fn mensa() -> CliBuilder {
    CliBuilder::new(None)
}

/// Scratch directory for config files and event logs
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the project root
    pub fn file(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(relative)).unwrap()
    }

    pub fn mensa(&self) -> CliBuilder {
        CliBuilder::new(Some(self.dir.path().to_path_buf()))
    }
}

pub struct CliBuilder {
    args: Vec<String>,
    dir: Option<PathBuf>,
}

impl CliBuilder {
    fn new(dir: Option<PathBuf>) -> Self {
        Self {
            args: Vec::new(),
            dir,
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|a| a.to_string()));
        self
    }

    /// The underlying command, for assertions with `predicates`
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(binary());
        cmd.args(&self.args).env_remove("RUST_LOG");
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }
        cmd.timeout(std::time::Duration::from_secs(60));
        cmd
    }

    /// Run and expect exit code 0
    pub fn passes(self) -> RunAssert {
        let output = self.command().output().unwrap();
        let result = RunAssert::from(output);
        assert!(
            result.success,
            "expected success for {:?}\nstdout:\n{}\nstderr:\n{}",
            self.args, result.stdout, result.stderr
        );
        result
    }

    /// Run and expect a non-zero exit code
    pub fn fails(self) -> RunAssert {
        let output = self.command().output().unwrap();
        let result = RunAssert::from(output);
        assert!(
            !result.success,
            "expected failure for {:?}\nstdout:\n{}",
            self.args, result.stdout
        );
        result
    }
}

pub struct RunAssert {
    success: bool,
    stdout: String,
    stderr: String,
}

impl From<std::process::Output> for RunAssert {
    fn from(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

impl RunAssert {
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(
            self.stdout.contains(needle),
            "stdout missing {:?}:\n{}",
            needle,
            self.stdout
        );
        self
    }

    pub fn stdout_lacks(self, needle: &str) -> Self {
        assert!(
            !self.stdout.contains(needle),
            "stdout unexpectedly has {:?}:\n{}",
            needle,
            self.stdout
        );
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(
            self.stderr.contains(needle),
            "stderr missing {:?}:\n{}",
            needle,
            self.stderr
        );
        self
    }

    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout, expected);
        self
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout).unwrap()
    }
}
