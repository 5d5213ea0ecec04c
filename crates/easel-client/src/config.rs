//! Renderer launch configuration.
//!
//! A [`LaunchConfig`] describes how to start the renderer: the executable,
//! its arguments and working directory, where its stderr goes, and whether
//! windows are opened in testing mode. Configuration is plain per-instance
//! state passed at construction; there is no ambient global.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Where the renderer's stderr is routed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StderrMode {
    /// Capture stderr as a third pipe; pending output is drained
    /// opportunistically and forwarded to the `log` crate.
    #[default]
    Captured,
    /// Append stderr directly to a log file.
    LogFile(PathBuf),
}

/// Builder-style description of the renderer process to launch.
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    program: PathBuf,
    args: Vec<OsString>,
    working_dir: Option<PathBuf>,
    stderr: StderrMode,
    testing: bool,
    path_prefix: Option<PathBuf>,
}

impl LaunchConfig {
    /// Configure a launch of the given renderer executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            stderr: StderrMode::default(),
            testing: false,
            path_prefix: None,
        }
    }

    /// Append a command-line argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set the renderer's working directory. Defaults to the caller's.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Append the renderer's stderr to a log file instead of capturing it.
    pub fn log_stderr_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stderr = StderrMode::LogFile(path.into());
        self
    }

    /// Open all windows in testing mode: the renderer keeps per-slot content
    /// hashes so transmitted images can be verified via the checksum query.
    /// Increases renderer memory usage; leave off outside of tests.
    pub fn testing(mut self, enabled: bool) -> Self {
        self.testing = enabled;
        self
    }

    /// Directory to resolve the executable against when it is not on the
    /// default search path.
    pub fn path_prefix(mut self, dir: impl Into<PathBuf>) -> Self {
        self.path_prefix = Some(dir.into());
        self
    }

    /// The executable path after applying any configured prefix.
    pub(crate) fn resolved_program(&self) -> PathBuf {
        match &self.path_prefix {
            Some(prefix) => prefix.join(&self.program),
            None => self.program.clone(),
        }
    }

    pub(crate) fn args(&self) -> &[OsString] {
        &self.args
    }

    pub(crate) fn cwd(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub(crate) fn stderr_mode(&self) -> &StderrMode {
        &self.stderr
    }

    pub(crate) fn is_testing(&self) -> bool {
        self.testing
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
