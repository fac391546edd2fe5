//! Launch configuration for the external recognition engine.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What happens to lines the engine writes on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StderrMode {
    /// Stderr shares the response channel with stdout, line by line.
    #[default]
    Merged,
    /// Stderr lines are logged and never read as protocol lines.
    Separate,
}

/// How to start the engine process and how long to wait on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Executable to launch.
    pub program: PathBuf,

    /// Arguments passed to the executable.
    pub args: Vec<String>,

    /// Working directory for the process (inherits ours when unset).
    pub working_dir: Option<PathBuf>,

    /// Stderr handling.
    pub stderr: StderrMode,

    /// Maximum wait for the `READY` line. Unbounded when unset.
    #[serde(with = "crate::eval::report::duration_millis_option")]
    pub startup_timeout: Option<Duration>,

    /// Maximum wait for one response line. Unbounded when unset.
    #[serde(with = "crate::eval::report::duration_millis_option")]
    pub request_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("python"),
            args: vec!["ocr_engine.py".to_string()],
            working_dir: None,
            stderr: StderrMode::Merged,
            startup_timeout: None,
            request_timeout: None,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Program and arguments as one display string.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    program: Option<PathBuf>,
    args: Option<Vec<String>>,
    working_dir: Option<PathBuf>,
    stderr: Option<StderrMode>,
    startup_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
}

impl EngineConfigBuilder {
    /// Set the executable. Clears the default arguments.
    #[must_use]
    pub fn program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self.args.get_or_insert_with(Vec::new);
        self
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.get_or_insert_with(Vec::new).push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args
            .get_or_insert_with(Vec::new)
            .extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set the stderr handling.
    #[must_use]
    pub fn stderr(mut self, mode: StderrMode) -> Self {
        self.stderr = Some(mode);
        self
    }

    /// Bound the wait for the handshake.
    #[must_use]
    pub fn startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = Some(timeout);
        self
    }

    /// Bound the wait for each response.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> EngineConfig {
        let defaults = EngineConfig::default();
        EngineConfig {
            program: self.program.unwrap_or(defaults.program),
            args: self.args.unwrap_or(defaults.args),
            working_dir: self.working_dir,
            stderr: self.stderr.unwrap_or_default(),
            startup_timeout: self.startup_timeout,
            request_timeout: self.request_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_engine_command() {
        let config = EngineConfig::default();
        assert_eq!(config.command_line(), "python ocr_engine.py");
        assert_eq!(config.stderr, StderrMode::Merged);
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn test_builder_program_replaces_default_args() {
        let config = EngineConfig::builder()
            .program("/usr/bin/engine")
            .arg("--gpu")
            .request_timeout(Duration::from_secs(5))
            .build();

        assert_eq!(config.program, PathBuf::from("/usr/bin/engine"));
        assert_eq!(config.args, vec!["--gpu".to_string()]);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_builder_args_without_program_replace_defaults() {
        let config = EngineConfig::builder().args(["ocr_server.py", "-q"]).build();
        assert_eq!(config.command_line(), "python ocr_server.py -q");
    }
}
