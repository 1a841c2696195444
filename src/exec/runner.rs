// ABOUTME: Command runner trait and the process-backed implementation.
// ABOUTME: Every external tool call (docker, kubectl, git) goes through CommandRunner.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use snafu::ResultExt;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::error::{ExecError, IoSnafu, NonZeroExitSnafu, SpawnSnafu};

/// A single external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment variables layered over the inherited environment.
    pub env: BTreeMap<String, String>,
    /// Data written to the child's stdin, which is closed afterwards.
    pub stdin: Option<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs(mut self, env: BTreeMap<String, String>) -> Self {
        self.env.extend(env);
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Output from a finished command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code (None when terminated by a signal).
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stderr if the tool wrote any, otherwise stdout.
    pub fn message(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }

    fn status_label(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit status {}", code),
            None => "a signal".to_string(),
        }
    }
}

/// Runs external programs.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the program to completion. A non-zero exit is still `Ok`;
    /// only failing to start or talk to the process is an error.
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError>;

    /// Run the program and treat a non-zero exit as an error.
    async fn run_checked(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError> {
        let output = self.run(invocation).await?;
        if output.success() {
            Ok(output)
        } else {
            NonZeroExitSnafu {
                command: invocation.to_string(),
                status: output.status_label(),
                message: output.message(),
            }
            .fail()
        }
    }
}

/// Runs programs as child processes of this one.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    working_dir: Option<PathBuf>,
}

impl SystemRunner {
    /// Run every command from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: Some(dir.into()),
        }
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError> {
        let command_line = invocation.to_string();
        tracing::debug!(command = %command_line, "running external command");

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .envs(&invocation.env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command.stdin(if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().context(SpawnSnafu {
            command: command_line.clone(),
        })?;

        if let (Some(input), Some(mut stdin)) = (&invocation.stdin, child.stdin.take()) {
            stdin.write_all(input.as_bytes()).await.context(IoSnafu {
                command: command_line.clone(),
            })?;
            // Dropping the handle closes the pipe so the child sees EOF
            drop(stdin);
        }

        let output = child.wait_with_output().await.context(IoSnafu {
            command: command_line.clone(),
        })?;

        let result = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if result.success() {
            tracing::debug!(command = %command_line, "command succeeded");
        } else {
            tracing::warn!(
                command = %command_line,
                exit_code = ?result.exit_code,
                "command failed"
            );
            for line in result.stderr.lines() {
                tracing::debug!(command = %command_line, "{}", line);
            }
        }

        Ok(result)
    }
}
