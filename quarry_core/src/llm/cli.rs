//! Backend that shells out to the `claude` command-line tool.

use super::{AnalysisBackend, AnalysisError};
use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

pub const DEFAULT_CLI_PATH: &str = "claude";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Stdout beyond this many bytes is treated as a failure.
pub const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

const STDERR_CAP_BYTES: u64 = 64 * 1024;

/// Non-interactive mode, bounded agent turns.
const DEFAULT_ARGS: [&str; 3] = ["--print", "--max-turns", "3"];

/// Runs `<program> --print --max-turns 3` with the prompt on stdin.
///
/// The prompt goes through a temporary file rather than a pipe so large notes
/// never deadlock against an unread stdout. The file is removed when the call
/// returns, whether it succeeded or not.
pub struct ClaudeCliBackend {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    max_output: usize,
    temp_dir: Option<PathBuf>,
}

impl ClaudeCliBackend {
    pub fn new(program: &str) -> Self {
        let program = if program.trim().is_empty() {
            DEFAULT_CLI_PATH
        } else {
            program.trim()
        };
        Self {
            program: program.to_string(),
            args: DEFAULT_ARGS.iter().map(|s| s.to_string()).collect(),
            timeout: DEFAULT_TIMEOUT,
            max_output: MAX_OUTPUT_BYTES,
            temp_dir: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the default `--print --max-turns 3` arguments.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_max_output(mut self, bytes: usize) -> Self {
        self.max_output = bytes;
        self
    }

    /// Directory for the prompt file; the system temp dir otherwise.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn write_prompt(&self, prompt: &str) -> Result<tempfile::NamedTempFile, AnalysisError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("quarry-prompt-").suffix(".txt");
        let mut file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(prompt.as_bytes())?;
        file.flush()?;
        Ok(file)
    }
}

#[async_trait]
impl AnalysisBackend for ClaudeCliBackend {
    fn name(&self) -> &'static str {
        "claude-cli"
    }

    async fn complete(&self, prompt: &str) -> Result<String, AnalysisError> {
        // Dropped (and deleted) on every return path below.
        let prompt_file = self.write_prompt(prompt)?;
        let stdin = prompt_file.reopen()?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AnalysisError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        debug!(program = %self.program, prompt_bytes = prompt.len(), "analysis command started");

        let stdout = child.stdout.take();
        let stderr_task = child.stderr.take().map(|stderr| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut capped = stderr.take(STDERR_CAP_BYTES);
                let _ = capped.read_to_end(&mut buf).await;
                // Keep the pipe open past the cap so the child never hits SIGPIPE
                let _ = tokio::io::copy(&mut capped.into_inner(), &mut tokio::io::sink()).await;
                buf
            })
        });

        let limit = self.max_output;
        let run = async {
            let mut out = Vec::new();
            if let Some(stdout) = stdout {
                stdout.take(limit as u64 + 1).read_to_end(&mut out).await?;
            }
            if out.len() > limit {
                return Err(AnalysisError::OutputTooLarge(limit));
            }
            let status = child.wait().await?;
            Ok::<_, AnalysisError>((status, out))
        };

        let (status, out) = match timeout(self.timeout, run).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(program = %self.program, timeout_secs = self.timeout.as_secs(), "analysis command timed out");
                return Err(AnalysisError::Timeout(self.timeout.as_secs()));
            }
        };

        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => Vec::new(),
        };
        let stderr = String::from_utf8_lossy(&stderr).trim().to_string();

        if !status.success() {
            return Err(AnalysisError::ExitStatus {
                status: status.to_string(),
                stderr,
            });
        }
        if !stderr.is_empty() && !stderr.contains("Warning") {
            warn!(program = %self.program, stderr = %stderr, "analysis command wrote to stderr");
        }

        Ok(String::from_utf8_lossy(&out).trim().to_string())
    }
}
