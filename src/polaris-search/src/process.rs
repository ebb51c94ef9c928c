//! Child process plumbing shared by enumeration and content search.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};

use crate::error::{SearchError, SearchResult};

/// An executable plus the arguments that always precede the generated ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub leading_args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Runs `program` with `args` in front of every invocation.
    ///
    /// `ToolCommand::new("sh").with_leading_args(["fake-rg.sh"])` runs a script
    /// in place of the real tool.
    pub fn with_leading_args(
        mut self,
        args: impl IntoIterator<Item = impl Into<OsString>>,
    ) -> Self {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Name used in logs and errors.
    pub fn display_name(&self) -> String {
        self.program.display().to_string()
    }

    /// Builds a command with piped output that dies with its handle.
    pub fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Starts the process, mapping a launch failure to [`SearchError::Spawn`].
    pub fn spawn<I, S>(&self, args: I) -> SearchResult<Child>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.command(args)
            .spawn()
            .map_err(|e| SearchError::spawn(self.display_name(), e))
    }
}

/// Completed process output.
#[derive(Debug)]
pub struct CapturedOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Runs a command to completion, collecting both streams.
pub async fn run_to_completion(
    tool: &ToolCommand,
    args: &[OsString],
    cwd: &Path,
) -> SearchResult<CapturedOutput> {
    let mut cmd = tool.command(args);
    cmd.current_dir(cwd);
    let mut child = cmd
        .spawn()
        .map_err(|e| SearchError::spawn(tool.display_name(), e))?;

    let mut stdout_pipe = child.stdout.take().ok_or_else(|| SearchError::StreamUnavailable {
        program: tool.display_name(),
        stream: "stdout",
    })?;
    let stderr_task = spawn_stderr_reader(&mut child);

    let mut stdout = Vec::new();
    stdout_pipe.read_to_end(&mut stdout).await?;
    let status = child.wait().await?;
    let stderr = collect_stderr(stderr_task).await;

    Ok(CapturedOutput {
        status,
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr,
    })
}

/// Drains the child's stderr in the background so it can never block the child.
pub fn spawn_stderr_reader(child: &mut Child) -> Option<tokio::task::JoinHandle<String>> {
    child.stderr.take().map(|mut err| {
        tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = err.read_to_end(&mut buf).await;
            String::from_utf8_lossy(&buf).trim().to_string()
        })
    })
}

pub async fn collect_stderr(task: Option<tokio::task::JoinHandle<String>>) -> String {
    match task {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    }
}

/// Asks the child to exit, then kills it if it is still alive after `grace`.
pub async fn terminate(child: &mut Child, grace: Duration) {
    if matches!(child.try_wait(), Ok(Some(_))) {
        return;
    }

    if request_exit(child) {
        match tokio::time::timeout(grace, child.wait()).await {
            Ok(_) => {
                tracing::debug!("Search process exited after termination request");
                return;
            }
            Err(_) => tracing::debug!("Search process ignored termination request for {grace:?}"),
        }
    }

    kill(child).await;
}

/// Kills the child and reaps it.
pub async fn kill(child: &mut Child) {
    if let Err(e) = child.kill().await {
        tracing::debug!("Failed to kill search process: {e}");
    }
}

#[cfg(unix)]
fn request_exit(child: &Child) -> bool {
    let Some(pid) = child.id() else {
        return false;
    };
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // SAFETY: kill(2) only signals the process; pid belongs to our unreaped child.
    unsafe { libc::kill(pid, libc::SIGTERM) == 0 }
}

#[cfg(not(unix))]
fn request_exit(_child: &Child) -> bool {
    false
}
