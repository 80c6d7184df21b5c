//! One exiftool process, from spawn to reap

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

/// Trailing stderr summary that exiftool prints on otherwise successful runs
const BENIGN_STDERR_SUFFIX: &str = "image files read";

/// Hide the console window of the child process on Windows
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Runs exiftool once against an args file.
///
/// [`run`](Self::run) consumes the invoker, so an instance never owns more than
/// one process and is never reused across chunks.
#[derive(Debug)]
pub struct ToolInvoker {
    binary_path: PathBuf,
    timeout: Duration,
}

impl ToolInvoker {
    /// Create an invoker for the given binary with a wait limit
    pub fn new(binary_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary_path: binary_path.into(),
            timeout,
        }
    }

    /// Spawn `exiftool -@ <args_file>` and return its stdout as one string.
    ///
    /// Stdout is drained line by line on a dedicated task into a buffer owned by
    /// this call; non-empty lines are trimmed and concatenated. The reader is
    /// joined before returning, so the output is never truncated. Reading
    /// stderr, reaping the process and joining the reader share one timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::ToolStart`] if the process cannot be spawned
    /// - [`Error::ToolExecution`] if stderr holds anything but the read summary
    /// - [`Error::ToolTimeout`] if stderr, exit and the end of stdout do not
    ///   all arrive in time
    pub async fn run(self, args_file: &Path) -> Result<String> {
        let mut command = Command::new(&self.binary_path);
        command
            .arg("-@")
            .arg(args_file)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);

        let mut child = command.spawn().map_err(|source| Error::ToolStart {
            binary: self.binary_path.clone(),
            source,
        })?;
        debug!(binary = ?self.binary_path, ?args_file, pid = ?child.id(), "spawned exiftool");

        let (Some(stdout), Some(mut stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(Error::ToolStart {
                binary: self.binary_path.clone(),
                source: std::io::Error::other("child process streams were not captured"),
            });
        };
        let mut stdout_reader = tokio::spawn(drain_stdout(stdout));

        // A descendant holding stdout open keeps the reader alive after exit,
        // so joining it counts against the same deadline.
        let waited = tokio::time::timeout(self.timeout, async {
            let mut diagnostics = String::new();
            stderr.read_to_string(&mut diagnostics).await?;
            let status = child.wait().await?;
            let output = (&mut stdout_reader).await.map_err(std::io::Error::other)??;
            Ok::<_, std::io::Error>((output, diagnostics, status))
        })
        .await;

        let (output, diagnostics, status) = match waited {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                stop_child(&mut child).await;
                stdout_reader.abort();
                return Err(Error::Io(e));
            }
            Err(_) => {
                warn!(binary = ?self.binary_path, timeout = ?self.timeout, "exiftool timed out, killing process");
                stop_child(&mut child).await;
                stdout_reader.abort();
                return Err(Error::ToolTimeout {
                    timeout: self.timeout,
                });
            }
        };

        if !is_benign(&diagnostics) {
            return Err(Error::ToolExecution {
                stderr: diagnostics.trim().to_string(),
            });
        }
        if !status.success() {
            debug!(code = ?status.code(), "exiftool exited with non-zero status");
        }

        debug!(bytes = output.len(), "exiftool output captured");
        Ok(output)
    }
}

/// Whether stderr output can be ignored
fn is_benign(diagnostics: &str) -> bool {
    let trimmed = diagnostics.trim();
    trimmed.is_empty() || trimmed.to_lowercase().ends_with(BENIGN_STDERR_SUFFIX)
}

/// Read all lines of `stdout`, concatenating the non-empty trimmed ones
async fn drain_stdout<R: AsyncRead + Unpin>(stdout: R) -> std::io::Result<String> {
    let mut lines = BufReader::new(stdout).lines();
    let mut output = String::new();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if !line.is_empty() {
            output.push_str(line);
        }
    }
    Ok(output)
}

async fn stop_child(child: &mut tokio::process::Child) {
    if let Err(e) = child.kill().await {
        debug!(error = %e, "failed to kill exiftool process");
    }
}
