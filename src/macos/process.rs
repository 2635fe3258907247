//! Running one external tool with captured diagnostics

use crate::error::{NotarizeError, Result, Step};
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;

/// Destination for human-readable progress from `notarytool` and `stapler`.
pub type ProgressOutput = Box<dyn AsyncWrite + Send + Unpin>;

/// Run `cmd` to completion as pipeline stage `step`.
///
/// stderr is always captured and attached to the error on a non-zero exit.
/// stdout goes to `progress` when the step streams progress and a sink is
/// set; otherwise it is discarded. The child is killed if this future is
/// dropped before it exits.
pub async fn run_tool(
    step: Step,
    mut cmd: Command,
    progress: Option<&mut ProgressOutput>,
) -> Result<()> {
    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    let progress = progress.filter(|_| step.streams_progress());

    cmd.stdin(Stdio::null())
        .stdout(if progress.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    log::debug!("{step}: running {program}");

    let mut child = cmd.spawn().map_err(|source| NotarizeError::Spawn {
        step,
        program,
        source,
    })?;

    let stderr_pipe = child.stderr.take();
    let stdout_pipe = child.stdout.take();

    let collect_stderr = async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = stderr_pipe {
            pipe.read_to_end(&mut buf).await?;
        }
        Ok::<_, std::io::Error>(buf)
    };

    // A failing sink must not close the pipe: the tool would die of SIGPIPE
    // mid-submission. Keep draining stdout and report the sink error after.
    let forward_stdout = async move {
        let mut sink_error = None;
        if let (Some(mut pipe), Some(sink)) = (stdout_pipe, progress) {
            let mut buffer = vec![0u8; 8192];
            loop {
                let n = pipe.read(&mut buffer).await?;
                if n == 0 {
                    break;
                }
                if sink_error.is_none() {
                    if let Err(e) = sink.write_all(&buffer[..n]).await {
                        log::warn!("{step}: progress output failed, discarding the rest: {e}");
                        sink_error = Some(e);
                    }
                }
            }
            if sink_error.is_none() {
                sink_error = sink.flush().await.err();
            }
        }
        Ok::<_, std::io::Error>(sink_error)
    };

    let (stderr, forwarded) = tokio::join!(collect_stderr, forward_stdout);
    let status = child.wait().await?;
    let stderr = String::from_utf8_lossy(&stderr?).into_owned();
    let progress_error = forwarded?;

    if !status.success() {
        let hint = match step {
            Step::Submit => submission_hint(&stderr),
            _ => None,
        };
        return Err(NotarizeError::ToolFailed {
            step,
            status,
            stderr,
            hint,
            progress_error,
        });
    }

    if let Some(source) = progress_error {
        return Err(NotarizeError::Progress { step, source });
    }

    Ok(())
}

/// Troubleshooting advice for common `notarytool submit` rejections
fn submission_hint(stderr: &str) -> Option<&'static str> {
    if stderr.contains("UNAUTHORIZED") || stderr.contains("status code: 401") {
        Some(
            "Authentication failed. Check:\n\
             1. The Apple ID email is correct\n\
             2. The password is an app-specific password, not the account password\n\
             3. The team ID matches the signing certificate's team",
        )
    } else if stderr.contains("FORBIDDEN") || stderr.contains("status code: 403") {
        Some(
            "Permission denied. Verify:\n\
             1. The account has accepted the latest developer agreements\n\
             2. The account is a member of the given team\n\
             3. Team ID is correct",
        )
    } else {
        None
    }
}
