use std::io::ErrorKind;
use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::sync::Notify;

use crate::error::AudioError;

/// Runs an audio child process until it exits or `cancel` is notified.
///
/// `input` is streamed to the child's stdin when present. The child is killed
/// on cancellation and also when the returned future is dropped.
pub(crate) async fn run_child(
    mut command: Command,
    input: Option<Vec<u8>>,
    cancel: &Notify,
) -> Result<(), AudioError> {
    command
        .kill_on_drop(true)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

    let cancelled = cancel.notified();
    tokio::pin!(cancelled);
    cancelled.as_mut().enable();

    let mut child = command.spawn().map_err(|err| match err.kind() {
        ErrorKind::NotFound => AudioError::NotSupported,
        _ => AudioError::SpawnFailed(err.to_string()),
    })?;

    let finished = tokio::select! {
        result = feed_and_wait(&mut child, input) => Some(result),
        _ = &mut cancelled => None,
    };

    match finished {
        Some(Ok(status)) if status.success() => Ok(()),
        Some(Ok(status)) => Err(AudioError::PlaybackFailed(format!("exited with {status}"))),
        Some(Err(err)) => Err(err),
        None => {
            let _ = child.kill().await;
            Err(AudioError::Cancelled)
        }
    }
}

async fn feed_and_wait(child: &mut Child, input: Option<Vec<u8>>) -> Result<ExitStatus, AudioError> {
    if let (Some(mut stdin), Some(bytes)) = (child.stdin.take(), input) {
        stdin
            .write_all(&bytes)
            .await
            .map_err(|err| AudioError::PlaybackFailed(err.to_string()))?;
        // Closing stdin tells the player the stream is complete.
        drop(stdin);
    }

    child
        .wait()
        .await
        .map_err(|err| AudioError::PlaybackFailed(err.to_string()))
}
