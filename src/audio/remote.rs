use std::time::Duration;

use reqwest::Client;
use tokio::process::Command;
use tokio::sync::Notify;
use tracing::debug;

use crate::audio::process::run_child;
use crate::audio::RemotePlayer;
use crate::config::clamp_speed;
use crate::error::AudioError;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Downloads a clip and pipes it into a command-line player (`ffplay` by
/// default) reading from stdin.
pub struct ProcessAudioPlayer {
    client: Client,
    program: String,
    cancel: Notify,
}

impl ProcessAudioPlayer {
    pub fn new(program: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::with_client(client, program)
    }

    pub fn with_client(client: Client, program: impl Into<String>) -> Self {
        Self {
            client,
            program: program.into(),
            cancel: Notify::new(),
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, AudioError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| AudioError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AudioError::Network(format!("HTTP {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| AudioError::Network(err.to_string()))?;
        if bytes.is_empty() {
            return Err(AudioError::PlaybackFailed("empty audio file".to_string()));
        }
        Ok(bytes.to_vec())
    }

    fn command(&self, rate: f32) -> Command {
        let mut command = Command::new(&self.program);
        if self.program.ends_with("ffplay") {
            command.args(["-nodisp", "-autoexit", "-loglevel", "error"]);
            let rate = clamp_speed(rate);
            if (rate - 1.0).abs() > f32::EPSILON {
                command.arg("-af").arg(format!("atempo={rate:.2}"));
            }
            command.args(["-i", "-"]);
        } else {
            command.arg("-");
        }
        command
    }
}

impl RemotePlayer for ProcessAudioPlayer {
    async fn play_url(&self, url: &str, rate: f32) -> Result<(), AudioError> {
        let cancelled = self.cancel.notified();
        tokio::pin!(cancelled);
        cancelled.as_mut().enable();

        let bytes = tokio::select! {
            bytes = self.download(url) => bytes?,
            _ = &mut cancelled => return Err(AudioError::Cancelled),
        };
        debug!(url, bytes = bytes.len(), "playing remote clip");

        run_child(self.command(rate), Some(bytes), &self.cancel).await
    }

    fn stop(&self) {
        self.cancel.notify_waiters();
    }
}
