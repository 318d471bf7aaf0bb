//! Best-effort audio for card sides.
//!
//! [`AudioPlayer`] tries the remote clip first and falls back to on-device
//! speech. Nothing here ever reports an error to the caller: the outcome is a
//! plain value and failures only reach the logs.

mod process;
pub mod remote;
pub mod tts;

pub use remote::ProcessAudioPlayer;
pub use tts::{ProcessSynthesizer, TtsConfig};

use std::future::Future;

use tracing::debug;

use crate::error::AudioError;

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackRequest {
    pub text: String,
    pub language: String,
    pub remote_url: Option<String>,
    pub rate: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Remote,
    Synthesized,
    /// A newer request took over before this one finished.
    Cancelled,
    /// Both paths failed; the card simply stays silent.
    Silent,
}

/// Seam the study engine plays audio through.
pub trait Playback: Send + Sync {
    fn play(&self, request: PlaybackRequest) -> impl Future<Output = PlaybackOutcome> + Send;

    /// Stops whatever is currently audible.
    fn cancel(&self);
}

pub trait RemotePlayer: Send + Sync {
    fn play_url(&self, url: &str, rate: f32) -> impl Future<Output = Result<(), AudioError>> + Send;

    fn stop(&self);
}

pub trait SpeechSynthesizer: Send + Sync {
    fn speak(
        &self,
        text: &str,
        config: &TtsConfig,
    ) -> impl Future<Output = Result<(), AudioError>> + Send;

    fn cancel(&self);
}

pub struct AudioPlayer<R, S> {
    remote: R,
    speech: S,
}

impl<R: RemotePlayer, S: SpeechSynthesizer> AudioPlayer<R, S> {
    pub fn new(remote: R, speech: S) -> Self {
        Self { remote, speech }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn speech(&self) -> &S {
        &self.speech
    }
}

impl<R: RemotePlayer, S: SpeechSynthesizer> Playback for AudioPlayer<R, S> {
    async fn play(&self, request: PlaybackRequest) -> PlaybackOutcome {
        self.cancel();

        if let Some(url) = request.remote_url.as_deref() {
            match self.remote.play_url(url, request.rate).await {
                Ok(()) => return PlaybackOutcome::Remote,
                Err(AudioError::Cancelled) => return PlaybackOutcome::Cancelled,
                Err(err) => debug!(url, error = %err, "remote audio failed, falling back to speech"),
            }
        }

        let config = TtsConfig {
            language: request.language.clone(),
            rate: request.rate,
            ..TtsConfig::default()
        };
        match self.speech.speak(&request.text, &config).await {
            Ok(()) => PlaybackOutcome::Synthesized,
            Err(AudioError::Cancelled) => PlaybackOutcome::Cancelled,
            Err(err) => {
                debug!(language = %request.language, error = %err, "speech synthesis failed");
                PlaybackOutcome::Silent
            }
        }
    }

    fn cancel(&self) {
        self.remote.stop();
        self.speech.cancel();
    }
}

/// Playback that does nothing, for front-ends without audio output.
#[derive(Debug, Default, Clone, Copy)]
pub struct Muted;

impl Playback for Muted {
    async fn play(&self, _request: PlaybackRequest) -> PlaybackOutcome {
        PlaybackOutcome::Silent
    }

    fn cancel(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeRemote {
        fail_with: Option<AudioError>,
        urls: Mutex<Vec<String>>,
        stops: AtomicUsize,
    }

    impl RemotePlayer for FakeRemote {
        async fn play_url(&self, url: &str, _rate: f32) -> Result<(), AudioError> {
            self.urls.lock().push(url.to_string());
            match &self.fail_with {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct FakeSpeech {
        fail: bool,
        spoken: Mutex<Vec<(String, String)>>,
        cancels: AtomicUsize,
    }

    impl SpeechSynthesizer for FakeSpeech {
        async fn speak(&self, text: &str, config: &TtsConfig) -> Result<(), AudioError> {
            self.spoken
                .lock()
                .push((text.to_string(), config.language.clone()));
            if self.fail {
                Err(AudioError::NotSupported)
            } else {
                Ok(())
            }
        }

        fn cancel(&self) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn request(remote_url: Option<&str>) -> PlaybackRequest {
        PlaybackRequest {
            text: "elma".into(),
            language: "tr-TR".into(),
            remote_url: remote_url.map(str::to_string),
            rate: 1.0,
        }
    }

    #[tokio::test]
    async fn remote_success_skips_speech() {
        let player = AudioPlayer::new(FakeRemote::default(), FakeSpeech::default());
        let outcome = player.play(request(Some("http://api/a.mp3"))).await;

        assert_eq!(outcome, PlaybackOutcome::Remote);
        assert_eq!(player.remote().urls.lock().len(), 1);
        assert!(player.speech().spoken.lock().is_empty());
    }

    #[tokio::test]
    async fn remote_failure_speaks_same_text_once() {
        let remote = FakeRemote {
            fail_with: Some(AudioError::PlaybackFailed("decode".into())),
            ..FakeRemote::default()
        };
        let player = AudioPlayer::new(remote, FakeSpeech::default());
        let outcome = player.play(request(Some("http://api/missing.mp3"))).await;

        assert_eq!(outcome, PlaybackOutcome::Synthesized);
        assert_eq!(
            *player.speech().spoken.lock(),
            vec![("elma".to_string(), "tr-TR".to_string())]
        );
    }

    #[tokio::test]
    async fn missing_url_goes_straight_to_speech() {
        let player = AudioPlayer::new(FakeRemote::default(), FakeSpeech::default());
        let outcome = player.play(request(None)).await;

        assert_eq!(outcome, PlaybackOutcome::Synthesized);
        assert!(player.remote().urls.lock().is_empty());
        assert_eq!(player.speech().spoken.lock().len(), 1);
    }

    #[tokio::test]
    async fn every_request_cancels_the_previous_utterance_first() {
        let player = AudioPlayer::new(FakeRemote::default(), FakeSpeech::default());
        player.play(request(None)).await;
        player.play(request(None)).await;

        assert_eq!(player.speech().cancels.load(Ordering::SeqCst), 2);
        assert_eq!(player.remote().stops.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn double_failure_is_silent() {
        let remote = FakeRemote {
            fail_with: Some(AudioError::Network("offline".into())),
            ..FakeRemote::default()
        };
        let speech = FakeSpeech {
            fail: true,
            ..FakeSpeech::default()
        };
        let player = AudioPlayer::new(remote, speech);

        assert_eq!(
            player.play(request(Some("http://api/a.mp3"))).await,
            PlaybackOutcome::Silent
        );
    }

    #[tokio::test]
    async fn superseded_remote_clip_does_not_fall_back() {
        let remote = FakeRemote {
            fail_with: Some(AudioError::Cancelled),
            ..FakeRemote::default()
        };
        let player = AudioPlayer::new(remote, FakeSpeech::default());

        assert_eq!(
            player.play(request(Some("http://api/a.mp3"))).await,
            PlaybackOutcome::Cancelled
        );
        assert!(player.speech().spoken.lock().is_empty());
    }
}
