// On-device speech synthesis through an external TTS program.
//
// Linux and Windows: espeak-ng
// macOS: say

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::sync::Notify;
use tracing::debug;

use crate::audio::process::run_child;
use crate::audio::SpeechSynthesizer;
use crate::config::clamp_speed;
use crate::error::AudioError;

/// Words per minute both engines treat as normal speed.
const BASE_WORDS_PER_MINUTE: f32 = 175.0;

/// TTS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    /// BCP 47 tag, e.g. "en-US" or "tr-TR"
    pub language: String,
    /// 0.5 - 2.0, 1.0 is normal
    pub rate: f32,
    /// 0.5 - 2.0, 1.0 is normal
    pub pitch: f32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            rate: 1.0,
            pitch: 1.0,
        }
    }
}

impl TtsConfig {
    pub fn words_per_minute(&self) -> u32 {
        (BASE_WORDS_PER_MINUTE * clamp_speed(self.rate)).round() as u32
    }

    /// espeak-ng voice name for the language tag: "en-US" -> "en-us", "tr-TR" -> "tr".
    pub fn espeak_voice(&self) -> String {
        let tag = self.language.trim().to_ascii_lowercase().replace('_', "-");
        match tag.split_once('-') {
            Some((primary, region)) if primary == "en" => format!("{primary}-{region}"),
            Some((primary, _)) => primary.to_string(),
            None if tag.is_empty() => "en".to_string(),
            None => tag,
        }
    }

    fn espeak_pitch(&self) -> u32 {
        // espeak-ng pitch runs 0..=99 with 50 as default.
        (50.0 * self.pitch.clamp(0.5, 2.0)).round().min(99.0) as u32
    }
}

/// Speech through a command-line synthesizer. A new utterance always
/// interrupts the one still playing.
pub struct ProcessSynthesizer {
    program: String,
    cancel: Notify,
}

impl ProcessSynthesizer {
    pub fn new(program: Option<String>) -> Self {
        Self {
            program: program.unwrap_or_else(|| default_program().to_string()),
            cancel: Notify::new(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, text: &str, config: &TtsConfig) -> Command {
        let mut command = Command::new(&self.program);
        if self.program == "say" {
            command
                .arg("-r")
                .arg(config.words_per_minute().to_string())
                .arg("--")
                .arg(text);
        } else {
            command
                .arg("-v")
                .arg(config.espeak_voice())
                .arg("-s")
                .arg(config.words_per_minute().to_string())
                .arg("-p")
                .arg(config.espeak_pitch().to_string())
                .arg("--")
                .arg(text);
        }
        command
    }
}

impl SpeechSynthesizer for ProcessSynthesizer {
    async fn speak(&self, text: &str, config: &TtsConfig) -> Result<(), AudioError> {
        if text.trim().is_empty() {
            return Ok(());
        }
        debug!(program = %self.program, language = %config.language, "speaking");
        run_child(self.command(text, config), None, &self.cancel).await
    }

    fn cancel(&self) {
        self.cancel.notify_waiters();
    }
}

#[cfg(target_os = "macos")]
fn default_program() -> &'static str {
    "say"
}

#[cfg(not(target_os = "macos"))]
fn default_program() -> &'static str {
    "espeak-ng"
}
