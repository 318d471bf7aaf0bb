use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:8001";
const DEFAULT_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_SETTLE_MS: u64 = 300;
const DEFAULT_SENTENCE_LIMIT: u32 = 10;
const MIN_AUDIO_SPEED: f32 = 0.5;
const MAX_AUDIO_SPEED: f32 = 2.0;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub request_timeout: Duration,
    pub store_path: PathBuf,
    pub log_level: String,
    pub study: StudySettings,
    pub tts_program: Option<String>,
    pub audio_player_program: String,
}

/// Engine-facing settings; the rest of `ClientConfig` only matters for wiring.
#[derive(Debug, Clone, PartialEq)]
pub struct StudySettings {
    pub prompt_language: String,
    pub answer_language: String,
    pub reveal_settle_delay: Duration,
    pub sentence_batch_limit: u32,
    pub auto_play: bool,
    pub show_images: bool,
    pub audio_speed: f32,
}

impl Default for StudySettings {
    fn default() -> Self {
        Self {
            prompt_language: "en-US".to_string(),
            answer_language: "tr-TR".to_string(),
            reveal_settle_delay: Duration::from_millis(DEFAULT_SETTLE_MS),
            sentence_batch_limit: DEFAULT_SENTENCE_LIMIT,
            auto_play: true,
            show_images: true,
            audio_speed: 1.0,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let api_url = env_string("API_URL")
            .map(|value| value.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let request_timeout =
            Duration::from_millis(env_parse::<u64>("API_TIMEOUT_MS").unwrap_or(DEFAULT_TIMEOUT_MS));

        let store_path = env_string("STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_store_path);

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let defaults = StudySettings::default();
        let study = StudySettings {
            prompt_language: env_string("PROMPT_LANGUAGE").unwrap_or(defaults.prompt_language),
            answer_language: env_string("ANSWER_LANGUAGE").unwrap_or(defaults.answer_language),
            reveal_settle_delay: env_parse::<u64>("REVEAL_SETTLE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.reveal_settle_delay),
            sentence_batch_limit: env_parse::<u32>("SENTENCE_BATCH_LIMIT")
                .filter(|limit| *limit > 0)
                .unwrap_or(defaults.sentence_batch_limit),
            auto_play: env_bool("AUTO_PLAY").unwrap_or(defaults.auto_play),
            show_images: env_bool("SHOW_IMAGES").unwrap_or(defaults.show_images),
            audio_speed: env_parse::<f32>("AUDIO_SPEED")
                .filter(|speed| speed.is_finite())
                .map(clamp_speed)
                .unwrap_or(defaults.audio_speed),
        };

        Self {
            api_url,
            request_timeout,
            store_path,
            log_level,
            study,
            tts_program: env_string("TTS_PROGRAM"),
            audio_player_program: env_string("AUDIO_PLAYER_PROGRAM")
                .unwrap_or_else(|| "ffplay".to_string()),
        }
    }
}

pub fn clamp_speed(speed: f32) -> f32 {
    speed.clamp(MIN_AUDIO_SPEED, MAX_AUDIO_SPEED)
}

fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("./data"))
        .join("danci-study")
        .join("store.json")
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|value| value.parse::<T>().ok())
}

fn env_bool(key: &str) -> Option<bool> {
    env_string(key).and_then(|value| match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_study_settings() {
        let settings = StudySettings::default();
        assert_eq!(settings.prompt_language, "en-US");
        assert_eq!(settings.answer_language, "tr-TR");
        assert_eq!(settings.reveal_settle_delay, Duration::from_millis(300));
        assert_eq!(settings.sentence_batch_limit, 10);
        assert!(settings.auto_play);
    }

    #[test]
    fn speed_is_clamped() {
        assert_eq!(clamp_speed(5.0), 2.0);
        assert_eq!(clamp_speed(0.1), 0.5);
        assert_eq!(clamp_speed(1.25), 1.25);
    }
}
