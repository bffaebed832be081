//! Configuration for the coaching client
//!
//! Configuration comes from .env files, environment variables and an optional
//! YAML file. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Environment variables
//! - `COACH_API_BASE_URL` - backend base URL (default `http://localhost:8000`)
//! - `COACH_API_TOKEN` - optional bearer token for the backend
//! - `COACH_REQUEST_TIMEOUT_SECONDS` - HTTP request timeout (default 30)
//! - `COACH_AUDIO_PLAYBACK` - `false` starts sessions muted (default true)
//! - `COACH_GREETING` - message sent on the user's behalf after connect;
//!   empty disables it (default `hi`)
//!
//! # Example
//! ```rust,no_run
//! use coach_realtime::config::ClientConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! let config = ClientConfig::from_file(&PathBuf::from("coach.yaml"))?;
//! println!("Backend at {}", config.api_base_url);
//! # Ok(())
//! # }
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

mod yaml;

pub use yaml::{ApiYaml, SessionYaml, YamlConfig};

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_GREETING: &str = "hi";

/// Client configuration
#[derive(Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub request_timeout_seconds: u64,
    /// Play agent audio; `false` connects muted
    pub audio_playback: bool,
    pub greeting: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            request_timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            audio_playback: true,
            greeting: Some(DEFAULT_GREETING.to_string()),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "***"))
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("audio_playback", &self.audio_playback)
            .field("greeting", &self.greeting)
            .finish()
    }
}

impl Drop for ClientConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut token) = self.api_token {
            token.zeroize();
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// The .env file, if any, is loaded in main.rs before this is called.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = Self::default();

        if let Ok(url) = env::var("COACH_API_BASE_URL") {
            config.api_base_url = url;
        }
        config.api_token = env::var("COACH_API_TOKEN").ok().filter(|t| !t.is_empty());
        if let Ok(timeout) = env::var("COACH_REQUEST_TIMEOUT_SECONDS") {
            config.request_timeout_seconds = timeout.parse().map_err(|e| {
                format!("Invalid COACH_REQUEST_TIMEOUT_SECONDS '{timeout}': {e}")
            })?;
        }
        if let Ok(value) = env::var("COACH_AUDIO_PLAYBACK") {
            config.audio_playback = parse_bool(&value)
                .ok_or_else(|| format!("Invalid COACH_AUDIO_PLAYBACK '{value}'"))?;
        }
        if let Ok(greeting) = env::var("COACH_GREETING") {
            config.greeting = non_empty(greeting);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file layered over environment variables
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = YamlConfig::from_file(path)?;
        let mut config = Self::from_env()?;

        if let Some(api) = yaml_config.api {
            if let Some(url) = api.base_url {
                config.api_base_url = url;
            }
            if let Some(token) = api.token {
                config.api_token = non_empty(token);
            }
            if let Some(timeout) = api.timeout_seconds {
                config.request_timeout_seconds = timeout;
            }
        }
        if let Some(session) = yaml_config.session {
            if let Some(playback) = session.audio_playback {
                config.audio_playback = playback;
            }
            if let Some(greeting) = session.greeting {
                config.greeting = non_empty(greeting);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the base URL and timeout
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        let url = Url::parse(&self.api_base_url)
            .map_err(|e| format!("Invalid API base URL '{}': {e}", self.api_base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("API base URL must use http or https, got '{}'", url.scheme()).into());
        }
        if self.request_timeout_seconds == 0 {
            return Err("Request timeout must be greater than zero".into());
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Whether sessions should start muted
    pub fn start_muted(&self) -> bool {
        !self.audio_playback
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
