use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use kaiwa_core::DEFAULT_MAX_HISTORY_PAIRS;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_MAX_TOKENS: u32 = 200;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STORE_URL: &str = "ws://127.0.0.1:8001";
const DEFAULT_STORE_NS: &str = "kaiwa";
const DEFAULT_STORE_DB: &str = "kaiwa";

const DEFAULT_SYSTEM_PROMPT: &str =
    "あなたは親切なAIアシスタントです。ユーザーの質問に答えたり、会話を楽しんだりします。";
const DEFAULT_RESET_KEYWORD: &str = "リセット";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub line: LineConfig,
    pub openai: OpenAiConfig,
    pub store: StoreConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LineConfig {
    pub channel_access_token: String,
    pub channel_secret: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Explicit outbound request timeout (seconds), applied to every
    /// HTTP client instead of inheriting library defaults.
    pub request_timeout_secs: u64,
}

impl OpenAiConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChatConfig {
    pub system_prompt: String,
    pub reset_keyword: String,
    pub max_history_pairs: usize,
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::from_map(&env)
    }

    /// Load configuration from an explicit variable map.
    ///
    /// Split out from [`Config::from_env`] so tests can exercise the
    /// parsing and defaulting logic without mutating process state.
    pub fn from_map(env: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let channel_access_token = required(env, "LINE_CHANNEL_ACCESS_TOKEN")?;
        let channel_secret = required(env, "LINE_CHANNEL_SECRET")?;
        let api_key = required(env, "OPENAI_API_KEY")?;

        Ok(Self {
            server: ServerConfig {
                port: parse_or(env, "PORT", DEFAULT_PORT)?,
            },
            line: LineConfig {
                channel_access_token,
                channel_secret,
            },
            openai: OpenAiConfig {
                api_key,
                model: string_or(env, "OPENAI_MODEL", DEFAULT_MODEL),
                max_tokens: parse_or(env, "OPENAI_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
                temperature: parse_or(env, "OPENAI_TEMPERATURE", DEFAULT_TEMPERATURE)?,
                request_timeout_secs: parse_or(env, "REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            },
            store: StoreConfig {
                url: string_or(env, "SURREALDB_URL", DEFAULT_STORE_URL),
                namespace: string_or(env, "SURREALDB_NS", DEFAULT_STORE_NS),
                database: string_or(env, "SURREALDB_DB", DEFAULT_STORE_DB),
                username: env.get("SURREALDB_USER").cloned(),
                password: env.get("SURREALDB_PASS").cloned(),
            },
            chat: ChatConfig {
                system_prompt: string_or(env, "SYSTEM_PROMPT", DEFAULT_SYSTEM_PROMPT),
                reset_keyword: string_or(env, "RESET_KEYWORD", DEFAULT_RESET_KEYWORD),
                max_history_pairs: parse_or(env, "MAX_HISTORY_PAIRS", DEFAULT_MAX_HISTORY_PAIRS)?,
            },
        })
    }
}

fn required(env: &HashMap<String, String>, var: &'static str) -> Result<String, ConfigError> {
    match env.get(var) {
        Some(value) if !value.trim().is_empty() => Ok(value.clone()),
        _ => Err(ConfigError::Missing(var)),
    }
}

fn string_or(env: &HashMap<String, String>, var: &str, default: &str) -> String {
    env.get(var)
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

fn parse_or<T: std::str::FromStr>(
    env: &HashMap<String, String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    env.get(var).map_or(Ok(default), |raw| {
        raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        })
    })
}
