use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::domain::Address;

pub const DEFAULT_ASI_API_URL: &str = "https://api.asi1.ai/v1/chat/completions";
pub const DEFAULT_OCR_SPACE_URL: &str = "https://api.ocr.space/parse/image";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rpc_url: String,
    pub debt_tracker_address: Address,
    pub circle_score_address: Address,
    pub poll_interval: Duration,
    pub settlement_offset_secs: i64,
    pub confirmation_timeout: Duration,
    /// Per-request limit for every outbound HTTP call.
    pub request_timeout: Duration,
    /// Limit for one receipt scanner before the chain moves on.
    pub scan_timeout: Duration,
    pub asi_api_key: Option<String>,
    pub asi_api_url: String,
    pub ocr_space_api_key: Option<String>,
    pub ocr_space_url: String,
    pub watch_users: Vec<Address>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let rpc_url = env_map
            .get("RPC_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("RPC_URL".to_string()))?;

        let debt_tracker_address = env_map
            .get("DEBT_TRACKER_ADDRESS")
            .ok_or_else(|| ConfigError::MissingEnv("DEBT_TRACKER_ADDRESS".to_string()))
            .and_then(|s| parse_address("DEBT_TRACKER_ADDRESS", s))?;

        let circle_score_address = match env_map.get("CIRCLE_SCORE_ADDRESS") {
            Some(s) => parse_address("CIRCLE_SCORE_ADDRESS", s)?,
            None => Address::zero(),
        };

        let poll_interval = parse_positive_ms(&env_map, "POLL_INTERVAL_MS", 10_000)?;

        let settlement_offset_secs = env_map
            .get("SETTLEMENT_OFFSET_SECS")
            .map(|s| s.as_str())
            .unwrap_or("3600")
            .parse::<i64>()
            .ok()
            .filter(|v| *v >= 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "SETTLEMENT_OFFSET_SECS".to_string(),
                    "must be a non-negative integer".to_string(),
                )
            })?;

        let confirmation_timeout_ms = parse_u64(&env_map, "CONFIRMATION_TIMEOUT_MS", 60_000)?;
        let request_timeout = parse_positive_ms(&env_map, "REQUEST_TIMEOUT_MS", 15_000)?;
        let scan_timeout = parse_positive_ms(&env_map, "SCAN_TIMEOUT_MS", 30_000)?;

        // Older deployments set ASI_ONE_API_KEY.
        let asi_api_key = non_empty(&env_map, "ASI_API_KEY")
            .or_else(|| non_empty(&env_map, "ASI_ONE_API_KEY"));
        let asi_api_url = non_empty(&env_map, "ASI_API_URL")
            .unwrap_or_else(|| DEFAULT_ASI_API_URL.to_string());
        let ocr_space_api_key = non_empty(&env_map, "OCR_SPACE_API_KEY");
        let ocr_space_url = non_empty(&env_map, "OCR_SPACE_URL")
            .unwrap_or_else(|| DEFAULT_OCR_SPACE_URL.to_string());

        let watch_users = parse_watch_users_from_map(&env_map)?;

        Ok(Config {
            port,
            rpc_url,
            debt_tracker_address,
            circle_score_address,
            poll_interval,
            settlement_offset_secs,
            confirmation_timeout: Duration::from_millis(confirmation_timeout_ms),
            request_timeout,
            scan_timeout,
            asi_api_key,
            asi_api_url,
            ocr_space_api_key,
            ocr_space_url,
            watch_users,
        })
    }
}

fn parse_address(key: &str, value: &str) -> Result<Address, ConfigError> {
    Address::parse(value).map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}

fn parse_u64(
    env_map: &HashMap<String, String>,
    key: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    match env_map.get(key) {
        Some(s) => s.trim().parse::<u64>().map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), "must be a valid u64".to_string())
        }),
        None => Ok(default),
    }
}

fn parse_positive_ms(
    env_map: &HashMap<String, String>,
    key: &str,
    default_ms: u64,
) -> Result<Duration, ConfigError> {
    match parse_u64(env_map, key, default_ms)? {
        0 => Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be greater than zero".to_string(),
        )),
        ms => Ok(Duration::from_millis(ms)),
    }
}

fn non_empty(env_map: &HashMap<String, String>, key: &str) -> Option<String> {
    env_map
        .get(key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_watch_users_from_map(
    env_map: &HashMap<String, String>,
) -> Result<Vec<Address>, ConfigError> {
    let raw: Vec<String> = if let Some(users_str) = env_map.get("WATCH_USERS") {
        users_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    } else if let Some(file_path) = env_map.get("WATCH_USERS_FILE") {
        let content = std::fs::read_to_string(file_path).map_err(|_| {
            ConfigError::InvalidValue(
                "WATCH_USERS_FILE".to_string(),
                "file not found or unreadable".to_string(),
            )
        })?;
        content
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|s| !s.is_empty() && !s.starts_with('#'))
            .collect()
    } else {
        Vec::new()
    };

    raw.iter()
        .map(|s| parse_address("WATCH_USERS", s))
        .collect()
}
