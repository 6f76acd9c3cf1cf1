use std::path::PathBuf;

use url::Url;

use crate::errors::ConfigError;

pub const DEFAULT_VIDEO_NOTE_SIZE: u32 = 640;
pub const DEFAULT_PORT: u16 = 8080;

/// How updates reach the bot
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateMode {
    Polling,
    Webhook {
        url: Url,
        secret: Option<String>,
        port: u16,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub mode: UpdateMode,
    pub video_note_size: u32,
    pub ffmpeg: String,
    pub temp_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let token = var("BOT_TOKEN").ok_or(ConfigError::Missing("BOT_TOKEN"))?;

        let mode = match var("WEBHOOK_URL") {
            Some(raw) => {
                let url = Url::parse(&raw).map_err(|_| ConfigError::Invalid {
                    name: "WEBHOOK_URL",
                    value: raw.clone(),
                })?;
                let port = match var("PORT") {
                    Some(p) => p.parse().map_err(|_| ConfigError::Invalid {
                        name: "PORT",
                        value: p,
                    })?,
                    None => DEFAULT_PORT,
                };
                let secret = match var("WEBHOOK_SECRET") {
                    Some(s) if !is_valid_secret(&s) => {
                        return Err(ConfigError::Invalid {
                            name: "WEBHOOK_SECRET",
                            value: s,
                        });
                    }
                    secret => secret,
                };
                UpdateMode::Webhook { url, secret, port }
            }
            None => UpdateMode::Polling,
        };

        let video_note_size = match var("VIDEO_NOTE_SIZE") {
            Some(s) => match s.parse::<u32>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "VIDEO_NOTE_SIZE",
                        value: s,
                    });
                }
            },
            None => DEFAULT_VIDEO_NOTE_SIZE,
        };

        Ok(Self {
            token,
            mode,
            video_note_size,
            ffmpeg: var("FFMPEG_PATH").unwrap_or_else(|| "ffmpeg".to_string()),
            temp_dir: var("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
        })
    }
}

/// Telegram accepts 1 to 256 characters from `A-Z`, `a-z`, `0-9`, `_` and `-`.
fn is_valid_secret(secret: &str) -> bool {
    (1..=256).contains(&secret.len())
        && secret
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}
