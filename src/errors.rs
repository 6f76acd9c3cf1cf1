use std::fmt;

use strum::Display;

use crate::texts;

/// Error type of the dptree handler tree
#[derive(Debug)]
pub enum BotError {
    /// Telegram API errors
    TelegramError(teloxide::RequestError),
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { name: &'static str, value: String },
}

#[derive(Debug)]
pub enum ConversionError {
    NonUtf8Path,
    Spawn(std::io::Error),
    FfmpegFailed(std::process::ExitStatus),
    Cancelled,
}

#[derive(Debug)]
pub enum DownloadError {
    /// The file handle could not be resolved to a remote path
    Lookup(String),
    Http(reqwest::Error),
    Status(reqwest::StatusCode),
    Io(std::io::Error),
    Cancelled,
}

#[derive(Debug)]
pub enum UploadError {
    Open(std::io::Error),
    /// The recipient disabled voice and video-note messages
    VoiceMessagesForbidden,
    Request(String),
    Cancelled,
}

/// Why a single request ended early
#[derive(Debug)]
pub enum PipelineError {
    Validation,
    Download(DownloadError),
    Transcode(ConversionError),
    Upload(UploadError),
}

#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    #[strum(to_string = "success")]
    Success,
    #[strum(to_string = "validation failure")]
    ValidationFailure,
    #[strum(to_string = "download failure")]
    DownloadFailure,
    #[strum(to_string = "transcode failure")]
    TranscodeFailure,
    #[strum(to_string = "upload failure")]
    UploadFailure,
}

impl fmt::Display for BotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotError::TelegramError(e) => write!(f, "Telegram API error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(name) => write!(f, "{name} environment variable is not set"),
            ConfigError::Invalid { name, value } => write!(f, "invalid value for {name}: {value:?}"),
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ConversionError::*;
        match self {
            NonUtf8Path => write!(f, "path is not valid UTF-8"),
            Spawn(e) => write!(f, "failed to spawn ffmpeg: {e}"),
            FfmpegFailed(code) => write!(f, "ffmpeg exited with {code}"),
            Cancelled => write!(f, "ffmpeg was cancelled"),
        }
    }
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use DownloadError::*;
        match self {
            Lookup(msg) => write!(f, "failed to get file info: {msg}"),
            Http(e) => write!(f, "download request failed: {e}"),
            Status(code) => write!(f, "download returned {code}"),
            Io(e) => write!(f, "failed to write downloaded file: {e}"),
            Cancelled => write!(f, "download was cancelled"),
        }
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use UploadError::*;
        match self {
            Open(e) => write!(f, "failed to open converted file: {e}"),
            VoiceMessagesForbidden => write!(f, "recipient forbids voice and video-note messages"),
            Request(msg) => write!(f, "failed to send video note: {msg}"),
            Cancelled => write!(f, "upload was cancelled"),
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Validation => write!(f, "message has no video or document"),
            PipelineError::Download(e) => write!(f, "{e}"),
            PipelineError::Transcode(e) => write!(f, "{e}"),
            PipelineError::Upload(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for BotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BotError::TelegramError(e) => Some(e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl std::error::Error for ConversionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConversionError::Spawn(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for DownloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DownloadError::Http(e) => Some(e),
            DownloadError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for UploadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UploadError::Open(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Validation => None,
            PipelineError::Download(e) => Some(e),
            PipelineError::Transcode(e) => Some(e),
            PipelineError::Upload(e) => Some(e),
        }
    }
}

impl From<teloxide::RequestError> for BotError {
    fn from(err: teloxide::RequestError) -> Self {
        BotError::TelegramError(err)
    }
}

impl From<reqwest::Error> for DownloadError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<DownloadError> for PipelineError {
    fn from(e: DownloadError) -> Self {
        Self::Download(e)
    }
}

impl From<ConversionError> for PipelineError {
    fn from(e: ConversionError) -> Self {
        Self::Transcode(e)
    }
}

impl From<UploadError> for PipelineError {
    fn from(e: UploadError) -> Self {
        Self::Upload(e)
    }
}

impl UploadError {
    /// Classifies a Bot API error description
    pub fn from_description(description: impl Into<String>) -> Self {
        let description = description.into();
        if description.contains("VOICE_MESSAGES_FORBIDDEN") {
            Self::VoiceMessagesForbidden
        } else {
            Self::Request(description)
        }
    }
}

impl PipelineError {
    pub fn outcome(&self) -> RequestOutcome {
        match self {
            PipelineError::Validation => RequestOutcome::ValidationFailure,
            PipelineError::Download(_) => RequestOutcome::DownloadFailure,
            PipelineError::Transcode(_) => RequestOutcome::TranscodeFailure,
            PipelineError::Upload(_) => RequestOutcome::UploadFailure,
        }
    }

    /// The single reply the user gets for this failure
    pub fn user_text(&self) -> &'static str {
        match self {
            PipelineError::Validation => texts::INVALID_VIDEO,
            // The file handle never resolved, nothing was fetched yet.
            PipelineError::Download(DownloadError::Lookup(_)) => texts::PROCESS_FAILED,
            PipelineError::Download(_) => texts::DOWNLOAD_FAILED,
            PipelineError::Transcode(_) => texts::PROCESS_FAILED,
            PipelineError::Upload(UploadError::VoiceMessagesForbidden) => {
                texts::VIDEO_NOTES_FORBIDDEN
            }
            PipelineError::Upload(_) => texts::SEND_FAILED,
        }
    }
}

/// Result of bot operations
pub type BotResult<T> = Result<T, BotError>;

/// Result for handlers
pub type HandlerResult = BotResult<()>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_messages_forbidden_is_recognised() {
        let err = UploadError::from_description("Bad Request: VOICE_MESSAGES_FORBIDDEN");
        assert!(matches!(err, UploadError::VoiceMessagesForbidden));

        let err = UploadError::from_description("Bad Request: chat not found");
        assert!(matches!(err, UploadError::Request(ref m) if m == "Bad Request: chat not found"));
    }

    #[test]
    fn user_text_follows_failure_category() {
        let lookup = PipelineError::Download(DownloadError::Lookup("gone".into()));
        assert_eq!(lookup.user_text(), texts::PROCESS_FAILED);
        assert_eq!(lookup.outcome(), RequestOutcome::DownloadFailure);

        let status = PipelineError::Download(DownloadError::Status(reqwest::StatusCode::NOT_FOUND));
        assert_eq!(status.user_text(), texts::DOWNLOAD_FAILED);

        let cancelled = PipelineError::Transcode(ConversionError::Cancelled);
        assert_eq!(cancelled.user_text(), texts::PROCESS_FAILED);
        assert_eq!(cancelled.outcome(), RequestOutcome::TranscodeFailure);

        let forbidden = PipelineError::Upload(UploadError::VoiceMessagesForbidden);
        assert_eq!(forbidden.user_text(), texts::VIDEO_NOTES_FORBIDDEN);

        let other = PipelineError::Upload(UploadError::Request("timeout".into()));
        assert_eq!(other.user_text(), texts::SEND_FAILED);
        assert_eq!(other.outcome(), RequestOutcome::UploadFailure);
    }

    #[test]
    fn outcome_display() {
        assert_eq!(RequestOutcome::TranscodeFailure.to_string(), "transcode failure");
        assert_eq!(PipelineError::Validation.outcome().to_string(), "validation failure");
    }
}
