use async_trait::async_trait;
use teloxide::{
    RequestError,
    prelude::*,
    types::InputFile,
};
use tokio::fs;

use crate::errors::{BotResult, DownloadError, UploadError};

/// The slice of the Bot API the request pipeline talks to
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Resolves a file handle to its path on the Bot API file storage.
    async fn file_path(&self, file_id: &str) -> Result<String, DownloadError>;

    async fn send_text(&self, chat_id: ChatId, text: &str) -> BotResult<()>;

    async fn send_video_note(
        &self,
        chat_id: ChatId,
        file: fs::File,
        file_name: &str,
        length: u32,
    ) -> Result<(), UploadError>;
}

#[derive(Clone)]
pub struct TelegramChat {
    bot: Bot,
}

impl TelegramChat {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatClient for TelegramChat {
    async fn file_path(&self, file_id: &str) -> Result<String, DownloadError> {
        let file = self
            .bot
            .get_file(file_id.to_owned())
            .await
            .map_err(|e| DownloadError::Lookup(e.to_string()))?;
        Ok(file.path)
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> BotResult<()> {
        self.bot.send_message(chat_id, text).await?;
        Ok(())
    }

    async fn send_video_note(
        &self,
        chat_id: ChatId,
        file: fs::File,
        file_name: &str,
        length: u32,
    ) -> Result<(), UploadError> {
        let note = InputFile::read(file).file_name(file_name.to_owned());
        self.bot
            .send_video_note(chat_id, note)
            .length(length)
            .await
            .map_err(upload_error)?;
        Ok(())
    }
}

fn upload_error(err: RequestError) -> UploadError {
    match err {
        RequestError::Api(api) => UploadError::from_description(api.to_string()),
        other => UploadError::Request(other.to_string()),
    }
}

/// Best-effort message: a failed send is logged and dropped.
pub async fn notify<C: ChatClient + ?Sized>(chat: &C, chat_id: ChatId, text: &str) {
    if let Err(e) = chat.send_text(chat_id, text).await {
        log::warn!("Failed to send message to chat {}: {}", chat_id, e);
    }
}
