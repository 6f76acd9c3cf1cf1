use std::{io, path::Path};

use async_trait::async_trait;
use teloxide::Bot;
use tokio::{fs, io::AsyncWriteExt};
use url::Url;

use crate::errors::DownloadError;

/// Fetches a remote Bot API file into local storage
#[async_trait]
pub trait FileTransfer: Send + Sync {
    async fn download(&self, remote_path: &str, dest: &Path) -> Result<(), DownloadError>;
}

#[derive(Debug, Clone)]
pub struct FileClient {
    client: reqwest::Client,
    /// `<api>/file/bot<token>/`
    base: Url,
}

impl FileClient {
    pub fn new(client: reqwest::Client, base: Url) -> Self {
        Self { client, base }
    }

    /// Uses the bot's HTTP client and API url, so a custom Bot API server is honoured.
    pub fn for_bot(bot: &Bot) -> Result<Self, url::ParseError> {
        let base = bot.api_url().join(&format!("file/bot{}/", bot.token()))?;
        Ok(Self::new(bot.client().clone(), base))
    }
}

#[async_trait]
impl FileTransfer for FileClient {
    async fn download(&self, remote_path: &str, dest: &Path) -> Result<(), DownloadError> {
        // A Bot API server started with --local hands out absolute paths on its own disk.
        if Path::new(remote_path).is_absolute() {
            log::debug!("Copying local file {} to {}", remote_path, dest.display());
            fs::copy(remote_path, dest).await?;
            return Ok(());
        }

        let url = self
            .base
            .join(remote_path)
            .map_err(|e| DownloadError::Lookup(format!("bad file path {remote_path:?}: {e}")))?;

        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status));
        }

        let mut file = fs::File::create(dest).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        log::debug!("Downloaded {} to {}", remote_path, dest.display());
        Ok(())
    }
}

/// Opens a local file for upload, positioned at its start.
pub async fn open_for_upload(path: &Path) -> io::Result<fs::File> {
    fs::File::open(path).await
}
