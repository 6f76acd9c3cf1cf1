use std::path::{Path, PathBuf};

use teloxide::types::ChatId;
use tokio_util::sync::CancellationToken;

use crate::{
    attachment::{Attachment, normalize_file_name},
    chat::{ChatClient, notify},
    errors::{DownloadError, PipelineError, RequestOutcome, UploadError},
    temp_file::TempFile,
    texts,
    transfer::{FileTransfer, open_for_upload},
    video::Transcoder,
};

/// Short per-request id used in logs and temp file names
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string()[..8].to_string())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Turns one inbound attachment into a video note or a single error reply
pub struct Pipeline<C, F, T> {
    chat: C,
    files: F,
    transcoder: T,
    temp_dir: PathBuf,
    note_length: u32,
}

impl<C, F, T> Pipeline<C, F, T>
where
    C: ChatClient,
    F: FileTransfer,
    T: Transcoder,
{
    pub fn new(chat: C, files: F, transcoder: T, temp_dir: PathBuf, note_length: u32) -> Self {
        Self {
            chat,
            files,
            transcoder,
            temp_dir,
            note_length,
        }
    }

    pub fn chat(&self) -> &C {
        &self.chat
    }

    #[cfg(test)]
    pub(crate) fn transcoder(&self) -> &T {
        &self.transcoder
    }

    pub async fn handle(
        &self,
        chat_id: ChatId,
        attachment: Attachment,
        cancel: CancellationToken,
    ) -> RequestOutcome {
        let request_id = RequestId::new();
        log::info!("[{}] New video from chat {}", request_id, chat_id);

        // Temp files are gone by the time `run` returns, whatever happened.
        match self.run(chat_id, &request_id, attachment, &cancel).await {
            Ok(()) => {
                log::info!("[{}] Video note sent to chat {}", request_id, chat_id);
                RequestOutcome::Success
            }
            Err(e) => {
                log::error!("[{}] {} for chat {}: {}", request_id, e.outcome(), chat_id, e);
                notify(&self.chat, chat_id, e.user_text()).await;
                e.outcome()
            }
        }
    }

    async fn run(
        &self,
        chat_id: ChatId,
        request_id: &RequestId,
        attachment: Attachment,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        let reference = attachment.into_ref().ok_or(PipelineError::Validation)?;
        let file_name = normalize_file_name(reference.file_name.as_deref());

        let remote_path = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DownloadError::Cancelled),
            path = self.chat.file_path(&reference.file_id) => path,
        }?;

        let input = TempFile::new(temp_path(
            &self.temp_dir,
            "input",
            chat_id,
            request_id,
            &file_name,
        ));
        log::debug!("[{}] Downloading video to {}", request_id, input.path().display());
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DownloadError::Cancelled),
            res = self.files.download(&remote_path, input.path()) => res,
        }?;

        notify(&self.chat, chat_id, texts::DOWNLOADED).await;

        let output = TempFile::new(temp_path(
            &self.temp_dir,
            "output",
            chat_id,
            request_id,
            &file_name,
        ));
        self.transcoder
            .transcode(input.path(), output.path(), cancel)
            .await?;

        notify(&self.chat, chat_id, texts::PROCESSED).await;

        let note = open_for_upload(output.path())
            .await
            .map_err(UploadError::Open)?;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(UploadError::Cancelled),
            res = self.chat.send_video_note(chat_id, note, &file_name, self.note_length) => res,
        }?;

        Ok(())
    }
}

/// `<dir>/<prefix>_<chat>_<request>_<name>`
pub fn temp_path(
    dir: &Path,
    prefix: &str,
    chat_id: ChatId,
    request_id: &RequestId,
    file_name: &str,
) -> PathBuf {
    dir.join(format!("{prefix}_{}_{request_id}_{file_name}", chat_id.0))
}
