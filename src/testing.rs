//! In-memory collaborators for pipeline and adapter tests.

use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use teloxide::{
    ApiError, RequestError,
    types::ChatId,
};
use tokio::{fs, io::AsyncReadExt};
use tokio_util::sync::CancellationToken;

use crate::{
    chat::ChatClient,
    errors::{BotError, BotResult, ConversionError, DownloadError, UploadError},
    pipeline::Pipeline,
    transfer::FileTransfer,
    video::Transcoder,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SentNote {
    pub chat_id: ChatId,
    pub file_name: String,
    pub length: u32,
    pub content: Vec<u8>,
}

#[derive(Default)]
pub struct FakeChat {
    /// file id -> remote path; unknown ids resolve to themselves
    pub paths: HashMap<String, String>,
    pub lookup_error: Option<String>,
    pub upload_error: Option<String>,
    pub fail_texts: bool,
    pub lookups: AtomicUsize,
    texts: Mutex<Vec<(ChatId, String)>>,
    notes: Mutex<Vec<SentNote>>,
}

impl FakeChat {
    pub fn with_paths(paths: &[(&str, &str)]) -> Self {
        Self {
            paths: paths
                .iter()
                .map(|(id, path)| (id.to_string(), path.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn texts(&self) -> Vec<(ChatId, String)> {
        self.texts.lock().unwrap().clone()
    }

    pub fn notes(&self) -> Vec<SentNote> {
        self.notes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for FakeChat {
    async fn file_path(&self, file_id: &str) -> Result<String, DownloadError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.lookup_error {
            return Err(DownloadError::Lookup(e.clone()));
        }
        Ok(self
            .paths
            .get(file_id)
            .cloned()
            .unwrap_or_else(|| file_id.to_string()))
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> BotResult<()> {
        if self.fail_texts {
            return Err(BotError::TelegramError(RequestError::Api(ApiError::Unknown(
                "Forbidden: bot was blocked by the user".to_string(),
            ))));
        }
        self.texts.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }

    async fn send_video_note(
        &self,
        chat_id: ChatId,
        mut file: fs::File,
        file_name: &str,
        length: u32,
    ) -> Result<(), UploadError> {
        if let Some(e) = &self.upload_error {
            return Err(UploadError::from_description(e.clone()));
        }
        let mut content = Vec::new();
        file.read_to_end(&mut content)
            .await
            .map_err(UploadError::Open)?;
        self.notes.lock().unwrap().push(SentNote {
            chat_id,
            file_name: file_name.to_string(),
            length,
            content,
        });
        Ok(())
    }
}

/// Writes `bytes of <remote path>` to the destination
#[derive(Default)]
pub struct FakeFiles {
    pub fail_with_status: Option<reqwest::StatusCode>,
}

#[async_trait]
impl FileTransfer for FakeFiles {
    async fn download(&self, remote_path: &str, dest: &Path) -> Result<(), DownloadError> {
        if let Some(status) = self.fail_with_status {
            fs::write(dest, b"partial").await?;
            return Err(DownloadError::Status(status));
        }
        fs::write(dest, format!("bytes of {remote_path}")).await?;
        Ok(())
    }
}

/// Writes `note:` followed by the input bytes to the output
#[derive(Default)]
pub struct FakeTranscoder {
    pub fail: bool,
    pub delay: Option<Duration>,
    runs: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl FakeTranscoder {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn slow() -> Self {
        Self {
            delay: Some(Duration::from_millis(50)),
            ..Self::default()
        }
    }

    pub fn runs(&self) -> Vec<(PathBuf, PathBuf)> {
        self.runs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), ConversionError> {
        self.runs
            .lock()
            .unwrap()
            .push((input.to_path_buf(), output.to_path_buf()));

        if let Some(delay) = self.delay {
            tokio::select! {
                _ = cancel.cancelled() => return Err(ConversionError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        if self.fail {
            fs::write(output, b"half a frame")
                .await
                .map_err(ConversionError::Spawn)?;
            return Err(ConversionError::Spawn(io::Error::other(
                "Invalid data found when processing input",
            )));
        }

        let mut content = b"note:".to_vec();
        content.extend(fs::read(input).await.map_err(ConversionError::Spawn)?);
        fs::write(output, content)
            .await
            .map_err(ConversionError::Spawn)?;
        Ok(())
    }
}

pub type FakePipeline = Pipeline<FakeChat, FakeFiles, FakeTranscoder>;

/// Owns the temp directory the pipeline writes into
pub struct TestEnv {
    dir: tempfile::TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn pipeline(&self) -> FakePipeline {
        self.pipeline_with(
            FakeChat::default(),
            FakeFiles::default(),
            FakeTranscoder::default(),
        )
    }

    pub fn pipeline_with(
        &self,
        chat: FakeChat,
        files: FakeFiles,
        transcoder: FakeTranscoder,
    ) -> FakePipeline {
        Pipeline::new(chat, files, transcoder, self.dir.path().to_path_buf(), 640)
    }

    /// No temp files left behind
    pub fn is_empty(&self) -> bool {
        std::fs::read_dir(self.dir.path()).unwrap().next().is_none()
    }
}
