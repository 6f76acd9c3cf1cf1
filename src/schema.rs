use std::sync::Arc;

use teloxide::{dispatching::UpdateHandler, prelude::*};
use tokio::task::JoinHandle;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::{
    attachment::Attachment,
    chat::{ChatClient, TelegramChat, notify},
    errors::{BotError, HandlerResult, RequestOutcome},
    pipeline::Pipeline,
    texts,
    transfer::{FileClient, FileTransfer},
    video::{Ffmpeg, Transcoder},
};

pub type TelegramPipeline = Pipeline<TelegramChat, FileClient, Ffmpeg>;

pub fn schema() -> UpdateHandler<BotError> {
    Update::filter_message().endpoint(message_received)
}

async fn message_received(
    msg: Message,
    pipeline: Arc<TelegramPipeline>,
    cancel: CancellationToken,
    requests: TaskTracker,
) -> HandlerResult {
    let attachment = Attachment::from_message(&msg);
    // The update loop never waits on a request; `shutdown` does.
    let _ = dispatch(pipeline, msg.chat.id, attachment, cancel, &requests).await;
    Ok(())
}

/// Spawns the pipeline for attachments, answers anything else with the usage hint.
pub async fn dispatch<C, F, T>(
    pipeline: Arc<Pipeline<C, F, T>>,
    chat_id: ChatId,
    attachment: Attachment,
    cancel: CancellationToken,
    requests: &TaskTracker,
) -> Option<JoinHandle<RequestOutcome>>
where
    C: ChatClient + 'static,
    F: FileTransfer + 'static,
    T: Transcoder + 'static,
{
    match attachment {
        Attachment::Neither => {
            log::debug!("Message without video from chat {}", chat_id);
            notify(pipeline.chat(), chat_id, texts::SEND_VIDEO).await;
            None
        }
        attachment => Some(requests.spawn(async move {
            pipeline.handle(chat_id, attachment, cancel).await
        })),
    }
}

/// Cancels in-flight requests and waits until each has sent its last reply.
pub async fn shutdown(requests: &TaskTracker, cancel: &CancellationToken) {
    requests.close();
    cancel.cancel();
    if !requests.is_empty() {
        log::info!("Waiting for {} in-flight requests", requests.len());
    }
    requests.wait().await;
}
