mod attachment;
mod chat;
mod config;
mod errors;
mod pipeline;
mod schema;
mod temp_file;
#[cfg(test)]
mod testing;
mod texts;
mod transfer;
mod video;

use std::{net::SocketAddr, sync::Arc};

use teloxide::{
    dispatching::ShutdownToken,
    prelude::*,
    update_listeners::{Polling, webhooks},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::{
    chat::TelegramChat,
    config::{Config, UpdateMode},
    pipeline::Pipeline,
    schema::{schema, shutdown},
    transfer::FileClient,
    video::Ffmpeg,
};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    pretty_env_logger::init();

    if let Err(e) = run().await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::from_env()?;
    log::info!("Starting circle note bot...");

    let bot = Bot::new(&config.token);
    let pipeline = Arc::new(Pipeline::new(
        TelegramChat::new(bot.clone()),
        FileClient::for_bot(&bot)?,
        Ffmpeg::new(&config.ffmpeg, config.video_note_size),
        config.temp_dir.clone(),
        config.video_note_size,
    ));
    log::info!(
        "Video notes are {0}x{0}, temp files go to {1}",
        config.video_note_size,
        config.temp_dir.display()
    );

    // Threaded into every request so in-flight ffmpeg runs die with the process.
    let cancel = CancellationToken::new();
    let requests = TaskTracker::new();

    let mut dispatcher = Dispatcher::builder(bot.clone(), schema())
        .dependencies(dptree::deps![pipeline, cancel.clone(), requests.clone()])
        .build();
    tokio::spawn(shutdown_on_signal(cancel.clone(), dispatcher.shutdown_token()));

    let error_handler = LoggingErrorHandler::with_custom_text("An error from the update listener");
    match config.mode {
        UpdateMode::Polling => {
            log::info!("Starting bot in long polling mode");
            let listener = Polling::builder(bot).delete_webhook().await.build();
            dispatcher
                .dispatch_with_listener(listener, error_handler)
                .await;
        }
        UpdateMode::Webhook { url, secret, port } => {
            let address = SocketAddr::from(([0, 0, 0, 0], port));
            log::info!("Starting bot in webhook mode at {}, listening on {}", url, address);
            let mut options = webhooks::Options::new(address, url);
            if let Some(secret) = secret {
                options = options.secret_token(secret);
            }
            let listener = webhooks::axum(bot, options).await?;
            dispatcher
                .dispatch_with_listener(listener, error_handler)
                .await;
        }
    }

    shutdown(&requests, &cancel).await;
    log::info!("Bot stopped");
    Ok(())
}

async fn shutdown_on_signal(cancel: CancellationToken, dispatcher: ShutdownToken) {
    wait_for_signal().await;
    log::info!("Received shutdown signal. Closing bot...");
    cancel.cancel();

    match dispatcher.shutdown() {
        Ok(stopped) => stopped.await,
        Err(_) => log::warn!("Dispatcher was not running when shutdown was requested"),
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            log::warn!("Failed to listen for SIGTERM: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
