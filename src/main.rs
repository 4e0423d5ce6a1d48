use std::time::Duration;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use rust_chat_sim::network::ChatClient;
use rust_chat_sim::ui::ChatApp;
use tokio::sync::mpsc;

use rust_chat_sim::common::{ChatCommand, ChatEvent, ClientEvent, ScreenError};
use rust_chat_sim::config::{self, AppConfig};

#[derive(Parser)]
#[command(
    name = "rust_chat_sim",
    version,
    about = "Chat screen backed by a simulated conversation"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Clone, PartialEq, Eq)]
enum Mode {
    /// Play a scripted conversation without the UI and log every change
    Headless {
        /// Message to send; repeat for several
        #[arg(long = "message", value_name = "TEXT")]
        messages: Vec<String>,
        /// Raise the remote typing indicator before sending
        #[arg(long)]
        typing: bool,
        /// Give up if the conversation has not settled after this long
        #[arg(long, default_value_t = 30_000, value_name = "MS")]
        timeout_ms: u64,
    },
    /// Write the effective configuration to the config path
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let app_config = config::load_config(&cli.config);

    match cli.mode {
        Some(Mode::InitConfig) => {
            match config::save_config(&cli.config, &app_config) {
                Ok(()) => log::info!("Wrote config to {}", cli.config),
                Err(err) => log::error!("Failed to write config {}: {err}", cli.config),
            }
            Ok(())
        }
        Some(Mode::Headless {
            messages,
            typing,
            timeout_ms,
        }) => {
            run_headless(app_config, messages, typing, timeout_ms).await;
            Ok(())
        }
        None => run_full_client(app_config).await,
    }
}

async fn run_headless(app_config: AppConfig, messages: Vec<String>, typing: bool, timeout_ms: u64) {
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let client = tokio::spawn(ChatClient::new(event_tx, cmd_rx, app_config).run());
    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            log_event(&event);
        }
    });

    let mut commands = Vec::new();
    if typing {
        commands.push(ChatCommand::SetTyping(true));
    }
    commands.extend(messages.into_iter().map(|text| ChatCommand::SendMessage {
        text,
        reply_to: None,
    }));
    for command in commands {
        if let Err(err) = cmd_tx.send(command).await {
            log::warn!("Chat client stopped accepting commands: {err}");
            break;
        }
    }
    drop(cmd_tx);

    match tokio::time::timeout(Duration::from_millis(timeout_ms), client).await {
        Ok(Ok(Ok(()))) => {
            if let Err(err) = printer.await {
                log::warn!("Event printer stopped abnormally: {err}");
            }
        }
        Ok(Ok(Err(err))) => log::error!("Chat client failed: {err}"),
        Ok(Err(err)) => log::error!("Chat client task aborted: {err}"),
        Err(_) => {
            printer.abort();
            log::error!("{}", ScreenError::Timeout { millis: timeout_ms });
        }
    }
}

fn log_event(event: &ClientEvent) {
    match event {
        ClientEvent::Chat(ChatEvent::MessageAppended(message)) => log::info!(
            "[{}] {}: {} ({})",
            message.timestamp.format("%H:%M:%S%.3f"),
            message.sender_name,
            message.content,
            message.state
        ),
        ClientEvent::Chat(ChatEvent::MessageUpdated(message)) => log::info!(
            "Message {} is {} {:?}",
            message.id.short(),
            message.state,
            message.reactions
        ),
        ClientEvent::Chat(ChatEvent::TypingChanged { user_id, is_typing }) => {
            log::info!("{user_id} typing: {is_typing}")
        }
        ClientEvent::Failure(err) => log::warn!("{err}"),
    }
}

async fn run_full_client(app_config: AppConfig) -> Result<(), eframe::Error> {
    // UI -> chat client
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // chat client -> UI
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let local_user = app_config.local_user.clone();
    let remote_user = app_config.remote_user.clone();
    tokio::spawn(async move {
        let client = ChatClient::new(event_tx, cmd_rx, app_config);
        if let Err(err) = client.run().await {
            log::error!("Chat client terminated: {err}");
        }
    });

    let options = eframe::NativeOptions::default();
    let mut event_rx = Some(event_rx);

    eframe::run_native(
        "Rust Chat Sim",
        options,
        Box::new(move |cc| {
            let Some(event_receiver) = event_rx.take() else {
                return Err("ChatApp initialized twice".into());
            };
            log::info!(
                "Chat screen opened: {} with {}",
                local_user.display_name,
                remote_user.display_name
            );

            Ok(Box::new(ChatApp::new(
                cc,
                local_user.clone(),
                remote_user.clone(),
                cmd_tx.clone(),
                event_receiver,
            )))
        }),
    )
}
