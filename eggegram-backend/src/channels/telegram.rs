//! Telegram listener.
//!
//! Normalises each text message into an [`InboundEvent`], hands it to the
//! [`CommandHandler`] and sends back the single reply. Updates arrive by
//! long polling, or through a webhook when `WEBHOOK_URL` is configured.

use crate::channels::types::InboundEvent;
use crate::commands::{Command, CommandHandler};
use crate::config::{Config, Delivery};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks;
use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Eggegram commands:")]
enum BotCommand {
    #[command(description = "show the welcome message")]
    Start,
    #[command(description = "show weekly statistics")]
    Stats,
}

impl From<BotCommand> for Command {
    fn from(cmd: BotCommand) -> Self {
        match cmd {
            BotCommand::Start => Command::Start,
            BotCommand::Stats => Command::Stats,
        }
    }
}

/// Run the Telegram listener until shutdown (Ctrl-C).
pub async fn start_telegram_listener(
    config: &Config,
    handler: Arc<CommandHandler>,
) -> Result<(), String> {
    let bot = Bot::new(&config.telegram_bot_token);

    let schema = Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<BotCommand>()
                .endpoint(on_command),
        )
        .branch(dptree::endpoint(on_text));

    let mut dispatcher = Dispatcher::builder(bot.clone(), schema)
        .dependencies(dptree::deps![handler])
        .enable_ctrlc_handler()
        .build();

    match config.delivery() {
        Delivery::Polling => {
            log::info!("Telegram: Starting polling mode");
            dispatcher.dispatch().await;
        }
        Delivery::Webhook { listen, url } => {
            log::info!("Telegram: Starting webhook on port {}", listen.port());
            let listener = webhooks::axum(bot, webhooks::Options::new(listen, url))
                .await
                .map_err(|e| format!("Failed to set up Telegram webhook: {}", e))?;
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("Telegram: Update listener error"),
                )
                .await;
        }
    }

    log::info!("Telegram: Listener stopped");
    Ok(())
}

async fn on_command(
    bot: Bot,
    msg: Message,
    cmd: BotCommand,
    handler: Arc<CommandHandler>,
) -> ResponseResult<()> {
    let event = InboundEvent::command(msg.chat.id.to_string(), Command::from(cmd).name());
    let reply = handler.handle(&event).await;
    send_reply(&bot, &msg, reply).await;
    Ok(())
}

async fn on_text(bot: Bot, msg: Message, handler: Arc<CommandHandler>) -> ResponseResult<()> {
    // Photos, stickers and the like carry no text
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let event = InboundEvent::text(msg.chat.id.to_string(), text);
    let reply = handler.handle(&event).await;
    send_reply(&bot, &msg, reply).await;
    Ok(())
}

async fn send_reply(bot: &Bot, msg: &Message, reply: String) {
    if let Err(e) = bot.send_message(msg.chat.id, reply).await {
        log::error!(
            "Telegram: Failed to send reply to chat {}: {}",
            msg.chat.id,
            e
        );
    }
}
