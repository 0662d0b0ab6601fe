use anyhow::Result;
use teloxide::prelude::*;

use crate::messages::{generation_failed, DESCRIBE_USAGE};
use crate::service::DescriptionService;
use crate::store::ImageInput;
use crate::text_utils::{format_generated, split_describe_args};

/// Run a generation and report the outcome to the chat.
///
/// A failed generation is reported as a message; it is not an error of the handler.
pub async fn reply_with_generation(
    bot: &Bot,
    chat_id: ChatId,
    service: &DescriptionService,
    image: ImageInput,
    title: &str,
) -> Result<()> {
    match service.generate(image, title).await {
        Ok(record) => {
            tracing::info!(chat_id = chat_id.0, title = %record.title, "Description generated");
            bot.send_message(chat_id, format_generated(&record)).await?;
        }
        Err(err) => {
            tracing::warn!(chat_id = chat_id.0, error = %err, "Description generation failed");
            bot.send_message(chat_id, generation_failed(&err)).await?;
        }
    }
    Ok(())
}

/// `/describe <url> <title>`
pub async fn describe_from_url(
    bot: Bot,
    msg: Message,
    service: DescriptionService,
    args: String,
) -> Result<()> {
    let Some((url, title)) = split_describe_args(&args) else {
        bot.send_message(msg.chat.id, DESCRIBE_USAGE).await?;
        return Ok(());
    };

    reply_with_generation(&bot, msg.chat.id, &service, ImageInput::Url(url), &title).await
}
