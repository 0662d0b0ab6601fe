use anyhow::Result;
use teloxide::{prelude::*, types::InputFile};

use crate::messages::EXPORT_FILE_NAME;
use crate::service::DescriptionService;
use crate::text_utils::{format_history, HISTORY_LIMIT};

pub async fn show_history(bot: Bot, msg: Message, service: DescriptionService) -> Result<()> {
    let records = service.records().await;
    tracing::debug!(chat_id = msg.chat.id.0, rows = records.len(), "Showing history");
    bot.send_message(msg.chat.id, format_history(&records, HISTORY_LIMIT))
        .await?;
    Ok(())
}

/// Send the whole history as a CSV document.
pub async fn export_history(bot: Bot, msg: Message, service: DescriptionService) -> Result<()> {
    let bytes = service.export_csv().await?;
    tracing::debug!(chat_id = msg.chat.id.0, size = bytes.len(), "Exporting history");
    bot.send_document(msg.chat.id, InputFile::memory(bytes).file_name(EXPORT_FILE_NAME))
        .await?;
    Ok(())
}
