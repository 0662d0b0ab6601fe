use anyhow::Result;
use teloxide::prelude::*;

use crate::messages::{generation_failed, PHOTO_NEEDS_CAPTION};
use crate::service::DescriptionService;
use crate::utils::download_telegram_file;

use super::describe::reply_with_generation;

/// File id and a file name for an image sent as a photo or as an image document.
pub fn uploaded_image(msg: &Message) -> Option<(String, String)> {
    if let Some(sizes) = msg.photo() {
        let largest = sizes.iter().max_by_key(|p| p.file.size)?;
        return Some((
            largest.file.id.clone(),
            format!("{}.jpg", largest.file.unique_id),
        ));
    }

    let doc = msg.document()?;
    let is_image = doc
        .mime_type
        .as_ref()
        .is_some_and(|m| m.essence_str().starts_with("image/"));
    if !is_image {
        return None;
    }
    let name = doc
        .file_name
        .clone()
        .unwrap_or_else(|| format!("{}.jpg", doc.file.unique_id));
    Some((doc.file.id.clone(), name))
}

/// Describe an uploaded image, using its caption as the title.
pub async fn describe_uploaded_photo(
    bot: Bot,
    msg: Message,
    service: DescriptionService,
) -> Result<()> {
    let Some((file_id, file_name)) = uploaded_image(&msg) else {
        tracing::debug!("message had no usable image");
        return Ok(());
    };

    let Some(title) = msg.caption().map(str::trim).filter(|c| !c.is_empty()) else {
        bot.send_message(msg.chat.id, PHOTO_NEEDS_CAPTION).await?;
        return Ok(());
    };

    let stored = async {
        let bytes = download_telegram_file(&bot, &file_id).await?;
        tracing::trace!(size = bytes.len(), "downloaded photo bytes");
        service.store_upload(&file_name, bytes).await
    }
    .await;
    let image = match stored {
        Ok(image) => image,
        Err(err) => {
            tracing::error!(chat_id = msg.chat.id.0, error = %err, "Failed to fetch uploaded photo");
            bot.send_message(msg.chat.id, generation_failed(&err)).await?;
            return Ok(());
        }
    };

    reply_with_generation(&bot, msg.chat.id, &service, image, title).await
}
