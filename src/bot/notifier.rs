use async_trait::async_trait;
use serenity::{builder::CreateMessage, http::Http, model::id::ChannelId};
use std::sync::Arc;
use tracing::error;

use crate::{
    audio::notice::{Notice, Notifier},
    ui::embeds,
};

/// Posts queue notices as embeds in the guild's text channel.
pub struct DiscordNotifier {
    http: Arc<Http>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, channel_id: ChannelId, notice: Notice) {
        let message = CreateMessage::new().embed(embeds::create_notice_embed(&notice));

        if let Err(e) = channel_id.send_message(&self.http, message).await {
            error!("Error sending notice to {}: {:?}", channel_id, e);
        }
    }
}
