use std::sync::Arc;

use reelbot_relay::Relay;

/// Shared context handed to every inbound message handler.
#[derive(Clone)]
pub struct BotContext {
    pub bot: teloxide::Bot,
    pub relay: Arc<Relay>,
}

impl BotContext {
    pub fn new(bot: teloxide::Bot, relay: Arc<Relay>) -> Self {
        Self { bot, relay }
    }
}
