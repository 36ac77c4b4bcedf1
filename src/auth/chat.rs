use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

/// External chat/video directory. Verified users are registered with the
/// provider and handed a client token for the messaging UI.
#[async_trait]
pub trait ChatDirectory: Send + Sync {
    /// Upserts the identity with the provider and returns a client token.
    async fn provision(&self, user_id: Uuid, full_name: &str) -> anyhow::Result<String>;
}

/// Local-dev binding: no provider round-trip, returns a recognizable
/// placeholder token.
pub struct LogChatDirectory;

#[async_trait]
impl ChatDirectory for LogChatDirectory {
    async fn provision(&self, user_id: Uuid, full_name: &str) -> anyhow::Result<String> {
        debug!(user_id = %user_id, full_name = %full_name, "chat directory provision stub");
        Ok(format!("chat-dev-{user_id}"))
    }
}
