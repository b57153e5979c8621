use super::metered;
use crate::Result;
use teloxide::types::ChatId;

/// Chats that subscribed to reminder broadcasts at runtime
pub(crate) struct ChatRepo {
    db: sqlx::PgPool,
}

impl ChatRepo {
    pub(crate) fn new(db: sqlx::PgPool) -> Self {
        Self { db }
    }

    /// Returns `false` if the chat was already subscribed
    pub(crate) async fn subscribe(&self, chat: ChatId) -> Result<bool> {
        metered("subscribe_chat", async {
            Ok(sqlx::query(
                "insert into chat_destinations (chat_id) values ($1)
                on conflict (chat_id) do nothing",
            )
            .bind(chat.0)
            .execute(&self.db)
            .await?
            .rows_affected()
                > 0)
        })
        .await
    }

    /// Returns `false` if the chat wasn't subscribed
    pub(crate) async fn unsubscribe(&self, chat: ChatId) -> Result<bool> {
        metered("unsubscribe_chat", async {
            Ok(sqlx::query("delete from chat_destinations where chat_id = $1")
                .bind(chat.0)
                .execute(&self.db)
                .await?
                .rows_affected()
                > 0)
        })
        .await
    }

    pub(crate) async fn list(&self) -> Result<Vec<ChatId>> {
        let ids: Vec<i64> = metered("list_chats", async {
            Ok(sqlx::query_scalar("select chat_id from chat_destinations order by subscribed_at")
                .fetch_all(&self.db)
                .await?)
        })
        .await?;

        Ok(ids.into_iter().map(ChatId).collect())
    }
}
