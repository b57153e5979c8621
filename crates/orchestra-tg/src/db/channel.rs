use super::metered;
use crate::error::{err, UserError};
use crate::pipeline::{Channel, NewChannel};
use crate::prelude::*;
use crate::Result;

const CHANNEL_COLUMNS: &str = "id, channel_name, channel_display_name, is_active, \
    daily_video_target, reference_audio_id";

pub(crate) struct ChannelRepo {
    db: sqlx::PgPool,
}

impl ChannelRepo {
    pub(crate) fn new(db: sqlx::PgPool) -> Self {
        Self { db }
    }

    /// Fails with a user error if a channel with the same name already exists
    pub(crate) async fn add(&self, channel: NewChannel) -> Result<Channel> {
        let query = format!(
            "insert into channels (channel_name, channel_display_name)
            values ($1, $2)
            on conflict (channel_name) do nothing
            returning {CHANNEL_COLUMNS}"
        );

        let inserted: Option<Channel> = metered("add_channel", async {
            Ok(sqlx::query_as(&query)
                .bind(&channel.name)
                .bind(&channel.display_name)
                .fetch_optional(&self.db)
                .await?)
        })
        .await?;

        inserted.ok_or_else(|| {
            err!(UserError::ChannelAlreadyExists { name: channel.name })
        })
    }

    pub(crate) async fn list(&self, active_only: bool) -> Result<Vec<Channel>> {
        let query = format!(
            "select {CHANNEL_COLUMNS} from channels
            where is_active or not $1
            order by channel_name"
        );

        metered("list_channels", async {
            Ok(sqlx::query_as(&query)
                .bind(active_only)
                .fetch_all(&self.db)
                .await?)
        })
        .await
    }

    pub(crate) async fn find(&self, name: &str) -> Result<Option<Channel>> {
        let query = format!("select {CHANNEL_COLUMNS} from channels where channel_name = $1");

        metered("find_channel", async {
            Ok(sqlx::query_as(&query)
                .bind(name)
                .fetch_optional(&self.db)
                .await?)
        })
        .await
    }

    /// Same as [`Self::find`], but a missing channel is a user error
    pub(crate) async fn get(&self, name: &str) -> Result<Channel> {
        self.find(name).await?.ok_or_else(|| {
            err!(UserError::ChannelNotFound {
                name: name.to_owned()
            })
        })
    }

    /// Channels are never deleted, only deactivated
    pub(crate) async fn set_active(&self, name: &str, is_active: bool) -> Result {
        let updated = metered("set_channel_active", async {
            Ok(sqlx::query(
                "update channels set is_active = $2, updated_at = now()
                where channel_name = $1",
            )
            .bind(name)
            .bind(is_active)
            .execute(&self.db)
            .await?
            .rows_affected())
        })
        .await?;

        if updated == 0 {
            return Err(err!(UserError::ChannelNotFound {
                name: name.to_owned()
            }));
        }

        info!(channel = name, is_active, "Changed channel activity");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;
    use itertools::Itertools;

    #[test]
    fn selects_only_columns_the_channel_maps() {
        let columns = CHANNEL_COLUMNS.split(',').map(str::trim).join("\n");
        expect![[r#"
            id
            channel_name
            channel_display_name
            is_active
            daily_video_target
            reference_audio_id"#]]
        .assert_eq(&columns);
    }
}
