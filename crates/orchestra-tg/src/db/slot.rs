use super::metered;
use crate::pipeline::{FieldStatus, SlotPatch, SlotRow};
use crate::prelude::*;
use crate::Result;
use chrono::prelude::*;
use sea_query::{Expr, Iden, PostgresQueryBuilder, Query, UpdateStatement};
use sea_query_binder::SqlxBinder;

#[derive(Iden)]
enum DailyUploads {
    Table,
    ChannelId,
    UploadDate,
    VideoNumber,
    ScriptStatus,
    ThumbnailStatus,
    VideoStatus,
    AudioStatus,
    ScriptText,
    ThumbnailFileId,
    ThumbnailUrl,
    VideoGdriveId,
    VideoGdriveUrl,
    ErrorMessage,
    ScriptReceivedAt,
    ProcessingCompletedAt,
    UpdatedAt,
}

#[derive(sqlx::FromRow)]
struct SlotRecord {
    channel_name: String,
    video_number: i16,
    script_status: String,
    thumbnail_status: String,
    video_status: String,
    audio_status: String,
}

impl SlotRecord {
    fn into_row(self) -> Result<SlotRow> {
        let parse = |column: &str, value: &str| {
            value
                .parse::<FieldStatus>()
                .fatal_ctx(|| format!("Unknown {column} value in the database: {value}"))
        };

        Ok(SlotRow {
            slot: u8::try_from(self.video_number)
                .fatal_ctx(|| format!("Invalid video number: {}", self.video_number))?,
            script: parse("script_status", &self.script_status)?,
            thumbnail: parse("thumbnail_status", &self.thumbnail_status)?,
            video: parse("video_status", &self.video_status)?,
            audio: parse("audio_status", &self.audio_status)?,
            channel: self.channel_name,
        })
    }
}

pub(crate) struct SlotRepo {
    db: sqlx::PgPool,
}

impl SlotRepo {
    pub(crate) fn new(db: sqlx::PgPool) -> Self {
        Self { db }
    }

    /// Creates the slot with all fields pending. An existing slot is
    /// left untouched.
    pub(crate) async fn ensure(&self, channel_id: i32, date: NaiveDate, slot: u8) -> Result {
        metered("ensure_slot", async {
            sqlx::query(
                "insert into daily_uploads (channel_id, upload_date, video_number)
                values ($1, $2, $3)
                on conflict (channel_id, upload_date, video_number) do nothing",
            )
            .bind(channel_id)
            .bind(date)
            .bind(i16::from(slot))
            .execute(&self.db)
            .await?;
            Ok(())
        })
        .await
    }

    /// Returns `false` if there is no such slot
    pub(crate) async fn update(
        &self,
        channel_id: i32,
        date: NaiveDate,
        slot: u8,
        patch: &SlotPatch,
    ) -> Result<bool> {
        let (sql, values) = update_statement(channel_id, date, slot, patch)
            .build_sqlx(PostgresQueryBuilder);

        let updated = metered("update_slot", async {
            Ok(sqlx::query_with(&sql, values)
                .execute(&self.db)
                .await?
                .rows_affected())
        })
        .await?;

        Ok(updated > 0)
    }

    /// Slots of all active channels for the date ordered by channel name
    /// and slot number
    pub(crate) async fn rows_for_date(&self, date: NaiveDate) -> Result<Vec<SlotRow>> {
        let records: Vec<SlotRecord> = metered("slot_rows_for_date", async {
            Ok(sqlx::query_as(
                "select
                    channels.channel_name,
                    daily_uploads.video_number,
                    daily_uploads.script_status,
                    daily_uploads.thumbnail_status,
                    daily_uploads.video_status,
                    daily_uploads.audio_status
                from daily_uploads
                join channels on channels.id = daily_uploads.channel_id
                where daily_uploads.upload_date = $1 and channels.is_active
                order by channels.channel_name, daily_uploads.video_number",
            )
            .bind(date)
            .fetch_all(&self.db)
            .await?)
        })
        .await?;

        records.into_iter().map(SlotRecord::into_row).collect()
    }

    /// Creates all slots of every active channel for the date.
    /// Returns the number of newly created slots.
    pub(crate) async fn create_day_skeleton(&self, date: NaiveDate) -> Result<i32> {
        metered("create_day_skeleton", async {
            Ok(sqlx::query_scalar("select create_daily_uploads_skeleton($1)")
                .bind(date)
                .fetch_one(&self.db)
                .await?)
        })
        .await
    }
}

fn update_statement(channel_id: i32, date: NaiveDate, slot: u8, patch: &SlotPatch) -> UpdateStatement {
    let mut update = Query::update();
    update.table(DailyUploads::Table);

    let statuses = [
        (DailyUploads::ScriptStatus, patch.script_status),
        (DailyUploads::ThumbnailStatus, patch.thumbnail_status),
        (DailyUploads::VideoStatus, patch.video_status),
        (DailyUploads::AudioStatus, patch.audio_status),
    ];

    for (column, status) in statuses {
        if let Some(status) = status {
            update.value(column, status.to_string());
        }
    }

    let texts = [
        (DailyUploads::ScriptText, &patch.script_text),
        (DailyUploads::ThumbnailFileId, &patch.thumbnail_file_id),
        (DailyUploads::ThumbnailUrl, &patch.thumbnail_url),
        (DailyUploads::VideoGdriveId, &patch.video_gdrive_id),
        (DailyUploads::VideoGdriveUrl, &patch.video_gdrive_url),
    ];

    for (column, text) in texts {
        if let Some(text) = text {
            update.value(column, text.clone());
        }
    }

    if let Some(error_message) = &patch.error_message {
        update.value(DailyUploads::ErrorMessage, error_message.clone());
    }

    if patch.touch_script_received_at {
        update.value(DailyUploads::ScriptReceivedAt, Expr::current_timestamp());
    }

    if patch.touch_processing_completed_at {
        update.value(DailyUploads::ProcessingCompletedAt, Expr::current_timestamp());
    }

    update
        .value(DailyUploads::UpdatedAt, Expr::current_timestamp())
        .and_where(Expr::col(DailyUploads::ChannelId).eq(channel_id))
        .and_where(Expr::col(DailyUploads::UploadDate).eq(date))
        .and_where(Expr::col(DailyUploads::VideoNumber).eq(i16::from(slot)));

    update
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::QueryStatementWriter;

    fn sql(patch: &SlotPatch) -> String {
        let date = NaiveDate::from_ymd_opt(2025, 1, 21).unwrap();
        update_statement(3, date, 2, patch).to_string(PostgresQueryBuilder)
    }

    #[test]
    fn update_writes_only_present_fields() {
        let sql = sql(&SlotPatch::script("Once upon a time"));

        assert!(sql.starts_with(r#"UPDATE "daily_uploads" SET "#), "{sql}");
        assert!(sql.contains(r#""script_status" = 'received'"#), "{sql}");
        assert!(sql.contains(r#""script_text" = 'Once upon a time'"#), "{sql}");
        assert!(sql.contains(r#""script_received_at" = CURRENT_TIMESTAMP"#), "{sql}");
        assert!(sql.contains(r#""updated_at" = CURRENT_TIMESTAMP"#), "{sql}");

        for untouched in [
            "thumbnail_status",
            "video_status",
            "audio_status",
            "thumbnail_file_id",
            "processing_completed_at",
            "error_message",
        ] {
            assert!(!sql.contains(untouched), "{untouched} in {sql}");
        }
    }

    #[test]
    fn update_targets_natural_key() {
        let sql = sql(&SlotPatch::force_complete());

        assert!(sql.contains(r#""channel_id" = 3"#), "{sql}");
        assert!(sql.contains(r#""upload_date" = '2025-01-21'"#), "{sql}");
        assert!(sql.contains(r#""video_number" = 2"#), "{sql}");
        assert!(sql.contains(r#""video_status" = 'completed'"#), "{sql}");
        assert!(sql.contains(r#""audio_status" = 'completed'"#), "{sql}");
        assert!(sql.contains(r#""script_status" = 'processed'"#), "{sql}");
        assert!(sql.contains(r#""processing_completed_at" = CURRENT_TIMESTAMP"#), "{sql}");
        assert!(!sql.contains("script_text"), "{sql}");
    }

    #[test]
    fn later_report_clears_the_failure_message() {
        let sql = sql(&SlotPatch::video(FieldStatus::Completed, None, None));
        assert!(sql.contains(r#""error_message" = NULL"#), "{sql}");

        let sql = self::sql(&SlotPatch::video(
            FieldStatus::Failed,
            None,
            Some("render crashed".to_owned()),
        ));
        assert!(sql.contains(r#""error_message" = 'render crashed'"#), "{sql}");
    }
}
