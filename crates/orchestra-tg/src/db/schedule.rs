use super::metered;
use crate::pipeline::reminder::ReminderEntry;
use crate::pipeline::{ReminderKind, ReminderMarker};
use crate::prelude::*;
use crate::Result;
use chrono::prelude::*;

#[derive(sqlx::FromRow)]
struct MarkerRecord {
    reminder_type: Option<String>,
    last_reminder_sent_at: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow)]
pub(crate) struct Schedule {
    pub(crate) deadline_time: NaiveTime,
    pub(crate) gdrive_folder_link: Option<String>,
}

pub(crate) struct ScheduleRepo {
    db: sqlx::PgPool,
}

impl ScheduleRepo {
    pub(crate) fn new(db: sqlx::PgPool) -> Self {
        Self { db }
    }

    pub(crate) async fn get(&self, date: NaiveDate) -> Result<Option<Schedule>> {
        metered("get_schedule", async {
            Ok(sqlx::query_as(
                "select deadline_time, gdrive_folder_link from upload_schedules
                where schedule_date = $1",
            )
            .bind(date)
            .fetch_optional(&self.db)
            .await?)
        })
        .await
    }

    pub(crate) async fn set_folder_link(&self, date: NaiveDate, link: &str) -> Result {
        metered("set_schedule_folder_link", async {
            sqlx::query(
                "insert into upload_schedules (schedule_date, gdrive_folder_link)
                values ($1, $2)
                on conflict (schedule_date) do update
                set gdrive_folder_link = excluded.gdrive_folder_link, updated_at = now()",
            )
            .bind(date)
            .bind(link)
            .execute(&self.db)
            .await?;
            Ok(())
        })
        .await
    }

    /// The last reminder sent about the given date, if any
    pub(crate) async fn marker(&self, date: NaiveDate) -> Result<Option<ReminderMarker>> {
        let record: Option<MarkerRecord> = metered("get_reminder_marker", async {
            Ok(sqlx::query_as(
                "select reminder_type, last_reminder_sent_at from upload_schedules
                where schedule_date = $1",
            )
            .bind(date)
            .fetch_optional(&self.db)
            .await?)
        })
        .await?;

        let Some(MarkerRecord {
            reminder_type: Some(kind),
            last_reminder_sent_at: Some(sent_at),
        }) = record
        else {
            return Ok(None);
        };

        let kind = kind
            .parse::<ReminderKind>()
            .fatal_ctx(|| format!("Unknown reminder type in the database: {kind}"))?;

        Ok(Some(ReminderMarker { kind, sent_at }))
    }

    /// Appends the reminder to the log and moves the date's marker.
    /// These are two separate statements, not a transaction.
    pub(crate) async fn record_reminder(&self, entry: &ReminderEntry) -> Result {
        let kind: &'static str = entry.kind.into();
        let incomplete_count = i32::try_from(entry.incomplete_count)
            .fatal_ctx(|| format!("Too many incomplete items: {}", entry.incomplete_count))?;

        metered("insert_reminder_log", async {
            sqlx::query(
                "insert into reminder_logs
                (reminder_type, target_date, message_text, incomplete_count, channels_notified)
                values ($1, $2, $3, $4, $5)",
            )
            .bind(kind)
            .bind(entry.date)
            .bind(&entry.text)
            .bind(incomplete_count)
            .bind(&entry.channels)
            .execute(&self.db)
            .await?;
            Ok(())
        })
        .await?;

        metered("upsert_reminder_marker", async {
            sqlx::query(
                "insert into upload_schedules (schedule_date, reminder_type, last_reminder_sent_at)
                values ($1, $2, now())
                on conflict (schedule_date) do update
                set reminder_type = excluded.reminder_type,
                    last_reminder_sent_at = excluded.last_reminder_sent_at,
                    updated_at = now()",
            )
            .bind(entry.date)
            .bind(kind)
            .execute(&self.db)
            .await?;
            Ok(())
        })
        .await?;

        info!(kind, date = %entry.date, "Recorded sent reminder");

        Ok(())
    }
}
