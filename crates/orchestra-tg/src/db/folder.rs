use super::metered;
use crate::pipeline::FolderRecord;
use crate::prelude::*;
use crate::Result;
use chrono::prelude::*;

pub(crate) struct FolderRepo {
    db: sqlx::PgPool,
}

impl FolderRepo {
    pub(crate) fn new(db: sqlx::PgPool) -> Self {
        Self { db }
    }

    /// Folders are identified by their Google Drive id. Recreating a known
    /// folder revives its record.
    pub(crate) async fn upsert(&self, folder: &FolderRecord) -> Result {
        metered("upsert_folder", async {
            sqlx::query(
                "insert into gdrive_folders (
                    folder_date, folder_path, folder_id, parent_folder_id,
                    channel_name, video_number, web_view_link
                )
                values ($1, $2, $3, $4, $5, $6, $7)
                on conflict (folder_id) do update
                set folder_path = excluded.folder_path,
                    web_view_link = excluded.web_view_link,
                    is_active = true,
                    archived_at = null",
            )
            .bind(folder.folder_date)
            .bind(&folder.folder_path)
            .bind(&folder.folder_id)
            .bind(&folder.parent_folder_id)
            .bind(&folder.channel_name)
            .bind(folder.video_number.map(i16::from))
            .bind(&folder.web_view_link)
            .execute(&self.db)
            .await?;
            Ok(())
        })
        .await
    }

    /// Link to the date level folder, if it was created
    pub(crate) async fn date_folder_link(&self, date: NaiveDate) -> Result<Option<String>> {
        let link: Option<Option<String>> = metered("date_folder_link", async {
            Ok(sqlx::query_scalar(
                "select web_view_link from gdrive_folders
                where folder_date = $1
                    and channel_name is null
                    and video_number is null
                    and is_active
                order by created_at desc
                limit 1",
            )
            .bind(date)
            .fetch_optional(&self.db)
            .await?)
        })
        .await?;

        Ok(link.flatten())
    }

    /// Soft-deletes the records of folders for dates before `cutoff`.
    /// Returns the number of archived records.
    pub(crate) async fn archive_before(&self, cutoff: NaiveDate) -> Result<u64> {
        let archived = metered("archive_folders", async {
            Ok(sqlx::query(
                "update gdrive_folders
                set is_active = false, archived_at = now()
                where folder_date < $1 and is_active",
            )
            .bind(cutoff)
            .execute(&self.db)
            .await?
            .rows_affected())
        })
        .await?;

        info!(%cutoff, archived, "Archived old folder records");

        Ok(archived)
    }
}
