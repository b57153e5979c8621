use super::{DriveClient, DriveItem};
use crate::pipeline::{FolderRecord, SLOTS_PER_DAY};
use crate::prelude::*;
use crate::Result;
use chrono::prelude::*;

const SCRIPT_FILE_NAME: &str = "script.txt";

/// Folder hierarchy of the upload schedule under the configured root
pub(crate) struct DriveTree {
    client: DriveClient,
}

/// Folders created for a single date
#[derive(Debug)]
pub(crate) struct DateTree {
    pub(crate) date_folder: DriveItem,
    pub(crate) records: Vec<FolderRecord>,
}

impl DriveTree {
    pub(crate) fn new(client: DriveClient) -> Self {
        Self { client }
    }

    /// Creates (or finds the existing) `<date>/<channel>/Video_<n>` folders.
    /// A failure for one channel is logged and the rest of the channels
    /// are still processed.
    #[instrument(skip_all, fields(%date))]
    pub(crate) async fn create_date_tree(&self, date: NaiveDate, channels: &[String]) -> Result<DateTree> {
        let root = self.client.root_folder_id().to_owned();
        let date_folder = self.client.get_or_create_folder(&root, &date_folder_name(date)).await?;

        let mut records = vec![FolderRecord {
            folder_date: date,
            folder_path: folder_path(date, None, None),
            folder_id: date_folder.id.clone(),
            parent_folder_id: Some(root),
            channel_name: None,
            video_number: None,
            web_view_link: date_folder.web_view_link.clone(),
        }];

        for channel in channels {
            match self.create_channel_tree(date, &date_folder, channel).await {
                Ok(channel_records) => records.extend(channel_records),
                Err(err) => warn!(
                    err = tracing_err(&err),
                    channel,
                    "Failed to create channel folders, skipping the channel"
                ),
            }
        }

        info!(folders = records.len(), "Date folder tree is ready");

        Ok(DateTree {
            date_folder,
            records,
        })
    }

    async fn create_channel_tree(
        &self,
        date: NaiveDate,
        date_folder: &DriveItem,
        channel: &str,
    ) -> Result<Vec<FolderRecord>> {
        let channel_folder = self.client.get_or_create_folder(&date_folder.id, channel).await?;

        let mut records = Vec::with_capacity(usize::from(SLOTS_PER_DAY) + 1);

        for slot in 1..=SLOTS_PER_DAY {
            let slot_folder = self
                .client
                .get_or_create_folder(&channel_folder.id, &slot_folder_name(slot))
                .await?;

            records.push(FolderRecord {
                folder_date: date,
                folder_path: folder_path(date, Some(channel), Some(slot)),
                folder_id: slot_folder.id,
                parent_folder_id: Some(channel_folder.id.clone()),
                channel_name: Some(channel.to_owned()),
                video_number: Some(slot),
                web_view_link: slot_folder.web_view_link,
            });
        }

        records.insert(
            0,
            FolderRecord {
                folder_date: date,
                folder_path: folder_path(date, Some(channel), None),
                folder_id: channel_folder.id,
                parent_folder_id: Some(date_folder.id.clone()),
                channel_name: Some(channel.to_owned()),
                video_number: None,
                web_view_link: channel_folder.web_view_link,
            },
        );

        Ok(records)
    }

    /// Stores the script as `script.txt` in the slot folder, creating
    /// the missing folders on the way.
    #[instrument(skip(self, text))]
    pub(crate) async fn upload_script(
        &self,
        date: NaiveDate,
        channel: &str,
        slot: u8,
        text: &str,
    ) -> Result<DriveItem> {
        let root = self.client.root_folder_id().to_owned();
        let date_folder = self.client.get_or_create_folder(&root, &date_folder_name(date)).await?;
        let channel_folder = self.client.get_or_create_folder(&date_folder.id, channel).await?;
        let slot_folder = self
            .client
            .get_or_create_folder(&channel_folder.id, &slot_folder_name(slot))
            .await?;

        self.client
            .put_text_file(&slot_folder.id, SCRIPT_FILE_NAME, text)
            .await
    }
}

fn date_folder_name(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn slot_folder_name(slot: u8) -> String {
    format!("Video_{slot}")
}

/// Path of the folder relative to the root, used only for display
/// and lookups in the database
fn folder_path(date: NaiveDate, channel: Option<&str>, slot: Option<u8>) -> String {
    let mut path = date_folder_name(date);

    if let Some(channel) = channel {
        path += &format!("/{channel}");
    }
    if let Some(slot) = slot {
        path += &format!("/{}", slot_folder_name(slot));
    }

    path
}
