use chrono::prelude::*;
use serde::Deserialize;
use serde_with::serde_as;
use teloxide::types::ChatId;

#[serde_as]
#[derive(Deserialize)]
pub(crate) struct Config {
    pub(crate) token: String,

    /// Chats that receive scheduled reminders in addition to the ones
    /// subscribed via `/subscribe`. JSON array of chat ids.
    #[serde_as(as = "serde_with::json::JsonString")]
    #[serde(default)]
    pub(crate) reminder_chats: Vec<ChatId>,

    /// Time zone the schedule dates and cron triggers are evaluated in
    #[serde(default = "default_timezone")]
    pub(crate) timezone: chrono_tz::Tz,

    /// Local time of the upload deadline on the scheduled date
    #[serde(default = "default_upload_deadline")]
    pub(crate) upload_deadline: NaiveTime,
}

impl Config {
    pub(crate) fn now(&self) -> DateTime<chrono_tz::Tz> {
        Utc::now().with_timezone(&self.timezone)
    }

    pub(crate) fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

fn default_timezone() -> chrono_tz::Tz {
    chrono_tz::Asia::Kolkata
}

fn default_upload_deadline() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default()
}

#[derive(Deserialize)]
pub(crate) struct ArchiveConfig {
    /// Folder records for dates older than this many days are archived
    #[serde(default = "default_folder_age_days")]
    pub(crate) folder_age_days: u32,
}

fn default_folder_age_days() -> u32 {
    1
}
