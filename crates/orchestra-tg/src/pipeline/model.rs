use crate::prelude::*;
use chrono::prelude::*;

/// Number of video slots every channel has per day
pub(crate) const SLOTS_PER_DAY: u8 = 4;

/// Length of the rolling schedule window in days, starting today
pub(crate) const WINDOW_DAYS: u64 = 7;

/// Status of a single field of an upload slot.
/// Stored in the database as lowercase text.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum FieldStatus {
    Pending,
    Received,
    Processed,
    Processing,
    Completed,
    Failed,
}

impl FieldStatus {
    pub(crate) fn is_pending(self) -> bool {
        self == Self::Pending
    }

    pub(crate) fn is_ready_script(self) -> bool {
        matches!(self, Self::Received | Self::Processed)
    }

    pub(crate) fn is_ready_thumbnail(self) -> bool {
        self == Self::Received
    }

    pub(crate) fn is_completed(self) -> bool {
        self == Self::Completed
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct Channel {
    pub(crate) id: i32,
    pub(crate) channel_name: String,
    pub(crate) channel_display_name: String,
    pub(crate) is_active: bool,
    pub(crate) daily_video_target: i32,
    pub(crate) reference_audio_id: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct NewChannel {
    pub(crate) name: String,
    pub(crate) display_name: String,
}

/// Natural key of an upload slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SlotKey {
    pub(crate) channel: String,
    pub(crate) date: NaiveDate,
    pub(crate) slot: u8,
}

/// Status fields of one slot joined with its channel name
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SlotRow {
    pub(crate) channel: String,
    pub(crate) slot: u8,
    pub(crate) script: FieldStatus,
    pub(crate) thumbnail: FieldStatus,
    pub(crate) video: FieldStatus,
    pub(crate) audio: FieldStatus,
}

/// Partial update of an upload slot. Only the fields that are `Some`
/// (or `true` for the timestamp flags) are written, `updated_at` is
/// bumped unconditionally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SlotPatch {
    pub(crate) script_status: Option<FieldStatus>,
    pub(crate) thumbnail_status: Option<FieldStatus>,
    pub(crate) video_status: Option<FieldStatus>,
    pub(crate) audio_status: Option<FieldStatus>,
    pub(crate) script_text: Option<String>,
    pub(crate) thumbnail_file_id: Option<String>,
    pub(crate) thumbnail_url: Option<String>,
    pub(crate) video_gdrive_id: Option<String>,
    pub(crate) video_gdrive_url: Option<String>,

    /// `Some(None)` clears the message left by an earlier failure
    pub(crate) error_message: Option<Option<String>>,

    /// Sets `script_received_at` to the current time
    pub(crate) touch_script_received_at: bool,

    /// Sets `processing_completed_at` to the current time
    pub(crate) touch_processing_completed_at: bool,
}

impl SlotPatch {
    pub(crate) fn script(text: impl Into<String>) -> Self {
        Self {
            script_status: Some(FieldStatus::Received),
            script_text: Some(text.into()),
            touch_script_received_at: true,
            ..Default::default()
        }
    }

    pub(crate) fn thumbnail(file_id: impl Into<String>, url: Option<String>) -> Self {
        Self {
            thumbnail_status: Some(FieldStatus::Received),
            thumbnail_file_id: Some(file_id.into()),
            thumbnail_url: url,
            ..Default::default()
        }
    }

    pub(crate) fn video(status: FieldStatus, gdrive: Option<DriveFile>, error: Option<String>) -> Self {
        let (video_gdrive_id, video_gdrive_url) = gdrive
            .map(|file| (Some(file.id), Some(file.url)))
            .unwrap_or_default();

        Self {
            video_status: Some(status),
            video_gdrive_id,
            video_gdrive_url,
            error_message: Some(error),
            touch_processing_completed_at: status.is_completed(),
            ..Default::default()
        }
    }

    /// Administrative override that marks every field of the slot as done
    /// regardless of its current state.
    pub(crate) fn force_complete() -> Self {
        Self {
            script_status: Some(FieldStatus::Processed),
            thumbnail_status: Some(FieldStatus::Received),
            video_status: Some(FieldStatus::Completed),
            audio_status: Some(FieldStatus::Completed),
            error_message: Some(None),
            touch_processing_completed_at: true,
            ..Default::default()
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Reference to a file stored in Google Drive
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DriveFile {
    pub(crate) id: String,
    pub(crate) url: String,
}

/// Content submitted to the bot that has to be routed to an upload slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Content {
    Script { text: String },
    Thumbnail { file_id: String, url: Option<String> },
}

impl Content {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Script { .. } => "script",
            Self::Thumbnail { .. } => "thumbnail",
        }
    }

    pub(crate) fn to_patch(&self) -> SlotPatch {
        match self {
            Self::Script { text } => SlotPatch::script(text.clone()),
            Self::Thumbnail { file_id, url } => SlotPatch::thumbnail(file_id.clone(), url.clone()),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum ReminderKind {
    TomorrowIncomplete,
    TodayReady,
}

/// Last reminder sent for a given date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReminderMarker {
    pub(crate) kind: ReminderKind,
    pub(crate) sent_at: DateTime<Utc>,
}

/// Google Drive folder mirrored into the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FolderRecord {
    pub(crate) folder_date: NaiveDate,
    pub(crate) folder_path: String,
    pub(crate) folder_id: String,
    pub(crate) parent_folder_id: Option<String>,
    pub(crate) channel_name: Option<String>,
    pub(crate) video_number: Option<u8>,
    pub(crate) web_view_link: Option<String>,
}

/// All dates of the rolling schedule window that starts at `today`
pub(crate) fn window_dates(today: NaiveDate) -> Vec<NaiveDate> {
    today.days_from(WINDOW_DAYS)
}
