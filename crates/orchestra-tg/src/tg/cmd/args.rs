//! Parsing of the free-form command arguments

use crate::error::UserError;
use crate::pipeline::{DriveFile, FieldStatus, NewChannel, SlotKey, SLOTS_PER_DAY};
use crate::{err, Result};
use chrono::prelude::*;

pub(crate) const ADD_CHANNEL_USAGE: &str = "/add_channel <name> [display name]";
pub(crate) const REMOVE_CHANNEL_USAGE: &str = "/remove_channel <name>";
pub(crate) const ACTIVATE_CHANNEL_USAGE: &str = "/activate_channel <name>";
pub(crate) const DAY_STATUS_USAGE: &str = "/day_status YYYY-MM-DD";
pub(crate) const MARK_COMPLETE_USAGE: &str = "/mark_complete <channel> <YYYY-MM-DD> <video>";
pub(crate) const SET_VIDEO_USAGE: &str =
    "/set_video <channel> <YYYY-MM-DD> <video> <processing|completed|failed> [drive link or error]";

/// Telegram limits callback data to 64 bytes and the channel button
/// carries `channel:<name>`
const MAX_CHANNEL_NAME_BYTES: usize = 64 - "channel:".len();

/// Statuses of a video that may be reported manually
const VIDEO_STATUSES: &str = "processing, completed, failed";

pub(crate) fn channel_name(args: &str, usage: &'static str) -> Result<String> {
    let mut words = args.split_whitespace();

    match (words.next(), words.next()) {
        (Some(name), None) => Ok(name.to_owned()),
        _ => Err(err!(UserError::Usage { usage })),
    }
}

pub(crate) fn new_channel(args: &str) -> Result<NewChannel> {
    let args = args.trim();

    let (name, display_name) = match args.split_once(char::is_whitespace) {
        Some((name, display_name)) => (name, display_name.trim()),
        None => (args, args),
    };

    if name.is_empty() {
        return Err(err!(UserError::Usage {
            usage: ADD_CHANNEL_USAGE
        }));
    }

    if name.len() > MAX_CHANNEL_NAME_BYTES {
        return Err(err!(UserError::ChannelNameTooLong {
            name: name.to_owned(),
            max: MAX_CHANNEL_NAME_BYTES,
        }));
    }

    Ok(NewChannel {
        name: name.to_owned(),
        display_name: display_name.to_owned(),
    })
}

pub(crate) fn date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        err!(UserError::InvalidDate {
            input: input.to_owned()
        })
    })
}

/// Argument of `/day_status`
pub(crate) fn day(args: &str) -> Result<NaiveDate> {
    if args.trim().is_empty() {
        return Err(err!(UserError::Usage {
            usage: DAY_STATUS_USAGE
        }));
    }
    date(args)
}

pub(crate) fn video_number(input: &str) -> Result<u8> {
    input
        .parse()
        .ok()
        .filter(|slot| (1..=SLOTS_PER_DAY).contains(slot))
        .ok_or_else(|| {
            err!(UserError::InvalidVideoNumber {
                input: input.to_owned(),
                max: SLOTS_PER_DAY,
            })
        })
}

/// `<channel> <YYYY-MM-DD> <video>` followed by the rest of the arguments
fn slot_key<'a>(args: &'a str, usage: &'static str) -> Result<(SlotKey, Vec<&'a str>)> {
    let words: Vec<_> = args.split_whitespace().collect();

    let [channel, date_input, slot, rest @ ..] = words.as_slice() else {
        return Err(err!(UserError::Usage { usage }));
    };

    let key = SlotKey {
        channel: (*channel).to_owned(),
        date: date(date_input)?,
        slot: video_number(slot)?,
    };

    Ok((key, rest.to_vec()))
}

pub(crate) fn mark_complete(args: &str) -> Result<SlotKey> {
    let (key, rest) = slot_key(args, MARK_COMPLETE_USAGE)?;

    if !rest.is_empty() {
        return Err(err!(UserError::Usage {
            usage: MARK_COMPLETE_USAGE
        }));
    }

    Ok(key)
}

/// Manual report of the downstream video production result
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VideoReport {
    pub(crate) key: SlotKey,
    pub(crate) status: FieldStatus,
    pub(crate) file: Option<DriveFile>,
    pub(crate) error: Option<String>,
}

pub(crate) fn set_video(args: &str) -> Result<VideoReport> {
    let (key, rest) = slot_key(args, SET_VIDEO_USAGE)?;

    let Some((status, details)) = rest.split_first() else {
        return Err(err!(UserError::Usage {
            usage: SET_VIDEO_USAGE
        }));
    };

    let details = (!details.is_empty()).then(|| details.join(" "));

    let status = match status.parse() {
        Ok(status @ (FieldStatus::Processing | FieldStatus::Completed | FieldStatus::Failed)) => {
            status
        }
        _ => {
            return Err(err!(UserError::InvalidVideoStatus {
                input: (*status).to_owned(),
                expected: VIDEO_STATUSES,
            }))
        }
    };

    let (file, error) = match (status, details) {
        (FieldStatus::Completed, Some(link)) => (Some(drive_file(&link)?), None),
        (FieldStatus::Failed, error) => (None, error),
        (FieldStatus::Processing, Some(_)) => {
            return Err(err!(UserError::Usage {
                usage: SET_VIDEO_USAGE
            }))
        }
        _ => (None, None),
    };

    Ok(VideoReport {
        key,
        status,
        file,
        error,
    })
}

/// Accepts links like `https://drive.google.com/file/d/<id>/view` and
/// `https://drive.google.com/open?id=<id>`
fn drive_file(link: &str) -> Result<DriveFile> {
    let invalid = || {
        err!(UserError::InvalidDriveLink {
            input: link.to_owned()
        })
    };

    let url = url::Url::parse(link).map_err(|_| invalid())?;

    let from_path = url.path_segments().and_then(|mut segments| {
        segments.find(|segment| *segment == "d")?;
        segments.next().filter(|id| !id.is_empty())
    });

    let id = from_path
        .map(ToOwned::to_owned)
        .or_else(|| {
            url.query_pairs()
                .find(|(key, _)| key == "id")
                .map(|(_, id)| id.into_owned())
        })
        .ok_or_else(invalid)?;

    Ok(DriveFile {
        id,
        url: link.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use assert_matches::assert_matches;

    fn user_error(err: crate::Error) -> String {
        assert_matches!(err.kind(), ErrorKind::User { .. });
        err.kind().to_string()
    }

    #[test]
    fn add_channel_arguments() {
        let channel = new_channel("GYH  Green Yoga Home ").unwrap();
        assert_eq!(channel.name, "GYH");
        assert_eq!(channel.display_name, "Green Yoga Home");

        let channel = new_channel("BI").unwrap();
        assert_eq!(channel.display_name, "BI");

        let longest = "C".repeat(MAX_CHANNEL_NAME_BYTES);
        let channel = new_channel(&longest).unwrap();
        let data = crate::tg::wizard::CallbackAction::Channel(channel.name).encode();
        assert_eq!(data.len(), 64);

        assert_eq!(
            user_error(new_channel(&format!("{longest}C")).unwrap_err()),
            format!("Channel name '{longest}C' is too long, the limit is 56 bytes")
        );

        assert_eq!(
            user_error(new_channel("  ").unwrap_err()),
            "Usage: /add_channel <name> [display name]"
        );
    }

    #[test]
    fn single_channel_name() {
        assert_eq!(channel_name(" GYH ", REMOVE_CHANNEL_USAGE).unwrap(), "GYH");
        assert!(channel_name("", REMOVE_CHANNEL_USAGE).is_err());
        assert!(channel_name("GYH BI", REMOVE_CHANNEL_USAGE).is_err());
    }

    #[test]
    fn mark_complete_arguments() {
        let key = mark_complete("GYH 2025-01-21 3").unwrap();
        assert_eq!(
            key,
            SlotKey {
                channel: "GYH".to_owned(),
                date: NaiveDate::from_ymd_opt(2025, 1, 21).unwrap(),
                slot: 3,
            }
        );

        assert_eq!(
            user_error(mark_complete("GYH 21-01-2025 3").unwrap_err()),
            "Invalid date '21-01-2025', expected format YYYY-MM-DD"
        );
        assert_eq!(
            user_error(mark_complete("GYH 2025-01-21 5").unwrap_err()),
            "Invalid video number '5', expected a number from 1 to 4"
        );
        assert_eq!(
            user_error(mark_complete("GYH 2025-01-21").unwrap_err()),
            "Usage: /mark_complete <channel> <YYYY-MM-DD> <video>"
        );
        assert!(mark_complete("GYH 2025-01-21 1 extra").is_err());
    }

    #[test]
    fn set_video_arguments() {
        let report = set_video("BI 2025-01-21 2 failed render crashed").unwrap();
        assert_eq!(report.status, FieldStatus::Failed);
        assert_eq!(report.error.as_deref(), Some("render crashed"));
        assert_eq!(report.file, None);

        let report = set_video(
            "BI 2025-01-21 2 completed https://drive.google.com/file/d/1AbC/view?usp=sharing",
        )
        .unwrap();
        assert_eq!(report.status, FieldStatus::Completed);
        assert_eq!(report.file.unwrap().id, "1AbC");

        let report = set_video("BI 2025-01-21 2 processing").unwrap();
        assert_eq!(report.status, FieldStatus::Processing);

        assert_eq!(
            user_error(set_video("BI 2025-01-21 2 processing almost done").unwrap_err()),
            format!("Usage: {SET_VIDEO_USAGE}")
        );

        assert_eq!(
            user_error(set_video("BI 2025-01-21 2 received").unwrap_err()),
            "Invalid video status 'received', expected one of: processing, completed, failed"
        );
        assert!(set_video("BI 2025-01-21 2").is_err());
    }

    #[test]
    fn day_status_argument() {
        assert_eq!(
            day(" 2025-01-21 ").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 21).unwrap()
        );
        assert_eq!(
            user_error(day("").unwrap_err()),
            "Usage: /day_status YYYY-MM-DD"
        );
    }

    #[test]
    fn drive_links() {
        assert_eq!(
            drive_file("https://drive.google.com/open?id=XyZ").unwrap().id,
            "XyZ"
        );
        assert!(drive_file("https://drive.google.com/drive/my-drive").is_err());
        assert!(drive_file("not a link").is_err());
    }
}
