//! Decides whether a time-based reminder should fire and renders it.

use super::model::{ReminderKind, ReminderMarker};
use super::status::{self, DayStatus, IncompleteSlot, Outstanding};
use crate::prelude::*;
use chrono::prelude::*;
use chrono::Duration;
use itertools::Itertools;

/// Minimum time between two reminders about tomorrow's incomplete slots
pub(crate) fn tomorrow_incomplete_window() -> Duration {
    Duration::minutes(30)
}

/// Minimum time between two "today is ready" reminders
pub(crate) fn today_ready_window() -> Duration {
    Duration::hours(3)
}

/// Any marker for tomorrow throttles the reminder, not only the
/// tomorrow-incomplete one.
pub(crate) fn should_send_tomorrow_incomplete(
    incomplete: &[IncompleteSlot],
    marker: Option<ReminderMarker>,
    now: DateTime<Utc>,
) -> bool {
    if incomplete.is_empty() {
        return false;
    }

    marker.map_or(true, |marker| {
        now - marker.sent_at >= tomorrow_incomplete_window()
    })
}

pub(crate) fn should_send_today_ready(
    status: &DayStatus,
    marker: Option<ReminderMarker>,
    now: DateTime<Utc>,
) -> bool {
    if !status.is_fully_complete() {
        return false;
    }

    match marker {
        Some(marker) if marker.kind == ReminderKind::TodayReady => {
            now - marker.sent_at >= today_ready_window()
        }
        _ => true,
    }
}

/// Reminder that was decided to be sent, together with the data
/// that goes into the reminder log
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReminderEntry {
    pub(crate) kind: ReminderKind,
    pub(crate) date: NaiveDate,
    pub(crate) text: String,
    pub(crate) incomplete_count: usize,
    pub(crate) channels: Vec<String>,
}

impl ReminderEntry {
    pub(crate) fn tomorrow_incomplete(date: NaiveDate, incomplete: &[IncompleteSlot]) -> Self {
        Self {
            kind: ReminderKind::TomorrowIncomplete,
            date,
            text: format_tomorrow_incomplete(date, incomplete),
            incomplete_count: incomplete.len(),
            channels: incomplete
                .iter()
                .map(|slot| slot.channel.clone())
                .sorted()
                .dedup()
                .collect(),
        }
    }

    pub(crate) fn today_ready(
        status: &DayStatus,
        folder_link: Option<&str>,
        deadline: NaiveTime,
    ) -> Self {
        Self {
            kind: ReminderKind::TodayReady,
            date: status.date,
            text: format_today_ready(status, folder_link, deadline),
            incomplete_count: 0,
            channels: vec![],
        }
    }
}

fn check_mark(done: bool) -> &'static str {
    if done {
        "✅"
    } else {
        "❌"
    }
}

pub(crate) fn format_tomorrow_incomplete(date: NaiveDate, incomplete: &[IncompleteSlot]) -> String {
    let mut lines = vec![
        format!("⚠️ TOMORROW ({}) UPLOAD - INCOMPLETE\n", date.short_label()),
        format!("Missing Items ({} total):\n", incomplete.len()),
    ];

    let by_channel = incomplete
        .iter()
        .into_group_map_by(|slot| slot.channel.as_str());

    for (channel, slots) in by_channel.into_iter().sorted_by_key(|(channel, _)| *channel) {
        lines.push(format!("• {channel}:"));

        lines.extend(slots.into_iter().map(|slot| {
            format!(
                "  Video {}: Script {} | Thumbnail {} | Video {}",
                slot.slot,
                check_mark(!slot.is_missing(Outstanding::Script)),
                check_mark(!slot.is_missing(Outstanding::Thumbnail)),
                check_mark(!slot.is_missing(Outstanding::Video)),
            )
        }));
    }

    lines.push("\nUse /mark_complete to update status".to_owned());

    lines.join("\n")
}

pub(crate) fn format_today_ready(
    status: &DayStatus,
    folder_link: Option<&str>,
    deadline: NaiveTime,
) -> String {
    let mut lines = vec![
        format!(
            "✅ TODAY ({}) - READY FOR UPLOAD\n",
            status.date.short_label()
        ),
        format!("All {} videos completed!\n", status.total),
    ];

    if let Some(link) = folder_link {
        lines.push(format!("📁 GDrive: {link}\n"));
    }

    lines.push(format!("⏰ Upload by: {}", status::format_deadline(deadline)));
    lines.push(format!(
        "\nCompletion: {}/{} ({:.1}%)",
        status.completed, status.total, status.percentage
    ));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::model::FieldStatus::*;
    use crate::pipeline::model::SlotRow;
    use expect_test::expect;

    fn date(input: &str) -> NaiveDate {
        input.parse().unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 20, 12, 0, 0).unwrap()
    }

    fn marker(kind: ReminderKind, ago: Duration) -> Option<ReminderMarker> {
        Some(ReminderMarker {
            kind,
            sent_at: now() - ago,
        })
    }

    fn incomplete() -> Vec<IncompleteSlot> {
        vec![
            IncompleteSlot {
                channel: "GYH".to_owned(),
                slot: 2,
                missing: vec![Outstanding::Thumbnail, Outstanding::Video],
            },
            IncompleteSlot {
                channel: "BI".to_owned(),
                slot: 1,
                missing: vec![Outstanding::Script, Outstanding::Video],
            },
            IncompleteSlot {
                channel: "BI".to_owned(),
                slot: 3,
                missing: vec![Outstanding::Video],
            },
        ]
    }

    fn complete_day() -> DayStatus {
        let rows: Vec<_> = (1..=4)
            .map(|slot| SlotRow {
                channel: "GYH".to_owned(),
                slot,
                script: Processed,
                thumbnail: Received,
                video: Completed,
                audio: Completed,
            })
            .collect();

        DayStatus::from_rows(date("2025-01-20"), &rows)
    }

    #[test]
    fn tomorrow_incomplete_throttle() {
        let epsilon = Duration::seconds(1);
        let window = tomorrow_incomplete_window();
        let items = incomplete();
        let kind = ReminderKind::TomorrowIncomplete;

        assert!(should_send_tomorrow_incomplete(&items, None, now()));
        assert!(!should_send_tomorrow_incomplete(
            &items,
            marker(kind, window - epsilon),
            now()
        ));
        assert!(should_send_tomorrow_incomplete(
            &items,
            marker(kind, window + epsilon),
            now()
        ));

        // Another kind of marker throttles the same way
        assert!(!should_send_tomorrow_incomplete(
            &items,
            marker(ReminderKind::TodayReady, window - epsilon),
            now()
        ));

        assert!(!should_send_tomorrow_incomplete(&[], None, now()));
    }

    #[test]
    fn today_ready_throttle() {
        let epsilon = Duration::seconds(1);
        let window = today_ready_window();
        let status = complete_day();
        let kind = ReminderKind::TodayReady;

        assert!(should_send_today_ready(&status, None, now()));
        assert!(!should_send_today_ready(
            &status,
            marker(kind, window - epsilon),
            now()
        ));
        assert!(should_send_today_ready(
            &status,
            marker(kind, window + epsilon),
            now()
        ));

        // A fresh marker of a different kind doesn't throttle
        assert!(should_send_today_ready(
            &status,
            marker(ReminderKind::TomorrowIncomplete, Duration::minutes(1)),
            now()
        ));
    }

    #[test]
    fn today_ready_requires_all_videos() {
        let mut rows: Vec<_> = (1..=4)
            .map(|slot| SlotRow {
                channel: "GYH".to_owned(),
                slot,
                script: Processed,
                thumbnail: Received,
                video: Completed,
                audio: Completed,
            })
            .collect();
        rows[3].video = Processing;

        let status = DayStatus::from_rows(date("2025-01-20"), &rows);
        assert!(!should_send_today_ready(&status, None, now()));

        let empty = DayStatus::from_rows(date("2025-01-20"), &[]);
        assert!(!should_send_today_ready(&empty, None, now()));
    }

    #[test]
    fn tomorrow_incomplete_entry() {
        let entry = ReminderEntry::tomorrow_incomplete(date("2025-01-21"), &incomplete());

        assert_eq!(entry.incomplete_count, 3);
        assert_eq!(entry.channels, ["BI", "GYH"]);

        expect![[r#"
            ⚠️ TOMORROW (21-Jan) UPLOAD - INCOMPLETE

            Missing Items (3 total):

            • BI:
              Video 1: Script ❌ | Thumbnail ✅ | Video ❌
              Video 3: Script ✅ | Thumbnail ✅ | Video ❌
            • GYH:
              Video 2: Script ✅ | Thumbnail ❌ | Video ❌

            Use /mark_complete to update status"#]]
        .assert_eq(&entry.text);
    }

    #[test]
    fn today_ready_entry() {
        let deadline = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let link = "https://drive.google.com/drive/folders/abc";
        let entry = ReminderEntry::today_ready(&complete_day(), Some(link), deadline);

        assert_eq!(entry.kind, ReminderKind::TodayReady);
        assert_eq!(entry.incomplete_count, 0);

        expect![[r#"
            ✅ TODAY (20-Jan) - READY FOR UPLOAD

            All 4 videos completed!

            📁 GDrive: https://drive.google.com/drive/folders/abc

            ⏰ Upload by: 8:00 AM

            Completion: 4/4 (100.0%)"#]]
        .assert_eq(&entry.text);

        let text = format_today_ready(&complete_day(), None, deadline);
        assert!(!text.contains("GDrive"));
    }
}
