//! Aggregation of slot rows into per-day and per-week completion reports.

use super::model::{SlotRow, WINDOW_DAYS};
use crate::prelude::*;
use chrono::prelude::*;
use itertools::Itertools;
use std::collections::BTreeMap;
use std::fmt;

/// How many missing items are listed per channel before collapsing the rest
const MISSING_ITEMS_SHOWN: usize = 3;

/// Qualitative label of a completion percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tier {
    Ready,
    AlmostReady,
    InProgress,
    Started,
    NotStarted,
}

impl Tier {
    pub(crate) fn from_percentage(percentage: f64) -> Self {
        if percentage >= 100.0 {
            Self::Ready
        } else if percentage >= 80.0 {
            Self::AlmostReady
        } else if percentage >= 50.0 {
            Self::InProgress
        } else if percentage > 0.0 {
            Self::Started
        } else {
            Self::NotStarted
        }
    }

    pub(crate) fn emoji(self) -> &'static str {
        match self {
            Self::Ready => "✅",
            Self::AlmostReady => "🟢",
            Self::InProgress => "🟡",
            Self::Started => "🔵",
            Self::NotStarted => "⚪",
        }
    }

    pub(crate) fn text(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::AlmostReady => "ALMOST READY",
            Self::InProgress => "IN PROGRESS",
            Self::Started => "STARTED",
            Self::NotStarted => "NOT STARTED",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ChannelStatus {
    pub(crate) completed: usize,
    pub(crate) total: usize,
    pub(crate) scripts: usize,
    pub(crate) thumbnails: usize,
    pub(crate) missing: Vec<String>,
}

impl ChannelStatus {
    fn emoji(&self) -> &'static str {
        if self.completed == self.total {
            "✅"
        } else if self.completed > 0 {
            "🟡"
        } else {
            "⚪"
        }
    }

    fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DayStatus {
    pub(crate) date: NaiveDate,
    pub(crate) percentage: f64,
    pub(crate) total: usize,
    pub(crate) completed: usize,
    pub(crate) scripts_ready: usize,
    pub(crate) thumbnails_ready: usize,
    pub(crate) tier: Tier,
    pub(crate) channels: BTreeMap<String, ChannelStatus>,
}

impl DayStatus {
    /// Rows are expected to be ordered by slot number within a channel,
    /// the missing items list follows that order.
    pub(crate) fn from_rows(date: NaiveDate, rows: &[SlotRow]) -> Self {
        let mut channels = BTreeMap::<String, ChannelStatus>::new();

        for row in rows {
            let channel = channels.entry(row.channel.clone()).or_default();

            channel.total += 1;
            channel.completed += usize::from(row.video.is_completed());
            channel.scripts += usize::from(row.script.is_ready_script());
            channel.thumbnails += usize::from(row.thumbnail.is_ready_thumbnail());

            if row.script.is_pending() {
                channel.missing.push(format!("V{} script", row.slot));
            }
            if row.thumbnail.is_pending() {
                channel.missing.push(format!("V{} thumbnail", row.slot));
            }
        }

        let total = rows.len();
        let completed = rows.iter().filter(|row| row.video.is_completed()).count();

        Self {
            date,
            total,
            completed,
            scripts_ready: channels.values().map(|channel| channel.scripts).sum(),
            thumbnails_ready: channels.values().map(|channel| channel.thumbnails).sum(),
            // Rounding must not promote the tier, 1999 of 2000 isn't ready
            tier: Tier::from_percentage(raw_percentage(completed, total)),
            percentage: percentage(completed, total),
            channels,
        }
    }

    pub(crate) fn is_fully_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WeekOverview {
    pub(crate) days: Vec<DayStatus>,
    pub(crate) total: usize,
    pub(crate) completed: usize,
    pub(crate) percentage: f64,
}

impl WeekOverview {
    pub(crate) fn from_days(days: Vec<DayStatus>) -> Self {
        let total = days.iter().map(|day| day.total).sum();
        let completed = days.iter().map(|day| day.completed).sum();

        Self {
            percentage: percentage(completed, total),
            days,
            total,
            completed,
        }
    }
}

/// Field of a slot that still blocks the upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum Outstanding {
    Script,
    Thumbnail,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IncompleteSlot {
    pub(crate) channel: String,
    pub(crate) slot: u8,
    pub(crate) missing: Vec<Outstanding>,
}

impl IncompleteSlot {
    pub(crate) fn from_rows(rows: &[SlotRow]) -> Vec<Self> {
        rows.iter()
            .filter_map(|row| {
                let missing: Vec<_> = [
                    (row.script.is_pending(), Outstanding::Script),
                    (row.thumbnail.is_pending(), Outstanding::Thumbnail),
                    (!row.video.is_completed(), Outstanding::Video),
                ]
                .into_iter()
                .filter_map(|(is_missing, field)| is_missing.then_some(field))
                .collect();

                (!missing.is_empty()).then(|| Self {
                    channel: row.channel.clone(),
                    slot: row.slot,
                    missing,
                })
            })
            .collect()
    }

    pub(crate) fn is_missing(&self, field: Outstanding) -> bool {
        self.missing.contains(&field)
    }
}

/// Completed share in percent, rounded to one decimal place
/// Exact share of completed items in percent, 0 when there are no items
fn raw_percentage(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    completed as f64 / total as f64 * 100.0
}

/// Rounded to one decimal for display
pub(crate) fn percentage(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (completed as f64 / total as f64 * 1000.0).round() / 10.0
}

pub(crate) fn format_day_status(status: &DayStatus, details: bool) -> String {
    let mut lines = vec![
        format!(
            "{} {} - {} ({:.1}%)",
            status.tier.emoji(),
            status.date,
            status.tier.text(),
            status.percentage
        ),
        format!("Videos: {}/{}", status.completed, status.total),
    ];

    if !details || status.channels.is_empty() {
        return lines.join("\n");
    }

    lines.push("\nChannel Breakdown:".to_owned());

    for (name, channel) in &status.channels {
        lines.push(format!(
            "{} {name}: {}/{}",
            channel.emoji(),
            channel.completed,
            channel.total
        ));

        if channel.missing.is_empty() {
            continue;
        }

        let mut missing = channel.missing.iter().take(MISSING_ITEMS_SHOWN).join(", ");
        if channel.missing.len() > MISSING_ITEMS_SHOWN {
            missing += &format!(" +{} more", channel.missing.len() - MISSING_ITEMS_SHOWN);
        }
        lines.push(format!("   Missing: {missing}"));
    }

    lines.join("\n")
}

pub(crate) fn format_week_overview(overview: &WeekOverview, today: NaiveDate) -> String {
    if overview.days.is_empty() {
        return "No schedule data available".to_owned();
    }

    let tomorrow = today.succ_opt();

    let days = overview.days.iter().map(|day| {
        let marker = if day.date == today {
            " [TODAY]"
        } else if Some(day.date) == tomorrow {
            " [TOMORROW]"
        } else {
            ""
        };

        format!(
            "{} {}{marker}: {} {:.1}% ({}/{})",
            day.date.weekday_label(),
            day.date,
            day.tier.emoji(),
            day.percentage,
            day.completed,
            day.total,
        )
    });

    std::iter::once(format!("📅 {WINDOW_DAYS}-DAY SCHEDULE OVERVIEW\n"))
        .chain(days)
        .chain([format!(
            "\nOverall: {}/{} ({:.1}%)",
            overview.completed, overview.total, overview.percentage
        )])
        .join("\n")
}

pub(crate) fn format_morning_checklist(status: &DayStatus, deadline: NaiveTime) -> String {
    let channels = status.channels.iter().map(|(name, channel)| {
        let emoji = if channel.is_complete() { "✅" } else { "⚠️" };
        format!("{emoji} {name}: {}/{}", channel.completed, channel.total)
    });

    std::iter::once("🔍 MORNING CHECKLIST\n".to_owned())
        .chain([format!("Upload Date: {}\n", status.date)])
        .chain(channels)
        .chain([
            format!("\nOverall: {}/{}", status.completed, status.total),
            format!("Status: {}", status.tier.text()),
            format!("\n⏰ Upload Deadline: {}", format_deadline(deadline)),
        ])
        .join("\n")
}

/// Formats the time like `8:00 AM`
pub(crate) fn format_deadline(deadline: NaiveTime) -> String {
    deadline.format("%-I:%M %p").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TimeLeft {
    pub(crate) days: i64,
    pub(crate) hours: i64,
    pub(crate) minutes: i64,
}

impl fmt::Display for TimeLeft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d {}h {}m", self.days, self.hours, self.minutes)
    }
}

/// Time left until the deadline, zero if it has already passed
pub(crate) fn time_until(deadline: NaiveDateTime, now: NaiveDateTime) -> TimeLeft {
    let left = (deadline - now).num_minutes().max(0);

    TimeLeft {
        days: left / (24 * 60),
        hours: left % (24 * 60) / 60,
        minutes: left % 60,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::model::FieldStatus::{self, *};
    use expect_test::{expect, Expect};

    fn date(input: &str) -> NaiveDate {
        input.parse().unwrap()
    }

    fn row(
        channel: &str,
        slot: u8,
        script: FieldStatus,
        thumbnail: FieldStatus,
        video: FieldStatus,
    ) -> SlotRow {
        SlotRow {
            channel: channel.to_owned(),
            slot,
            script,
            thumbnail,
            video,
            audio: Pending,
        }
    }

    #[track_caller]
    fn assert_text(actual: String, expected: Expect) {
        expected.assert_eq(&actual);
    }

    #[test]
    fn tier_boundaries() {
        let cases = [
            (0.0, Tier::NotStarted),
            (0.1, Tier::Started),
            (49.9, Tier::Started),
            (50.0, Tier::InProgress),
            (79.9, Tier::InProgress),
            (80.0, Tier::AlmostReady),
            (99.9, Tier::AlmostReady),
            (100.0, Tier::Ready),
        ];
        for (percentage, tier) in cases {
            assert_eq!(Tier::from_percentage(percentage), tier, "{percentage}");
        }
    }

    #[test]
    fn percentage_rounding() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(4, 4), 100.0);
    }

    #[test]
    fn tier_ignores_display_rounding() {
        let rows: Vec<_> = (0..2000)
            .map(|i| {
                let video = if i == 0 { Processing } else { Completed };
                row("GYH", 1, Processed, Received, video)
            })
            .collect();

        let status = DayStatus::from_rows(date("2025-01-21"), &rows);
        assert_eq!(status.tier, Tier::AlmostReady);
        assert!(!status.is_fully_complete());

        // 79.95%
        let rows: Vec<_> = (0..2000)
            .map(|i| {
                let video = if i < 1599 { Completed } else { Pending };
                row("GYH", 1, Processed, Received, video)
            })
            .collect();

        let status = DayStatus::from_rows(date("2025-01-21"), &rows);
        assert_eq!(status.tier, Tier::InProgress);
    }

    #[test]
    fn pending_script_is_listed_as_missing() {
        let rows = [row("ChannelX", 2, Pending, Received, Pending)];
        let status = DayStatus::from_rows(date("2025-01-21"), &rows);

        let channel = &status.channels["ChannelX"];
        assert_eq!(channel.missing, ["V2 script"]);
        assert_eq!(channel.total, 1);
        assert_eq!(channel.completed, 0);
        assert_eq!(status.tier, Tier::NotStarted);
    }

    #[test]
    fn all_videos_completed_is_ready() {
        let rows: Vec<_> = ["BI", "GYH"]
            .into_iter()
            .flat_map(|channel| (1..=4).map(move |slot| row(channel, slot, Processed, Received, Completed)))
            .collect();

        let status = DayStatus::from_rows(date("2025-01-21"), &rows);
        assert_eq!(status.percentage, 100.0);
        assert_eq!(status.tier, Tier::Ready);
        assert!(status.is_fully_complete());
        assert_eq!(status.scripts_ready, 8);
        assert_eq!(status.thumbnails_ready, 8);
    }

    #[test]
    fn no_rows_is_empty_not_an_error() {
        let status = DayStatus::from_rows(date("2025-01-21"), &[]);
        assert_eq!(status.percentage, 0.0);
        assert_eq!(status.tier, Tier::NotStarted);
        assert!(!status.is_fully_complete());
        assert!(status.channels.is_empty());
    }

    #[test]
    fn incomplete_slots() {
        let rows = [
            row("GYH", 1, Processed, Received, Completed),
            row("GYH", 2, Received, Pending, Processing),
            row("BI", 1, Pending, Pending, Pending),
        ];

        let incomplete = IncompleteSlot::from_rows(&rows);
        assert_eq!(
            incomplete,
            [
                IncompleteSlot {
                    channel: "GYH".to_owned(),
                    slot: 2,
                    missing: vec![Outstanding::Thumbnail, Outstanding::Video],
                },
                IncompleteSlot {
                    channel: "BI".to_owned(),
                    slot: 1,
                    missing: vec![
                        Outstanding::Script,
                        Outstanding::Thumbnail,
                        Outstanding::Video
                    ],
                },
            ]
        );
    }

    #[test]
    fn day_status_text() {
        let rows = [
            row("BI", 1, Processed, Received, Completed),
            row("BI", 2, Processed, Received, Completed),
            row("GYH", 1, Processed, Received, Completed),
            row("GYH", 2, Pending, Pending, Pending),
            row("GYH", 3, Pending, Received, Pending),
            row("GYH", 4, Received, Pending, Pending),
        ];
        let status = DayStatus::from_rows(date("2025-01-21"), &rows);

        assert_text(
            format_day_status(&status, true),
            expect![[r#"
                🟡 2025-01-21 - IN PROGRESS (50.0%)
                Videos: 3/6

                Channel Breakdown:
                ✅ BI: 2/2
                🟡 GYH: 1/4
                   Missing: V2 script, V2 thumbnail, V3 script +1 more"#]],
        );

        assert_text(
            format_day_status(&status, false),
            expect![[r#"
                🟡 2025-01-21 - IN PROGRESS (50.0%)
                Videos: 3/6"#]],
        );
    }

    #[test]
    fn week_overview_text() {
        let today = date("2025-01-20");
        let days = window_days(today);
        let overview = WeekOverview::from_days(days);

        assert_eq!(overview.total, 8);
        assert_eq!(overview.completed, 5);

        assert_text(
            format_week_overview(&overview, today),
            expect![[r#"
                📅 7-DAY SCHEDULE OVERVIEW

                Mon 2025-01-20 [TODAY]: ✅ 100.0% (4/4)
                Tue 2025-01-21 [TOMORROW]: 🔵 25.0% (1/4)
                Wed 2025-01-22: ⚪ 0.0% (0/0)

                Overall: 5/8 (62.5%)"#]],
        );
    }

    fn window_days(today: NaiveDate) -> Vec<DayStatus> {
        let done = |slot| row("GYH", slot, Processed, Received, Completed);
        let todo = |slot| row("GYH", slot, Pending, Pending, Pending);

        let today_rows: Vec<_> = (1..=4).map(done).collect();
        let tomorrow_rows = [done(1), todo(2), todo(3), todo(4)];

        vec![
            DayStatus::from_rows(today, &today_rows),
            DayStatus::from_rows(date("2025-01-21"), &tomorrow_rows),
            DayStatus::from_rows(date("2025-01-22"), &[]),
        ]
    }

    #[test]
    fn morning_checklist_text() {
        let rows = [
            row("BI", 1, Processed, Received, Completed),
            row("GYH", 1, Processed, Received, Completed),
            row("GYH", 2, Pending, Pending, Pending),
        ];
        let status = DayStatus::from_rows(date("2025-01-21"), &rows);
        let deadline = NaiveTime::from_hms_opt(8, 0, 0).unwrap();

        assert_text(
            format_morning_checklist(&status, deadline),
            expect![[r#"
                🔍 MORNING CHECKLIST

                Upload Date: 2025-01-21

                ✅ BI: 1/1
                ⚠️ GYH: 1/2

                Overall: 2/3
                Status: IN PROGRESS

                ⏰ Upload Deadline: 8:00 AM"#]],
        );
    }

    #[test]
    fn time_until_deadline() {
        let now = date("2025-01-20").and_hms_opt(21, 15, 0).unwrap();
        let deadline = date("2025-01-21").and_hms_opt(8, 0, 0).unwrap();

        let left = time_until(deadline, now);
        assert_eq!(left.to_string(), "0d 10h 45m");

        let left = time_until(deadline + chrono::Duration::days(2), now);
        assert_eq!(left.to_string(), "2d 10h 45m");

        let left = time_until(now, deadline);
        assert_eq!(left, TimeLeft { days: 0, hours: 0, minutes: 0 });
    }
}
