//! Guided selection of the slot for the submitted content:
//! date, then channel, then video number.

use crate::pipeline::{
    self, Assignment, BulkAssignment, BulkOutcome, Content, SlotAssigner, SLOTS_PER_DAY,
    WINDOW_DAYS,
};
use crate::prelude::*;
use crate::tg;
use crate::util::DynResult;
use crate::{Error, Result};
use chrono::prelude::*;
use itertools::Itertools;
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId};

const CHANNEL_BUTTONS_PER_ROW: usize = 3;
const VIDEO_BUTTONS_PER_ROW: usize = 2;

/// Payload of the inline keyboard buttons
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CallbackAction {
    Date(NaiveDate),
    Channel(String),
    Video(u8),
    BackToDate,
    BackToChannel,
    Cancel,
}

impl CallbackAction {
    pub(crate) fn parse(data: &str) -> Option<Self> {
        match data {
            "back_to_date" => return Some(Self::BackToDate),
            "back_to_channel" => return Some(Self::BackToChannel),
            "cancel" => return Some(Self::Cancel),
            _ => {}
        }

        let (prefix, value) = data.split_once(':')?;

        match prefix {
            "date" => value.parse().ok().map(Self::Date),
            "channel" if !value.is_empty() => Some(Self::Channel(value.to_owned())),
            "video" => value
                .parse()
                .ok()
                .filter(|slot| (1..=SLOTS_PER_DAY).contains(slot))
                .map(Self::Video),
            _ => None,
        }
    }

    pub(crate) fn encode(&self) -> String {
        match self {
            Self::Date(date) => format!("date:{}", date.format("%Y-%m-%d")),
            Self::Channel(name) => format!("channel:{name}"),
            Self::Video(slot) => format!("video:{slot}"),
            Self::BackToDate => "back_to_date".to_owned(),
            Self::BackToChannel => "back_to_channel".to_owned(),
            Self::Cancel => "cancel".to_owned(),
        }
    }

    fn button(self, text: impl Into<String>) -> InlineKeyboardButton {
        InlineKeyboardButton::callback(text, self.encode())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Payload {
    Single(Content),
    Bulk(Vec<Content>),
}

impl Payload {
    fn label(&self) -> &'static str {
        match self {
            Self::Single(content) => content.label(),
            Self::Bulk(items) => items.first().map(Content::label).unwrap_or("item"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WizardStep {
    AwaitingDate,
    AwaitingChannel { date: NaiveDate },
    AwaitingSlot { date: NaiveDate, channel: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Session {
    pub(crate) payload: Payload,
    pub(crate) step: WizardStep,

    /// Message with the inline keyboard that drives this session
    pub(crate) prompt_msg: Option<MessageId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Commit {
    Single(Assignment),
    Bulk(BulkAssignment),
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Transition {
    Prompt(Session),
    Commit(Commit),
    Cancelled,
    Ignored(Session),
}

impl Session {
    pub(crate) fn new(payload: Payload) -> Self {
        Self {
            payload,
            step: WizardStep::AwaitingDate,
            prompt_msg: None,
        }
    }

    pub(crate) fn advance(self, action: CallbackAction) -> Transition {
        use CallbackAction as A;
        use WizardStep as S;

        enum Next {
            Step(WizardStep),
            CommitSingle {
                date: NaiveDate,
                channel: String,
                slot: u8,
            },
            CommitBulk {
                date: NaiveDate,
                channel: String,
            },
            Ignore,
        }

        let next = match (&self.step, action) {
            (_, A::Cancel) => return Transition::Cancelled,

            (S::AwaitingDate, A::Date(date)) => Next::Step(S::AwaitingChannel { date }),

            (S::AwaitingChannel { date }, A::Channel(channel)) => match self.payload {
                Payload::Single(_) => Next::Step(S::AwaitingSlot {
                    date: *date,
                    channel,
                }),
                Payload::Bulk(_) => Next::CommitBulk {
                    date: *date,
                    channel,
                },
            },

            (S::AwaitingSlot { date, channel }, A::Video(slot)) => Next::CommitSingle {
                date: *date,
                channel: channel.clone(),
                slot,
            },

            (S::AwaitingChannel { .. } | S::AwaitingSlot { .. }, A::BackToDate) => {
                Next::Step(S::AwaitingDate)
            }

            (S::AwaitingSlot { date, .. }, A::BackToChannel) => {
                Next::Step(S::AwaitingChannel { date: *date })
            }

            _ => Next::Ignore,
        };

        match next {
            Next::Ignore => Transition::Ignored(self),
            Next::Step(step) => Transition::Prompt(Self { step, ..self }),
            Next::CommitSingle {
                date,
                channel,
                slot,
            } => match self.payload {
                Payload::Single(content) => Transition::Commit(Commit::Single(Assignment {
                    date,
                    channel,
                    slot,
                    content,
                })),
                // Bulk sessions never reach the slot step
                Payload::Bulk(_) => Transition::Ignored(self),
            },
            Next::CommitBulk { date, channel } => match self.payload {
                Payload::Bulk(items) => Transition::Commit(Commit::Bulk(BulkAssignment {
                    date,
                    channel,
                    items,
                })),
                Payload::Single(_) => Transition::Ignored(self),
            },
        }
    }

    pub(crate) fn prompt_text(&self) -> String {
        let label = self.payload.label();

        match (&self.step, &self.payload) {
            (WizardStep::AwaitingDate, Payload::Single(_)) => {
                format!("📅 Select upload date for this {label}:")
            }
            (WizardStep::AwaitingDate, Payload::Bulk(items)) => {
                format!("📅 Select date for {} {label}s:", items.len())
            }
            (WizardStep::AwaitingChannel { date }, Payload::Single(_)) => {
                format!("📺 Select channel for {}:", date.short_label())
            }
            (WizardStep::AwaitingChannel { date }, Payload::Bulk(_)) => {
                format!("📺 Select channel for bulk upload ({}):", date.short_label())
            }
            (WizardStep::AwaitingSlot { channel, .. }, _) => {
                format!("🎬 Select video number for {channel}:")
            }
        }
    }

    pub(crate) fn keyboard(&self, today: NaiveDate, channels: &[String]) -> InlineKeyboardMarkup {
        match &self.step {
            WizardStep::AwaitingDate => date_keyboard(today),
            WizardStep::AwaitingChannel { .. } => channel_keyboard(channels),
            WizardStep::AwaitingSlot { .. } => video_keyboard(),
        }
    }
}

fn date_button_label(today: NaiveDate, date: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => format!("Today ({})", date.short_label()),
        1 => format!("Tomorrow ({})", date.short_label()),
        _ => format!("{} ({})", date.short_label(), date.weekday_label()),
    }
}

pub(crate) fn date_keyboard(today: NaiveDate) -> InlineKeyboardMarkup {
    let rows = today
        .days_from(WINDOW_DAYS)
        .into_iter()
        .map(|date| vec![CallbackAction::Date(date).button(date_button_label(today, date))])
        .chain([vec![CallbackAction::Cancel.button("❌ Cancel")]]);

    InlineKeyboardMarkup::new(rows)
}

pub(crate) fn channel_keyboard(channels: &[String]) -> InlineKeyboardMarkup {
    let rows = channels
        .chunks(CHANNEL_BUTTONS_PER_ROW)
        .map(|row| {
            row.iter()
                .map(|name| CallbackAction::Channel(name.clone()).button(name))
                .collect::<Vec<_>>()
        })
        .chain([vec![
            CallbackAction::BackToDate.button("⬅️ Back"),
            CallbackAction::Cancel.button("❌ Cancel"),
        ]]);

    InlineKeyboardMarkup::new(rows)
}

pub(crate) fn video_keyboard() -> InlineKeyboardMarkup {
    let slots: Vec<_> = (1..=SLOTS_PER_DAY).collect();

    let rows = slots
        .chunks(VIDEO_BUTTONS_PER_ROW)
        .map(|row| {
            row.iter()
                .map(|&slot| CallbackAction::Video(slot).button(format!("Video {slot}")))
                .collect::<Vec<_>>()
        })
        .chain([vec![
            CallbackAction::BackToChannel.button("⬅️ Back"),
            CallbackAction::Cancel.button("❌ Cancel"),
        ]]);

    InlineKeyboardMarkup::new(rows)
}

/// In-memory wizard sessions, one per user
#[derive(Default)]
pub(crate) struct SessionStore {
    sessions: SyncMutex<HashMap<UserId, Session>>,
}

impl SessionStore {
    /// Replaces any session the user had before
    pub(crate) fn start(&self, user: UserId, session: Session) {
        if self.sessions.lock().insert(user, session).is_some() {
            debug!(%user, "Replaced an unfinished selection session");
        }
    }

    /// Hands out the session only to a callback from its own prompt. The
    /// keyboard of a session that was replaced by a newer one is stale.
    pub(crate) fn take_for_prompt(&self, user: UserId, prompt: MessageId) -> Option<Session> {
        let mut sessions = self.sessions.lock();

        match sessions.get(&user) {
            Some(session) if session.prompt_msg == Some(prompt) => sessions.remove(&user),
            _ => None,
        }
    }

    pub(crate) fn put(&self, user: UserId, session: Session) {
        self.sessions.lock().insert(user, session);
    }
}

const EXPIRED_TEXT: &str = "❌ Selection expired. Please try again.";
const CANCELLED_TEXT: &str = "❌ Selection cancelled.";

fn single_result_text(assignment: &Assignment, result: &Result) -> String {
    match result {
        Ok(()) => format!(
            "✅ Saved for {} / {} / Video {}",
            assignment.date.short_label(),
            assignment.channel,
            assignment.slot,
        ),
        Err(err) => format!("❌ Error saving. Please try again.\n\n{}", err.display_chain()),
    }
}

fn bulk_result_text(date: NaiveDate, channel: &str, outcome: &BulkOutcome) -> String {
    let succeeded = outcome.succeeded();

    let emoji = if succeeded == outcome.attempted {
        "✅"
    } else if succeeded > 0 {
        "⚠️"
    } else {
        "❌"
    };

    let mut text = format!(
        "{emoji} Saved {succeeded}/{} items\n\
        Date: {}\n\
        Channel: {channel}",
        outcome.attempted,
        date.short_label(),
    );

    if !outcome.saved.is_empty() {
        text += &format!("\nVideos: {}", outcome.saved.iter().join(", "));
    }

    text
}

/// Reply for a failure that isn't caused by the user's input
fn failure_text(err: &Error) -> String {
    format!(
        "❌ Something went wrong, please send the content again (error id: {})",
        err.id()
    )
}

/// Sends the first prompt of the wizard in reply to the content message
pub(crate) async fn start(ctx: &tg::Ctx, msg: &Message, user: UserId, payload: Payload) -> Result {
    let mut session = Session::new(payload);

    let keyboard = session.keyboard(ctx.cfg.today(), &[]);

    let prompt = ctx
        .bot
        .reply_text(msg, session.prompt_text())
        .reply_markup(keyboard)
        .await?;

    session.prompt_msg = Some(prompt.id);

    info!(payload = ?session.payload, "Started selection session");

    ctx.sessions.start(user, session);

    Ok(())
}

/// Same as [`start`], but a failure is reported in reply to the content
pub(crate) async fn start_or_report(ctx: &tg::Ctx, msg: &Message, user: UserId, payload: Payload) {
    let Err(err) = start(ctx, msg, user, payload).await else {
        return;
    };

    warn!(err = tracing_err(&err), "Failed to start the selection");

    if let Err(err) = ctx.bot.reply_text(msg, failure_text(&err)).await {
        warn!(
            err = tracing_err(&err),
            "Failed to reply with the error message to the user"
        );
    }
}

#[instrument(skip_all, fields(
    from = %query.from.debug_id(),
    data = query.data.as_deref(),
))]
pub(crate) async fn handle_callback_query(ctx: Arc<tg::Ctx>, query: CallbackQuery) -> DynResult {
    async {
        debug!("Processing callback query");

        ctx.bot.answer_callback_query(query.id.clone()).await?;

        let Some(prompt) = &query.message else {
            warn!("Received callback query without a message");
            return Ok(());
        };

        let prompt = Prompt {
            chat: prompt.chat().id,
            msg: prompt.id(),
        };

        let Some(action) = query.data.as_deref().and_then(CallbackAction::parse) else {
            warn!("Received unknown callback data");
            return Ok(());
        };

        let result = apply_action(&ctx, query.from.id, prompt, action).await;

        if let Err(err) = &result {
            warn!(err = tracing_err(err), "Failed to process the selection");
            ctx.bot
                .edit_message_text(prompt.chat, prompt.msg, failure_text(err))
                .await?;
        }

        Ok::<_, Error>(())
    }
    .await
    .map_err(Into::into)
}

/// Message with the inline keyboard the callback came from
#[derive(Debug, Clone, Copy)]
struct Prompt {
    chat: ChatId,
    msg: MessageId,
}

async fn apply_action(ctx: &tg::Ctx, user: UserId, prompt: Prompt, action: CallbackAction) -> Result {
    let tg::Ctx { bot, .. } = ctx;

    let Some(session) = ctx.sessions.take_for_prompt(user, prompt.msg) else {
        bot.edit_message_text(prompt.chat, prompt.msg, EXPIRED_TEXT)
            .await?;
        return Ok(());
    };

    match session.advance(action) {
        Transition::Ignored(session) => {
            debug!(step = ?session.step, "Ignoring action not valid for the current step");
            ctx.sessions.put(user, session);
        }
        Transition::Cancelled => {
            info!("Selection cancelled");
            bot.edit_message_text(prompt.chat, prompt.msg, CANCELLED_TEXT)
                .await?;
        }
        Transition::Prompt(session) => {
            let channels = match &session.step {
                WizardStep::AwaitingChannel { .. } => ctx.active_channel_names().await?,
                _ => vec![],
            };

            let keyboard = session.keyboard(ctx.cfg.today(), &channels);

            bot.edit_message_text(prompt.chat, prompt.msg, session.prompt_text())
                .reply_markup(keyboard)
                .await?;

            ctx.sessions.put(user, session);
        }
        Transition::Commit(Commit::Single(assignment)) => {
            let result = ctx.assigner.assign(&assignment).await;

            if let Err(err) = &result {
                warn!(err = tracing_err(err), "Failed to save the selection");
            } else {
                info!(?assignment, "Saved the selection");
            }

            let text = single_result_text(&assignment, &result);
            bot.edit_message_text(prompt.chat, prompt.msg, text).await?;
        }
        Transition::Commit(Commit::Bulk(bulk)) => {
            let (date, channel) = (bulk.date, bulk.channel.clone());

            let outcome = pipeline::assign_bulk(&ctx.assigner, bulk).await;

            info!(?outcome, %date, %channel, "Saved bulk selection");

            let text = bulk_result_text(date, &channel, &outcome);
            bot.edit_message_text(prompt.chat, prompt.msg, text).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use expect_test::expect;
    use teloxide::types::InlineKeyboardButtonKind;

    fn date(input: &str) -> NaiveDate {
        input.parse().unwrap()
    }

    fn script() -> Content {
        Content::Script {
            text: "A long enough script".to_owned(),
        }
    }

    fn run(session: Session, actions: &[&str]) -> Transition {
        let mut transition = Transition::Prompt(session);

        for action in actions {
            let session = match transition {
                Transition::Prompt(session) | Transition::Ignored(session) => session,
                Transition::Commit(_) | Transition::Cancelled => {
                    panic!("Session has already finished before {action}")
                }
            };
            transition = session.advance(CallbackAction::parse(action).unwrap());
        }

        transition
    }

    fn rows(markup: &InlineKeyboardMarkup) -> Vec<Vec<(String, String)>> {
        markup
            .inline_keyboard
            .iter()
            .map(|row| {
                row.iter()
                    .map(|button| {
                        let data = match &button.kind {
                            InlineKeyboardButtonKind::CallbackData(data) => data.clone(),
                            other => panic!("Unexpected button kind: {other:?}"),
                        };
                        (button.text.clone(), data)
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn parse_callback_actions() {
        assert_eq!(
            CallbackAction::parse("date:2025-01-21"),
            Some(CallbackAction::Date(date("2025-01-21")))
        );
        assert_eq!(
            CallbackAction::parse("channel:GYH"),
            Some(CallbackAction::Channel("GYH".to_owned()))
        );
        assert_eq!(CallbackAction::parse("video:4"), Some(CallbackAction::Video(4)));
        assert_eq!(CallbackAction::parse("back_to_channel"), Some(CallbackAction::BackToChannel));

        assert_eq!(CallbackAction::parse("video:5"), None);
        assert_eq!(CallbackAction::parse("video:0"), None);
        assert_eq!(CallbackAction::parse("date:tomorrow"), None);
        assert_eq!(CallbackAction::parse("channel:"), None);
        assert_eq!(CallbackAction::parse("captcha:1"), None);

        let action = CallbackAction::Date(date("2025-01-21"));
        assert_eq!(CallbackAction::parse(&action.encode()), Some(action));
    }

    #[test]
    fn back_to_channel_changes_the_target() {
        let transition = run(
            Session::new(Payload::Single(script())),
            &[
                "date:2025-01-21",
                "channel:BI",
                "back_to_channel",
                "channel:GYH",
                "video:3",
            ],
        );

        assert_eq!(
            transition,
            Transition::Commit(Commit::Single(Assignment {
                date: date("2025-01-21"),
                channel: "GYH".to_owned(),
                slot: 3,
                content: script(),
            }))
        );
    }

    #[test]
    fn cancel_never_commits() {
        let paths: &[&[&str]] = &[
            &["cancel"],
            &["date:2025-01-21", "cancel"],
            &["date:2025-01-21", "channel:BI", "cancel"],
            &["date:2025-01-21", "channel:BI", "back_to_date", "cancel"],
            &["date:2025-01-21", "channel:BI", "back_to_channel", "cancel"],
        ];

        for path in paths {
            let transition = run(Session::new(Payload::Single(script())), path);
            assert_eq!(transition, Transition::Cancelled, "{path:?}");
        }
    }

    #[test]
    fn back_to_date_clears_the_channel() {
        let transition = run(
            Session::new(Payload::Single(script())),
            &["date:2025-01-21", "channel:BI", "back_to_date"],
        );

        assert_matches!(
            transition,
            Transition::Prompt(Session {
                step: WizardStep::AwaitingDate,
                ..
            })
        );
    }

    #[test]
    fn actions_out_of_order_are_ignored() {
        let session = Session::new(Payload::Single(script()));

        let transition = session.clone().advance(CallbackAction::Video(2));
        assert_eq!(transition, Transition::Ignored(session.clone()));

        let transition = session.clone().advance(CallbackAction::BackToChannel);
        assert_eq!(transition, Transition::Ignored(session));

        let transition = run(
            Session::new(Payload::Single(script())),
            &["date:2025-01-21", "date:2025-01-22"],
        );
        assert_matches!(
            transition,
            Transition::Ignored(Session {
                step: WizardStep::AwaitingChannel { date: picked },
                ..
            }) if picked == date("2025-01-21")
        );
    }

    #[test]
    fn bulk_skips_the_slot_picker() {
        let items = vec![script(), script(), script()];

        let transition = run(
            Session::new(Payload::Bulk(items.clone())),
            &["date:2025-01-21", "channel:GYH"],
        );

        assert_eq!(
            transition,
            Transition::Commit(Commit::Bulk(BulkAssignment {
                date: date("2025-01-21"),
                channel: "GYH".to_owned(),
                items,
            }))
        );
    }

    #[test]
    fn prompts() {
        let session = Session::new(Payload::Single(script()));
        assert_eq!(session.prompt_text(), "📅 Select upload date for this script:");

        let bulk = Session::new(Payload::Bulk(vec![script(), script()]));
        assert_eq!(bulk.prompt_text(), "📅 Select date for 2 scripts:");

        let Transition::Prompt(session) = session.advance(CallbackAction::Date(date("2025-01-21")))
        else {
            panic!("Expected a prompt");
        };
        assert_eq!(session.prompt_text(), "📺 Select channel for 21-Jan:");
    }

    #[test]
    fn date_keyboard_layout() {
        let markup = date_keyboard(date("2025-01-20"));

        expect![[r#"
            [
                [
                    (
                        "Today (20-Jan)",
                        "date:2025-01-20",
                    ),
                ],
                [
                    (
                        "Tomorrow (21-Jan)",
                        "date:2025-01-21",
                    ),
                ],
                [
                    (
                        "22-Jan (Wed)",
                        "date:2025-01-22",
                    ),
                ],
                [
                    (
                        "23-Jan (Thu)",
                        "date:2025-01-23",
                    ),
                ],
                [
                    (
                        "24-Jan (Fri)",
                        "date:2025-01-24",
                    ),
                ],
                [
                    (
                        "25-Jan (Sat)",
                        "date:2025-01-25",
                    ),
                ],
                [
                    (
                        "26-Jan (Sun)",
                        "date:2025-01-26",
                    ),
                ],
                [
                    (
                        "❌ Cancel",
                        "cancel",
                    ),
                ],
            ]
        "#]]
        .assert_debug_eq(&rows(&markup));
    }

    #[test]
    fn channel_and_video_keyboard_layout() {
        let channels: Vec<_> = ["GYH", "BI", "KM", "TT"].map(str::to_owned).into();
        let markup = rows(&channel_keyboard(&channels));

        let texts: Vec<Vec<_>> = markup
            .iter()
            .map(|row| row.iter().map(|(text, _)| text.as_str()).collect())
            .collect();

        assert_eq!(
            texts,
            [
                vec!["GYH", "BI", "KM"],
                vec!["TT"],
                vec!["⬅️ Back", "❌ Cancel"]
            ]
        );
        assert_eq!(markup[2][0].1, "back_to_date");

        let markup = rows(&video_keyboard());
        let data: Vec<Vec<_>> = markup
            .iter()
            .map(|row| row.iter().map(|(_, data)| data.as_str()).collect())
            .collect();

        assert_eq!(
            data,
            [
                vec!["video:1", "video:2"],
                vec!["video:3", "video:4"],
                vec!["back_to_channel", "cancel"]
            ]
        );
    }

    #[test]
    fn result_texts() {
        let outcome = BulkOutcome {
            saved: vec![1, 3, 4],
            attempted: 4,
        };
        expect![[r#"
            ⚠️ Saved 3/4 items
            Date: 21-Jan
            Channel: GYH
            Videos: 1, 3, 4"#]]
        .assert_eq(&bulk_result_text(date("2025-01-21"), "GYH", &outcome));

        let outcome = BulkOutcome {
            saved: vec![1, 2],
            attempted: 2,
        };
        expect![[r#"
            ✅ Saved 2/2 items
            Date: 21-Jan
            Channel: GYH
            Videos: 1, 2"#]]
        .assert_eq(&bulk_result_text(date("2025-01-21"), "GYH", &outcome));

        let outcome = BulkOutcome {
            saved: vec![],
            attempted: 3,
        };
        expect![[r#"
            ❌ Saved 0/3 items
            Date: 21-Jan
            Channel: GYH"#]]
        .assert_eq(&bulk_result_text(date("2025-01-21"), "GYH", &outcome));

        let assignment = Assignment {
            date: date("2025-01-21"),
            channel: "GYH".to_owned(),
            slot: 3,
            content: script(),
        };
        assert_eq!(
            single_result_text(&assignment, &Ok(())),
            "✅ Saved for 21-Jan / GYH / Video 3"
        );
    }

    #[test]
    fn failure_text_mentions_the_error_id() {
        let err = crate::error::fatal!("Telegram is down");
        let text = failure_text(&err);

        assert!(text.starts_with("❌ Something went wrong"), "{text}");
        assert!(text.ends_with(&format!("(error id: {})", err.id())), "{text}");
    }

    fn started(prompt: i32) -> Session {
        Session {
            prompt_msg: Some(MessageId(prompt)),
            ..Session::new(Payload::Single(script()))
        }
    }

    #[test]
    fn session_store_hands_out_each_session_once() {
        let store = SessionStore::default();
        let user = UserId(42);

        store.start(user, started(10));

        assert!(store.take_for_prompt(user, MessageId(10)).is_some());
        assert!(store.take_for_prompt(user, MessageId(10)).is_none());
    }

    #[test]
    fn stale_prompt_does_not_drive_the_newer_session() {
        let store = SessionStore::default();
        let user = UserId(42);

        // The script's prompt is 10, then a thumbnail replaces the session
        store.start(user, started(10));
        store.start(user, started(11));

        assert_eq!(store.take_for_prompt(user, MessageId(10)), None);

        let session = store.take_for_prompt(user, MessageId(11)).unwrap();
        assert_eq!(session.prompt_msg, Some(MessageId(11)));
    }
}
