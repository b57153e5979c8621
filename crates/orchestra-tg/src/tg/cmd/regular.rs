use super::args;
use crate::pipeline::status::{self, DayStatus};
use crate::pipeline::{Channel, SlotPatch, WINDOW_DAYS};
use crate::prelude::*;
use crate::tg::{self, SetupSummary};
use crate::Result;
use async_trait::async_trait;
use chrono::Days;
use itertools::Itertools;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "snake_case", description = "Commands:")]
pub(crate) enum Cmd {
    #[command(description = "show the welcome message")]
    Start,

    #[command(description = "show this help")]
    Help,

    #[command(
        rename = "setup_7day",
        description = "create the upload slots and folders for the next 7 days"
    )]
    Setup7Day,

    #[command(description = "add a channel: <name> [display name]")]
    AddChannel(String),

    #[command(description = "show all channels")]
    ListChannels,

    #[command(description = "deactivate a channel: <name>")]
    RemoveChannel(String),

    #[command(description = "activate a channel again: <name>")]
    ActivateChannel(String),

    #[command(description = "7-day overview")]
    WeekStatus,

    #[command(description = "today's status")]
    TodayStatus,

    #[command(description = "tomorrow's status")]
    TomorrowStatus,

    #[command(description = "status of a date: <YYYY-MM-DD>")]
    DayStatus(String),

    #[command(description = "mark a video complete: <channel> <YYYY-MM-DD> <video>")]
    MarkComplete(String),

    #[command(
        description = "report a video result: <channel> <YYYY-MM-DD> <video> <status> [details]"
    )]
    SetVideo(String),

    #[command(description = "receive reminders in this chat")]
    Subscribe,

    #[command(description = "stop receiving reminders in this chat")]
    Unsubscribe,
}

const WELCOME_TEXT: &str = "🤖 Orchestrator Bot Active!\n\n\
    Commands:\n\
    /setup_7day - Initialize system\n\
    /week_status - 7-day overview\n\
    /today_status - Today's status\n\
    /tomorrow_status - Tomorrow's status\n\
    /list_channels - Show channels\n\n\
    Send scripts or thumbnails to organize!";

#[async_trait]
impl tg::cmd::Command for Cmd {
    async fn handle(self, ctx: &tg::Ctx, msg: &Message) -> Result {
        let reply = match self {
            Cmd::Start => WELCOME_TEXT.to_owned(),
            Cmd::Help => Cmd::descriptions().to_string(),
            Cmd::Setup7Day => {
                ctx.bot
                    .reply_text(msg, format!("🔧 Setting up {WINDOW_DAYS}-day system..."))
                    .await?;

                let summary = ctx
                    .setup_window()
                    .with_duration_log("Set up the schedule window")
                    .await?;

                format_setup_summary(&summary)
            }
            Cmd::AddChannel(args) => {
                let channel = ctx.db.channels.add(args::new_channel(&args)?).await?;
                info!(channel = %channel.channel_name, "Added a channel");
                format!("✅ Channel added: {}", channel.channel_name)
            }
            Cmd::ListChannels => format_channel_list(&ctx.db.channels.list(false).await?),
            Cmd::RemoveChannel(args) => {
                let name = args::channel_name(&args, args::REMOVE_CHANNEL_USAGE)?;
                ctx.db.channels.set_active(&name, false).await?;
                format!("✅ Channel deactivated: {name}")
            }
            Cmd::ActivateChannel(args) => {
                let name = args::channel_name(&args, args::ACTIVATE_CHANNEL_USAGE)?;
                ctx.db.channels.set_active(&name, true).await?;
                format!("✅ Channel activated: {name}")
            }
            Cmd::WeekStatus => {
                let overview = ctx.week_overview().await?;
                status::format_week_overview(&overview, ctx.cfg.today())
            }
            Cmd::TodayStatus => {
                let today = ctx.cfg.today();
                let status = ctx.day_status(today).await?;

                let mut reply = format_day_status_or_empty(&status);

                if let Some(link) = ctx.folder_link(today).await? {
                    reply += &format!("\n\n📁 GDrive: {link}");
                }

                reply
            }
            Cmd::TomorrowStatus => {
                let now = ctx.cfg.now().naive_local();
                let tomorrow = now.date() + Days::new(1);
                let status = ctx.day_status(tomorrow).await?;

                let mut reply = format_day_status_or_empty(&status);

                let deadline = tomorrow.and_time(ctx.deadline(tomorrow).await?);
                let left = status::time_until(deadline, now);
                reply += &format!("\n\n⏰ Time until upload: {left}");

                reply
            }
            Cmd::DayStatus(args) => {
                let date = args::day(&args)?;
                format_day_status_or_empty(&ctx.day_status(date).await?)
            }
            Cmd::MarkComplete(args) => {
                let key = args::mark_complete(&args)?;
                let channel = ctx.db.channels.get(&key.channel).await?;

                ctx.db.slots.ensure(channel.id, key.date, key.slot).await?;
                ctx.db
                    .slots
                    .update(channel.id, key.date, key.slot, &SlotPatch::force_complete())
                    .await?;

                info!(?key, "Marked the slot complete");

                format!(
                    "✅ Marked complete:\n{} / {} / Video {}",
                    key.channel, key.date, key.slot
                )
            }
            Cmd::SetVideo(args) => {
                let report = args::set_video(&args)?;
                let key = &report.key;
                let channel = ctx.db.channels.get(&key.channel).await?;

                let patch = SlotPatch::video(report.status, report.file.clone(), report.error.clone());

                ctx.db.slots.ensure(channel.id, key.date, key.slot).await?;
                ctx.db
                    .slots
                    .update(channel.id, key.date, key.slot, &patch)
                    .await?;

                info!(?report, "Updated the video status");

                format!(
                    "✅ Video status set to {}:\n{} / {} / Video {}",
                    report.status, key.channel, key.date, key.slot
                )
            }
            Cmd::Subscribe => {
                if ctx.db.chats.subscribe(msg.chat.id).await? {
                    "🔔 This chat will receive reminders".to_owned()
                } else {
                    "This chat is already subscribed to reminders".to_owned()
                }
            }
            Cmd::Unsubscribe => {
                if ctx.db.chats.unsubscribe(msg.chat.id).await? {
                    "🔕 This chat will no longer receive reminders".to_owned()
                } else {
                    "This chat wasn't subscribed to reminders".to_owned()
                }
            }
        };

        ctx.bot.reply_text(msg, reply).await?;

        Ok(())
    }
}

fn format_day_status_or_empty(status: &DayStatus) -> String {
    if status.total == 0 {
        return format!("No data for {}.", status.date);
    }
    status::format_day_status(status, true)
}

fn format_setup_summary(summary: &SetupSummary) -> String {
    format!(
        "✅ {WINDOW_DAYS}-Day System Setup Complete!\n\n\
        • Database: {} days initialized\n\
        • Channels: {} active\n\
        • GDrive: {} date folders created\n\n\
        Channels: {}\n\n\
        Ready to use!",
        summary.days,
        summary.channels.len(),
        summary.date_folders,
        summary.channels.iter().join(", "),
    )
}

fn format_channel_list(channels: &[Channel]) -> String {
    if channels.is_empty() {
        return "No channels configured.".to_owned();
    }

    let channels = channels.iter().map(|channel| {
        let status = if channel.is_active { "✅" } else { "❌" };
        let voice = if channel.reference_audio_id.is_some() {
            "🎤"
        } else {
            "⚪"
        };

        format!(
            "{status} {} ({})\n   Videos/day: {} | Voice: {voice}",
            channel.channel_name, channel.channel_display_name, channel.daily_video_target
        )
    });

    std::iter::once("📋 CONFIGURED CHANNELS:\n".to_owned())
        .chain(channels)
        .join("\n")
}
