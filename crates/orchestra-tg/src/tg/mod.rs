//! Telegram bot: commands, content intake, the selection wizard and the
//! scheduled reminders

mod assigner;
mod cmd;
mod config;
mod content;
mod jobs;
mod wizard;

use crate::pipeline::status::{DayStatus, WeekOverview};
use crate::pipeline::{self, FolderRecord};
use crate::prelude::*;
use crate::{db, drive, Result};
use assigner::ContentAssigner;
use chrono::prelude::*;
use dptree::di::DependencyMap;
use itertools::Itertools;
use std::sync::Arc;
use teloxide::adaptors::{CacheMe, Throttle, Trace};
use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

pub(crate) use config::*;

pub(crate) type Bot = Trace<CacheMe<Throttle<teloxide::Bot>>>;

pub(crate) struct Ctx {
    bot: Bot,
    db: Arc<db::Repo>,
    drive: Option<Arc<drive::DriveTree>>,
    cfg: Arc<Config>,
    archive: ArchiveConfig,
    sessions: wizard::SessionStore,
    albums: content::AlbumBuffer,
    assigner: ContentAssigner,
}

pub(crate) struct RunBotOptions {
    pub(crate) tg_cfg: Config,
    pub(crate) archive_cfg: ArchiveConfig,
    pub(crate) db: db::Repo,
    pub(crate) drive: Option<drive::DriveTree>,
}

/// Result of initializing the schedule window
#[derive(Debug)]
pub(crate) struct SetupSummary {
    pub(crate) days: usize,
    pub(crate) channels: Vec<String>,
    pub(crate) date_folders: usize,
}

impl Ctx {
    pub(crate) async fn day_status(&self, date: NaiveDate) -> Result<DayStatus> {
        let rows = self.db.slots.rows_for_date(date).await?;
        Ok(DayStatus::from_rows(date, &rows))
    }

    pub(crate) async fn week_overview(&self) -> Result<WeekOverview> {
        let mut days = vec![];
        for date in pipeline::window_dates(self.cfg.today()) {
            days.push(self.day_status(date).await?);
        }
        Ok(WeekOverview::from_days(days))
    }

    /// Deadline stored for the date, or the configured default one
    pub(crate) async fn deadline(&self, date: NaiveDate) -> Result<NaiveTime> {
        let schedule = self.db.schedules.get(date).await?;
        Ok(schedule
            .map(|schedule| schedule.deadline_time)
            .unwrap_or(self.cfg.upload_deadline))
    }

    pub(crate) async fn folder_link(&self, date: NaiveDate) -> Result<Option<String>> {
        let schedule_link = self
            .db
            .schedules
            .get(date)
            .await?
            .and_then(|schedule| schedule.gdrive_folder_link);

        if schedule_link.is_some() {
            return Ok(schedule_link);
        }

        self.db.folders.date_folder_link(date).await
    }

    async fn active_channel_names(&self) -> Result<Vec<String>> {
        Ok(self
            .db
            .channels
            .list(true)
            .await?
            .into_iter()
            .map(|channel| channel.channel_name)
            .collect())
    }

    /// Creates the slots of every active channel for each day of the window
    /// and mirrors the window in Google Drive if it's configured.
    #[instrument(skip_all)]
    pub(crate) async fn setup_window(&self) -> Result<SetupSummary> {
        let dates = pipeline::window_dates(self.cfg.today());

        let mut days = 0;
        for &date in &dates {
            let created = self.db.slots.create_day_skeleton(date).await?;
            debug!(%date, created, "Initialized the day");
            days += 1;
        }

        let channels = self.active_channel_names().await?;

        let Some(drive) = &self.drive else {
            info!(days, "Google Drive is not configured, skipping the folder tree");
            return Ok(SetupSummary {
                days,
                channels,
                date_folders: 0,
            });
        };

        let mut date_folders = 0;

        for &date in &dates {
            let result = async {
                let tree = drive.create_date_tree(date, &channels).await?;
                self.store_folders(&tree.records).await?;

                if let Some(link) = &tree.date_folder.web_view_link {
                    self.db.schedules.set_folder_link(date, link).await?;
                }

                Ok::<_, crate::Error>(())
            }
            .await;

            match result {
                Ok(()) => date_folders += 1,
                Err(err) => warn!(
                    err = tracing_err(&err),
                    %date,
                    "Failed to create the date folder tree, skipping the date"
                ),
            }
        }

        info!(days, date_folders, "Schedule window is ready");

        Ok(SetupSummary {
            days,
            channels,
            date_folders,
        })
    }

    async fn store_folders(&self, records: &[FolderRecord]) -> Result {
        for record in records {
            self.db.folders.upsert(record).await?;
        }
        Ok(())
    }

    /// Chats from the config and the ones that subscribed at runtime
    async fn broadcast_destinations(&self) -> Result<Vec<ChatId>> {
        let subscribed = self.db.chats.list().await?;

        Ok(self
            .cfg
            .reminder_chats
            .iter()
            .copied()
            .chain(subscribed)
            .unique()
            .collect())
    }

    /// Sends the message to every destination. A failure to deliver to one
    /// of them doesn't stop the rest. Returns the number of deliveries.
    pub(crate) async fn broadcast(&self, text: &str) -> Result<usize> {
        let destinations = self.broadcast_destinations().await?;

        if destinations.is_empty() {
            warn!("There are no chats to broadcast the message to");
            return Ok(0);
        }

        let mut delivered = 0;

        for chat in destinations {
            match self.bot.send_message(chat, text).await {
                Ok(_) => delivered += 1,
                Err(err) => warn!(
                    err = tracing_err(&err),
                    %chat,
                    "Failed to deliver the broadcast message"
                ),
            }
        }

        Ok(delivered)
    }
}

pub(crate) async fn run_bot(opts: RunBotOptions) -> Result {
    let mut di = DependencyMap::new();

    let bot: Bot = teloxide::Bot::new(opts.tg_cfg.token.clone())
        .throttle(Default::default())
        .cache_me()
        .trace(teloxide::adaptors::trace::Settings::all());

    let db = Arc::new(opts.db);
    let drive = opts.drive.map(Arc::new);

    let ctx = Arc::new(Ctx {
        assigner: ContentAssigner {
            db: db.clone(),
            drive: drive.clone(),
        },
        bot: bot.clone(),
        db,
        drive,
        cfg: Arc::new(opts.tg_cfg),
        archive: opts.archive_cfg,
        sessions: Default::default(),
        albums: Default::default(),
    });

    di.insert(ctx.clone());

    info!("Starting bot...");

    bot.set_my_commands(cmd::regular::Cmd::bot_commands())
        .await?;

    let mut scheduler = jobs::start(ctx).await?;

    let handler = dptree::entry()
        .inspect(|update: Update| {
            metrics::counter!("tg_updates_total", "kind" => update.kind.discriminator())
                .increment(1);
        })
        .branch(
            Update::filter_message()
                .filter_command::<cmd::regular::Cmd>()
                .endpoint(cmd::handle::<cmd::regular::Cmd>()),
        )
        .branch(
            Update::filter_message()
                .chain(dptree::filter_map(content::filter))
                .endpoint(content::handle),
        )
        .branch(Update::filter_callback_query().endpoint(wizard::handle_callback_query))
        .inspect(|update: Update| {
            metrics::counter!("tg_updates_skipped_total", "kind" => update.kind.discriminator())
                .increment(1);
        });

    Dispatcher::builder(bot, handler)
        .dependencies(di)
        // Regular chat messages are not handled, so the warning about
        // unhandled updates is suppressed with a noop default handler
        .default_handler(|_| std::future::ready(()))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Bot stopped");

    scheduler.shutdown().await?;

    Ok(())
}
