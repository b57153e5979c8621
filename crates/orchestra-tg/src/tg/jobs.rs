//! Time-triggered reminders broadcast to the subscribed chats

use crate::pipeline::reminder::{self, ReminderEntry};
use crate::pipeline::status::{self, IncompleteSlot};
use crate::prelude::*;
use crate::{tg, Result};
use chrono::prelude::*;
use chrono::Days;
use futures::future::BoxFuture;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};

type JobFn = fn(Arc<tg::Ctx>) -> BoxFuture<'static, Result>;

enum Trigger {
    Every(Duration),

    /// Cron expression with seconds evaluated in the configured time zone
    Cron(&'static str),
}

/// Registers the reminder jobs and starts the scheduler. The scheduler
/// must be kept alive for the jobs to run.
pub(crate) async fn start(ctx: Arc<tg::Ctx>) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let jobs: [(&'static str, Trigger, JobFn); 4] = [
        (
            "tomorrow_incomplete",
            Trigger::Every(Duration::from_secs(30 * 60)),
            |ctx| Box::pin(tomorrow_incomplete(ctx)),
        ),
        (
            "today_ready",
            Trigger::Every(Duration::from_secs(3 * 60 * 60)),
            |ctx| Box::pin(today_ready(ctx)),
        ),
        (
            "morning_checklist",
            Trigger::Cron("0 0 6 * * *"),
            |ctx| Box::pin(morning_checklist(ctx)),
        ),
        (
            "weekly_overview",
            Trigger::Cron("0 0 9 * * *"),
            |ctx| Box::pin(weekly_overview(ctx)),
        ),
    ];

    let tz = ctx.cfg.timezone;

    for (name, trigger, run) in jobs {
        let ctx = ctx.clone();

        let job = match trigger {
            Trigger::Every(period) => {
                Job::new_repeated_async(period, move |_id, _scheduler| {
                    run_job(ctx.clone(), name, run)
                })?
            }
            Trigger::Cron(schedule) => {
                Job::new_async_tz(schedule, tz, move |_id, _scheduler| {
                    run_job(ctx.clone(), name, run)
                })?
            }
        };

        scheduler.add(job).await?;
    }

    scheduler.start().await?;

    info!(%tz, "Scheduled reminder jobs");

    Ok(scheduler)
}

fn run_job(ctx: Arc<tg::Ctx>, name: &'static str, run: JobFn) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async move {
        let result = run(ctx)
            .with_duration_log("Scheduled job finished")
            .instrument(info_span!("job", name))
            .await;

        if let Err(err) = result {
            error!(err = tracing_err(&err), name, "Scheduled job failed");
        }
    })
}

async fn send_reminder(ctx: &tg::Ctx, entry: &ReminderEntry) -> Result {
    let delivered = ctx.broadcast(&entry.text).await?;

    let kind: &'static str = entry.kind.into();
    metrics::counter!("reminders_sent_total", "kind" => kind).increment(delivered as u64);

    ctx.db.schedules.record_reminder(entry).await
}

async fn tomorrow_incomplete(ctx: Arc<tg::Ctx>) -> Result {
    let tomorrow = ctx.cfg.today() + Days::new(1);

    let rows = ctx.db.slots.rows_for_date(tomorrow).await?;
    let incomplete = IncompleteSlot::from_rows(&rows);
    let marker = ctx.db.schedules.marker(tomorrow).await?;

    if !reminder::should_send_tomorrow_incomplete(&incomplete, marker, Utc::now()) {
        debug!(
            incomplete = incomplete.len(),
            ?marker,
            "Skipping the tomorrow-incomplete reminder"
        );
        return Ok(());
    }

    send_reminder(&ctx, &ReminderEntry::tomorrow_incomplete(tomorrow, &incomplete)).await
}

async fn today_ready(ctx: Arc<tg::Ctx>) -> Result {
    let today = ctx.cfg.today();

    let status = ctx.day_status(today).await?;
    let marker = ctx.db.schedules.marker(today).await?;

    if !reminder::should_send_today_ready(&status, marker, Utc::now()) {
        debug!(
            completed = status.completed,
            total = status.total,
            ?marker,
            "Skipping the today-ready reminder"
        );
        return Ok(());
    }

    let link = ctx.folder_link(today).await?;
    let deadline = ctx.deadline(today).await?;

    send_reminder(
        &ctx,
        &ReminderEntry::today_ready(&status, link.as_deref(), deadline),
    )
    .await
}

async fn morning_checklist(ctx: Arc<tg::Ctx>) -> Result {
    let today = ctx.cfg.today();
    let status = ctx.day_status(today).await?;

    if status.total == 0 {
        info!(%today, "No slots for today, skipping the morning checklist");
    } else {
        let deadline = ctx.deadline(today).await?;
        let text = status::format_morning_checklist(&status, deadline);
        let delivered = ctx.broadcast(&text).await?;

        metrics::counter!("reminders_sent_total", "kind" => "morning_checklist")
            .increment(delivered as u64);
    }

    let cutoff = today - Days::new(ctx.archive.folder_age_days.into());
    ctx.db.folders.archive_before(cutoff).await?;

    Ok(())
}

async fn weekly_overview(ctx: Arc<tg::Ctx>) -> Result {
    let overview = ctx.week_overview().await?;

    if overview.total == 0 {
        info!("No slots in the schedule window, skipping the weekly overview");
        return Ok(());
    }

    let text = format!(
        "🌅 GOOD MORNING - WEEKLY OVERVIEW\n\n{}",
        status::format_week_overview(&overview, ctx.cfg.today())
    );

    let delivered = ctx.broadcast(&text).await?;

    metrics::counter!("reminders_sent_total", "kind" => "weekly_overview")
        .increment(delivered as u64);

    Ok(())
}
