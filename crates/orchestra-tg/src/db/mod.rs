mod cfg;
mod channel;
mod chat;
mod error;
mod folder;
mod schedule;
mod slot;

use crate::prelude::*;
use crate::{err_ctx, Result};
use futures::prelude::*;

pub(crate) use cfg::*;
pub(crate) use channel::*;
pub(crate) use chat::*;
pub(crate) use error::*;
pub(crate) use folder::*;
pub(crate) use schedule::*;
pub(crate) use slot::*;

pub(crate) struct Repo {
    pub(crate) channels: ChannelRepo,
    pub(crate) slots: SlotRepo,
    pub(crate) schedules: ScheduleRepo,
    pub(crate) folders: FolderRepo,
    pub(crate) chats: ChatRepo,
}

impl Repo {
    fn new(db: sqlx::PgPool) -> Self {
        Self {
            channels: ChannelRepo::new(db.clone()),
            slots: SlotRepo::new(db.clone()),
            schedules: ScheduleRepo::new(db.clone()),
            folders: FolderRepo::new(db.clone()),
            chats: ChatRepo::new(db),
        }
    }
}

pub(crate) async fn init(cfg: Config) -> Result<Repo> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(cfg.pool_size)
        .connect(cfg.url.as_str())
        .await
        .map_err(err_ctx!(DbError::Connect))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(err_ctx!(DbError::Migrate))?;

    info!("Database is ready");

    Ok(Repo::new(pool))
}

/// Runs the query recording its duration in `db_query_duration_seconds`
async fn metered<T>(query: &'static str, fut: impl Future<Output = Result<T>> + Send) -> Result<T> {
    let (result, duration) = fut.with_duration().await;

    let result_label = if result.is_ok() { "ok" } else { "err" };

    metrics::histogram!(
        "db_query_duration_seconds",
        "query" => query,
        "result" => result_label
    )
    .record(duration);

    if let Err(err) = &result {
        debug!(query, err = tracing_err(err), duration = tracing_duration(duration), "Query failed");
    }

    result
}
