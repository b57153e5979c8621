mod config;
mod db;
mod drive;
mod error;
mod http;
mod observability;
mod pipeline;
mod tg;

pub mod util;

pub use crate::error::*;
pub use config::*;
pub use observability::*;

#[allow(unused_imports)]
mod prelude {
    pub(crate) use crate::error::prelude::*;
    pub(crate) use crate::http::prelude::*;
    pub(crate) use crate::observability::logging::prelude::*;
    pub(crate) use crate::util::prelude::*;
}

/// Run the telegram bot processing loop
pub async fn run(config: Config) -> Result<()> {
    let db = db::init(config.db).await?;

    let drive = config
        .drive
        .map(|cfg| drive::DriveTree::new(drive::DriveClient::new(cfg, http::create_client())));

    if drive.is_none() {
        tracing::warn!("Google Drive is not configured, folders won't be mirrored");
    }

    let opts = tg::RunBotOptions {
        tg_cfg: config.tg,
        archive_cfg: config.archive,
        db,
        drive,
    };

    tg::run_bot(opts).await
}
