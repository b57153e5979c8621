use crate::{db, drive, tg};
use serde::de::DeserializeOwned;

pub struct Config {
    pub(crate) tg: tg::Config,
    pub(crate) archive: tg::ArchiveConfig,
    pub(crate) db: db::Config,

    /// Drive mirroring is switched off when `DRIVE_ROOT_FOLDER_ID` is not set
    pub(crate) drive: Option<drive::Config>,
}

impl Config {
    pub fn load_or_panic() -> Config {
        let drive = std::env::var_os("DRIVE_ROOT_FOLDER_ID")
            .is_some()
            .then(|| from_env_or_panic("DRIVE_"));

        Self {
            tg: from_env_or_panic("TG_"),
            archive: from_env_or_panic("ARCHIVE_"),
            db: from_env_or_panic("DATABASE_"),
            drive,
        }
    }
}

pub(crate) fn from_env_or_panic<T: DeserializeOwned>(prefix: &str) -> T {
    envy::prefixed(prefix).from_env().unwrap_or_else(|err| {
        panic!(
            "BUG: Couldn't load config from environment for {}: {:#?}",
            std::any::type_name::<T>(),
            err
        );
    })
}
