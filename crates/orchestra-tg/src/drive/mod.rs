//! Mirror of the upload schedule in Google Drive:
//! `root/<date>/<channel>/Video_<n>`

mod client;
mod tree;

use serde::Deserialize;

pub(crate) use client::*;
pub(crate) use tree::*;

#[derive(Deserialize)]
pub(crate) struct Config {
    /// Folder that holds the date folders
    pub(crate) root_folder_id: String,

    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) refresh_token: String,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum DriveError {
    #[error("Failed to obtain a Google Drive access token")]
    Auth { source: crate::Error },

    #[error("Google Drive folder name must not be empty (parent: {parent})")]
    EmptyFolderName { parent: String },
}
