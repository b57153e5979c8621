//! Domain core of the upload pipeline. Nothing here talks to Telegram,
//! the database or Google Drive directly.

pub(crate) mod assign;
pub(crate) mod model;
pub(crate) mod reminder;
pub(crate) mod status;

pub(crate) use assign::*;
pub(crate) use model::*;
