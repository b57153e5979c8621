mod ext;
mod macros;

use crate::prelude::*;
use crate::util::DynError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing_error::SpanTrace;

pub(crate) use ext::*;
pub(crate) use macros::*;

pub(crate) mod prelude {
    pub(crate) use super::ext::ResultExt as _;
}

pub type Result<T = (), E = Error> = std::result::Result<T, E>;

/// Describes any possible error that may happen in the application lifetime.
#[derive(Clone)]
pub struct Error {
    imp: Arc<ErrorImp>,
}

struct ErrorImp {
    /// Short identifier mentioned in the chat reply, so that the
    /// corresponding log records can be found by it.
    id: String,
    kind: ErrorKind,

    // Participates only in debug impl
    spantrace: SpanTrace,
}

#[derive(Error, Debug)]
pub(crate) enum ErrorKind {
    #[error(transparent)]
    User {
        #[from]
        source: UserError,
    },

    #[error(transparent)]
    HttpClient {
        #[from]
        source: crate::http::HttpClientError,
    },

    #[error(transparent)]
    Drive {
        #[from]
        source: crate::drive::DriveError,
    },

    #[error(transparent)]
    Tg {
        #[from]
        source: teloxide::RequestError,
    },

    #[error(transparent)]
    Db {
        #[from]
        source: crate::db::DbError,
    },

    #[error(transparent)]
    Scheduler {
        #[from]
        source: tokio_cron_scheduler::JobSchedulerError,
    },

    /// Unrecoverable kind of error, that is not supposed to happen, but when
    /// it happens we can't do anything reasonable about it, so no structural
    /// error handling is possible, this error is just propagated to the top.
    #[error("FATAL: {message}")]
    Fatal {
        message: String,
        source: Option<Box<DynError>>,
    },
}

/// Errors caused by wrong input from the chat
#[derive(Debug, Error)]
pub(crate) enum UserError {
    #[error("Channel {name} not found")]
    ChannelNotFound { name: String },

    #[error("Channel {name} already exists")]
    ChannelAlreadyExists { name: String },

    #[error("Channel name '{name}' is too long, the limit is {max} bytes")]
    ChannelNameTooLong { name: String, max: usize },

    #[error("Invalid date '{input}', expected format YYYY-MM-DD")]
    InvalidDate { input: String },

    #[error("Invalid video number '{input}', expected a number from 1 to {max}")]
    InvalidVideoNumber { input: String, max: u8 },

    #[error("Invalid video status '{input}', expected one of: {expected}")]
    InvalidVideoStatus {
        input: String,
        expected: &'static str,
    },

    #[error("Invalid Google Drive file link '{input}'")]
    InvalidDriveLink { input: String },

    #[error("Usage: {usage}")]
    Usage { usage: &'static str },
}

impl Error {
    pub(crate) fn id(&self) -> &str {
        &self.imp.id
    }

    /// Errors that are most likely caused by a human sending wrong input.
    pub(crate) fn is_user_error(&self) -> bool {
        match &self.imp.kind {
            ErrorKind::User { .. } => true,
            ErrorKind::HttpClient { .. }
            | ErrorKind::Drive { .. }
            | ErrorKind::Tg { .. }
            | ErrorKind::Db { .. }
            | ErrorKind::Scheduler { .. }
            | ErrorKind::Fatal { .. } => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn kind(&self) -> &ErrorKind {
        &self.imp.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error (id: {}): {}", self.imp.id, self.imp.kind)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.imp.kind.source()
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)?;
        fmt::Display::fmt(&self.imp.spantrace, f)
    }
}

impl<T: Into<ErrorKind>> From<T> for Error {
    #[track_caller]
    fn from(kind: T) -> Self {
        let imp = ErrorImp {
            kind: kind.into(),
            id: nanoid::nanoid!(6),
            spantrace: SpanTrace::capture(),
        };

        let err = Self { imp: Arc::new(imp) };

        trace!(err = tracing_err(&err), "Created an error");

        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn user_errors_are_classified() {
        let err = err!(UserError::ChannelNotFound {
            name: "GYH".to_owned()
        });
        assert!(err.is_user_error());
        assert_eq!(err.id().len(), 6);
        assert_matches!(err.kind(), ErrorKind::User { .. });

        let err = fatal!("boom {}", 42);
        assert!(!err.is_user_error());
        assert_eq!(err.kind().to_string(), "FATAL: boom 42");
    }

    #[test]
    fn fatal_context_keeps_the_source() {
        let result = "x".parse::<u8>();
        let err = result.fatal_ctx(|| "Invalid video number").unwrap_err();

        assert!(!err.is_user_error());
        assert_eq!(err.kind().to_string(), "FATAL: Invalid video number");
        assert!(std::error::Error::source(&err).is_some());
    }
}
