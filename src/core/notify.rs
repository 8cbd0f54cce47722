//! User-facing notifications.
//!
//! Saves, searches and subscription failures report their outcome through a
//! [`Notifier`]. The desk binary forwards notices to the log; a UI would show
//! them as transient toasts.

use serde::Serialize;
use tracing::{Level, error, info};

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// An operation completed
    Success,
    /// Informational hint, nothing failed
    Info,
    /// An operation failed
    Error,
}

impl NoticeLevel {
    /// Log level a notice of this severity is recorded at.
    #[must_use]
    pub const fn log_level(self) -> Level {
        match self {
            Self::Success | Self::Info => Level::INFO,
            Self::Error => Level::ERROR,
        }
    }
}

/// One transient notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Severity
    pub level: NoticeLevel,
    /// Text shown to staff
    pub message: String,
}

/// Sink for notifications.
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Delivers a notice.
    fn notify(&self, notice: Notice);

    /// Delivers a success notice.
    fn success(&self, message: String) {
        self.notify(Notice {
            level: NoticeLevel::Success,
            message,
        });
    }

    /// Delivers an informational notice.
    fn info(&self, message: String) {
        self.notify(Notice {
            level: NoticeLevel::Info,
            message,
        });
    }

    /// Delivers an error notice.
    fn error(&self, message: String) {
        self.notify(Notice {
            level: NoticeLevel::Error,
            message,
        });
    }
}

/// Forwards notices to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        if notice.level.log_level() == Level::ERROR {
            error!(target: "desk::notice", "{}", notice.message);
        } else {
            info!(target: "desk::notice", severity = ?notice.level, "{}", notice.message);
        }
    }
}
