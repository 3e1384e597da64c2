//! Non-fatal, user-visible notifications.
//!
//! Session operations catch errors at their boundary and report them here
//! instead of propagating them to whatever renders the session.

use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
  Info,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub level:   Level,
  pub message: String,
}

impl Notice {
  pub fn info(message: impl Into<String>) -> Self {
    Self { level: Level::Info, message: message.into() }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self { level: Level::Error, message: message.into() }
  }
}

/// Sink for [`Notice`]s. Implementations must not block.
pub trait Notifier: Send + Sync {
  fn notify(&self, notice: Notice);
}

/// Writes notices to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
  fn notify(&self, notice: Notice) {
    match notice.level {
      Level::Info => tracing::info!(message = %notice.message, "notice"),
      Level::Error => tracing::warn!(message = %notice.message, "notice"),
    }
  }
}

/// Forward notices to a channel; a closed receiver is ignored.
impl Notifier for mpsc::UnboundedSender<Notice> {
  fn notify(&self, notice: Notice) { let _ = self.send(notice); }
}
