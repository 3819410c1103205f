//! Operator notices.
//!
//! While the console owns the terminal, log lines written to stderr would
//! tear the alternate screen. [`NoticeLayer`] takes the place of the fmt
//! layer: it forwards `WARN` and `ERROR` events over a channel and the footer
//! shows the most recent one.

use std::fmt::{self, Write as _};

use chrono::{DateTime, Local};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::{Layer, layer::Context};

/// A warning or error raised while the console was running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// When the event was recorded.
    pub timestamp: DateTime<Local>,
    /// `WARN` or `ERROR`.
    pub level: Level,
    /// Message followed by any structured fields.
    pub message: String,
}

/// Tracing layer forwarding warnings and errors to the console.
#[derive(Debug)]
pub struct NoticeLayer {
    tx: UnboundedSender<Notice>,
}

impl NoticeLayer {
    /// Create a layer and the receiver the console drains.
    pub fn channel() -> (Self, UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl<S: Subscriber> Layer<S> for NoticeLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        if level > Level::WARN {
            return;
        }

        let mut visitor = NoticeVisitor::default();
        event.record(&mut visitor);

        let notice = Notice { timestamp: Local::now(), level, message: visitor.finish() };

        // Console already gone
        let _ = self.tx.send(notice);
    }
}

#[derive(Default)]
struct NoticeVisitor {
    message: String,
    fields: String,
}

impl NoticeVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields
        } else {
            format!("{} ({})", self.message, self.fields)
        }
    }

    fn push_field(&mut self, field: &Field, value: fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={}", field.name(), value);
    }
}

impl Visit for NoticeVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field, format_args!("{value}"));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push_field(field, format_args!("{value:?}"));
        }
    }
}
