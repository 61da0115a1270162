//! Where announcements go.
//!
//! The runtime never talks to a chat network. It hands each line to a
//! [`MessageSink`]; the bot layer decides how the line reaches the channel.

use std::fmt;

use tokio::sync::mpsc;
use tracing::{info, warn};

use purrito_core::Scope;

/// One line the pet wants said in a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    /// Channel the line belongs to.
    pub scope: Scope,
    /// Text to send.
    pub text: String,
}

/// Receives announcements from the background loop.
///
/// Called from async context; implementations must not block.
pub trait MessageSink: Send + Sync {
    /// Deliver `text` to the channel behind `scope`.
    fn send(&self, scope: &Scope, text: &str);
}

// ---------------------------------------------------------------------------
// Channel sink
// ---------------------------------------------------------------------------

/// Forwards announcements into an unbounded mpsc channel.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Announcement>,
}

impl fmt::Debug for ChannelSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelSink")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl ChannelSink {
    /// A sink and the receiver the bot layer drains.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Announcement>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl MessageSink for ChannelSink {
    fn send(&self, scope: &Scope, text: &str) {
        let announcement = Announcement {
            scope: scope.clone(),
            text: text.to_string(),
        };
        if self.tx.send(announcement).is_err() {
            warn!(scope = %scope, "Announcement dropped, receiver closed");
        }
    }
}

// ---------------------------------------------------------------------------
// Log sink
// ---------------------------------------------------------------------------

/// Writes announcements to the log. Useful for dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl MessageSink for LogSink {
    fn send(&self, scope: &Scope, text: &str) {
        info!(scope = %scope, text, "Announcement");
    }
}
