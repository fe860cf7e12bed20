//! Common result aliases and the event/reply types exchanged between the
//! socket transport and the dispatch loop.

use serde::{Deserialize, Serialize};

/// Crate-wide error type.
pub type Err = anyhow::Error;
/// Crate-wide result type.
pub type Res<T> = Result<T, Err>;
/// Crate-wide result type for operations that return nothing.
pub type Void = Res<()>;

/// One event pulled off the socket-mode connection.
///
/// The transport acknowledges the envelope before the event enters the
/// dispatch queue, so every `InboundEvent` the dispatcher sees has already
/// been acked exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InboundEvent {
    /// The bot was @-mentioned in a channel.
    AppMention(AppMention),
    /// Any other event kind delivered by the stream; nothing to do.
    Unsupported {
        /// The kind of event received, for logging.
        kind: String,
    },
}

/// Payload of an app-mention event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppMention {
    /// The channel in which the mention was posted.
    pub channel_id: String,
    /// The raw message text, mention token included.
    pub text: String,
}

/// A reply to be posted back into the originating channel.
///
/// Built only on successful completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundReply {
    /// The channel to post to.
    pub channel_id: String,
    /// The completion text, verbatim.
    pub text: String,
    /// Optional display color for the attachment.
    pub color: Option<String>,
}
