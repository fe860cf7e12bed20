//! The event dispatch loop: consumes inbound events one at a time and turns
//! mentions into completion-backed replies.

use anyhow::Context;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::{
    base::types::{AppMention, InboundEvent, OutboundReply, Void},
    interaction::mention::MentionStripper,
    service::{chat::ChatClient, completion::CompletionClient},
};

/// Attachment color for successful replies.
const REPLY_COLOR: &str = "#4af030";

/// Consumes inbound events and replies to mentions.
///
/// Events are handled strictly one at a time, in arrival order, so replies
/// are posted in the same relative order as their triggering mentions.  One
/// event's completion latency blocks the next event's start, which is
/// acceptable at the mention volume this bot serves.
pub struct Dispatcher {
    completion: CompletionClient,
    chat: ChatClient,
    mentions: MentionStripper,
}

impl Dispatcher {
    /// Create a new dispatcher over the given service clients.
    pub fn new(completion: CompletionClient, chat: ChatClient) -> Self {
        Self {
            completion,
            chat,
            mentions: MentionStripper::new(),
        }
    }

    /// Run the dispatch loop until cancellation fires or the event stream
    /// closes.
    ///
    /// Cancellation is observed at iteration boundaries only; an event
    /// already being handled finishes its current step.  Per-event failures
    /// are logged and never stop the loop.
    #[instrument(skip_all)]
    pub async fn run(self, mut events: mpsc::Receiver<InboundEvent>, cancel: CancellationToken) -> Void {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Shutting down event dispatcher");
                    return Ok(());
                }
                maybe_event = events.recv() => {
                    let Some(event) = maybe_event else {
                        info!("Event stream closed; stopping event dispatcher");
                        return Ok(());
                    };

                    if let Err(err) = self.handle_event(event).await {
                        error!("Error while handling event: {:#}", err);
                    }
                }
            }
        }
    }

    /// Classify one event and, for mentions, run the reply pipeline.
    #[instrument(skip_all)]
    async fn handle_event(&self, event: InboundEvent) -> Void {
        match event {
            InboundEvent::AppMention(mention) => self.handle_mention(mention).await,
            InboundEvent::Unsupported { kind } => {
                // Expected "nothing to do" branch, not a failure.
                warn!("Ignoring unsupported {} event", kind);
                Ok(())
            }
        }
    }

    async fn handle_mention(&self, mention: AppMention) -> Void {
        let prompt = self.mentions.strip(&mention.text);

        let text = self.completion.complete(&prompt).await.with_context(|| format!("failed to get completion for mention in channel {}", mention.channel_id))?;

        let reply = OutboundReply {
            channel_id: mention.channel_id,
            text,
            color: Some(REPLY_COLOR.to_string()),
        };

        self.chat.post_message(&reply).await.with_context(|| format!("failed to post reply to channel {}", reply.channel_id))?;

        Ok(())
    }
}
