//! Runtime services and shared state for relay-bot.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    interaction::dispatcher::Dispatcher,
    service::{chat::ChatClient, completion::CompletionClient},
};

/// Depth of the queue between the socket transport and the dispatcher.  The
/// transport acknowledges envelopes as it receives them, so the queue only
/// needs to absorb short bursts while one completion call is in flight.
const EVENT_QUEUE_DEPTH: usize = 32;

/// Runtime service context that can be shared across the application.
///
/// This struct holds the completion client, the chat client, and the
/// configuration.  It is designed to be trivially cloneable, allowing it to
/// be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The completion client instance.
    pub completion: CompletionClient,
    /// The chat client instance.
    pub chat: ChatClient,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Initialize the completion client.
        let completion = CompletionClient::openai(&config);

        // Initialize the slack client.
        let chat = ChatClient::slack(&config).await?;

        Ok(Self { config, completion, chat })
    }

    /// Serve events until the chat connection shuts down.
    pub async fn start(&self) -> Void {
        let cancel = CancellationToken::new();
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);

        // One dedicated task consumes the event queue.
        let dispatcher = Dispatcher::new(self.completion.clone(), self.chat.clone());
        let worker = tokio::spawn(dispatcher.run(events_rx, cancel.clone()));

        // Serve the socket connection.  Returns once the process receives a
        // termination signal.
        let served = self.chat.start(events_tx).await;

        // Stop the dispatch loop; an event already being handled is allowed
        // to finish its current step.
        cancel.cancel();
        worker.await??;

        served
    }
}
