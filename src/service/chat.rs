//! Wrapper around chat clients.

use crate::base::{
    config::Config,
    types::{AppMention, InboundEvent, OutboundReply, Res, Void},
};
use async_trait::async_trait;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use slack_morphism::prelude::*;
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use std::{ops::Deref, sync::Arc};

// Type aliases.

type FullClient = slack_morphism::SlackClient<SlackClientHyperConnector<HttpsConnector<HttpConnector>>>;

// Traits.

/// Generic "chat" trait that clients must implement.
#[async_trait]
pub trait GenericChatClient {
    /// Start the chat client listener, delivering inbound events into the
    /// given queue in arrival order.  Each envelope is acknowledged by the
    /// transport exactly once, before its event is queued.
    ///
    /// Returns once the connection is shut down.
    async fn start(&self, events: mpsc::Sender<InboundEvent>) -> Void;
    /// Post a reply to a channel.
    async fn post_message(&self, reply: &OutboundReply) -> Void;
}

// Structs.

/// User state for the slack socket client.
struct SlackUserState {
    events: mpsc::Sender<InboundEvent>,
}

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient + Send + Sync + 'static>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient + Send + Sync + 'static;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    /// Wrap any chat implementation.
    pub fn new(inner: Arc<dyn GenericChatClient + Send + Sync + 'static>) -> Self {
        Self { inner }
    }

    /// Creates a new Slack chat client.
    pub async fn slack(config: &Config) -> Res<Self> {
        let client = SlackChatClient::new(config).await?;
        Ok(Self::new(Arc::new(client)))
    }
}

impl From<SlackChatClient> for ChatClient {
    fn from(client: SlackChatClient) -> Self {
        Self { inner: Arc::new(client) }
    }
}

// Specific implementations.

/// Slack client implementation.
#[derive(Clone)]
pub struct SlackChatClient {
    app_token: SlackApiToken,
    bot_token: SlackApiToken,
    client: Arc<FullClient>,
}

impl SlackChatClient {
    /// Create a new Slack chat client.
    #[instrument(name = "SlackChatClient::new", skip_all)]
    pub async fn new(config: &Config) -> Res<Self> {
        // Initialize tokens.

        let app_token = SlackApiToken::new(SlackApiTokenValue(config.slack_app_token.clone()));
        let bot_token = SlackApiToken::new(SlackApiTokenValue(config.slack_bot_token.clone()));

        // Initialize the Slack client.

        let https_connector = HttpsConnector::<HttpConnector>::builder().with_native_roots()?.https_only().enable_all_versions().build();
        let connector = SlackClientHyperConnector::with_connector(https_connector);
        let client = Arc::new(slack_morphism::SlackClient::new(connector));

        // Validate the bot token up front and log who we are.

        let session = client.open_session(&bot_token);
        let bot_user = session.auth_test().await?;

        info!("Slack bot user ID: {}", bot_user.user_id.0);

        Ok(Self { app_token, bot_token, client })
    }
}

#[async_trait]
impl GenericChatClient for SlackChatClient {
    async fn start(&self, events: mpsc::Sender<InboundEvent>) -> Void {
        // Initialize the socket mode listener.

        let socket_mode_callbacks = SlackSocketModeListenerCallbacks::new()
            .with_command_events(handle_command_event)
            .with_interaction_events(handle_interaction_event)
            .with_push_events(handle_push_event);

        // Initialize the socket mode listener environment.

        let listener_environment = Arc::new(SlackClientEventsListenerEnvironment::new(self.client.clone()).with_user_state(SlackUserState { events }));

        let socket_mode_listener = Arc::new(SlackClientSocketModeListener::new(
            &SlackClientSocketModeConfig::new(),
            listener_environment.clone(),
            socket_mode_callbacks,
        ));

        // Register an app token to listen for events,
        socket_mode_listener.listen_for(&self.app_token).await?;

        // Start WS connections calling Slack API to get WS url for the token,
        // and wait for termination signals to shutdown.
        // There are also `.start()`/`.shutdown()` available to manage manually
        socket_mode_listener.serve().await;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn post_message(&self, reply: &OutboundReply) -> Void {
        let mut attachment = SlackMessageAttachment::new().with_text(reply.text.clone());

        if let Some(color) = &reply.color {
            attachment = attachment.with_color(color.clone());
        }

        let content = SlackMessageContent::new().with_attachments(vec![attachment]);

        let request = SlackApiChatPostMessageRequest::new(SlackChannelId(reply.channel_id.clone()), content).with_as_user(true);

        let session = self.client.open_session(&self.bot_token);

        let _ = session.chat_post_message(&request).await.map_err(|e| anyhow::anyhow!("Failed to post message: {}", e))?;

        Ok(())
    }
}

// Event conversion.

impl From<SlackEventCallbackBody> for InboundEvent {
    fn from(body: SlackEventCallbackBody) -> Self {
        match body {
            SlackEventCallbackBody::AppMention(event) => InboundEvent::AppMention(AppMention {
                channel_id: event.channel.0,
                text: event.content.text.unwrap_or_default(),
            }),
            SlackEventCallbackBody::Message(_) => InboundEvent::Unsupported { kind: "message".to_string() },
            SlackEventCallbackBody::ReactionAdded(_) => InboundEvent::Unsupported { kind: "reaction_added".to_string() },
            SlackEventCallbackBody::LinkShared(_) => InboundEvent::Unsupported { kind: "link_shared".to_string() },
            _ => InboundEvent::Unsupported { kind: "other".to_string() },
        }
    }
}

// Socket mode listener callbacks for Slack.

/// Handles command events from Slack.
async fn handle_command_event(
    event: SlackCommandEvent,
    _client: Arc<SlackHyperClient>,
    _states: SlackClientEventsUserState,
) -> Result<SlackCommandEventResponse, Box<dyn std::error::Error + Send + Sync>> {
    warn!("[COMMAND] {:#?}", event);
    Ok(SlackCommandEventResponse::new(SlackMessageContent::new().with_text("No app commands are currently supported.".into())))
}

/// Handles interaction events from Slack.
async fn handle_interaction_event(event: SlackInteractionEvent, _client: Arc<SlackHyperClient>, _states: SlackClientEventsUserState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    warn!("[INTERACTION] {:#?}", event);
    Ok(())
}

/// Handles push events from Slack.
///
/// The envelope has already been acknowledged by the listener; this just
/// hands the event to the dispatch loop in arrival order.
#[instrument(skip_all)]
async fn handle_push_event(event_callback: SlackPushEventCallback, _client: Arc<SlackHyperClient>, states: SlackClientEventsUserState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let states = states.read().await;
    let user_state = states.get_user_state::<SlackUserState>().ok_or(anyhow::anyhow!("Failed to get user state"))?;

    let event = InboundEvent::from(event_callback.event);

    user_state.events.send(event).await.map_err(|_| anyhow::anyhow!("Event dispatcher is no longer running"))?;

    Ok(())
}
