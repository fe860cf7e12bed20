//! Library root for `relay-bot`.
//!
//! Relay-bot is a Slack assistant that answers @-mentions with text
//! completions:
//! - Listens on a socket-mode connection for app-mention events
//! - Strips the mention token from the message to form a prompt
//! - Forwards the prompt to a text-completion service
//! - Posts the returned text back into the originating channel
//!
//! The bot integrates with Slack for chat and OpenAI for completions. The
//! architecture is built around extensible traits that allow for different
//! implementations of each service.

#[deny(missing_docs)]
pub mod base;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the relay-bot runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with the completion and chat clients
/// - Starts the event dispatch loop for processing mentions
pub async fn start(config: Config) -> Void {
    info!("Starting relay-bot ...");

    // Start the crypto provider.
    crypto::ring::default_provider().install_default().unwrap();

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
