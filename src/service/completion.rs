//! Thin wrapper around async-openai for text completions.

use std::{ops::Deref, sync::Arc};

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{Choice, CreateCompletionRequestArgs},
};
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::base::{config::Config, types::Res};

/// Completion model used for all requests.
///
/// Fixed at construction time; there is currently no option to override it.
const COMPLETION_MODEL: &str = "gpt-3.5-turbo-instruct";

/// Nucleus sampling parameter.  Kept at the full distribution; narrowing the
/// sampling breadth is left to `temperature`.
const TOP_P: f32 = 1.0;

/// Default max tokens generated per completion.
const DEFAULT_MAX_TOKENS: u32 = 100;

/// Default sampling temperature.
const DEFAULT_TEMPERATURE: f32 = 0.0;

// Errors.

/// Completion failures beyond plain transport errors.
#[derive(Debug, Error, PartialEq)]
pub enum CompletionError {
    /// The service answered, but returned zero choices.  Degenerate rather
    /// than exceptional; callers that retry can match on this.
    #[error("no choices available")]
    NoChoices,
}

// Options.

/// Construction-time settings for a completion client.
///
/// Start from `Default` and override the fields you care about:
///
/// ```
/// use relay_bot::service::completion::CompletionOptions;
///
/// let options = CompletionOptions::default().with_max_tokens(256);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CompletionOptions {
    /// Max tokens generated per completion.
    pub max_tokens: u32,
    /// Sampling temperature, between 0 and 2.
    pub temperature: f32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl CompletionOptions {
    /// Override the max token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Override the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

// Traits.

/// Generic completion trait that clients must implement.
#[async_trait]
pub trait GenericCompletionClient {
    /// Produce a text continuation for the given prompt, possibly failing.
    ///
    /// The prompt may be empty; length constraints are the service's concern.
    async fn complete(&self, prompt: &str) -> Res<String>;
}

// Structs.

/// Completion client for the application.
///
/// This is trivially cloneable and can be passed around without the need for
/// `Arc` or `Mutex`.
#[derive(Clone)]
pub struct CompletionClient {
    inner: Arc<dyn GenericCompletionClient + Send + Sync + 'static>,
}

impl Deref for CompletionClient {
    type Target = dyn GenericCompletionClient + Send + Sync + 'static;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl CompletionClient {
    /// Wrap any completion implementation.
    pub fn new(inner: Arc<dyn GenericCompletionClient + Send + Sync + 'static>) -> Self {
        Self { inner }
    }

    /// Creates the OpenAI-backed completion client from application config.
    pub fn openai(config: &Config) -> Self {
        let options = CompletionOptions::default().with_max_tokens(config.openai_max_tokens).with_temperature(config.openai_temperature);

        Self::new(Arc::new(OpenAiCompletionClient::new(&config.openai_api_key, options)))
    }
}

// Specific implementations.

/// OpenAI completion client implementation.
#[derive(Clone)]
pub struct OpenAiCompletionClient {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiCompletionClient {
    /// Create a new OpenAI completion client.
    pub fn new(api_key: &str, options: CompletionOptions) -> Self {
        let cfg = OpenAIConfig::new().with_api_key(api_key);

        Self {
            client: Client::with_config(cfg),
            model: COMPLETION_MODEL.to_string(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        }
    }
}

#[async_trait]
impl GenericCompletionClient for OpenAiCompletionClient {
    #[instrument(skip(self))]
    async fn complete(&self, prompt: &str) -> Res<String> {
        debug!("Requesting completion from model {} ...", self.model);

        let request = CreateCompletionRequestArgs::default()
            .model(&self.model)
            .prompt(prompt)
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .top_p(TOP_P)
            .build()?;

        let response = self.client.completions().create(request).await?;

        first_choice(response.choices)
    }
}

/// Pick the text of the first returned choice, verbatim.
fn first_choice(choices: Vec<Choice>) -> Res<String> {
    let choice = choices.into_iter().next().ok_or(CompletionError::NoChoices)?;

    Ok(choice.text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice(text: &str) -> Choice {
        Choice {
            text: text.to_string(),
            index: 0,
            logprobs: None,
            finish_reason: None,
        }
    }

    #[test]
    fn options_default_to_100_tokens_and_zero_temperature() {
        let options = CompletionOptions::default();

        assert_eq!(options.max_tokens, 100);
        assert_eq!(options.temperature, 0.0);
    }

    #[test]
    fn options_overrides_apply() {
        let options = CompletionOptions::default().with_max_tokens(256).with_temperature(0.7);

        assert_eq!(options.max_tokens, 256);
        assert_eq!(options.temperature, 0.7);
    }

    #[test]
    fn first_choice_returns_the_text_verbatim() {
        let text = first_choice(vec![choice("  hi there \n")]).unwrap();

        assert_eq!(text, "  hi there \n");
    }

    #[test]
    fn first_choice_prefers_the_first_of_many() {
        let text = first_choice(vec![choice("first"), choice("second")]).unwrap();

        assert_eq!(text, "first");
    }

    #[test]
    fn zero_choices_is_a_distinct_error() {
        let err = first_choice(vec![]).unwrap_err();

        assert_eq!(err.downcast_ref::<CompletionError>(), Some(&CompletionError::NoChoices));
        assert_eq!(err.to_string(), "no choices available");
    }
}
