//! Thin wrapper around the agent-call collaborator: one prompt text
//! out, one reply text back. Everything else about the agent is
//! someone else's problem.

use crate::config::Config;
use anyhow::{Result, bail};
use openrouter_api::types::chat::{ChatCompletionRequest, Message};
use openrouter_api::{OpenRouterClient, Ready};
use std::time::Duration;
use tracing::info;

/// Builds the API client. A missing API key is a configuration error
/// and fails here, before any analysis work begins.
pub fn initialize_client(config: &Config) -> Result<OpenRouterClient<Ready>> {
    let api_key = if let Some(env_var) = config.backend.api_key_env_var() {
        match std::env::var(env_var) {
            Ok(val) => val,
            Err(_) => bail!("environment variable {} not set", env_var),
        }
    } else {
        // Backends without authentication still require a key-shaped string.
        "sk-or-v1-0000000000000000000000000000000000000000000000000000000000000000".to_string()
    };
    let client = OpenRouterClient::new()
        .with_base_url(config.backend.base_url())?
        .with_timeout(Duration::from_secs(config.timeout_seconds))
        .with_api_key(api_key)?;
    Ok(client)
}

/// Sends one rewrite prompt and returns the reply text.
pub async fn request_rewrite(
    client: &OpenRouterClient<Ready>,
    model: &str,
    prompt: &str,
) -> Result<String> {
    info!(model, "calling rewriting agent");

    let request = ChatCompletionRequest {
        model: model.to_string(),
        messages: vec![Message {
            role: "user".to_string(),
            content: prompt.to_string(),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        }],
        stream: None,
        response_format: None,
        tools: None,
        provider: None,
        models: None,
        transforms: None,
    };

    let response = client.chat()?.chat_completion(request).await?;
    let Some(choice) = response.choices.into_iter().next() else {
        bail!("agent returned no choices");
    };
    Ok(choice.message.content)
}
