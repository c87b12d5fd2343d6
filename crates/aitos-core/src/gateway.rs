//! AI gateway
//!
//! Wraps a [`TextGenerator`] so callers always get text back. Any provider
//! failure becomes a fixed, user-facing fallback message; the underlying
//! error is only logged. There are no retries.

use crate::ai::{ClaudeClient, GenerationRequest, OllamaClient, OpenAIClient, TextGenerator};
use crate::config::Config;
use crate::error::DashboardError;
use crate::history::CommandResponse;
use crate::module::Module;
use crate::prompt::{compose_command_prompt, compose_module_prompt, PromptContext};
use crate::provider::Provider;
use async_trait::async_trait;
use std::sync::Arc;

pub const FALLBACK_RESPONSE: &str =
    "I'm experiencing some technical difficulties. Please try again in a moment.";

pub const COMMAND_TOKEN_BUDGET: u32 = 300;
pub const MODULE_TOKEN_BUDGET: u32 = 400;

/// Fallback shown when a module request fails
pub fn module_fallback(module: Module) -> String {
    format!(
        "OSS BOT is currently processing your request for the {} module. \
         This feature provides insights into {}. \
         Please check back shortly for detailed analytics and recommendations.",
        module.id(),
        module.prompt().to_lowercase()
    )
}

/// Stand-in generator for a provider whose API key is missing
struct Unconfigured(Provider);

#[async_trait]
impl TextGenerator for Unconfigured {
    async fn generate_text(&self, _request: &GenerationRequest) -> anyhow::Result<String> {
        Err(DashboardError::ProviderNotConfigured(self.0.display_name()).into())
    }
}

#[derive(Clone)]
pub struct AiGateway {
    generator: Arc<dyn TextGenerator>,
    model: String,
}

impl AiGateway {
    pub fn new(generator: Arc<dyn TextGenerator>, model: impl Into<String>) -> Self {
        Self {
            generator,
            model: model.into(),
        }
    }

    /// Build a gateway for `provider` using keys and URLs from the config
    pub fn for_provider(provider: Provider, model: impl Into<String>, config: &Config) -> Self {
        let generator: Arc<dyn TextGenerator> = match provider {
            Provider::Ollama => Arc::new(OllamaClient::new(config.ollama_url())),
            Provider::Claude => match config.claude_api_key() {
                Some(key) => Arc::new(ClaudeClient::new(&key)),
                None => Arc::new(Unconfigured(provider)),
            },
            Provider::OpenAI => match config.openai_api_key() {
                Some(key) => Arc::new(OpenAIClient::new(&key)),
                None => Arc::new(Unconfigured(provider)),
            },
        };
        Self::new(generator, model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Compose the prompt for `prompt_text` with the injected context and ask
    /// the model. Never fails: errors and empty answers become the fallback.
    pub async fn generate(&self, prompt_text: &str, context: &PromptContext) -> String {
        let (prompt, max_tokens) = match context.module {
            Some(module) => (
                compose_module_prompt(module, prompt_text, context),
                MODULE_TOKEN_BUDGET,
            ),
            None => (compose_command_prompt(prompt_text, context), COMMAND_TOKEN_BUDGET),
        };
        tracing::debug!(model = %self.model, max_tokens, %prompt, "sending prompt");

        let request = GenerationRequest {
            model: self.model.clone(),
            prompt,
            max_tokens,
        };

        match self.generator.generate_text(&request).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                tracing::warn!(model = %self.model, "model returned an empty response");
                fallback_for(context.module)
            }
            Err(e) => {
                tracing::error!(model = %self.model, error = %e, "AI processing error");
                fallback_for(context.module)
            }
        }
    }

    /// Run a command-bar submission and build its history entry
    pub async fn run_command(&self, command: &str, context: &PromptContext) -> CommandResponse {
        let response = self.generate(command, context).await;
        CommandResponse::new(command.trim(), response)
            .with_module("command_bar")
            .with_channel("dashboard")
    }

    /// Run a quick-access module and build its history entry
    pub async fn run_module(&self, module: Module, context: &PromptContext) -> CommandResponse {
        let context = PromptContext {
            module: Some(module),
            ..context.clone()
        };
        let response = self.generate(module.prompt(), &context).await;
        CommandResponse::new(module.history_command(), response)
            .with_module(module.module_type())
            .with_channel("dashboard")
    }
}

fn fallback_for(module: Option<Module>) -> String {
    match module {
        Some(module) => module_fallback(module),
        None => FALLBACK_RESPONSE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::RosterStore;
    use crate::storage::MemoryStore;
    use std::sync::Mutex;

    /// Generator that replays a canned outcome and records what it was asked
    struct Scripted {
        outcome: Result<String, String>,
        calls: Mutex<Vec<GenerationRequest>>,
    }

    impl Scripted {
        fn new(outcome: Result<&str, &str>) -> Arc<Self> {
            Arc::new(Self {
                outcome: outcome.map(str::to_string).map_err(str::to_string),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn generate_text(&self, request: &GenerationRequest) -> anyhow::Result<String> {
            self.calls.lock().unwrap().push(request.clone());
            self.outcome.clone().map_err(|e| anyhow::anyhow!(e))
        }
    }

    fn context() -> PromptContext {
        PromptContext::new(&RosterStore::load(Arc::new(MemoryStore::new())))
    }

    #[tokio::test]
    async fn test_generate_returns_model_text() {
        let generator = Scripted::new(Ok("All hands on deck"));
        let gateway = AiGateway::new(generator.clone(), "gpt-4o-mini");

        let text = gateway.generate("status?", &context()).await;

        assert_eq!(text, "All hands on deck");
        let calls = generator.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].max_tokens, COMMAND_TOKEN_BUDGET);
        assert_eq!(calls[0].model, "gpt-4o-mini");
        assert!(calls[0].prompt.contains("status?"));
    }

    #[tokio::test]
    async fn test_failure_yields_fallback_once() {
        let generator = Scripted::new(Err("quota exceeded"));
        let gateway = AiGateway::new(generator.clone(), "gpt-4o-mini");

        let text = gateway.generate("hello", &context()).await;

        assert_eq!(text, FALLBACK_RESPONSE);
        assert_eq!(generator.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_text_yields_fallback() {
        let gateway = AiGateway::new(Scripted::new(Ok("  ")), "m");
        assert_eq!(gateway.generate("hello", &context()).await, FALLBACK_RESPONSE);
    }

    #[tokio::test]
    async fn test_run_module_uses_module_budget_and_fallback() {
        let generator = Scripted::new(Err("network down"));
        let gateway = AiGateway::new(generator.clone(), "m");

        let entry = gateway.run_module(Module::DailyOps, &context()).await;

        assert_eq!(entry.command, Module::DailyOps.history_command());
        assert_eq!(entry.response, module_fallback(Module::DailyOps));
        assert_eq!(entry.module_type.as_deref(), Some("daily_ops"));
        assert_eq!(generator.calls.lock().unwrap()[0].max_tokens, MODULE_TOKEN_BUDGET);
    }

    #[tokio::test]
    async fn test_run_command_trims_and_tags() {
        let gateway = AiGateway::new(Scripted::new(Ok("Hi!")), "m");
        let entry = gateway.run_command("  hello there ", &context()).await;
        assert_eq!(entry.command, "hello there");
        assert_eq!(entry.response, "Hi!");
        assert_eq!(entry.module_type.as_deref(), Some("command_bar"));
        assert_eq!(entry.channel.as_deref(), Some("dashboard"));
    }

    #[tokio::test]
    async fn test_unconfigured_provider_falls_back() {
        let request = GenerationRequest {
            model: "gpt-4o-mini".to_string(),
            prompt: "hi".to_string(),
            max_tokens: COMMAND_TOKEN_BUDGET,
        };
        let err = Unconfigured(Provider::OpenAI)
            .generate_text(&request)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ChatGPT (OpenAI) is not configured"));

        let gateway = AiGateway::new(Arc::new(Unconfigured(Provider::OpenAI)), "gpt-4o-mini");
        assert_eq!(gateway.generate("hi", &context()).await, FALLBACK_RESPONSE);
    }
}
