use std::sync::Arc;
use tokio::sync::mpsc;
use log::{debug, trace, error, info};

use crate::config::SettingsProvider;
use crate::extract::{extract_json, parse_response};
use crate::prompt::{build_prompt, JsonPrompts, PromptContext, PromptSource};
use crate::providers::{HttpProviders, ProviderFactory};
use crate::request::{
  Message, TranslationInput, TranslationRecord, TranslationRequest,
};
use crate::retry::RetryPolicy;
use crate::validate::validate;

/// Receives every successful translation for storage
pub trait HistorySink: Send + Sync
{   fn record(&self, record: &TranslationRecord);
}

/// Top-level entry point: settings -> mode -> prompt -> vendor -> answer
#[derive(Clone)]
pub struct Translator
{   settings: Arc<dyn SettingsProvider>
  , prompts: Arc<dyn PromptSource>
  , providers: Arc<dyn ProviderFactory>
  , retry: RetryPolicy
  , history: Option<Arc<dyn HistorySink>>
}

impl Translator
{   /// Translator over real vendor endpoints with the default prompts
    pub fn new(settings: impl SettingsProvider + 'static) -> Self
    {   debug!("Creating Translator");
        Translator
        {   settings: Arc::new(settings)
          , prompts: Arc::new(JsonPrompts)
          , providers: Arc::new(HttpProviders::default())
          , retry: RetryPolicy::default()
          , history: None
        }
    }

    pub fn with_providers(
      mut self
    , providers: impl ProviderFactory + 'static
    ) -> Self
    {   self.providers = Arc::new(providers);
        self
    }

    pub fn with_prompts(
      mut self
    , prompts: impl PromptSource + 'static
    ) -> Self
    {   self.prompts = Arc::new(prompts);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self
    {   self.retry = retry;
        self
    }

    pub fn with_history(
      mut self
    , history: Arc<dyn HistorySink>
    ) -> Self
    {   self.history = Some(history);
        self
    }

    /// Run one request to completion.
    ///
    /// The vendor call, extraction, parsing and validation run inside the
    /// retry loop; only transport and vendor errors are attempted again.
    pub async fn translate(
      &self
    , request: TranslationRequest
    ) -> crate::Result<TranslationRecord>
    {   let settings = self.settings.snapshot();
        let is_image = request.input.is_image();
        let (provider, model) = settings.route(is_image);
        let config = settings.request_config(provider, model.clone());
        let mode = request.mode.clone()
          .unwrap_or_else(|| settings.resolve_mode());
        debug!(
          "Translating with {} / {} in {:?} mode (image: {})",
          provider, model, mode, is_image
        );

        let ctx = PromptContext
        {   input_text: request.input.text()
          , is_image
          , source_language: request.source_language.as_deref()
          , target_language: &request.target_language
        };
        let prompt = build_prompt(
          self.prompts.as_ref()
        , &mode
        , request.perception.as_deref()
        , request.instruction.as_deref()
        , &ctx
        );
        let messages = build_messages(prompt.system, prompt.user, &request.input);

        let adapter = self.providers.create(provider, &settings.api_base(provider));
        let original = request.input.text();
        let messages = &messages;
        let config = &config;

        let parsed = self.retry.run(move |attempt| {
          let adapter = adapter.clone();
          async move
          {   let raw = adapter.send(messages, config).await?;
              trace!("Attempt {} raw reply: {}", attempt + 1, raw);
              let extracted = extract_json(&raw);
              trace!("Extracted: {}", extracted);
              let parsed = parse_response(&extracted)?;
              validate(&parsed.text, original)?;
              Ok(parsed)
          }
        }).await
          .map_err(|e| {
            error!("Translation via {} failed: {}", provider, e);
            e
          })?;

        if let Some(kind) = &parsed.detected_type
        {   debug!("Vendor detected input type: {}", kind);
        }
        if parsed.reasoning_trace.is_some()
        {   trace!("Reply carried a reasoning trace");
        }

        let record = TranslationRecord
        {   input: request.input
          , output: parsed.text
          , source_language: request.source_language
          , target_language: request.target_language
          , mode
          , provider
          , model
        };
        info!("Translated via {} ({} chars)", provider, record.output.chars().count());

        if let Some(history) = &self.history
        {   history.record(&record);
        }
        Ok(record)
    }

    /// Run one request as its own task; the reply arrives on the receiver.
    /// Dropping the receiver does not cancel the request.
    pub fn spawn(&self, request: TranslationRequest) -> crate::TranslateReplyReceiver
    {   let (reply_tx, reply_rx): (crate::TranslateReplySender, _)
          = mpsc::unbounded_channel();
        let translator = self.clone();
        tokio::spawn(async move {
          let result = translator.translate(request).await;
          if reply_tx.send(result).is_err()
          {   debug!("Reply receiver dropped before completion");
          }
        });
        reply_rx
    }
}

fn build_messages(
  system: String
, user: String
, input: &TranslationInput
) -> Vec<Message>
{   let user = match input
    {   TranslationInput::Image(bytes) => Message::user_with_image(user, bytes.clone())
      , TranslationInput::Text(_) => Message::user(user)
    };
    vec![Message::system(system), user]
}
