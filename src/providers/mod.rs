//! Vendor adapters behind one `send` contract

pub mod chat_completions;
pub mod openai;
pub mod gemini;
pub mod zhipu;
pub mod deepseek;
pub mod minimax;

pub use deepseek::DeepSeekClient;
pub use gemini::GeminiClient;
pub use minimax::MiniMaxClient;
pub use openai::OpenAiClient;
pub use zhipu::ZhipuClient;

use async_trait::async_trait;
use base64::Engine;
use log::{error, trace};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::request::{Message, RequestConfig, Role};
use crate::Provider;

/// Timeout for plain text requests
pub const TEXT_TIMEOUT: Duration = Duration::from_secs(60);
/// Timeout for image and reasoning requests
pub const SLOW_TIMEOUT: Duration = Duration::from_secs(120);
/// Output ceiling used while a model is reasoning
pub const REASONING_MAX_TOKENS: u32 = 16384;

/// Uniform contract every vendor adapter implements
#[async_trait]
pub trait ChatProvider: Send + Sync
{   /// Vendor this adapter talks to
    fn provider(&self) -> Provider;

    /// Whether a model name belongs to a family that can think first
    fn is_reasoning_model(&self, model: &str) -> bool;

    /// Send one conversation and return the assistant's answer text
    async fn send(
      &self
    , messages: &[Message]
    , config: &RequestConfig
    ) -> crate::Result<String>;

    /// True when reasoning was asked for and the model supports it
    fn reasoning_active(&self, config: &RequestConfig) -> bool
    {   config.enable_reasoning && self.is_reasoning_model(&config.model)
    }
}

/// Builds adapters for a vendor and endpoint
pub trait ProviderFactory: Send + Sync
{   fn create(
      &self
    , provider: Provider
    , api_base: &str
    ) -> Arc<dyn ChatProvider>;
}

/// Real HTTP adapters sharing one connection pool
#[derive(Debug, Clone, Default)]
pub struct HttpProviders
{   http_client: reqwest::Client
}

impl HttpProviders
{   pub fn new(http_client: reqwest::Client) -> Self
    {   HttpProviders { http_client }
    }
}

impl ProviderFactory for HttpProviders
{   fn create(
      &self
    , provider: Provider
    , api_base: &str
    ) -> Arc<dyn ChatProvider>
    {   let http = self.http_client.clone();
        match provider
        {   Provider::OpenAI => Arc::new(OpenAiClient::new(http, api_base))
          , Provider::Gemini => Arc::new(GeminiClient::new(http, api_base))
          , Provider::Zhipu => Arc::new(ZhipuClient::new(http, api_base))
          , Provider::DeepSeek => Arc::new(DeepSeekClient::new(http, api_base))
          , Provider::MiniMax => Arc::new(MiniMaxClient::new(http, api_base))
        }
    }
}

/// Fixed set of adapters, endpoint ignored. Unregistered vendors fall
/// through to HTTP adapters on one shared client.
#[derive(Default, Clone)]
pub struct ProviderRegistry
{   providers: HashMap<Provider, Arc<dyn ChatProvider>>
  , fallback: HttpProviders
}

impl ProviderRegistry
{   pub fn new() -> Self
    {   Self::default()
    }

    pub fn with_fallback(mut self, fallback: HttpProviders) -> Self
    {   self.fallback = fallback;
        self
    }

    pub fn register(mut self, adapter: Arc<dyn ChatProvider>) -> Self
    {   self.providers.insert(adapter.provider(), adapter);
        self
    }
}

impl ProviderFactory for ProviderRegistry
{   fn create(
      &self
    , provider: Provider
    , api_base: &str
    ) -> Arc<dyn ChatProvider>
    {   match self.providers.get(&provider)
        {   Some(adapter) => adapter.clone()
          , None => self.fallback.create(provider, api_base)
        }
    }
}

// ===== Shared adapter helpers =====

/// Case-insensitive substring match against a family allow-list
pub fn matches_family(model: &str, markers: &[&str]) -> bool
{   let model = model.to_ascii_lowercase();
    markers.iter().any(|m| model.contains(m))
}

/// Credential from the config, or `MissingCredential`
pub fn require_credential(
  provider: Provider
, config: &RequestConfig
) -> crate::Result<&str>
{   let key = config.credential.trim();
    if key.is_empty()
    {   error!("No API key configured for {}", provider);
        return Err(crate::Error::MissingCredential(provider));
    }
    Ok(key)
}

pub fn request_timeout(messages: &[Message], reasoning: bool) -> Duration
{   if reasoning || messages.iter().any(Message::has_image)
    {   SLOW_TIMEOUT
    } else
    {   TEXT_TIMEOUT
    }
}

/// Output ceiling for a call
pub fn token_budget(config: &RequestConfig, reasoning: bool) -> u32
{   if reasoning
    {   config.max_tokens.max(REASONING_MAX_TOKENS)
    } else
    {   config.max_tokens
    }
}

/// Transport failure with the request URL dropped. Gemini carries its
/// credential in the query string, so the URL never reaches text.
pub fn transport_error(provider: Provider, e: reqwest::Error) -> crate::Error
{   let e = e.without_url();
    error!("{} HTTP error: {}", provider, e);
    crate::Error::Network(e.to_string())
}

/// Turn a raw response into JSON, classifying failures
pub async fn read_json(
  provider: Provider
, response: reqwest::Response
) -> crate::Result<Value>
{   let status = response.status();
    trace!("{} response status: {}", provider, status);
    let body = response.text().await
      .map_err(|e| transport_error(provider, e))?;

    if status == reqwest::StatusCode::UNAUTHORIZED
      || status == reqwest::StatusCode::FORBIDDEN
    {   error!("{} rejected credential: {}", provider, body);
        return Err(crate::Error::Unauthorized { provider, body });
    }
    if !status.is_success()
    {   error!("{} API error {}: {}", provider, status, body);
        return Err(crate::Error::VendorError
        {   provider
          , status: status.as_u16()
          , body
        });
    }

    trace!("{} raw body: {}", provider, body);
    serde_json::from_str(&body).map_err(|e| {
      error!("{} body is not JSON: {}", provider, e);
      crate::Error::malformed(format!("{} body is not JSON: {}", provider, e))
    })
}

/// Final answer text: think spans removed, must not be blank
pub fn finish_text(provider: Provider, text: &str) -> crate::Result<String>
{   let cleaned = strip_think_spans(text);
    if cleaned.is_empty()
    {   return Err(crate::Error::malformed(
          format!("{} returned no answer text", provider)
        ));
    }
    Ok(cleaned)
}

/// Remove every `<think>...</think>` span
pub fn strip_think_spans(text: &str) -> String
{   const OPEN: &str = "<think>";
    const CLOSE: &str = "</think>";
    let mut result = text.to_string();
    while let Some(start) = result.find(OPEN)
    {   match result[start..].find(CLOSE)
        {   Some(offset) => {
              result.replace_range(start..start + offset + CLOSE.len(), "");
            }
          , None => break
        }
    }
    result.trim().to_string()
}

/// Top-level keys of a body, for diagnostics
pub fn keys_of(body: &Value) -> Vec<String>
{   body.as_object()
      .map(|o| o.keys().cloned().collect())
      .unwrap_or_default()
}

/// MIME type from magic bytes; PNG when unknown
pub fn image_mime(bytes: &[u8]) -> &'static str
{   if bytes.starts_with(&[0xFF, 0xD8, 0xFF])
    {   "image/jpeg"
    } else if bytes.starts_with(b"GIF8")
    {   "image/gif"
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP"
    {   "image/webp"
    } else
    {   "image/png"
    }
}

pub fn encode_image(bytes: &[u8]) -> String
{   base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// `data:` URL for OpenAI-shaped image parts
pub fn image_data_url(bytes: &[u8]) -> String
{   format!("data:{};base64,{}", image_mime(bytes), encode_image(bytes))
}

/// Join all system turns; other turns returned in order
pub fn split_system(messages: &[Message]) -> (Option<String>, Vec<&Message>)
{   let mut system = Vec::new();
    let mut rest = Vec::new();
    for message in messages
    {   match message.role
        {   Role::System => system.push(message.text.as_str())
          , _ => rest.push(message)
        }
    }
    let system = if system.is_empty()
    {   None
    } else
    {   Some(system.join("\n\n"))
    };
    (system, rest)
}
