//! Unified request and response types for xlate

use serde::{Deserialize, Serialize};

/// Speaker of one conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role
{   System
  , User
  , Assistant
}

impl Role
{   /// Wire name shared by the chat-completion style vendors
    pub fn as_str(&self) -> &'static str
    {   match self
        {   Role::System => "system"
          , Role::User => "user"
          , Role::Assistant => "assistant"
        }
    }
}

/// One conversation turn. Built per request and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message
{   pub role: Role
  , pub text: String
  , /// Raw image bytes; encoded by the adapter
    pub image: Option<Vec<u8>>
}

impl Message
{   pub fn system(text: impl Into<String>) -> Self
    {   Message { role: Role::System, text: text.into(), image: None }
    }

    pub fn user(text: impl Into<String>) -> Self
    {   Message { role: Role::User, text: text.into(), image: None }
    }

    pub fn assistant(text: impl Into<String>) -> Self
    {   Message { role: Role::Assistant, text: text.into(), image: None }
    }

    /// User turn carrying an image alongside its text
    pub fn user_with_image(
      text: impl Into<String>
    , image: Vec<u8>
    ) -> Self
    {   Message { role: Role::User, text: text.into(), image: Some(image) }
    }

    pub fn has_image(&self) -> bool
    {   self.image.is_some()
    }
}

/// Tunables of one vendor call, built fresh from settings per call
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig
{   pub credential: String
  , pub model: String
  , pub temperature: f32
  , pub max_tokens: u32
  , pub enable_reasoning: bool
}

impl RequestConfig
{   pub fn new(
      credential: impl Into<String>
    , model: impl Into<String>
    ) -> Self
    {   RequestConfig
        {   credential: credential.into()
          , model: model.into()
          , temperature: crate::config::DEFAULT_TEMPERATURE
          , max_tokens: crate::config::DEFAULT_MAX_TOKENS
          , enable_reasoning: false
        }
    }

    pub fn with_reasoning(mut self, enable: bool) -> Self
    {   self.enable_reasoning = enable;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self
    {   self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self
    {   self.temperature = temperature;
        self
    }
}

/// Result resolved from a vendor reply.
/// Only `text` reaches the caller; the rest is diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedResult
{   pub text: String
  , pub detected_type: Option<String>
  , pub reasoning_trace: Option<String>
}

impl ParsedResult
{   pub fn plain(text: impl Into<String>) -> Self
    {   ParsedResult
        {   text: text.into()
          , ..Default::default()
        }
    }
}

/// What the caller wants processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationInput
{   Text(String)
  , Image(Vec<u8>)
}

impl TranslationInput
{   pub fn is_image(&self) -> bool
    {   matches!(self, TranslationInput::Image(_))
    }

    /// Text the answer is measured against; empty for images
    pub fn text(&self) -> &str
    {   match self
        {   TranslationInput::Text(t) => t
          , TranslationInput::Image(_) => ""
        }
    }
}

/// Inbound request from the front end
#[derive(Debug, Clone)]
pub struct TranslationRequest
{   pub input: TranslationInput
  , /// Explicit mode; resolved from settings when absent
    pub mode: Option<crate::mode::Mode>
  , /// None means "detect"
    pub source_language: Option<String>
  , pub target_language: String
  , /// Free-text pair used by `Mode::TemporaryCustom`
    pub perception: Option<String>
  , pub instruction: Option<String>
}

impl TranslationRequest
{   pub fn text(
      text: impl Into<String>
    , target_language: impl Into<String>
    ) -> Self
    {   TranslationRequest
        {   input: TranslationInput::Text(text.into())
          , mode: None
          , source_language: None
          , target_language: target_language.into()
          , perception: None
          , instruction: None
        }
    }

    pub fn image(
      bytes: Vec<u8>
    , target_language: impl Into<String>
    ) -> Self
    {   TranslationRequest
        {   input: TranslationInput::Image(bytes)
          , mode: None
          , source_language: None
          , target_language: target_language.into()
          , perception: None
          , instruction: None
        }
    }

    pub fn with_mode(mut self, mode: crate::mode::Mode) -> Self
    {   self.mode = Some(mode);
        self
    }

    pub fn with_source(mut self, language: impl Into<String>) -> Self
    {   self.source_language = Some(language.into());
        self
    }

    pub fn with_custom(
      mut self
    , perception: impl Into<String>
    , instruction: impl Into<String>
    ) -> Self
    {   self.perception = Some(perception.into());
        self.instruction = Some(instruction.into());
        self
    }
}

/// Outbound record handed to the history collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRecord
{   pub input: TranslationInput
  , pub output: String
  , pub source_language: Option<String>
  , pub target_language: String
  , pub mode: crate::mode::Mode
  , pub provider: crate::Provider
  , pub model: String
}
