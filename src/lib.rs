pub mod error;
pub mod config;
pub mod providers;
pub mod request;
pub mod retry;
pub mod mode;
pub mod prompt;
pub mod extract;
pub mod validate;
pub mod client;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use client::{HistorySink, Translator};
pub use config::{Settings, SettingsProvider, StaticSettings, VendorSettings};
pub use error::{Error, ErrorKind, ValidationFailure};
pub use mode::{Mode, Preset};
pub use request::{
  Message, ParsedResult, RequestConfig, Role, TranslationInput,
  TranslationRecord, TranslationRequest,
};

/*

xlate: translate or recognise text through one of several
interchangeable AI vendors. The interesting part is the layer
between the caller's intent and the vendor APIs, which disagree
on request shape, response shape and reasoning switches.

xlate/
├── src/
│   ├── lib.rs          # Provider identity, re-exports
│   ├── error.rs        # Error taxonomy with explicit kind tags
│   ├── config.rs       # Stored settings and the settings capability
│   ├── request.rs      # Message / RequestConfig / result types
│   ├── mode.rs         # Mode + preset resolution
│   ├── prompt.rs       # Prompt source interface
│   ├── extract.rs      # JSON isolation and result-key resolution
│   ├── validate.rs     # Semantic rejection of bad answers
│   ├── retry.rs        # Sequential exponential backoff
│   ├── client.rs       # Translator orchestrator
│   └── providers/      # One adapter per vendor
└── tests/

*/

pub type Result<T> = std::result::Result<T, crate::error::Error>;

// ===== Translate (spawned) =====

pub type TranslateReply = Result<crate::request::TranslationRecord>;
pub type TranslateReplySender
  = tokio::sync::mpsc::UnboundedSender<TranslateReply>;
pub type TranslateReplyReceiver
  = tokio::sync::mpsc::UnboundedReceiver<TranslateReply>;

/// Every vendor xlate can talk to.
/// Each variant maps to exactly one adapter and one base endpoint.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
  Deserialize, Serialize,
)]
pub enum Provider
{   /// OpenAI chat completions (GPT-4o, o-series)
    OpenAI
  , /// Google AI Studio generateContent (Gemini)
    Gemini
  , /// Zhipu BigModel (GLM)
    Zhipu
  , /// DeepSeek chat completions
    DeepSeek
  , /// MiniMax, Anthropic-compatible messages endpoint
    MiniMax
}

impl Provider
{   pub const ALL: [Provider; 5] = [
      Provider::OpenAI
    , Provider::Gemini
    , Provider::Zhipu
    , Provider::DeepSeek
    , Provider::MiniMax
    ];

    /// Model used when settings leave the text model blank
    pub fn default_model(&self) -> &'static str
    {   match self
        {   Provider::OpenAI => "gpt-4o-mini"
          , Provider::Gemini => "gemini-2.0-flash"
          , Provider::Zhipu => "glm-4-flash"
          , Provider::DeepSeek => "deepseek-chat"
          , Provider::MiniMax => "MiniMax-M2"
        }
    }

    /// Model used for image recognition when settings leave it blank
    pub fn default_image_model(&self) -> &'static str
    {   match self
        {   Provider::OpenAI => "gpt-4o-mini"
          , Provider::Gemini => "gemini-2.0-flash"
          , Provider::Zhipu => "glm-4v-flash"
          , Provider::DeepSeek => "deepseek-chat"
          , Provider::MiniMax => "MiniMax-M2"
        }
    }

    /// Base endpoint of the vendor API, without the operation path
    pub fn default_endpoint(&self) -> &'static str
    {   match self
        {   Provider::OpenAI => "https://api.openai.com/v1"
          , Provider::Gemini =>
              "https://generativelanguage.googleapis.com/v1beta"
          , Provider::Zhipu => "https://open.bigmodel.cn/api/paas/v4"
          , Provider::DeepSeek => "https://api.deepseek.com"
          , Provider::MiniMax => "https://api.minimax.io/anthropic/v1"
        }
    }

    /// Upper-case token used in environment variable names
    pub fn env_token(&self) -> &'static str
    {   match self
        {   Provider::OpenAI => "OPENAI"
          , Provider::Gemini => "GEMINI"
          , Provider::Zhipu => "ZHIPU"
          , Provider::DeepSeek => "DEEPSEEK"
          , Provider::MiniMax => "MINIMAX"
        }
    }
}

impl fmt::Display for Provider
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   let name = match self
        {   Provider::OpenAI => "OpenAI"
          , Provider::Gemini => "Gemini"
          , Provider::Zhipu => "Zhipu"
          , Provider::DeepSeek => "DeepSeek"
          , Provider::MiniMax => "MiniMax"
        };
        f.write_str(name)
    }
}

impl FromStr for Provider
{   type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self>
    {   match s.trim().to_ascii_lowercase().as_str()
        {   "openai" | "gpt" => Ok(Provider::OpenAI)
          , "gemini" | "google" => Ok(Provider::Gemini)
          , "zhipu" | "glm" | "bigmodel" => Ok(Provider::Zhipu)
          , "deepseek" => Ok(Provider::DeepSeek)
          , "minimax" => Ok(Provider::MiniMax)
          , other => Err(crate::error::Error::InvalidConfiguration(
              format!("unknown provider: {}", other)
            ))
        }
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn test_every_provider_has_defaults()
    {   for p in Provider::ALL
        {   assert!(!p.default_model().is_empty());
            assert!(!p.default_image_model().is_empty());
            assert!(p.default_endpoint().starts_with("https://"));
        }
    }

    #[test]
    fn test_provider_from_str()
    {   assert_eq!("Google".parse::<Provider>().ok(), Some(Provider::Gemini));
        assert_eq!(" glm ".parse::<Provider>().ok(), Some(Provider::Zhipu));
        assert_eq!("MiniMax".parse::<Provider>().ok(), Some(Provider::MiniMax));
        assert!("mistral".parse::<Provider>().is_err());
    }

    #[test]
    fn test_provider_display_round_trips()
    {   for p in Provider::ALL
        {   assert_eq!(p.to_string().parse::<Provider>().ok(), Some(p));
        }
    }
}
