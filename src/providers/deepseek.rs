use async_trait::async_trait;
use log::debug;

use super::chat_completions::{self, ChatCompletionRequest, ThinkingToggle};
use super::ChatProvider;
use crate::request::{Message, RequestConfig};
use crate::Provider;

const REASONING_MARKERS: &[&str] = &["reasoner", "r1", "deepseek-v3.1", "deepseek-v3.2"];

pub struct DeepSeekClient
{   http_client: reqwest::Client
  , api_base: String
}

impl DeepSeekClient
{   pub fn new(http_client: reqwest::Client, api_base: &str) -> Self
    {   debug!("Creating DeepSeekClient for {}", api_base);
        DeepSeekClient
        {   http_client
          , api_base: api_base.trim_end_matches('/').to_string()
        }
    }

    /// Thinking requests carry `thinking: {type: enabled}` and no temperature
    pub fn build_request(
      &self
    , messages: &[Message]
    , config: &RequestConfig
    ) -> ChatCompletionRequest
    {   let mut request = ChatCompletionRequest::plain(messages, config);
        if self.reasoning_active(config)
        {   request.thinking = Some(ThinkingToggle::enabled());
            request.temperature = None;
            request.max_tokens = Some(super::token_budget(config, true));
        }
        request
    }
}

#[async_trait]
impl ChatProvider for DeepSeekClient
{   fn provider(&self) -> Provider
    {   Provider::DeepSeek
    }

    fn is_reasoning_model(&self, model: &str) -> bool
    {   super::matches_family(model, REASONING_MARKERS)
    }

    async fn send(
      &self
    , messages: &[Message]
    , config: &RequestConfig
    ) -> crate::Result<String>
    {   let api_key = super::require_credential(Provider::DeepSeek, config)?;
        let request = self.build_request(messages, config);
        let timeout = super::request_timeout(messages, self.reasoning_active(config));
        chat_completions::post(
          Provider::DeepSeek
        , &self.http_client
        , format!("{}/chat/completions", self.api_base)
        , api_key
        , &request
        , timeout
        ).await
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use serde_json::json;

    fn client() -> DeepSeekClient
    {   DeepSeekClient::new(reqwest::Client::new(), Provider::DeepSeek.default_endpoint())
    }

    #[test]
    fn test_reasoner_gets_thinking_toggle()
    {   let config = RequestConfig::new("k", "deepseek-reasoner").with_reasoning(true);
        let body = serde_json::to_value(
          client().build_request(&[Message::user("hi")], &config)
        ).unwrap();
        assert_eq!(body["thinking"], json!({"type": "enabled"}));
        assert!(body.get("temperature").is_none());
        assert_eq!(body["max_tokens"], json!(super::super::REASONING_MAX_TOKENS));
    }

    #[test]
    fn test_chat_model_sends_no_reasoning_field()
    {   let config = RequestConfig::new("k", "deepseek-chat").with_reasoning(true);
        let body = serde_json::to_value(
          client().build_request(&[Message::user("hi")], &config)
        ).unwrap();
        assert!(body.get("thinking").is_none());
        assert!(body.get("temperature").is_some());
        assert_eq!(body["max_tokens"], json!(2048));
    }
}
