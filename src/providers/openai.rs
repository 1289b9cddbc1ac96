use async_trait::async_trait;
use log::debug;

use super::chat_completions::{self, ChatCompletionRequest};
use super::ChatProvider;
use crate::request::{Message, RequestConfig};
use crate::Provider;

/// o-series and GPT-5 families reason and reject `temperature`
const REASONING_MARKERS: &[&str] = &["o1", "o3", "o4-", "gpt-5"];
const REASONING_EFFORT: &str = "medium";

pub struct OpenAiClient
{   http_client: reqwest::Client
  , api_base: String
}

impl OpenAiClient
{   pub fn new(http_client: reqwest::Client, api_base: &str) -> Self
    {   debug!("Creating OpenAiClient for {}", api_base);
        OpenAiClient
        {   http_client
          , api_base: api_base.trim_end_matches('/').to_string()
        }
    }

    /// Request body for a conversation
    pub fn build_request(
      &self
    , messages: &[Message]
    , config: &RequestConfig
    ) -> ChatCompletionRequest
    {   let mut request = ChatCompletionRequest::plain(messages, config);
        if self.is_reasoning_model(&config.model)
        {   let reasoning = self.reasoning_active(config);
            request.temperature = None;
            request.max_tokens = None;
            request.max_completion_tokens
              = Some(super::token_budget(config, reasoning));
            if reasoning
            {   request.reasoning_effort = Some(REASONING_EFFORT.to_string());
            }
        }
        request
    }
}

#[async_trait]
impl ChatProvider for OpenAiClient
{   fn provider(&self) -> Provider
    {   Provider::OpenAI
    }

    fn is_reasoning_model(&self, model: &str) -> bool
    {   super::matches_family(model, REASONING_MARKERS)
    }

    async fn send(
      &self
    , messages: &[Message]
    , config: &RequestConfig
    ) -> crate::Result<String>
    {   let api_key = super::require_credential(Provider::OpenAI, config)?;
        let request = self.build_request(messages, config);
        let timeout = super::request_timeout(messages, self.reasoning_active(config));
        chat_completions::post(
          Provider::OpenAI
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

    fn client() -> OpenAiClient
    {   OpenAiClient::new(reqwest::Client::new(), Provider::OpenAI.default_endpoint())
    }

    #[test]
    fn test_reasoning_predicate()
    {   let c = client();
        assert!(c.is_reasoning_model("o3-mini"));
        assert!(c.is_reasoning_model("GPT-5"));
        assert!(!c.is_reasoning_model("gpt-4o-mini"));
    }

    #[test]
    fn test_plain_model_ignores_reasoning_toggle()
    {   let config = RequestConfig::new("k", "gpt-4o-mini").with_reasoning(true);
        let request = client().build_request(&[Message::user("hi")], &config);
        assert_eq!(request.reasoning_effort, None);
        assert_eq!(request.temperature, Some(config.temperature));
        assert_eq!(request.max_tokens, Some(config.max_tokens));
    }

    #[test]
    fn test_config_tunables_reach_body()
    {   let config = RequestConfig::new("k", "gpt-4o-mini")
          .with_temperature(0.7)
          .with_max_tokens(512);
        let request = client().build_request(&[Message::user("hi")], &config);
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(512));
        assert_eq!(request.max_completion_tokens, None);
    }

    #[test]
    fn test_reasoning_model_omits_temperature()
    {   let on = RequestConfig::new("k", "o3-mini").with_reasoning(true);
        let request = client().build_request(&[Message::user("hi")], &on);
        assert_eq!(request.reasoning_effort.as_deref(), Some("medium"));
        assert_eq!(request.temperature, None);
        assert_eq!(request.max_completion_tokens, Some(super::super::REASONING_MAX_TOKENS));

        let off = RequestConfig::new("k", "o3-mini");
        let request = client().build_request(&[Message::user("hi")], &off);
        assert_eq!(request.reasoning_effort, None);
        assert_eq!(request.temperature, None);
        assert_eq!(request.max_completion_tokens, Some(off.max_tokens));
    }
}
