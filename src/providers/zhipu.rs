use async_trait::async_trait;
use log::debug;

use super::chat_completions::{self, ChatCompletionRequest, ThinkingToggle};
use super::ChatProvider;
use crate::request::{Message, RequestConfig};
use crate::Provider;

/// GLM families with a thinking switch
const REASONING_MARKERS: &[&str] = &["glm-4.5", "glm-4.6", "glm-5", "glm-z1", "thinking"];

pub struct ZhipuClient
{   http_client: reqwest::Client
  , api_base: String
}

impl ZhipuClient
{   pub fn new(http_client: reqwest::Client, api_base: &str) -> Self
    {   debug!("Creating ZhipuClient for {}", api_base);
        ZhipuClient
        {   http_client
          , api_base: api_base.trim_end_matches('/').to_string()
        }
    }

    pub fn build_request(
      &self
    , messages: &[Message]
    , config: &RequestConfig
    ) -> ChatCompletionRequest
    {   let mut request = ChatCompletionRequest::plain(messages, config);
        if self.reasoning_active(config)
        {   request.thinking = Some(ThinkingToggle::enabled());
            request.max_tokens = Some(super::token_budget(config, true));
        }
        request
    }
}

#[async_trait]
impl ChatProvider for ZhipuClient
{   fn provider(&self) -> Provider
    {   Provider::Zhipu
    }

    fn is_reasoning_model(&self, model: &str) -> bool
    {   super::matches_family(model, REASONING_MARKERS)
    }

    async fn send(
      &self
    , messages: &[Message]
    , config: &RequestConfig
    ) -> crate::Result<String>
    {   let api_key = super::require_credential(Provider::Zhipu, config)?;
        let request = self.build_request(messages, config);
        let timeout = super::request_timeout(messages, self.reasoning_active(config));
        chat_completions::post(
          Provider::Zhipu
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

    fn client() -> ZhipuClient
    {   ZhipuClient::new(reqwest::Client::new(), Provider::Zhipu.default_endpoint())
    }

    #[test]
    fn test_glm_thinking_keeps_temperature()
    {   let config = RequestConfig::new("k", "GLM-4.6").with_reasoning(true);
        let body = serde_json::to_value(
          client().build_request(&[Message::user("hi")], &config)
        ).unwrap();
        assert_eq!(body["thinking"], json!({"type": "enabled"}));
        assert!(body.get("temperature").is_some());
    }

    #[test]
    fn test_toggle_off_omits_thinking()
    {   let config = RequestConfig::new("k", "glm-4.6");
        let body = serde_json::to_value(
          client().build_request(&[Message::user("hi")], &config)
        ).unwrap();
        assert!(body.get("thinking").is_none());
        assert!(!client().is_reasoning_model("glm-4-flash"));
    }
}
