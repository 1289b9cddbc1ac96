use async_trait::async_trait;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ChatProvider;
use crate::request::{Message, RequestConfig, Role};
use crate::Provider;

/// Gemini 2.5+ and explicit thinking variants accept `thinkingConfig`
const REASONING_MARKERS: &[&str] = &["gemini-2.5", "gemini-3", "thinking"];
const THINKING_BUDGET: u32 = 8192;

// ===== Message Types =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineData
{   pub mime_type: String
  , pub data: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part
{   Text
    {   text: String
    }
  , Image
    {   inline_data: InlineData
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content
{   pub role: String
  , pub parts: Vec<Part>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInstruction
{   pub parts: Vec<Part>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingConfig
{   #[serde(rename = "thinkingBudget")]
    pub thinking_budget: u32
  , #[serde(rename = "includeThoughts")]
    pub include_thoughts: bool
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig
{   pub response_mime_type: String
  , pub temperature: f32
  , #[serde(rename = "maxOutputTokens")]
    pub max_output_tokens: u32
  , #[serde(rename = "thinkingConfig", skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiRequest
{   #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>
  , pub contents: Vec<Content>
  , #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig
}

pub struct GeminiClient
{   http_client: reqwest::Client
  , api_base: String
}

impl GeminiClient
{   pub fn new(http_client: reqwest::Client, api_base: &str) -> Self
    {   debug!("Creating GeminiClient for {}", api_base);
        GeminiClient
        {   http_client
          , api_base: api_base.trim_end_matches('/').to_string()
        }
    }

    /// System turns move to `system_instruction`; images become `inline_data`
    pub fn build_request(
      &self
    , messages: &[Message]
    , config: &RequestConfig
    ) -> GeminiRequest
    {   let (system, turns) = super::split_system(messages);
        let reasoning = self.reasoning_active(config);

        let contents = turns.into_iter()
          .map(|m| {
            let mut parts = vec![Part::Text { text: m.text.clone() }];
            if let Some(bytes) = &m.image
            {   parts.push(Part::Image
                {   inline_data: InlineData
                    {   mime_type: super::image_mime(bytes).to_string()
                      , data: super::encode_image(bytes)
                    }
                });
            }
            Content
            {   role: match m.role
                {   Role::Assistant => "model".to_string()
                  , _ => "user".to_string()
                }
              , parts
            }
          })
          .collect();

        GeminiRequest
        {   system_instruction: system.map(|text| SystemInstruction
            {   parts: vec![Part::Text { text }]
            })
          , contents
          , generation_config: GenerationConfig
            {   response_mime_type: "application/json".to_string()
              , temperature: config.temperature
              , max_output_tokens: super::token_budget(config, reasoning)
              , thinking_config: reasoning.then(|| ThinkingConfig
                {   thinking_budget: THINKING_BUDGET
                  , include_thoughts: false
                })
            }
        }
    }
}

/// Answer text from `candidates[0].content.parts`, skipping thought parts.
/// Falls back to any non-empty text part when only thoughts carry text.
pub fn extract_answer(body: &Value) -> Option<String>
{   let parts = body.get("candidates")?
      .get(0)?
      .get("content")?
      .get("parts")?
      .as_array()?;

    let texts = |want_thought: Option<bool>| -> String
    {   parts.iter()
          .filter(|p| match want_thought
          {   Some(flag) => p.get("thought").and_then(Value::as_bool).unwrap_or(false) == flag
            , None => true
          })
          .filter_map(|p| p.get("text").and_then(Value::as_str))
          .collect::<Vec<_>>()
          .join("")
    };

    let answer = texts(Some(false));
    if !answer.trim().is_empty()
    {   return Some(answer);
    }
    let any = texts(None);
    if any.trim().is_empty()
    {   None
    } else
    {   Some(any)
    }
}

#[async_trait]
impl ChatProvider for GeminiClient
{   fn provider(&self) -> Provider
    {   Provider::Gemini
    }

    fn is_reasoning_model(&self, model: &str) -> bool
    {   super::matches_family(model, REASONING_MARKERS)
    }

    async fn send(
      &self
    , messages: &[Message]
    , config: &RequestConfig
    ) -> crate::Result<String>
    {   let api_key = super::require_credential(Provider::Gemini, config)?;
        let request = self.build_request(messages, config);
        let url = format!("{}/models/{}:generateContent", self.api_base, config.model);
        debug!("Gemini request to {} (model {})", url, config.model);
        trace!("Gemini request: {:?}", request);

        let response = self.http_client
          .post(url)
          .query(&[("key", api_key)])
          .header("Content-Type", "application/json")
          .timeout(super::request_timeout(messages, self.reasoning_active(config)))
          .json(&request)
          .send()
          .await
          .map_err(|e| super::transport_error(Provider::Gemini, e))?;

        let body = super::read_json(Provider::Gemini, response).await?;
        let text = extract_answer(&body).ok_or_else(|| crate::Error::MalformedResponse
        {   detail: "Gemini reply has no candidate text".to_string()
          , keys: super::keys_of(&body)
        })?;
        super::finish_text(Provider::Gemini, &text)
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use serde_json::json;

    fn client() -> GeminiClient
    {   GeminiClient::new(reqwest::Client::new(), Provider::Gemini.default_endpoint())
    }

    #[test]
    fn test_request_shape()
    {   let config = RequestConfig::new("k", "gemini-2.0-flash");
        let body = serde_json::to_value(client().build_request(
          &[Message::system("sys"), Message::user_with_image("read", b"abc".to_vec())]
        , &config
        )).unwrap();
        assert_eq!(body["system_instruction"], json!({"parts": [{"text": "sys"}]}));
        assert_eq!(body["contents"][0]["parts"][0], json!({"text": "read"}));
        assert_eq!(
          body["contents"][0]["parts"][1],
          json!({"inline_data": {"mime_type": "image/png", "data": "YWJj"}})
        );
        assert_eq!(body["generationConfig"]["response_mime_type"], "application/json");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
        assert!(body["generationConfig"].get("thinkingConfig").is_none());
    }

    #[test]
    fn test_thinking_config_injected()
    {   let config = RequestConfig::new("k", "gemini-2.5-flash").with_reasoning(true);
        let body = serde_json::to_value(
          client().build_request(&[Message::user("hi")], &config)
        ).unwrap();
        assert_eq!(
          body["generationConfig"]["thinkingConfig"],
          json!({"thinkingBudget": 8192, "includeThoughts": false})
        );
        assert_eq!(
          body["generationConfig"]["maxOutputTokens"],
          json!(super::super::REASONING_MAX_TOKENS)
        );
    }

    #[test]
    fn test_assistant_turn_maps_to_model_role()
    {   let config = RequestConfig::new("k", "gemini-2.0-flash");
        let body = serde_json::to_value(client().build_request(
          &[Message::user("hello"), Message::assistant("{}"), Message::user("again")]
        , &config
        )).unwrap();
        assert!(body.get("system_instruction").is_none());
        let roles: Vec<&str> = body["contents"].as_array().unwrap().iter()
          .map(|c| c["role"].as_str().unwrap())
          .collect();
        assert_eq!(roles, ["user", "model", "user"]);
    }

    #[test]
    fn test_extract_skips_thought_parts()
    {   let body = json!({"candidates": [{"content": {"parts": [
          {"text": "Let me consider...", "thought": true},
          {"text": "{\"translation_result\":\"X\"}"}
        ]}}]});
        assert_eq!(extract_answer(&body).as_deref(), Some("{\"translation_result\":\"X\"}"));

        let only_thought = json!({"candidates": [{"content": {"parts": [
          {"text": "fallback", "thought": true}
        ]}}]});
        assert_eq!(extract_answer(&only_thought).as_deref(), Some("fallback"));
        assert_eq!(extract_answer(&json!({"promptFeedback": {}})), None);
    }
}
