use async_trait::async_trait;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ChatProvider;
use crate::request::{Message, RequestConfig, Role};
use crate::Provider;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const REASONING_MARKERS: &[&str] = &["minimax-m1", "minimax-m2"];
const THINKING_BUDGET: u32 = 4096;

// ===== Message Types =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSource
{   #[serde(rename = "type")]
    pub kind: String
  , pub media_type: String
  , pub data: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock
{   Text
    {   text: String
    }
  , Image
    {   source: ImageSource
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockMessage
{   pub role: String
  , pub content: Vec<ContentBlock>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingBudget
{   #[serde(rename = "type")]
    pub kind: String
  , pub budget_tokens: u32
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagesRequest
{   pub model: String
  , pub messages: Vec<BlockMessage>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>
  , pub max_tokens: u32
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<ThinkingBudget>
}

pub struct MiniMaxClient
{   http_client: reqwest::Client
  , api_base: String
}

impl MiniMaxClient
{   pub fn new(http_client: reqwest::Client, api_base: &str) -> Self
    {   debug!("Creating MiniMaxClient for {}", api_base);
        MiniMaxClient
        {   http_client
          , api_base: api_base.trim_end_matches('/').to_string()
        }
    }

    /// Anthropic-style body. Thinking requests carry a token budget and
    /// leave `temperature` out.
    pub fn build_request(
      &self
    , messages: &[Message]
    , config: &RequestConfig
    ) -> MessagesRequest
    {   let (system, turns) = super::split_system(messages);
        let reasoning = self.reasoning_active(config);

        let messages = turns.into_iter()
          .map(|m| {
            let mut content = vec![ContentBlock::Text { text: m.text.clone() }];
            if let Some(bytes) = &m.image
            {   content.push(ContentBlock::Image
                {   source: ImageSource
                    {   kind: "base64".to_string()
                      , media_type: super::image_mime(bytes).to_string()
                      , data: super::encode_image(bytes)
                    }
                });
            }
            BlockMessage
            {   role: match m.role
                {   Role::Assistant => "assistant".to_string()
                  , _ => "user".to_string()
                }
              , content
            }
          })
          .collect();

        MessagesRequest
        {   model: config.model.clone()
          , messages
          , system
          , max_tokens: super::token_budget(config, reasoning)
          , temperature: (!reasoning).then_some(config.temperature)
          , thinking: reasoning.then(|| ThinkingBudget
            {   kind: "enabled".to_string()
              , budget_tokens: THINKING_BUDGET
            })
        }
    }
}

/// Join `text`/`answer` blocks, dropping `thinking` blocks. When no typed
/// block is present, the first block with non-empty text is used.
pub fn extract_answer(body: &Value) -> Option<String>
{   let blocks = body.get("content")?.as_array()?;
    let block_text = |b: &Value| b.get("text").and_then(Value::as_str).map(str::to_string);

    let typed: Vec<String> = blocks.iter()
      .filter(|b| matches!(b.get("type").and_then(Value::as_str), Some("text") | Some("answer")))
      .filter_map(block_text)
      .collect();
    let answer = typed.join("");
    if !answer.trim().is_empty()
    {   return Some(answer);
    }

    blocks.iter()
      .filter_map(block_text)
      .find(|t| !t.trim().is_empty())
}

#[async_trait]
impl ChatProvider for MiniMaxClient
{   fn provider(&self) -> Provider
    {   Provider::MiniMax
    }

    fn is_reasoning_model(&self, model: &str) -> bool
    {   super::matches_family(model, REASONING_MARKERS)
    }

    async fn send(
      &self
    , messages: &[Message]
    , config: &RequestConfig
    ) -> crate::Result<String>
    {   let api_key = super::require_credential(Provider::MiniMax, config)?;
        let request = self.build_request(messages, config);
        let url = format!("{}/messages", self.api_base);
        debug!("MiniMax request to {} (model {})", url, config.model);
        trace!("MiniMax request: {:?}", request);

        let response = self.http_client
          .post(url)
          .header("x-api-key", api_key)
          .header("anthropic-version", ANTHROPIC_VERSION)
          .header("Content-Type", "application/json")
          .timeout(super::request_timeout(messages, self.reasoning_active(config)))
          .json(&request)
          .send()
          .await
          .map_err(|e| super::transport_error(Provider::MiniMax, e))?;

        let body = super::read_json(Provider::MiniMax, response).await?;
        let text = extract_answer(&body).ok_or_else(|| crate::Error::MalformedResponse
        {   detail: "MiniMax reply has no text block".to_string()
          , keys: super::keys_of(&body)
        })?;
        super::finish_text(Provider::MiniMax, &text)
    }
}
