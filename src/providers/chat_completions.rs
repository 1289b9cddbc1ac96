//! Chat-completion wire shape shared by OpenAI, DeepSeek and Zhipu

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::request::{Message, RequestConfig};
use crate::Provider;

// ===== Message Types =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl
{   pub url: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart
{   Text
    {   text: String
    }
  , ImageUrl
    {   image_url: ImageUrl
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatContent
{   Text(String)
  , Parts(Vec<ContentPart>)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: String
  , pub content: ChatContent
}

/// Vendor reasoning switch of the `{"type": "enabled"}` form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingToggle
{   #[serde(rename = "type")]
    pub kind: String
}

impl ThinkingToggle
{   pub fn enabled() -> Self
    {   ThinkingToggle { kind: "enabled".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<String>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<ThinkingToggle>
  , pub stream: bool
}

impl ChatCompletionRequest
{   /// Plain request: temperature and max_tokens from config, no reasoning fields
    pub fn plain(messages: &[Message], config: &RequestConfig) -> Self
    {   ChatCompletionRequest
        {   model: config.model.clone()
          , messages: convert_messages(messages)
          , temperature: Some(config.temperature)
          , max_tokens: Some(config.max_tokens)
          , max_completion_tokens: None
          , reasoning_effort: None
          , thinking: None
          , stream: false
        }
    }
}

/// Flat role/content list; a turn with an image becomes text + image_url parts
pub fn convert_messages(messages: &[Message]) -> Vec<ChatMessage>
{   messages.iter()
      .map(|m| {
        let content = match &m.image
        {   Some(bytes) => ChatContent::Parts(vec![
              ContentPart::Text { text: m.text.clone() }
            , ContentPart::ImageUrl
              {   image_url: ImageUrl { url: super::image_data_url(bytes) }
              }
            ])
          , None => ChatContent::Text(m.text.clone())
        };
        ChatMessage
        {   role: m.role.as_str().to_string()
          , content
        }
      })
      .collect()
}

/// POST a chat-completion request with a bearer token and pull out the answer
pub async fn post(
  provider: Provider
, http_client: &reqwest::Client
, url: String
, api_key: &str
, request: &ChatCompletionRequest
, timeout: std::time::Duration
) -> crate::Result<String>
{   debug!("{} request to {} (model {})", provider, url, request.model);
    trace!("{} request: {:?}", provider, request);

    let response = http_client
      .post(url)
      .bearer_auth(api_key)
      .header("Content-Type", "application/json")
      .timeout(timeout)
      .json(request)
      .send()
      .await
      .map_err(|e| super::transport_error(provider, e))?;

    let body = super::read_json(provider, response).await?;
    let text = extract_answer(&body).ok_or_else(|| crate::Error::MalformedResponse
    {   detail: format!("{} reply has no message content", provider)
      , keys: super::keys_of(&body)
    })?;
    super::finish_text(provider, &text)
}

/// `choices[0].message.content`, as a string or a list of text parts.
/// `reasoning_content` is never used as the answer.
pub fn extract_answer(body: &Value) -> Option<String>
{   let choice = body.get("choices")?.get(0)?;
    let content = choice.get("message")
      .and_then(|m| m.get("content"))
      .or_else(|| choice.get("text"))?;

    let text = match content
    {   Value::String(s) => s.clone()
      , Value::Array(parts) => parts.iter()
          .filter(|p| p.get("type").and_then(Value::as_str).map_or(true, |t| t == "text"))
          .filter_map(|p| p.get("text").and_then(Value::as_str))
          .collect::<Vec<_>>()
          .join("")
      , _ => return None
    };
    if text.trim().is_empty()
    {   None
    } else
    {   Some(text)
    }
}
