//! Isolating the JSON object in a vendor reply and resolving the answer from it

use log::{debug, trace};
use serde_json::{Map, Value};

/// Phrases vendors put in front of the JSON despite being told not to
const PREAMBLES: &[&str] = &[
  "here is the translation:"
, "here's the translation:"
, "here is the translated text:"
, "here is the result:"
, "here's the result:"
, "here is the json:"
, "here's the json:"
, "here is the recognized text:"
, "translation:"
, "result:"
, "output:"
];

/// Answer keys in the order they are tried, for every mode
pub const RESULT_KEYS: &[&str] = &[
  crate::prompt::RESULT_FIELD
, "translated_text"
, "translation"
, "result"
, "answer"
, "content"
, "output"
, "text"
];

/// Keys printed first when a structured answer is flattened
const PRIORITY_KEYS: &[&str] = &["author", "authors", "writer", "title"];

/// Strip preambles and code fences, then isolate the outermost `{...}`.
/// Text with no object inside comes back trimmed but otherwise unchanged.
pub fn extract_json(raw: &str) -> String
{   let mut text = raw.trim().to_string();
    loop
    {   let before = text.len();
        text = strip_preamble(&text);
        text = text
          .replace("```json", "")
          .replace("```JSON", "")
          .replace("```", "");
        text = text.trim().to_string();
        if text.len() == before
        {   break;
        }
    }

    if text.starts_with('{') && text.ends_with('}')
    {   return text;
    }
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}'))
    {   if start < end
        {   return text[start..=end].to_string();
        }
    }
    text
}

fn strip_preamble(text: &str) -> String
{   for preamble in PREAMBLES
    {   let matched = text.get(..preamble.len())
          .map_or(false, |head| head.eq_ignore_ascii_case(preamble));
        if matched
        {   return text[preamble.len()..].trim_start().to_string();
        }
    }
    text.to_string()
}

fn looks_like_object(text: &str) -> bool
{   text.starts_with('{') && text.ends_with('}')
}

/// Resolve the answer from extracted text.
///
/// Non-JSON text is taken as a direct answer. A JSON object is searched
/// through `RESULT_KEYS`; nested objects are flattened into `key: value`
/// lines.
pub fn parse_response(extracted: &str) -> crate::Result<crate::ParsedResult>
{   let text = extracted.trim();
    if text.is_empty()
    {   return Err(crate::Error::malformed("vendor returned no text"));
    }

    let value: Value = match serde_json::from_str(text)
    {   Ok(v) => v
      , Err(e) => {
          if looks_like_object(text)
          {   debug!("Object-shaped reply failed to decode: {}", e);
              return Err(crate::Error::malformed(
                format!("invalid JSON object: {}", e)
              ));
          }
          trace!("Reply is plain text, using it directly");
          return Ok(crate::ParsedResult::plain(text));
        }
    };

    let object = match value
    {   Value::Object(map) => map
      , Value::String(s) if !s.trim().is_empty() => {
          return Ok(crate::ParsedResult::plain(s));
        }
      , _ => return Ok(crate::ParsedResult::plain(text))
    };

    let detected_type = string_field(&object, crate::prompt::DETECTED_TYPE_FIELD);
    let reasoning_trace = string_field(&object, "reasoning")
      .or_else(|| string_field(&object, "thinking"));

    for key in RESULT_KEYS
    {   let resolved = match object.get(*key)
        {   Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone())
          , Some(Value::Object(nested)) if !nested.is_empty() => {
              debug!("Flattening nested object under {}", key);
              Some(flatten_object(nested))
            }
          , _ => None
        };
        if let Some(text) = resolved
        {   trace!("Resolved answer from key {}", key);
            return Ok(crate::ParsedResult
            {   text
              , detected_type
              , reasoning_trace
            });
        }
    }

    Err(crate::Error::MalformedResponse
    {   detail: "no usable result key".to_string()
      , keys: object.keys().cloned().collect()
    })
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String>
{   object.get(key)
      .and_then(|v| v.as_str())
      .map(|s| s.to_string())
}

/// One `key: value` line per entry; priority keys first, the rest alphabetical
pub fn flatten_object(object: &Map<String, Value>) -> String
{   let mut lines = Vec::with_capacity(object.len());
    for key in PRIORITY_KEYS
    {   if let Some(value) = object.get(*key)
        {   lines.push(format!("{}: {}", key, render_value(value)));
        }
    }
    let mut rest: Vec<&String> = object.keys()
      .filter(|k| !PRIORITY_KEYS.contains(&k.as_str()))
      .collect();
    rest.sort();
    for key in rest
    {   lines.push(format!("{}: {}", key, render_value(&object[key.as_str()])));
    }
    lines.join("\n")
}

fn render_value(value: &Value) -> String
{   match value
    {   Value::String(s) => s.clone()
      , Value::Array(items) => items.iter()
          .map(render_value)
          .collect::<Vec<_>>()
          .join(", ")
      , other => other.to_string()
    }
}
