//! Rejection of answers that parsed fine but are unusable

use crate::error::{Error, ValidationFailure};
use log::warn;

/// Longest acceptable answer, as a multiple of the input length
pub const MAX_LENGTH_RATIO: usize = 10;

/// Field names whose presence in an object-shaped answer means the vendor
/// echoed the response skeleton back
const SCHEMA_MARKERS: &[&str] = &[
  crate::prompt::DETECTED_TYPE_FIELD
, crate::prompt::RESULT_FIELD
];

/// Check a resolved answer against the input it was produced from.
/// The length bound is skipped when there is no input text (image mode).
pub fn validate(text: &str, original_input: &str) -> crate::Result<()>
{   let trimmed = text.trim();
    if trimmed.is_empty()
    {   warn!("Rejecting empty result");
        return Err(Error::ValidationFailed(ValidationFailure::Empty));
    }

    if trimmed.starts_with('{')
      && trimmed.ends_with('}')
      && SCHEMA_MARKERS.iter().any(|m| trimmed.contains(m))
    {   warn!("Rejecting result that restates the schema");
        return Err(Error::ValidationFailed(ValidationFailure::SchemaEcho));
    }

    let input_len = original_input.chars().count();
    if input_len > 0
    {   let len = text.chars().count();
        let limit = input_len * MAX_LENGTH_RATIO;
        if len > limit
        {   warn!("Rejecting result of {} chars for {} char input", len, input_len);
            return Err(Error::ValidationFailed(
              ValidationFailure::RunawayLength { len, limit }
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn test_accepts_normal_answer()
    {   assert!(validate("Bonjour le monde", "Hello world").is_ok());
    }

    #[test]
    fn test_rejects_empty()
    {   assert_eq!(
          validate("  \n", "Hello"),
          Err(Error::ValidationFailed(ValidationFailure::Empty))
        );
    }

    #[test]
    fn test_rejects_schema_echo()
    {   assert_eq!(
          validate("{\"detected_type\":\"x\",\"translation_result\":\"...\"}", "some long enough input text here"),
          Err(Error::ValidationFailed(ValidationFailure::SchemaEcho))
        );
    }

    #[test]
    fn test_braces_alone_are_fine()
    {   assert!(validate("{placeholder}", "{placeholder}").is_ok());
    }

    #[test]
    fn test_rejects_runaway_length()
    {   let input = "abc";
        assert!(validate(&"x".repeat(30), input).is_ok());
        assert_eq!(
          validate(&"x".repeat(31), input),
          Err(Error::ValidationFailed(
            ValidationFailure::RunawayLength { len: 31, limit: 30 }
          ))
        );
    }

    #[test]
    fn test_image_input_has_no_length_bound()
    {   assert!(validate(&"long recognised text ".repeat(100), "").is_ok());
    }
}
