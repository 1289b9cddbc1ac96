//! Prompt source interface.
//!
//! Prompt wording belongs to the application; this module only fixes the
//! three generation paths a mode can select and provides a small default.

use crate::mode::{Mode, Preset};

/// JSON field the answer is expected under
pub const RESULT_FIELD: &str = "translation_result";
/// JSON field the vendor uses to report what it saw
pub const DETECTED_TYPE_FIELD: &str = "detected_type";

/// System + user text for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair
{   pub system: String
  , pub user: String
}

/// Request facts a prompt may refer to
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a>
{   pub input_text: &'a str
  , pub is_image: bool
  , pub source_language: Option<&'a str>
  , pub target_language: &'a str
}

/// Generates prompt text for each mode path
pub trait PromptSource: Send + Sync
{   fn custom(
      &self
    , perception: &str
    , instruction: &str
    , ctx: &PromptContext<'_>
    ) -> PromptPair;

    fn translation(&self, ctx: &PromptContext<'_>) -> PromptPair;

    fn preset(&self, preset: &Preset, ctx: &PromptContext<'_>) -> PromptPair;
}

/// Route a mode to its generation path
pub fn build_prompt(
  source: &dyn PromptSource
, mode: &Mode
, perception: Option<&str>
, instruction: Option<&str>
, ctx: &PromptContext<'_>
) -> PromptPair
{   match mode
    {   Mode::TemporaryCustom => source.custom(
          perception.unwrap_or_default()
        , instruction.unwrap_or_default()
        , ctx
        )
      , Mode::DefaultTranslation => source.translation(ctx)
      , Mode::UserPreset(preset) => source.preset(preset, ctx)
    }
}

/// Minimal prompts asking for the JSON result schema
#[derive(Debug, Clone, Default)]
pub struct JsonPrompts;

impl JsonPrompts
{   fn schema() -> String
    {   format!(
          "Reply with a single JSON object: {{\"{}\": \"text|image\", \"{}\": \"<answer>\"}}.",
          DETECTED_TYPE_FIELD, RESULT_FIELD
        )
    }

    fn user_text(ctx: &PromptContext<'_>) -> String
    {   if ctx.is_image
        {   "Recognise the text in this image.".to_string()
        } else
        {   ctx.input_text.to_string()
        }
    }
}

impl PromptSource for JsonPrompts
{   fn custom(
      &self
    , perception: &str
    , instruction: &str
    , ctx: &PromptContext<'_>
    ) -> PromptPair
    {   PromptPair
        {   system: format!(
              "{}\n{}\nAnswer in {}. {}",
              perception, instruction, ctx.target_language, Self::schema()
            )
          , user: Self::user_text(ctx)
        }
    }

    fn translation(&self, ctx: &PromptContext<'_>) -> PromptPair
    {   let from = ctx.source_language.unwrap_or("the detected language");
        PromptPair
        {   system: format!(
              "Translate from {} to {}. Keep formatting. {}",
              from, ctx.target_language, Self::schema()
            )
          , user: Self::user_text(ctx)
        }
    }

    fn preset(&self, preset: &Preset, ctx: &PromptContext<'_>) -> PromptPair
    {   self.custom(&preset.perception, &preset.instruction, ctx)
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    fn ctx(text: &str) -> PromptContext<'_>
    {   PromptContext
        {   input_text: text
          , is_image: false
          , source_language: None
          , target_language: "French"
        }
    }

    #[test]
    fn test_mode_selects_path()
    {   let c = ctx("hello");
        let translation = build_prompt(&JsonPrompts, &Mode::DefaultTranslation, None, None, &c);
        assert!(translation.system.starts_with("Translate from the detected language to French"));
        assert_eq!(translation.user, "hello");

        let custom = build_prompt(
          &JsonPrompts, &Mode::TemporaryCustom, Some("A poet."), Some("Rhyme it."), &c
        );
        assert!(custom.system.starts_with("A poet.\nRhyme it."));

        let preset = Preset
        {   id: "p".into()
          , name: "p".into()
          , perception: "An editor.".into()
          , instruction: "Tighten.".into()
        };
        let from_preset = build_prompt(&JsonPrompts, &Mode::UserPreset(preset), None, None, &c);
        assert!(from_preset.system.starts_with("An editor.\nTighten."));
        assert!(from_preset.system.contains(RESULT_FIELD));
    }
}
