//! Interaction modes and preset resolution

use serde::{Deserialize, Serialize};

/// Identifier of the built-in standing translation entry in the preset list
pub const DEFAULT_PRESET_ID: &str = "default";

/// A named, reusable perception/instruction pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset
{   pub id: String
  , pub name: String
  , pub perception: String
  , pub instruction: String
}

/// How the caller wants the input handled.
///
/// Two `UserPreset` modes are equal when their preset ids match, even
/// if the preset content was edited in between.
#[derive(Debug, Clone)]
pub enum Mode
{   /// Ad-hoc perception + instruction supplied with the request
    TemporaryCustom
  , /// Standing source/target translation
    DefaultTranslation
  , /// Stored preset
    UserPreset(Preset)
}

impl Mode
{   pub fn preset_id(&self) -> Option<&str>
    {   match self
        {   Mode::UserPreset(p) => Some(&p.id)
          , _ => None
        }
    }
}

impl PartialEq for Mode
{   fn eq(&self, other: &Self) -> bool
    {   match (self, other)
        {   (Mode::TemporaryCustom, Mode::TemporaryCustom) => true
          , (Mode::DefaultTranslation, Mode::DefaultTranslation) => true
          , (Mode::UserPreset(a), Mode::UserPreset(b)) => a.id == b.id
          , _ => false
        }
    }
}

impl Eq for Mode {}

/// Pick the mode implied by stored settings.
/// A stale preset id (preset deleted) falls back to the default translation.
pub fn resolve_mode(
  preset_mode_enabled: bool
, selected_preset_id: &str
, presets: &[Preset]
) -> Mode
{   if !preset_mode_enabled
    {   return Mode::TemporaryCustom;
    }
    if selected_preset_id == DEFAULT_PRESET_ID
    {   return Mode::DefaultTranslation;
    }
    match presets.iter().find(|p| p.id == selected_preset_id)
    {   Some(preset) => Mode::UserPreset(preset.clone())
      , None => {
          log::debug!(
            "Preset {} not found, using default translation",
            selected_preset_id
          );
          Mode::DefaultTranslation
        }
    }
}
