//! Stored settings and the capability the orchestrator reads them through

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Per-vendor settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorSettings
{   /// API key; blank means "not configured"
    pub api_key: String
  , /// Text model (if custom)
    pub model: Option<String>
  , /// Vision model (if custom)
    pub image_model: Option<String>
  , /// API base URL (if custom)
    pub api_base: Option<String>
}

/// Snapshot of everything the user stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings
{   /// Vendor for text requests
    pub text_provider: crate::Provider
  , /// Vendor for image requests when they have their own settings
    pub image_provider: crate::Provider
  , /// Route image requests through the text vendor and model
    pub use_text_settings_for_image: bool
  , /// Ask reasoning-capable models to think first
    pub enable_reasoning: bool
  , pub temperature: f32
  , pub max_tokens: u32
  , pub preset_mode_enabled: bool
  , pub selected_preset_id: String
  , pub presets: Vec<crate::mode::Preset>
  , pub vendors: BTreeMap<crate::Provider, VendorSettings>
}

impl Default for Settings
{   fn default() -> Self
    {   Settings
        {   text_provider: crate::Provider::OpenAI
          , image_provider: crate::Provider::OpenAI
          , use_text_settings_for_image: true
          , enable_reasoning: false
          , temperature: DEFAULT_TEMPERATURE
          , max_tokens: DEFAULT_MAX_TOKENS
          , preset_mode_enabled: true
          , selected_preset_id: crate::mode::DEFAULT_PRESET_ID.to_string()
          , presets: vec![]
          , vendors: BTreeMap::new()
        }
    }
}

impl Settings
{   /// Load settings from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self>
    {   let path = path.as_ref();
        debug!("Loading settings from {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&raw)?;
        Ok(settings)
    }

    /// Overlay `XLATE_*` environment variables
    pub fn apply_env(self) -> Self
    {   self.apply_vars(|name| std::env::var(name).ok())
    }

    fn apply_vars<F>(mut self, lookup: F) -> Self
      where F: Fn(&str) -> Option<String>
    {   for provider in crate::Provider::ALL
        {   let token = provider.env_token();
            if let Some(key) = lookup(&format!("XLATE_{}_API_KEY", token))
            {   self.vendor_mut(provider).api_key = key;
            }
            if let Some(model) = lookup(&format!("XLATE_{}_MODEL", token))
            {   self.vendor_mut(provider).model = Some(model);
            }
        }
        if let Some(name) = lookup("XLATE_PROVIDER")
        {   match name.parse()
            {   Ok(provider) => {
                  self.text_provider = provider;
                  self.image_provider = provider;
                }
              , Err(e) => warn!("Ignoring XLATE_PROVIDER: {}", e)
            }
        }
        if let Some(flag) = lookup("XLATE_ENABLE_REASONING")
        {   self.enable_reasoning = matches!(
              flag.trim().to_ascii_lowercase().as_str(),
              "1" | "true" | "yes" | "on"
            );
        }
        self
    }

    fn vendor_mut(&mut self, provider: crate::Provider) -> &mut VendorSettings
    {   self.vendors.entry(provider).or_default()
    }

    /// Settings stored for a vendor, or empty ones
    pub fn vendor(&self, provider: crate::Provider) -> VendorSettings
    {   self.vendors.get(&provider).cloned().unwrap_or_default()
    }

    pub fn api_key(&self, provider: crate::Provider) -> String
    {   self.vendor(provider).api_key.trim().to_string()
    }

    /// Text model with the hardcoded fallback applied
    pub fn model(&self, provider: crate::Provider) -> String
    {   non_blank(self.vendor(provider).model)
          .unwrap_or_else(|| provider.default_model().to_string())
    }

    /// Vision model with the hardcoded fallback applied
    pub fn image_model(&self, provider: crate::Provider) -> String
    {   non_blank(self.vendor(provider).image_model)
          .unwrap_or_else(|| provider.default_image_model().to_string())
    }

    pub fn api_base(&self, provider: crate::Provider) -> String
    {   non_blank(self.vendor(provider).api_base)
          .map(|b| b.trim_end_matches('/').to_string())
          .unwrap_or_else(|| provider.default_endpoint().to_string())
    }

    /// Vendor and model for a request
    pub fn route(&self, image: bool) -> (crate::Provider, String)
    {   if image && !self.use_text_settings_for_image
        {   (self.image_provider, self.image_model(self.image_provider))
        } else
        {   (self.text_provider, self.model(self.text_provider))
        }
    }

    /// Fresh per-call config for a routed vendor
    pub fn request_config(
      &self
    , provider: crate::Provider
    , model: String
    ) -> crate::request::RequestConfig
    {   crate::request::RequestConfig
        {   credential: self.api_key(provider)
          , model
          , temperature: self.temperature
          , max_tokens: self.max_tokens
          , enable_reasoning: self.enable_reasoning
        }
    }

    pub fn resolve_mode(&self) -> crate::mode::Mode
    {   crate::mode::resolve_mode(
          self.preset_mode_enabled
        , &self.selected_preset_id
        , &self.presets
        )
    }

    /// Builder helper: set a vendor's key
    pub fn with_api_key(
      mut self
    , provider: crate::Provider
    , key: impl Into<String>
    ) -> Self
    {   self.vendor_mut(provider).api_key = key.into();
        self
    }

    /// Builder helper: set a vendor's endpoint
    pub fn with_api_base(
      mut self
    , provider: crate::Provider
    , base: impl Into<String>
    ) -> Self
    {   self.vendor_mut(provider).api_base = Some(base.into());
        self
    }
}

fn non_blank(value: Option<String>) -> Option<String>
{   value
      .map(|v| v.trim().to_string())
      .filter(|v| !v.is_empty())
}

/// Read access to stored settings. The orchestrator takes one snapshot
/// per request and never touches global state.
pub trait SettingsProvider: Send + Sync
{   fn snapshot(&self) -> Settings;
}

/// Fixed settings, for tests and the command line
#[derive(Debug, Clone, Default)]
pub struct StaticSettings(pub Settings);

impl SettingsProvider for StaticSettings
{   fn snapshot(&self) -> Settings
    {   self.0.clone()
    }
}

impl<F> SettingsProvider for F
  where F: Fn() -> Settings + Send + Sync
{   fn snapshot(&self) -> Settings
    {   self()
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use crate::Provider;
    use std::collections::HashMap;

    #[test]
    fn test_model_falls_back_to_default()
    {   let mut settings = Settings::default();
        assert_eq!(settings.model(Provider::Zhipu), "glm-4-flash");
        settings.vendors.insert(Provider::Zhipu, VendorSettings
        {   model: Some("  ".to_string())
          , ..Default::default()
        });
        assert_eq!(settings.model(Provider::Zhipu), "glm-4-flash");
        settings.vendors.insert(Provider::Zhipu, VendorSettings
        {   model: Some("glm-4.6".to_string())
          , ..Default::default()
        });
        assert_eq!(settings.model(Provider::Zhipu), "glm-4.6");
    }

    #[test]
    fn test_image_route_uses_own_settings_when_asked()
    {   let mut settings = Settings
        {   text_provider: Provider::DeepSeek
          , image_provider: Provider::Gemini
          , ..Default::default()
        };
        assert_eq!(
          settings.route(true),
          (Provider::DeepSeek, "deepseek-chat".to_string())
        );
        settings.use_text_settings_for_image = false;
        assert_eq!(
          settings.route(true),
          (Provider::Gemini, "gemini-2.0-flash".to_string())
        );
        assert_eq!(settings.route(false).0, Provider::DeepSeek);
    }

    #[test]
    fn test_env_overlay()
    {   let vars: HashMap<&str, &str> = [
          ("XLATE_GEMINI_API_KEY", "g-key")
        , ("XLATE_GEMINI_MODEL", "gemini-2.5-pro")
        , ("XLATE_PROVIDER", "google")
        , ("XLATE_ENABLE_REASONING", "true")
        ].into_iter().collect();
        let settings = Settings::default()
          .apply_vars(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(settings.text_provider, Provider::Gemini);
        assert_eq!(settings.api_key(Provider::Gemini), "g-key");
        assert_eq!(settings.model(Provider::Gemini), "gemini-2.5-pro");
        assert!(settings.enable_reasoning);
    }

    #[test]
    fn test_json_round_trip_keeps_vendor_map()
    {   let settings = Settings::default()
          .with_api_key(Provider::MiniMax, "mm")
          .with_api_base(Provider::MiniMax, "http://localhost:9000/");
        let raw = serde_json::to_string(&settings).unwrap();
        assert!(raw.contains("\"MiniMax\""));
        let back: Settings = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.api_base(Provider::MiniMax), "http://localhost:9000");
        assert_eq!(back.api_key(Provider::MiniMax), "mm");
    }

    fn scratch_path(name: &str) -> std::path::PathBuf
    {   std::env::temp_dir().join(format!("xlate-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn test_from_file_loads_settings()
    {   let path = scratch_path("load");
        std::fs::write(
          &path
        , r#"{"text_provider":"DeepSeek","temperature":0.5,"vendors":{"DeepSeek":{"api_key":"sk-file","model":"deepseek-reasoner"}}}"#
        ).unwrap();
        let settings = Settings::from_file(&path);
        let _ = std::fs::remove_file(&path);

        let settings = settings.unwrap();
        assert_eq!(settings.text_provider, Provider::DeepSeek);
        assert_eq!(settings.temperature, 0.5);
        assert_eq!(settings.api_key(Provider::DeepSeek), "sk-file");
        assert_eq!(settings.model(Provider::DeepSeek), "deepseek-reasoner");
        assert!(settings.preset_mode_enabled);
    }

    #[test]
    fn test_from_file_errors()
    {   let missing = Settings::from_file(scratch_path("missing")).unwrap_err();
        assert_eq!(missing.kind(), crate::ErrorKind::Io);

        let path = scratch_path("broken");
        std::fs::write(&path, "{ not json").unwrap();
        let broken = Settings::from_file(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(broken.unwrap_err().kind(), crate::ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_partial_json_uses_defaults()
    {   let back: Settings = serde_json::from_str(
          r#"{"text_provider":"Zhipu","vendors":{"Zhipu":{"api_key":"z"}}}"#
        ).unwrap();
        assert_eq!(back.text_provider, Provider::Zhipu);
        assert_eq!(back.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(back.request_config(Provider::Zhipu, "m".into()).credential, "z");
    }

    #[test]
    fn test_closure_settings_provider()
    {   let provider = || Settings::default().with_api_key(Provider::OpenAI, "k");
        assert_eq!(provider.snapshot().api_key(Provider::OpenAI), "k");
    }
}
