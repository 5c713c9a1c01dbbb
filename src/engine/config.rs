//! Banner configuration.
//!
//! `BannerConfig` controls everything a widget instance is built from: the
//! cookie categories, display texts handed to the view, placement hints,
//! the storage suffix, and lifecycle hooks.
//!
//! `BannerConfig` provides sensible defaults via [`Default`] and a fluent
//! [`BannerConfig::builder()`] for customization with validation. Hosts that
//! keep their configuration as JSON (the widget's historical camelCase shape)
//! can load it with [`BannerConfig::from_json`] or, for partial updates,
//! [`ConfigUpdate::from_json`], and attach callbacks afterwards.
//!
//! # Examples
//!
//! ## Customize with the builder
//! ```rust
//! use silktide_consent::config::BannerConfig;
//! use silktide_consent::categories::CategoryDefinition;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = BannerConfig::builder()
//!     .category(CategoryDefinition::new("essential").required(true))
//!     .category(CategoryDefinition::new("analytics").on_accept(|| println!("load analytics")))
//!     .banner_suffix("_shop")
//!     .show_background(true)
//!     .build()?; // returns Result<BannerConfig, ConfigError>
//! assert_eq!(cfg.cookie_types.len(), 2);
//! # Ok(()) }
//! ```
//!
//! ## Load from JSON
//! ```rust
//! use silktide_consent::config::BannerConfig;
//! let cfg = BannerConfig::from_json(r#"{
//!     "cookieTypes": [
//!         { "id": "essential", "name": "Essential", "required": true },
//!         { "id": "analytics", "name": "Analytics", "defaultValue": false }
//!     ],
//!     "position": { "banner": "bottomLeft" },
//!     "showBanner": true
//! }"#).unwrap()
//! .on_category_accept("analytics", || println!("load analytics"));
//! assert_eq!(cfg.banner_position.as_deref(), Some("bottomLeft"));
//! ```
//!
//! # Errors
//!
//! Builder validation can return [`ConfigError`] for empty or duplicate
//! category ids and for a suffix containing whitespace. JSON loading only
//! fails when the document is not a JSON object; malformed entries inside it
//! are skipped one by one.

use crate::engine::callback::Callback;
use crate::engine::categories::CategoryDefinition;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

/// Texts of the banner surface.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BannerText {
    pub description: Option<String>,
    pub accept_all_button_text: String,
    pub reject_non_essential_button_text: String,
    pub preferences_button_text: String,
}

impl Default for BannerText {
    fn default() -> Self {
        Self {
            description: None,
            accept_all_button_text: "Accept all".to_string(),
            reject_non_essential_button_text: "Reject".to_string(),
            preferences_button_text: "Preferences".to_string(),
        }
    }
}

/// Texts of the preferences modal.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferencesText {
    pub title: String,
    pub description: Option<String>,
}

impl Default for PreferencesText {
    fn default() -> Self {
        Self {
            title: "Your preferences".to_string(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub banner: BannerText,
    pub preferences: PreferencesText,
}

/// Hooks fired by the engine and the presentation controller.
#[derive(Debug, Clone, Default)]
pub struct LifecycleHooks {
    pub on_accept_all: Option<Callback>,
    pub on_reject_all: Option<Callback>,
    pub on_banner_open: Option<Callback>,
    pub on_banner_close: Option<Callback>,
    pub on_preferences_open: Option<Callback>,
    pub on_preferences_close: Option<Callback>,
    pub on_backdrop_open: Option<Callback>,
    pub on_backdrop_close: Option<Callback>,
}

impl LifecycleHooks {
    /// Hooks set in `other` replace ours, unset ones keep ours.
    pub fn merge(&mut self, other: LifecycleHooks) {
        fn take(slot: &mut Option<Callback>, new: Option<Callback>) {
            if new.is_some() {
                *slot = new;
            }
        }

        take(&mut self.on_accept_all, other.on_accept_all);
        take(&mut self.on_reject_all, other.on_reject_all);
        take(&mut self.on_banner_open, other.on_banner_open);
        take(&mut self.on_banner_close, other.on_banner_close);
        take(&mut self.on_preferences_open, other.on_preferences_open);
        take(&mut self.on_preferences_close, other.on_preferences_close);
        take(&mut self.on_backdrop_open, other.on_backdrop_open);
        take(&mut self.on_backdrop_close, other.on_backdrop_close);
    }
}

#[derive(Debug, Clone)]
pub struct BannerConfig {
    /// Configured categories, in display order
    pub cookie_types: Vec<CategoryDefinition>,
    /// Display strings, passed through to the view
    pub text: TextConfig,
    /// Placement hint of the banner (a class name for the view)
    pub banner_position: Option<String>,
    /// Placement hint of the floating icon
    pub icon_position: Option<String>,
    /// Show a backdrop behind the banner and the modal
    pub show_background: bool,
    /// Appended to every storage key, so several banners can live on one origin
    pub banner_suffix: String,
    /// When false, first-run visitors get the icon instead of the banner
    pub show_banner: bool,
    pub hooks: LifecycleHooks,
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            cookie_types: Vec::new(),
            text: TextConfig::default(),
            banner_position: None,
            icon_position: None,
            show_background: false,
            banner_suffix: String::new(),
            show_banner: true,
            hooks: LifecycleHooks::default(),
        }
    }
}

impl BannerConfig {
    pub fn builder() -> BannerConfigBuilder {
        BannerConfigBuilder::default()
    }

    /// Builds a configuration from the JSON shape used by host pages.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config = BannerConfig::default();
        config.merge(ConfigUpdate::from_json(json)?);
        Ok(config)
    }

    /// Applies an update. Fields present in the update replace ours; hooks merge one by one.
    pub fn merge(&mut self, update: ConfigUpdate) {
        let ConfigUpdate {
            cookie_types,
            text,
            banner_position,
            icon_position,
            show_background,
            banner_suffix,
            show_banner,
            hooks,
        } = update;

        if let Some(v) = cookie_types { self.cookie_types = v; }
        if let Some(v) = text { self.text = v; }
        if let Some(v) = banner_position { self.banner_position = Some(v); }
        if let Some(v) = icon_position { self.icon_position = Some(v); }
        if let Some(v) = show_background { self.show_background = v; }
        if let Some(v) = banner_suffix { self.banner_suffix = v; }
        if let Some(v) = show_banner { self.show_banner = v; }
        self.hooks.merge(hooks);
    }

    /// Attaches an accept callback to an already configured category.
    pub fn on_category_accept(mut self, id: &str, cb: impl Into<Callback>) -> Self {
        attach(&mut self.cookie_types, id, cb.into(), true);
        self
    }

    /// Attaches a reject callback to an already configured category.
    pub fn on_category_reject(mut self, id: &str, cb: impl Into<Callback>) -> Self {
        attach(&mut self.cookie_types, id, cb.into(), false);
        self
    }
}

fn attach(types: &mut [CategoryDefinition], id: &str, cb: Callback, accept: bool) {
    match types.iter_mut().find(|c| c.id == id) {
        Some(category) if accept => category.on_accept = Some(cb),
        Some(category) => category.on_reject = Some(cb),
        None => log::warn!("cannot attach callback: no cookie category '{id}'"),
    }
}

/// Builder for [`BannerConfig`], mirroring the other config builders.
#[derive(Debug, Clone, Default)]
pub struct BannerConfigBuilder {
    inner: BannerConfig,
}

impl BannerConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut BannerConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn category(self, def: CategoryDefinition) -> Self { self.map(|c| c.cookie_types.push(def)) }
    pub fn cookie_types(self, defs: Vec<CategoryDefinition>) -> Self { self.map(|c| c.cookie_types = defs) }
    pub fn text(self, text: TextConfig) -> Self { self.map(|c| c.text = text) }
    pub fn banner_position<S: Into<String>>(self, pos: S) -> Self { self.map(|c| c.banner_position = Some(pos.into())) }
    pub fn icon_position<S: Into<String>>(self, pos: S) -> Self { self.map(|c| c.icon_position = Some(pos.into())) }
    pub fn show_background(self, on: bool) -> Self { self.map(|c| c.show_background = on) }
    pub fn banner_suffix<S: Into<String>>(self, suffix: S) -> Self { self.map(|c| c.banner_suffix = suffix.into()) }
    pub fn show_banner(self, on: bool) -> Self { self.map(|c| c.show_banner = on) }
    pub fn hooks(self, hooks: LifecycleHooks) -> Self { self.map(|c| c.hooks = hooks) }
    pub fn on_accept_all(self, cb: impl Into<Callback>) -> Self { self.map(|c| c.hooks.on_accept_all = Some(cb.into())) }
    pub fn on_reject_all(self, cb: impl Into<Callback>) -> Self { self.map(|c| c.hooks.on_reject_all = Some(cb.into())) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut BannerConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<BannerConfig, ConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

/// Partial configuration handed to [`LifecycleManager::update_config`](crate::lifecycle::LifecycleManager::update_config).
/// `None` fields keep the current value.
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    pub cookie_types: Option<Vec<CategoryDefinition>>,
    pub text: Option<TextConfig>,
    pub banner_position: Option<String>,
    pub icon_position: Option<String>,
    pub show_background: Option<bool>,
    pub banner_suffix: Option<String>,
    pub show_banner: Option<bool>,
    pub hooks: LifecycleHooks,
}

impl From<BannerConfig> for ConfigUpdate {
    fn from(c: BannerConfig) -> Self {
        Self {
            cookie_types: Some(c.cookie_types),
            text: Some(c.text),
            banner_position: c.banner_position,
            icon_position: c.icon_position,
            show_background: Some(c.show_background),
            banner_suffix: Some(c.banner_suffix),
            show_banner: Some(c.show_banner),
            hooks: c.hooks,
        }
    }
}

impl ConfigUpdate {
    /// Parses a (possibly partial) JSON configuration. Fields of the wrong type are skipped
    /// with a warning, and so is every malformed `cookieTypes` entry.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        let Value::Object(obj) = value else {
            return Err(ConfigError::NotAnObject);
        };

        Ok(Self {
            cookie_types: field::<Vec<Value>>(&obj, "cookieTypes").map(parse_categories),
            text: field(&obj, "text"),
            banner_position: field::<PositionJson>(&obj, "position").and_then(|p| p.banner),
            icon_position: field::<PositionJson>(&obj, "cookieIcon").and_then(|p| p.position),
            show_background: field::<BackgroundJson>(&obj, "background").and_then(|b| b.show_background),
            banner_suffix: field(&obj, "bannerSuffix"),
            show_banner: field(&obj, "showBanner"),
            hooks: LifecycleHooks::default(),
        })
    }

    pub fn on_category_accept(mut self, id: &str, cb: impl Into<Callback>) -> Self {
        if let Some(types) = self.cookie_types.as_mut() {
            attach(types, id, cb.into(), true);
        }
        self
    }

    pub fn on_category_reject(mut self, id: &str, cb: impl Into<Callback>) -> Self {
        if let Some(types) = self.cookie_types.as_mut() {
            attach(types, id, cb.into(), false);
        }
        self
    }

    pub fn hooks(mut self, hooks: LifecycleHooks) -> Self {
        self.hooks = hooks;
        self
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryJson {
    id: String,
    name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    default_value: bool,
}

#[derive(Deserialize)]
struct PositionJson {
    banner: Option<String>,
    position: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackgroundJson {
    show_background: Option<bool>,
}

fn field<T: DeserializeOwned>(obj: &Map<String, Value>, name: &str) -> Option<T> {
    let value = obj.get(name)?;
    match serde_json::from_value(value.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("ignoring malformed config field '{name}': {e}");
            None
        }
    }
}

fn parse_categories(entries: Vec<Value>) -> Vec<CategoryDefinition> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(idx, entry)| match serde_json::from_value::<CategoryJson>(entry) {
            Ok(c) => Some(CategoryDefinition {
                id: c.id,
                name: c.name,
                description: c.description,
                required: c.required,
                default_value: c.default_value,
                on_accept: None,
                on_reject: None,
            }),
            Err(e) => {
                log::warn!("ignoring malformed cookie type #{idx}: {e}");
                None
            }
        })
        .collect()
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    EmptyCategoryId,
    DuplicateCategory(String),
    InvalidSuffix(String),
    Json(String),
    NotAnObject,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyCategoryId =>
                write!(f, "cookie category id must not be empty"),
            ConfigError::DuplicateCategory(id) =>
                write!(f, "cookie category '{id}' is defined more than once"),
            ConfigError::InvalidSuffix(s) =>
                write!(f, "banner suffix '{s}' must not contain whitespace"),
            ConfigError::Json(e) =>
                write!(f, "configuration is not valid JSON: {e}"),
            ConfigError::NotAnObject =>
                write!(f, "configuration must be a JSON object"),
        }
    }
}
impl std::error::Error for ConfigError {}

fn validate(c: &BannerConfig) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for category in &c.cookie_types {
        if category.id.trim().is_empty() {
            return Err(ConfigError::EmptyCategoryId);
        }
        if !seen.insert(category.id.as_str()) {
            return Err(ConfigError::DuplicateCategory(category.id.clone()));
        }
    }
    if c.banner_suffix.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidSuffix(c.banner_suffix.clone()));
    }
    Ok(())
}
