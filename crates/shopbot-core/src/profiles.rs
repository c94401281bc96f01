//! Site Profile Registry: per-store locators and parsing rules.
//!
//! Profiles are data, loaded once at startup from a YAML table and never
//! mutated. The bundled table lives at `config/stores.yaml` in the workspace
//! root and is compiled into the binary as the default.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ConfigError;

const BUNDLED_STORES: &str = include_str!("../../../config/stores.yaml");

/// Lowercase store slug, e.g. `makro` or `woolworths`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoreId(String);

impl StoreId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for StoreId {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let slug = raw.trim().to_ascii_lowercase();
        if slug.is_empty() {
            return Err(ConfigError::Validation(
                "store id must be non-empty".to_string(),
            ));
        }
        if !slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::Validation(format!(
                "store id \"{raw}\" may only contain letters, digits, '-' and '_'"
            )));
        }
        Ok(Self(slug))
    }
}

impl TryFrom<String> for StoreId {
    type Error = ConfigError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<StoreId> for String {
    fn from(id: StoreId) -> Self {
        id.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rule for finding one page element, written `<kind>:<value>` in config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Locator {
    Id(String),
    /// One or more space-separated class names; an element must carry all of them.
    Class(String),
    Css(String),
    XPath(String),
}

impl FromStr for Locator {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (kind, value) = raw.split_once(':').ok_or_else(|| {
            ConfigError::Validation(format!(
                "locator \"{raw}\" must be written as <kind>:<value>"
            ))
        })?;
        let value = value.trim();
        if value.is_empty() {
            return Err(ConfigError::Validation(format!(
                "locator \"{raw}\" has an empty value"
            )));
        }
        let value = value.to_string();
        match kind.trim() {
            "id" => Ok(Self::Id(value)),
            "class" => Ok(Self::Class(value)),
            "css" => Ok(Self::Css(value)),
            "xpath" => Ok(Self::XPath(value)),
            other => Err(ConfigError::Validation(format!(
                "unknown locator kind \"{other}\" in \"{raw}\"; expected id, class, css or xpath"
            ))),
        }
    }
}

impl TryFrom<String> for Locator {
    type Error = ConfigError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<Locator> for String {
    fn from(locator: Locator) -> Self {
        locator.to_string()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(v) => write!(f, "id:{v}"),
            Locator::Class(v) => write!(f, "class:{v}"),
            Locator::Css(v) => write!(f, "css:{v}"),
            Locator::XPath(v) => write!(f, "xpath:{v}"),
        }
    }
}

/// How the search form is submitted once the query has been typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmitAction {
    /// Send the Enter key to the search input.
    EnterKey,
    /// Click a dedicated search button.
    Click { target: Locator },
}

/// Per-store convention for turning price text into a decimal amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriceRule {
    /// `"R1999"`: every digit on the first line, read as cents.
    MinorUnits {
        #[serde(default = "default_currency")]
        currency: String,
    },
    /// `"R 1,299.50"`: the amount after the last currency token on the first line.
    MajorUnits {
        #[serde(default = "default_currency")]
        currency: String,
    },
}

impl PriceRule {
    #[must_use]
    pub fn currency(&self) -> &str {
        match self {
            PriceRule::MinorUnits { currency } | PriceRule::MajorUnits { currency } => currency,
        }
    }

    /// Renders `value` the way this rule reads it back, e.g. `R19.99`.
    #[must_use]
    pub fn render(&self, value: Decimal) -> String {
        format!("{}{:.2}", self.currency(), value)
    }
}

fn default_currency() -> String {
    "R".to_string()
}

/// Canonicalisation applied to the product page URL before it is recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UrlRewrite {
    #[default]
    #[serde(rename = "none")]
    Unchanged,
    /// Collapse `<anything><marker><tail>?tracking` to `<base_url><marker><tail>`.
    ProductPath { marker: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteProfile {
    pub store_id: StoreId,
    pub display_name: String,
    pub base_url: String,
    pub search_input: Locator,
    pub submit: SubmitAction,
    pub first_result: Locator,
    /// Promotional price first, normal price as the fallback.
    pub price_locators: Vec<Locator>,
    pub name_locator: Locator,
    #[serde(default = "default_title_separator")]
    pub title_separator: String,
    pub price_rule: PriceRule,
    #[serde(default)]
    pub url_rewrite: UrlRewrite,
    /// Page text shown when a search matches nothing.
    #[serde(default)]
    pub no_results_marker: Option<String>,
}

fn default_title_separator() -> String {
    "|".to_string()
}

#[derive(Debug, Error)]
#[error("no store profile registered for \"{store}\"")]
pub struct UnknownStore {
    pub store: String,
}

#[derive(Debug, Deserialize)]
struct ProfilesFile {
    stores: Vec<SiteProfile>,
}

/// Read-only lookup from store id to profile, in configuration order.
#[derive(Debug, Clone)]
pub struct SiteRegistry {
    profiles: Vec<SiteProfile>,
}

impl SiteRegistry {
    /// Builds a registry from already-constructed profiles, validating them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if any profile is malformed or two
    /// profiles share a store id.
    pub fn new(profiles: Vec<SiteProfile>) -> Result<Self, ConfigError> {
        validate_profiles(&profiles)?;
        Ok(Self { profiles })
    }

    /// Parses and validates a YAML profile table.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the YAML is malformed or fails validation.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let file: ProfilesFile = serde_yaml::from_str(content)?;
        Self::new(file.stores)
    }

    /// The profile table bundled with the binary.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` only if the bundled table itself is broken.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_yaml(BUNDLED_STORES)
    }

    /// Looks up the profile for `store_id`.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownStore`] when no profile is registered for the id.
    pub fn profile_for(&self, store_id: &StoreId) -> Result<&SiteProfile, UnknownStore> {
        self.profiles
            .iter()
            .find(|p| &p.store_id == store_id)
            .ok_or_else(|| UnknownStore {
                store: store_id.to_string(),
            })
    }

    /// Matches a human-written store name (sheet header, CLI argument) against
    /// store ids and display names, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn resolve_name(&self, name: &str) -> Option<&SiteProfile> {
        let wanted = name.trim();
        self.profiles.iter().find(|p| {
            p.store_id.as_str().eq_ignore_ascii_case(wanted)
                || p.display_name.eq_ignore_ascii_case(wanted)
        })
    }

    #[must_use]
    pub fn store_ids(&self) -> Vec<StoreId> {
        self.profiles.iter().map(|p| p.store_id.clone()).collect()
    }

    pub fn profiles(&self) -> impl Iterator<Item = &SiteProfile> {
        self.profiles.iter()
    }
}

/// Load and validate the store profile table from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_profiles(path: &Path) -> Result<SiteRegistry, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ProfilesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    SiteRegistry::from_yaml(&content)
}

fn validate_profiles(profiles: &[SiteProfile]) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for profile in profiles {
        let id = profile.store_id.as_str();

        if !seen_ids.insert(id) {
            return Err(ConfigError::Validation(format!(
                "duplicate store id: '{id}'"
            )));
        }

        if profile.display_name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "store '{id}' has an empty display_name"
            )));
        }

        if !(profile.base_url.starts_with("http://") || profile.base_url.starts_with("https://"))
        {
            return Err(ConfigError::Validation(format!(
                "store '{id}' base_url \"{}\" must start with http:// or https://",
                profile.base_url
            )));
        }

        if profile.price_locators.is_empty() {
            return Err(ConfigError::Validation(format!(
                "store '{id}' needs at least one price locator"
            )));
        }

        if profile.title_separator.is_empty() {
            return Err(ConfigError::Validation(format!(
                "store '{id}' has an empty title_separator"
            )));
        }

        if profile.price_rule.currency().trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "store '{id}' price_rule has an empty currency"
            )));
        }

        if let UrlRewrite::ProductPath { marker } = &profile.url_rewrite {
            if marker.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "store '{id}' url_rewrite marker must be non-empty"
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "profiles_test.rs"]
mod tests;
