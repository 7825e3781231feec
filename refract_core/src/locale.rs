//! Locale selection: picking the one value meant for the viewer's locale.

use crate::record::{LocaleMap, RawValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// A locale selector could not produce a value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason} (locale {locale})")]
pub struct LocaleError {
    /// The locale that was requested.
    pub locale: String,
    /// What went wrong.
    pub reason: String,
}

impl LocaleError {
    /// Create a new LocaleError.
    pub fn new(locale: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            reason: reason.into(),
        }
    }
}

/// Picks the value for the requested locale out of a locale-keyed map.
///
/// `Ok(None)` means the field simply has no value for that locale; an error
/// means the selector's policy forbids a missing value.
pub trait LocaleSelector {
    /// The locale code values are selected for.
    fn locale(&self) -> &str;

    /// Select one value from a field's locale map.
    fn select<'a>(&self, values: &'a LocaleMap) -> Result<Option<&'a RawValue>, LocaleError>;
}

impl<T: LocaleSelector + ?Sized> LocaleSelector for Box<T> {
    fn locale(&self) -> &str {
        (**self).locale()
    }

    fn select<'a>(&self, values: &'a LocaleMap) -> Result<Option<&'a RawValue>, LocaleError> {
        (**self).select(values)
    }
}

/// Selects the value stored under exactly one locale code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactLocale {
    code: String,
}

impl ExactLocale {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

impl LocaleSelector for ExactLocale {
    fn locale(&self) -> &str {
        &self.code
    }

    fn select<'a>(&self, values: &'a LocaleMap) -> Result<Option<&'a RawValue>, LocaleError> {
        Ok(values.get(&self.code))
    }
}

/// A locale declared by a content space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Locale {
    /// Locale code, e.g. `en-US`.
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Locale to fall back to when a value is missing.
    #[serde(default)]
    pub fallback_code: Option<String>,
    /// Whether this is the space's default locale.
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub optional: bool,
}

impl Locale {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: None,
            fallback_code: None,
            default: false,
            optional: false,
        }
    }

    /// Builder-style helper setting the fallback locale.
    pub fn with_fallback(mut self, code: impl Into<String>) -> Self {
        self.fallback_code = Some(code.into());
        self
    }

    /// Builder-style helper marking this locale as the default.
    pub fn as_default(mut self) -> Self {
        self.default = true;
        self
    }
}

/// Find the default locale in a locale list.
pub fn default_locale(locales: &[Locale]) -> Option<&Locale> {
    locales.iter().find(|locale| locale.default)
}

/// Selects the first value found along a locale fallback chain.
///
/// The chain starts at the requested locale and follows each locale's
/// `fallback_code` until a locale has none. A locale seen twice ends the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackSelector {
    chain: Vec<String>,
    strict: bool,
}

impl FallbackSelector {
    /// Build the chain for `locale` from the space's declared locales.
    ///
    /// A locale that is not declared gets a chain containing only itself.
    pub fn new(locale: impl Into<String>, locales: &[Locale]) -> Self {
        let by_code: HashMap<&str, &Locale> = locales
            .iter()
            .map(|locale| (locale.code.as_str(), locale))
            .collect();

        let mut chain = vec![locale.into()];
        while let Some(next) = chain
            .last()
            .and_then(|code| by_code.get(code.as_str()))
            .and_then(|locale| locale.fallback_code.as_deref())
        {
            if chain.iter().any(|code| code == next) {
                tracing::trace!(locale = next, "fallback loop detected, ending chain");
                break;
            }
            chain.push(next.to_string());
        }

        Self::from_chain(chain)
    }

    /// Use an explicit chain. The first element is the requested locale.
    pub fn from_chain(chain: Vec<String>) -> Self {
        Self {
            chain,
            strict: false,
        }
    }

    /// In strict mode an exhausted chain is an error instead of a missing value.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// The fallback chain, requested locale first.
    pub fn chain(&self) -> &[String] {
        &self.chain
    }
}

impl LocaleSelector for FallbackSelector {
    fn locale(&self) -> &str {
        self.chain.first().map(String::as_str).unwrap_or_default()
    }

    fn select<'a>(&self, values: &'a LocaleMap) -> Result<Option<&'a RawValue>, LocaleError> {
        if let Some(value) = self.chain.iter().find_map(|code| values.get(code)) {
            return Ok(Some(value));
        }

        if self.strict {
            return Err(LocaleError::new(
                self.locale(),
                format!("no value along fallback chain {}", self.chain.join(" -> ")),
            ));
        }

        Ok(None)
    }
}
