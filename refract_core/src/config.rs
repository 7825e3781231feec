//! Resolution settings.
//!
//! Settings come from a `key=value` config file, environment variables and
//! command-line flags; later layers override earlier ones. Whatever is still
//! unset falls back to the export's own locale declarations.

use crate::error::{Error, Result};
use crate::export::ContentExport;
use crate::locale::FallbackSelector;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "refract.conf";

/// One layer of settings. `None` means "not set by this layer".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveConfig {
    /// Path of the content export.
    pub export: Option<PathBuf>,
    /// Locale values are selected for.
    pub locale: Option<String>,
    /// Key non-localized fields are stored under.
    pub default_locale: Option<String>,
    /// Fail when a localized field has no value along the fallback chain.
    pub strict: Option<bool>,
}

impl ResolveConfig {
    /// Parse a config file.
    ///
    /// Blank lines and `#` comments are skipped. Unknown keys are ignored
    /// with a warning.
    pub fn parse(content: &str) -> Result<Self> {
        let mut config = ResolveConfig::default();

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| {
                Error::invalid_config(format!("line {}: expected key=value", number + 1))
            })?;
            let value = value.trim();

            match key.trim() {
                "export" => config.export = Some(PathBuf::from(value)),
                "locale" => config.locale = Some(value.to_string()),
                "default_locale" => config.default_locale = Some(value.to_string()),
                "strict" => config.strict = Some(parse_bool(value, number + 1)?),
                other => warn!(key = other, line = number + 1, "unknown config key"),
            }
        }

        Ok(config)
    }

    /// Read and parse a config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Layer `overrides` on top of this config.
    pub fn merge(self, overrides: ResolveConfig) -> Self {
        Self {
            export: overrides.export.or(self.export),
            locale: overrides.locale.or(self.locale),
            default_locale: overrides.default_locale.or(self.default_locale),
            strict: overrides.strict.or(self.strict),
        }
    }

    /// Settle the locale settings against an export.
    ///
    /// The default locale comes from this config or the export's default
    /// locale; the requested locale defaults to the default locale.
    pub fn locale_settings(&self, export: &ContentExport) -> Result<LocaleSettings> {
        let default_locale = self
            .default_locale
            .clone()
            .or_else(|| export.default_locale().map(str::to_string))
            .ok_or_else(|| {
                Error::invalid_config("no default locale configured and none declared by the export")
            })?;

        Ok(LocaleSettings {
            locale: self.locale.clone().unwrap_or_else(|| default_locale.clone()),
            default_locale,
            strict: self.strict.unwrap_or(false),
        })
    }
}

/// Effective locale settings of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleSettings {
    pub locale: String,
    pub default_locale: String,
    pub strict: bool,
}

impl LocaleSettings {
    /// A fallback selector for these settings over the export's locales.
    pub fn selector(&self, export: &ContentExport) -> FallbackSelector {
        FallbackSelector::new(self.locale.clone(), &export.locales).strict(self.strict)
    }
}

fn parse_bool(value: &str, line: usize) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(Error::invalid_config(format!(
            "line {}: expected a boolean, got {}",
            line, value
        ))),
    }
}
