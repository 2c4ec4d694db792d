// Device region lookup - the no-permission-needed half of location
use std::env;

/// Synchronous read of the configured region
pub trait LocaleProvider: Send + Sync {
    /// Lowercase ISO country code, if the device has one set
    fn region_code(&self) -> Option<String>;
}

/// Reads the region out of the POSIX locale variables
///
/// Same precedence as setlocale: LC_ALL, then LC_MESSAGES, then LANG.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLocale;

impl LocaleProvider for SystemLocale {
    fn region_code(&self) -> Option<String> {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| env::var(var).ok())
            .find(|value| !value.trim().is_empty())
            .and_then(|value| parse_region(&value))
    }
}

/// Fixed region, for config overrides and tests
#[derive(Debug, Default, Clone)]
pub struct FixedRegion(pub Option<String>);

impl LocaleProvider for FixedRegion {
    fn region_code(&self) -> Option<String> {
        self.0.as_deref().and_then(normalize_country)
    }
}

/// Pull the region out of a locale tag ("en_US.UTF-8" -> "us")
pub fn parse_region(locale: &str) -> Option<String> {
    let tag = locale.split(['.', '@']).next()?;
    let region = tag.split(['_', '-']).nth(1)?;
    normalize_country(region)
}

/// Two ASCII letters, lowercased; anything else isn't a country code
pub fn normalize_country(code: &str) -> Option<String> {
    let code = code.trim();
    if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(code.to_ascii_lowercase())
    } else {
        None
    }
}
