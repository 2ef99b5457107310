use std::{borrow::Cow, env, fmt};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LANG: Language = Language::English;

#[derive(ValueEnum, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "en", alias = "english")]
    #[value(name = "en")]
    English,
    #[serde(rename = "fr", alias = "french")]
    #[value(name = "fr")]
    French,
    #[serde(rename = "es", alias = "spanish")]
    #[value(name = "es")]
    Spanish,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::English => write!(f, "en-US"),
            Self::French => write!(f, "fr-FR"),
            Self::Spanish => write!(f, "es-ES"),
        }
    }
}

impl Language {
    // accepts "fr", "fr-CA", "fr_FR.UTF-8" and the like
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_lowercase();
        let primary = tag.split(['-', '_', '.', '@']).next().unwrap_or_default();

        match primary {
            "en" => Some(Self::English),
            "fr" => Some(Self::French),
            "es" => Some(Self::Spanish),
            _ => None,
        }
    }

    /// Picks a language from the usual locale environment variables, falling
    /// back to [`DEFAULT_LANG`] when none of them names a supported one.
    pub fn from_env() -> Self {
        ["LANGUAGE", "LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| env::var(var).ok())
            .find_map(|value| negotiate_language(&value))
            .unwrap_or(DEFAULT_LANG)
    }

    fn i18n_locale(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::French => "fr",
            Self::Spanish => "es",
        }
    }

    pub fn t<'a>(&self, key: &'a str) -> Cow<'a, str> {
        rust_i18n::t!(key, locale = self.i18n_locale())
    }

    // single interpolation argument, always named `x` in the catalogs
    pub fn t1<'a, T: fmt::Display>(&self, key: &'a str, x: T) -> Cow<'a, str> {
        rust_i18n::t!(key, locale = self.i18n_locale(), x = x)
    }
}

pub fn available_locales() -> Vec<&'static str> {
    rust_i18n::available_locales!()
}

// `LANGUAGE` is a colon separated preference list; the others hold one tag
fn negotiate_language(value: &str) -> Option<Language> {
    value
        .split([':', ','])
        .filter_map(|range| range.split(';').next())
        .find_map(Language::from_tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_with_regions_and_encodings() {
        assert_eq!(Language::from_tag("fr_CA.UTF-8"), Some(Language::French));
        assert_eq!(Language::from_tag("ES"), Some(Language::Spanish));
        assert_eq!(Language::from_tag("en-GB"), Some(Language::English));
        assert_eq!(Language::from_tag("sv"), None);
        assert_eq!(Language::from_tag("C"), None);
    }

    #[test]
    fn negotiation_skips_unsupported_entries() {
        assert_eq!(negotiate_language("sv:de:fr"), Some(Language::French));
        assert_eq!(negotiate_language("de;q=0.9,es;q=0.8"), Some(Language::Spanish));
        assert_eq!(negotiate_language("C.UTF-8"), None);
    }

    #[test]
    fn every_language_has_a_catalog() {
        let locales = available_locales();

        for lang in [Language::English, Language::French, Language::Spanish] {
            assert!(locales.contains(&lang.i18n_locale()), "{lang}");
        }
    }

    #[test]
    fn catalogs_translate_and_interpolate() {
        assert_eq!(Language::English.t("cancel"), "Cancel");
        assert_eq!(Language::French.t("cancel"), "Annuler");
        assert_eq!(
            Language::English.t1("user.delete.confirm", "bob"),
            "Are you sure you want to delete user bob?"
        );
    }
}
