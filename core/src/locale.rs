//! Locale fallback chains for translated attributes.

use indexmap::IndexMap;

use crate::{Locale, Name};

/// Provides the current locale and the order in which locales are tried.
pub trait Localizer {
    fn locale(&self) -> &Locale;

    /// Locales to try for `locale`, most preferred first. Always starts with
    /// `locale` itself.
    fn fallbacks(&self, locale: &str) -> Vec<Locale>;

    /// Fallback chain of the current locale.
    fn chain(&self) -> Vec<Locale> {
        self.fallbacks(self.locale())
    }
}

impl<L: Localizer + ?Sized> Localizer for &L {
    fn locale(&self) -> &Locale {
        (**self).locale()
    }

    fn fallbacks(&self, locale: &str) -> Vec<Locale> {
        (**self).fallbacks(locale)
    }
}

/// A fixed current locale with configured fallbacks.
///
/// ```
/// use plucker_core::{Fallbacks, Localizer};
///
/// let locales = Fallbacks::new("es").fallback("es", ["en"]);
/// assert_eq!(locales.chain(), ["es", "en"]);
/// assert_eq!(locales.fallbacks("fr"), ["fr"]);
/// ```
#[derive(Debug, Clone)]
pub struct Fallbacks {
    locale: Locale,
    chains: IndexMap<Locale, Vec<Locale>>,
}

impl Fallbacks {
    pub fn new(locale: impl Into<Locale>) -> Self {
        Self {
            locale: locale.into(),
            chains: IndexMap::new(),
        }
    }

    /// Locales tried after `locale`, in order.
    pub fn fallback<I, L>(mut self, locale: impl Into<Locale>, then: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Locale>,
    {
        self.chains
            .insert(locale.into(), then.into_iter().map(Into::into).collect());
        self
    }

    /// Switches the current locale, keeping the configured chains.
    pub fn with_locale(mut self, locale: impl Into<Locale>) -> Self {
        self.locale = locale.into();
        self
    }
}

impl Default for Fallbacks {
    fn default() -> Self {
        Self::new("en")
    }
}

impl Localizer for Fallbacks {
    fn locale(&self) -> &Locale {
        &self.locale
    }

    fn fallbacks(&self, locale: &str) -> Vec<Locale> {
        let mut chain = vec![Name::from(locale)];
        for next in self.chains.get(locale).into_iter().flatten() {
            if !chain.contains(next) {
                chain.push(next.clone());
            }
        }
        chain
    }
}

/// Join alias used for one locale's translation row.
///
/// `pt-BR` → `locale_pt__BR_translation`, `pt_BR` → `locale_pt_uBR_translation`.
/// Distinct locales always get distinct aliases.
pub fn translation_alias(locale: &str) -> Name {
    use core::fmt::Write;

    let mut alias = Name::with_capacity(locale.len() + 21);
    alias.push_str("locale_");
    for c in locale.chars() {
        match c {
            c if c.is_ascii_alphanumeric() => alias.push(c),
            '-' => alias.push_str("__"),
            '_' => alias.push_str("_u"),
            // Infallible for CompactString.
            c => {
                let _ = write!(alias, "_x{:x}_", u32::from(c));
            }
        }
    }
    alias.push_str("_translation");
    alias
}
