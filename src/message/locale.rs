use std::fmt;
use std::str::FromStr;

/// Language plus optional country, e.g. `en`, `en_US`, `de-AT`.
///
/// The root locale (empty language) is the last resort in every lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Locale {
    language: String,
    country: Option<String>,
}

impl Locale {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into().to_lowercase(),
            country: None,
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        let country = country.into();
        self.country = (!country.is_empty()).then(|| country.to_uppercase());
        self
    }

    pub fn root() -> Self {
        Self::default()
    }

    /// Parse `ll`, `ll_CC` or `ll-CC`
    pub fn parse(tag: &str) -> Self {
        let tag = tag.trim();
        match tag.split_once(['_', '-']) {
            Some((language, country)) => Self::new(language).with_country(country),
            None => Self::new(tag),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    pub fn is_root(&self) -> bool {
        self.language.is_empty()
    }

    /// Candidates to try in order: exact, language only, root
    pub fn fallbacks(&self) -> Vec<Locale> {
        let mut chain = vec![self.clone()];
        if self.country.is_some() {
            chain.push(Self::new(self.language.clone()));
        }
        if !self.is_root() {
            chain.push(Self::root());
        }
        chain
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.country {
            Some(country) => write!(f, "{}_{}", self.language, country),
            None => write!(f, "{}", self.language),
        }
    }
}

impl FromStr for Locale {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for Locale {
    fn from(tag: &str) -> Self {
        Self::parse(tag)
    }
}
