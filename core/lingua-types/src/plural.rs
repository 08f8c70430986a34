//! Plural categories and the per-entry plural form map.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The fixed set of plural categories an entry may carry.
///
/// Ordering follows declaration order, which keeps serialized forms and
/// content hashes stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    /// All categories in canonical order.
    pub const ALL: [PluralCategory; 6] = [
        PluralCategory::Zero,
        PluralCategory::One,
        PluralCategory::Two,
        PluralCategory::Few,
        PluralCategory::Many,
        PluralCategory::Other,
    ];

    /// Returns the lowercase category name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            PluralCategory::Zero => "zero",
            PluralCategory::One => "one",
            PluralCategory::Two => "two",
            PluralCategory::Few => "few",
            PluralCategory::Many => "many",
            PluralCategory::Other => "other",
        }
    }

    /// Returns true if `name` is one of the category names.
    #[must_use]
    pub fn is_category(name: &str) -> bool {
        name.parse::<PluralCategory>().is_ok()
    }
}

impl fmt::Display for PluralCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PluralCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zero" => Ok(PluralCategory::Zero),
            "one" => Ok(PluralCategory::One),
            "two" => Ok(PluralCategory::Two),
            "few" => Ok(PluralCategory::Few),
            "many" => Ok(PluralCategory::Many),
            "other" => Ok(PluralCategory::Other),
            _ => Err(Error::UnknownPluralCategory(s.to_string())),
        }
    }
}

/// Plural forms of one entry. Always contains [`PluralCategory::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<PluralCategory, String>", into = "BTreeMap<PluralCategory, String>")]
pub struct PluralForms(BTreeMap<PluralCategory, String>);

impl PluralForms {
    /// Builds a form map, rejecting maps without an `other` form.
    pub fn new(forms: BTreeMap<PluralCategory, String>) -> Result<Self, Error> {
        if !forms.contains_key(&PluralCategory::Other) {
            return Err(Error::MissingOtherForm);
        }
        Ok(Self(forms))
    }

    /// Builds a form map from `(category name, text)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut forms = BTreeMap::new();
        for (name, text) in pairs {
            forms.insert(name.as_ref().parse::<PluralCategory>()?, text.into());
        }
        Self::new(forms)
    }

    /// Returns the text for `category`, if present.
    #[must_use]
    pub fn get(&self, category: PluralCategory) -> Option<&str> {
        self.0.get(&category).map(String::as_str)
    }

    /// Returns the mandatory `other` form.
    #[must_use]
    pub fn other(&self) -> &str {
        self.get(PluralCategory::Other).unwrap_or_default()
    }

    /// Returns the form for `category`, falling back to `other`.
    #[must_use]
    pub fn select(&self, category: PluralCategory) -> (PluralCategory, &str) {
        match self.0.get(&category) {
            Some(text) => (category, text.as_str()),
            None => (PluralCategory::Other, self.other()),
        }
    }

    /// Returns true if a form exists for `category`.
    #[must_use]
    pub fn contains(&self, category: PluralCategory) -> bool {
        self.0.contains_key(&category)
    }

    /// Iterates forms in canonical category order.
    pub fn iter(&self) -> impl Iterator<Item = (PluralCategory, &str)> {
        self.0.iter().map(|(c, t)| (*c, t.as_str()))
    }

    /// Number of forms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with collections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<BTreeMap<PluralCategory, String>> for PluralForms {
    type Error = Error;

    fn try_from(forms: BTreeMap<PluralCategory, String>) -> Result<Self, Self::Error> {
        Self::new(forms)
    }
}

impl From<PluralForms> for BTreeMap<PluralCategory, String> {
    fn from(forms: PluralForms) -> Self {
        forms.0
    }
}
