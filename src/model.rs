/*!
 * Domain model for translation data.
 *
 * The read contracts `TranslationDomain` and `TranslatableString` are shared by
 * the storage-backed entities defined here and by the file-backed XLIFF
 * representation, so export and import are written once against the traits.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A locale known to the data store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Language {
    /// Storage-assigned id (0 when not loaded from storage)
    pub id: i64,
    /// Locale code such as `en` or `de-at`
    pub code: String,
    /// Display name
    pub name: String,
}

impl Language {
    pub fn new(id: i64, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            code: code.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

/// Read access to a translatable string
pub trait TranslatableString {
    /// Name of the string, unique within its domain
    fn name(&self) -> &str;

    /// All `(language code, content)` pairs of this string
    fn translations(&self) -> Vec<(&str, &str)>;

    /// Content for one language, if translated
    fn content(&self, language_code: &str) -> Option<&str> {
        self.translations()
            .into_iter()
            .find(|(code, _)| *code == language_code)
            .map(|(_, content)| content)
    }
}

/// Read access to a whole translation domain
pub trait TranslationDomain {
    type Entry: TranslatableString;

    fn name(&self) -> &str;

    fn strings(&self) -> &[Self::Entry];
}

/// Translation content of one string in one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    /// Storage id, absent for unsaved translations
    #[serde(skip)]
    pub id: Option<i64>,
    pub content: String,
}

impl Translation {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: None,
            content: content.into(),
        }
    }
}

/// A string with its translations keyed by language code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringEntry {
    #[serde(skip)]
    pub id: Option<i64>,
    pub name: String,
    pub translations: BTreeMap<String, Translation>,
}

impl StringEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            translations: BTreeMap::new(),
        }
    }

    /// Builder-style helper to add a translation
    pub fn with_translation(mut self, language_code: &str, content: &str) -> Self {
        self.translations
            .insert(language_code.to_string(), Translation::new(content));
        self
    }
}

impl TranslatableString for StringEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn translations(&self) -> Vec<(&str, &str)> {
        self.translations
            .iter()
            .map(|(code, t)| (code.as_str(), t.content.as_str()))
            .collect()
    }

    fn content(&self, language_code: &str) -> Option<&str> {
        self.translations
            .get(language_code)
            .map(|t| t.content.as_str())
    }
}

/// A named group of strings.
///
/// Domains returned by `DataStore::get_domain_list` carry only their name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    #[serde(default)]
    pub strings: Vec<StringEntry>,
}

impl Domain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strings: Vec::new(),
        }
    }

    /// Look up a string by name
    pub fn string(&self, name: &str) -> Option<&StringEntry> {
        self.strings.iter().find(|s| s.name == name)
    }
}

impl TranslationDomain for Domain {
    type Entry = StringEntry;

    fn name(&self) -> &str {
        &self.name
    }

    fn strings(&self) -> &[StringEntry] {
        &self.strings
    }
}

/// Which columns a search matches against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchField {
    /// String names only
    Name,
    /// Translation content only
    Content,
    /// String names or translation content
    #[default]
    All,
}

impl std::str::FromStr for SearchField {
    type Err = crate::errors::StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "content" => Ok(Self::Content),
            "all" => Ok(Self::All),
            other => Err(crate::errors::StoreError::Validation(format!(
                "unknown search field '{}' (expected name, content or all)",
                other
            ))),
        }
    }
}

/// One translation matched by a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub domain: String,
    pub string: String,
    pub language: String,
    pub content: String,
}
