//! Settings which control where words come from and how names are built.
//!
//! Settings can be loaded from environment variables via
//! [`WordNamesSettings::from_env`] or from a JSON document via
//! [`WordNamesSettings::from_json`]. In JSON, the word list is given as
//! either `{"words": ["Apple", "Pear"]}` or `{"page": "Wordnames"}`.

use anyhow::Context;
use serde::{Deserialize, Deserializer};
use std::env;
use std::str::FromStr;

/// Default number of words per generated name.
pub const DEFAULT_NUM_WORDS: i64 = 3;

/// Raised when the word list settings cannot be used at all.
///
/// This is the only fatal error of this crate. It surfaces when a mapping or
/// resolver is constructed, never while names are generated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("No word list is configured: either a word list or a page must be defined")]
    MissingWordList,

    #[error("Both a word list and a page are configured, only one of them may be defined")]
    AmbiguousWordList,
}

/// Where the words for generated names come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordListSpec {
    /// A fixed list of words, used as is.
    InlineWords(Vec<String>),

    /// A page whose lines are the words.
    ///
    /// The page is read from `target_deployment`, or from the local deployment
    /// if no target is given.
    RemoteDocument {
        page_name: String,
        target_deployment: Option<String>,
    },
}

/// All settings of the name generator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WordNamesSettings {
    /// The word list to sample from. Required.
    #[serde(deserialize_with = "deserialize_list")]
    pub list: Option<WordListSpec>,

    /// Number of words in each name.
    pub num_words: i64,

    /// Appends `index + offset` to each name if set.
    pub use_index: bool,

    /// Added to the index before it is appended.
    pub offset: i64,

    /// Deployment hosting the word list page. Applies to page lists only.
    pub central_deployment: Option<String>,
}

#[derive(Deserialize)]
struct RawWordListSpec {
    words: Option<Vec<String>>,
    page: Option<String>,
}

impl RawWordListSpec {
    fn into_spec(self) -> Result<WordListSpec, ConfigurationError> {
        match (self.words, self.page) {
            (Some(words), None) => Ok(WordListSpec::InlineWords(words)),
            (None, Some(page_name)) => Ok(WordListSpec::RemoteDocument {
                page_name,
                target_deployment: None,
            }),
            (Some(_), Some(_)) => Err(ConfigurationError::AmbiguousWordList),
            (None, None) => Err(ConfigurationError::MissingWordList),
        }
    }
}

fn deserialize_list<'de, D>(deserializer: D) -> Result<Option<WordListSpec>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawWordListSpec>::deserialize(deserializer)?
        .map(|raw| raw.into_spec().map_err(serde::de::Error::custom))
        .transpose()
}

impl WordNamesSettings {
    /// Creates settings for an inline word list with default name layout.
    pub fn with_words<S: Into<String>>(words: impl IntoIterator<Item = S>) -> Self {
        Self {
            list: Some(WordListSpec::InlineWords(
                words.into_iter().map(Into::into).collect(),
            )),
            ..Self::default()
        }
    }

    /// Creates settings for a word list page with default name layout.
    pub fn with_page(page_name: impl Into<String>) -> Self {
        Self {
            list: Some(WordListSpec::RemoteDocument {
                page_name: page_name.into(),
                target_deployment: None,
            }),
            ..Self::default()
        }
    }

    /// Loads the settings from `WORDNAMES_*` environment variables.
    ///
    /// A missing word list is not reported here but when the settings are
    /// used, see [`WordNamesSettings::word_list`].
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Loads the settings from `WORDNAMES_*` variables provided by `lookup`.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let words = lookup("WORDNAMES_WORDS").map(|words| {
            words
                .split(',')
                .map(str::trim)
                .filter(|word| !word.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        });
        let page = lookup("WORDNAMES_PAGE").filter(|page| !page.is_empty());

        let list = match (words, page) {
            (None, None) => None,
            (words, page) => Some(RawWordListSpec { words, page }.into_spec()?),
        };

        Ok(Self {
            list,
            num_words: parse_var(&lookup, "WORDNAMES_LENGTH")?.unwrap_or(DEFAULT_NUM_WORDS),
            use_index: parse_var(&lookup, "WORDNAMES_USE_INDEX")?.unwrap_or(true),
            offset: parse_var(&lookup, "WORDNAMES_OFFSET")?.unwrap_or(0),
            central_deployment: lookup("WORDNAMES_CENTRAL_DEPLOYMENT")
                .filter(|deployment| !deployment.is_empty()),
        })
    }

    /// Parses the settings from a JSON document.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("Failed to parse word name settings")
    }

    /// Returns the configured word list.
    ///
    /// A page without an explicit target is read from `central_deployment`.
    /// Fails with [`ConfigurationError::MissingWordList`] if no list is set.
    pub fn word_list(&self) -> Result<WordListSpec, ConfigurationError> {
        match self.list.clone() {
            Some(WordListSpec::RemoteDocument {
                page_name,
                target_deployment,
            }) => Ok(WordListSpec::RemoteDocument {
                page_name,
                target_deployment: target_deployment.or_else(|| self.central_deployment.clone()),
            }),
            Some(list) => Ok(list),
            None => Err(ConfigurationError::MissingWordList),
        }
    }
}

impl Default for WordNamesSettings {
    fn default() -> Self {
        Self {
            list: None,
            num_words: DEFAULT_NUM_WORDS,
            use_index: true,
            offset: 0,
            central_deployment: None,
        }
    }
}

fn parse_var<T>(lookup: impl Fn(&str) -> Option<String>, name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("Invalid value for {}: '{}'", name, value)),
        _ => Ok(None),
    }
}
