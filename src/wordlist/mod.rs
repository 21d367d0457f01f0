//! Resolution of the word list names are sampled from.
//!
//! [`WordListResolver::resolve`] never fails. Inline lists are used as
//! configured. Page lists are read through the [`SharedCache`] under a single
//! global key for one hour, so that all deployments sharing the cache also
//! share the list. The outcome is memoized for the lifetime of the resolver.
//!
//! If the page cannot be read, is empty, or the list is shorter than the
//! number of words per name (or that number is not positive), the built-in
//! [`FALLBACK_WORDS`] are used instead and a warning is logged.

use crate::DEPLOYMENT_ID;
use crate::cache::{CacheKey, CachedWords, SharedCache};
use crate::config::{ConfigurationError, WordListSpec, WordNamesSettings};
use crate::content::{DeploymentTarget, PageContentFetcher};
use arc_swap::ArcSwapOption;
use std::ops::Deref;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

/// How long a page list stays in the shared cache.
pub const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Keyspace of the shared cache entry holding the page list.
pub const CACHE_KEYSPACE: &str = "tempuserwordnames";

/// Words used whenever no valid word list can be resolved.
pub const FALLBACK_WORDS: [&str; 53] = [
    "Apple", "Banana", "Cherry", "Grape", "Peach", "Pear", "Strawberry", "Watermelon", "Apricot",
    "Blueberry", "Orange", "Tomato", "Plum", "Lime", "Lemon", "Bread", "Egg", "Fish", "Garlic",
    "Sugar", "Bagel", "Tofu", "Muffin", "Cake", "Perfect", "Cheerful", "Generous", "Friendly",
    "Happy", "Important", "Great", "Real", "Strong", "Delighted", "Merry", "Sunny", "Jovial",
    "Elated", "Lucky", "Golden", "Blissful", "Pretty", "Silly", "Red", "Yellow", "Green", "Blue",
    "Orange", "Purple", "Pink", "Cyan", "Magenta", "Fluorescent",
];

static FALLBACK_LIST: LazyLock<Arc<Vec<String>>> =
    LazyLock::new(|| Arc::new(FALLBACK_WORDS.iter().map(|word| word.to_string()).collect()));

/// A word list which is ready to be sampled from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedWordList(Arc<Vec<String>>);

impl ResolvedWordList {
    /// The built-in fallback list.
    pub fn fallback() -> Self {
        Self(FALLBACK_LIST.clone())
    }

    pub fn words(&self) -> &[String] {
        &self.0
    }

    pub fn is_fallback(&self) -> bool {
        Arc::ptr_eq(&self.0, &FALLBACK_LIST)
    }
}

impl Deref for ResolvedWordList {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Splits page text into words: one per line, trimmed, blank lines dropped.
pub fn parse_word_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

enum WordSource {
    Inline(CachedWords),
    Page {
        page_name: String,
        target: DeploymentTarget,
    },
}

/// Determines the word list to use, with caching and fallback.
pub struct WordListResolver {
    source: WordSource,
    num_words: i64,
    fetcher: Arc<dyn PageContentFetcher>,
    cache: Arc<dyn SharedCache>,
    cache_key: CacheKey,
    resolved: ArcSwapOption<Vec<String>>,
    resolving: tokio::sync::Mutex<()>,
}

impl WordListResolver {
    /// Creates a resolver for this deployment, see [`DEPLOYMENT_ID`].
    ///
    /// Fails if `settings` carry no word list at all.
    pub fn new(
        settings: &WordNamesSettings,
        fetcher: Arc<dyn PageContentFetcher>,
        cache: Arc<dyn SharedCache>,
    ) -> Result<Self, ConfigurationError> {
        Self::with_local_identity(settings, DEPLOYMENT_ID.as_str(), fetcher, cache)
    }

    /// Creates a resolver acting on behalf of the deployment `local_identity`.
    pub fn with_local_identity(
        settings: &WordNamesSettings,
        local_identity: &str,
        fetcher: Arc<dyn PageContentFetcher>,
        cache: Arc<dyn SharedCache>,
    ) -> Result<Self, ConfigurationError> {
        let source = match settings.word_list()? {
            WordListSpec::InlineWords(words) => WordSource::Inline(Arc::new(words)),
            WordListSpec::RemoteDocument {
                page_name,
                target_deployment,
            } => WordSource::Page {
                page_name,
                target: DeploymentTarget::resolve(target_deployment.as_deref(), local_identity),
            },
        };

        Ok(Self {
            source,
            num_words: settings.num_words,
            fetcher,
            cache,
            cache_key: CacheKey::global(CACHE_KEYSPACE, &["words"]),
            resolved: ArcSwapOption::new(None),
            resolving: tokio::sync::Mutex::new(()),
        })
    }

    /// The shared cache key under which page lists are stored.
    pub fn cache_key(&self) -> &CacheKey {
        &self.cache_key
    }

    /// Returns the word list to sample from.
    ///
    /// The first call computes the list, later calls return it unchanged
    /// until [`WordListResolver::invalidate`] is called. Concurrent first
    /// calls compute it only once.
    pub async fn resolve(&self) -> ResolvedWordList {
        if let Some(words) = self.resolved.load_full() {
            return ResolvedWordList(words);
        }

        let _guard = self.resolving.lock().await;
        if let Some(words) = self.resolved.load_full() {
            return ResolvedWordList(words);
        }

        let words = self.compute().await;
        self.resolved.store(Some(words.0.clone()));

        words
    }

    /// Forgets the memoized list so that the next call to `resolve` consults
    /// the shared cache (and possibly the page) again.
    pub fn invalidate(&self) {
        self.resolved.store(None);
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn compute(&self) -> ResolvedWordList {
        let candidates = match &self.source {
            WordSource::Inline(words) => words.clone(),
            WordSource::Page { page_name, target } => {
                match self.load_page_words(page_name, target).await {
                    Some(words) => words,
                    None => {
                        tracing::warn!(
                            "Configured word list (page: {}) is empty. Using fallback list.",
                            page_name
                        );
                        return ResolvedWordList::fallback();
                    }
                }
            }
        };

        if self.num_words <= 0 || self.num_words as u64 > candidates.len() as u64 {
            tracing::warn!(
                "Number of words per name ({}) is less than 1 or more than the length of the list ({}). Using fallback list.",
                self.num_words,
                candidates.len()
            );
            return ResolvedWordList::fallback();
        }

        ResolvedWordList(candidates)
    }

    async fn load_page_words(
        &self,
        page_name: &str,
        target: &DeploymentTarget,
    ) -> Option<CachedWords> {
        self.cache
            .get_with_set_callback(
                &self.cache_key,
                CACHE_TTL,
                Box::pin(fetch_page_words(self.fetcher.as_ref(), target, page_name)),
            )
            .await
    }
}

async fn fetch_page_words(
    fetcher: &dyn PageContentFetcher,
    target: &DeploymentTarget,
    page_name: &str,
) -> Option<CachedWords> {
    let text = match fetcher.fetch_main_content(target, page_name).await {
        Ok(Some(text)) => text,
        Ok(None) => {
            tracing::warn!("No main content on configured page: {} ({})", page_name, target);
            return None;
        }
        Err(err) => {
            tracing::warn!(
                "Failed to fetch configured page: {} ({}): {:#}",
                page_name,
                target,
                err
            );
            return None;
        }
    };

    let words = parse_word_list(&text);
    if words.is_empty() {
        tracing::warn!("Empty content on configured page: {} ({})", page_name, target);
        None
    } else {
        Some(Arc::new(words))
    }
}
